use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::char,
    combinator::{map, value},
    sequence::delimited,
};
use std::fmt;

use crate::utils::error::FilterError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    LParen,
    RParen,
    And,
    Or,
    Not,
    Equals,
    Word(String),
    Quoted(String),
}

/// A token with its byte range in the filter text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub start: usize,
    pub end: usize,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::And => write!(f, "'&&'"),
            Token::Or => write!(f, "'||'"),
            Token::Not => write!(f, "'!'"),
            Token::Equals => write!(f, "'=='"),
            Token::Word(w) => write!(f, "'{}'", w),
            Token::Quoted(q) => write!(f, "\"{}\"", q),
        }
    }
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '(' | ')' | '!' | '&' | '|' | '=' | '"')
}

fn quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_while(|c: char| c != '"'), char('"')).parse(input)
}

fn token(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::And, tag("&&")),
        value(Token::Or, tag("||")),
        value(Token::Equals, tag("==")),
        value(Token::Not, char('!')),
        value(Token::LParen, char('(')),
        value(Token::RParen, char(')')),
        map(quoted, |text: &str| Token::Quoted(text.to_string())),
        map(take_while1(is_word_char), |text: &str| {
            Token::Word(text.to_string())
        }),
    ))
    .parse(input)
}

/// Split filter text into tokens, skipping whitespace
pub fn tokenize(input: &str) -> Result<Vec<Spanned>, FilterError> {
    let mut tokens = Vec::new();
    let mut rest = input.trim_start();

    while !rest.is_empty() {
        let start = input.len() - rest.len();
        match token(rest) {
            Ok((remaining, token)) => {
                let end = input.len() - remaining.len();
                tokens.push(Spanned { token, start, end });
                rest = remaining.trim_start();
            }
            Err(_) => return Err(unexpected(rest, start)),
        }
    }

    Ok(tokens)
}

fn unexpected(rest: &str, position: usize) -> FilterError {
    let message = match rest.chars().next() {
        Some('"') => "unterminated quoted string".to_string(),
        Some('&') => "single '&', expected '&&'".to_string(),
        Some('|') => "single '|', expected '||'".to_string(),
        Some('=') => "single '=', expected '=='".to_string(),
        Some(c) => format!("unexpected character '{}'", c),
        None => "unexpected end of filter".to_string(),
    };
    FilterError::syntax(position, message)
}
