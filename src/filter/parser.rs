//! Recursive-descent parser for display filters.
//!
//! ```text
//! Or      := And ('||' And)*
//! And     := Unary ('&&' Unary)*
//! Unary   := '!'? Primary
//! Primary := '(' Or ')' | Field '==' Literal | BareText
//! ```
//!
//! Consecutive words with no operator between them form one bare-text phrase.
//! A comparison on a name that is not a registered field is bare text over
//! its source text and so matches (practically) nothing.

use crate::filter::expr::{Comparison, ComparisonOp, FilterExpression, Literal};
use crate::filter::fields;
use crate::filter::lexer::{tokenize, Spanned, Token};
use crate::utils::error::FilterError;

/// Parse filter text; empty or whitespace-only text matches everything
pub fn parse(input: &str) -> Result<FilterExpression, FilterError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Ok(FilterExpression::MatchAll);
    }

    let mut parser = ExprParser {
        input,
        tokens,
        pos: 0,
    };
    let expr = parser.or_expression()?;

    match parser.advance() {
        None => Ok(expr),
        Some(Spanned {
            token: Token::RParen,
            start,
            ..
        }) => Err(FilterError::syntax(start, "unbalanced ')'")),
        Some(Spanned { token, start, .. }) => Err(FilterError::syntax(
            start,
            format!("expected '&&' or '||' before {}", token),
        )),
    }
}

struct ExprParser<'a> {
    input: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
}

impl ExprParser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead).map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let next = self.tokens.get(self.pos).cloned();
        if next.is_some() {
            self.pos += 1;
        }
        next
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn end_of_input(&self, message: &str) -> FilterError {
        FilterError::syntax(self.input.len(), message)
    }

    fn or_expression(&mut self) -> Result<FilterExpression, FilterError> {
        let mut left = self.and_expression()?;
        while self.eat(&Token::Or) {
            let right = self.and_expression()?;
            left = FilterExpression::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expression(&mut self) -> Result<FilterExpression, FilterError> {
        let mut left = self.unary()?;
        while self.eat(&Token::And) {
            let right = self.unary()?;
            left = FilterExpression::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<FilterExpression, FilterError> {
        if self.eat(&Token::Not) {
            let operand = self.primary()?;
            return Ok(FilterExpression::Not(Box::new(operand)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<FilterExpression, FilterError> {
        let Some(spanned) = self.advance() else {
            return Err(self.end_of_input("expected an expression at end of filter"));
        };

        match spanned.token {
            Token::LParen => {
                let inner = self.or_expression()?;
                match self.advance() {
                    Some(Spanned {
                        token: Token::RParen,
                        ..
                    }) => Ok(inner),
                    Some(other) => Err(FilterError::syntax(
                        other.start,
                        format!("expected ')' but found {}", other.token),
                    )),
                    None => Err(FilterError::syntax(
                        spanned.start,
                        "unbalanced '(': missing ')'",
                    )),
                }
            }
            Token::Word(word) if self.peek() == Some(&Token::Equals) => {
                self.comparison(word, spanned.start)
            }
            Token::Word(text) | Token::Quoted(text) => Ok(self.phrase(text)),
            token => Err(FilterError::syntax(
                spanned.start,
                format!("unexpected {}", token),
            )),
        }
    }

    /// `name == literal`, with `==` not yet consumed
    fn comparison(&mut self, name: String, start: usize) -> Result<FilterExpression, FilterError> {
        let equals = self.advance();
        let literal = match self.advance() {
            Some(Spanned {
                token: Token::Word(text) | Token::Quoted(text),
                end,
                ..
            }) => (text, end),
            Some(other) => {
                return Err(FilterError::syntax(
                    other.start,
                    format!("expected a value after '==' but found {}", other.token),
                ))
            }
            None => {
                let position = equals.map(|e| e.start).unwrap_or(self.input.len());
                return Err(FilterError::syntax(position, "expected a value after '=='"));
            }
        };

        let (text, end) = literal;
        match fields::lookup(&name) {
            Some(field) => Ok(FilterExpression::FieldComparison(Comparison::new(
                field,
                ComparisonOp::Equal,
                Literal::new(text),
            ))),
            None => {
                log::debug!("Unknown filter field '{}', matching as text", name);
                Ok(FilterExpression::text_match(&self.input[start..end]))
            }
        }
    }

    /// Bare text, extended by following words that do not start a comparison
    fn phrase(&mut self, first: String) -> FilterExpression {
        let mut words = vec![first];
        while let Some(Token::Word(next) | Token::Quoted(next)) = self.peek() {
            if self.peek_at(1) == Some(&Token::Equals) {
                break;
            }
            words.push(next.clone());
            self.pos += 1;
        }
        FilterExpression::text_match(&words.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::fields::Field;

    fn cmp(field: Field, literal: &str) -> FilterExpression {
        FilterExpression::FieldComparison(Comparison::new(
            field,
            ComparisonOp::Equal,
            Literal::new(literal),
        ))
    }

    fn syntax_position(input: &str) -> usize {
        match parse(input) {
            Err(FilterError::Syntax { position, .. }) => position,
            Ok(expr) => panic!("'{}' parsed as {:?}", input, expr),
        }
    }

    #[test]
    fn test_empty_is_match_all() {
        assert_eq!(parse("").unwrap(), FilterExpression::MatchAll);
        assert_eq!(parse("   ").unwrap(), FilterExpression::MatchAll);
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let expr = parse("dns || ip.src==10.0.0.1 && tcp.port==80").unwrap();
        assert_eq!(
            expr,
            FilterExpression::Or(
                Box::new(FilterExpression::text_match("dns")),
                Box::new(FilterExpression::And(
                    Box::new(cmp(Field::IpSrc, "10.0.0.1")),
                    Box::new(cmp(Field::TcpPort, "80")),
                )),
            )
        );
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let expr = parse("(tcp.port==80 || tcp.port==443) && ip.src==10.0.0.1").unwrap();
        assert_eq!(
            expr,
            FilterExpression::And(
                Box::new(FilterExpression::Or(
                    Box::new(cmp(Field::TcpPort, "80")),
                    Box::new(cmp(Field::TcpPort, "443")),
                )),
                Box::new(cmp(Field::IpSrc, "10.0.0.1")),
            )
        );
    }

    #[test]
    fn test_not_applies_to_primary() {
        let expr = parse("!arp && udp").unwrap();
        assert_eq!(
            expr,
            FilterExpression::And(
                Box::new(FilterExpression::Not(Box::new(FilterExpression::text_match(
                    "arp"
                )))),
                Box::new(FilterExpression::text_match("udp")),
            )
        );
    }

    #[test]
    fn test_adjacent_words_form_phrase() {
        assert_eq!(
            parse("Standard   Query").unwrap(),
            FilterExpression::text_match("standard query")
        );
    }

    #[test]
    fn test_unknown_field_is_text() {
        assert_eq!(
            parse("frame.len == 60").unwrap(),
            FilterExpression::text_match("frame.len == 60")
        );
    }

    #[test]
    fn test_field_name_alone_is_text() {
        assert_eq!(
            parse("tcp.port").unwrap(),
            FilterExpression::text_match("tcp.port")
        );
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert_eq!(syntax_position("(dns"), 0);
        assert_eq!(syntax_position("dns)"), 3);
        assert_eq!(syntax_position("()"), 1);
        assert_eq!(syntax_position("((tcp) || udp"), 0);
    }

    #[test]
    fn test_dangling_operators() {
        assert_eq!(syntax_position("dns &&"), 6);
        assert_eq!(syntax_position("|| dns"), 0);
        assert_eq!(syntax_position("dns && || udp"), 7);
        assert_eq!(syntax_position("!"), 1);
        assert_eq!(syntax_position("ip.src =="), 7);
        assert_eq!(syntax_position("== 10.0.0.1"), 0);
    }

    #[test]
    fn test_missing_operator_between_terms() {
        assert_eq!(syntax_position("dns ip.src==10.0.0.1"), 4);
        assert_eq!(syntax_position("tcp.port==80 udp"), 13);
    }
}
