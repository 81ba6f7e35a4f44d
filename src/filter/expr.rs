use std::fmt;
use std::net::IpAddr;

use crate::filter::fields::Field;
use crate::models::packet::PacketRecord;

/// Compiled display filter
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpression {
    /// The compiled form of an empty filter
    MatchAll,
    FieldComparison(Comparison),
    And(Box<FilterExpression>, Box<FilterExpression>),
    Or(Box<FilterExpression>, Box<FilterExpression>),
    Not(Box<FilterExpression>),
    /// Case-insensitive substring over protocol, info and addresses; stored lowercase
    ProtocolOrTextMatch(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Equal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub field: Field,
    pub operator: ComparisonOp,
    pub literal: Literal,
}

/// A comparison literal, pre-parsed into the forms field values compare against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    text: String,
    address: Option<IpAddr>,
    port: Option<u16>,
}

impl Literal {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let address = text.parse().ok();
        let port = text.parse().ok();
        Self {
            text,
            address,
            port,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn address(&self) -> Option<IpAddr> {
        self.address
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

impl Comparison {
    pub fn new(field: Field, operator: ComparisonOp, literal: Literal) -> Self {
        Self {
            field,
            operator,
            literal,
        }
    }

    /// True when the literal equals any value the field yields
    pub fn matches(&self, record: &PacketRecord) -> bool {
        match self.operator {
            ComparisonOp::Equal => self
                .field
                .extract(record)
                .iter()
                .any(|value| value.equals(&self.literal)),
        }
    }
}

impl FilterExpression {
    /// Bare-text predicate; `text` is lowercased here
    pub fn text_match(text: &str) -> Self {
        FilterExpression::ProtocolOrTextMatch(text.to_lowercase())
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self, FilterExpression::MatchAll)
    }

    pub fn evaluate(&self, record: &PacketRecord) -> bool {
        match self {
            FilterExpression::MatchAll => true,
            FilterExpression::FieldComparison(comparison) => comparison.matches(record),
            FilterExpression::And(left, right) => left.evaluate(record) && right.evaluate(record),
            FilterExpression::Or(left, right) => left.evaluate(record) || right.evaluate(record),
            FilterExpression::Not(inner) => !inner.evaluate(record),
            FilterExpression::ProtocolOrTextMatch(needle) => text_matches(record, needle),
        }
    }
}

fn text_matches(record: &PacketRecord, needle: &str) -> bool {
    let contains = |haystack: &str| haystack.to_lowercase().contains(needle);

    contains(&record.protocol_tag)
        || contains(&record.summary_info)
        || record.source_address.as_deref().is_some_and(contains)
        || record.destination_address.as_deref().is_some_and(contains)
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterExpression::MatchAll => Ok(()),
            FilterExpression::FieldComparison(c) => {
                write!(f, "{}=={}", c.field.name(), c.literal.text())
            }
            FilterExpression::And(l, r) => write!(f, "({} && {})", l, r),
            FilterExpression::Or(l, r) => write!(f, "({} || {})", l, r),
            FilterExpression::Not(inner) => write!(f, "!{}", inner),
            FilterExpression::ProtocolOrTextMatch(text) => write!(f, "\"{}\"", text),
        }
    }
}
