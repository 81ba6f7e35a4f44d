//! Display filter engine: lexer, parser, AST and evaluator.

pub mod expr;
pub mod fields;
pub mod lexer;
pub mod parser;

use log::debug;

use crate::models::packet::PacketRecord;
use crate::store::{PacketStore, RecordRef};
use crate::utils::error::FilterError;

pub use expr::{Comparison, ComparisonOp, FilterExpression, Literal};
pub use fields::Field;

/// Compile display filter text into an expression
pub fn compile(text: &str) -> Result<FilterExpression, FilterError> {
    let expr = parser::parse(text)?;
    debug!("Compiled filter '{}' as {}", text.trim(), expr);
    Ok(expr)
}

pub fn evaluate(expr: &FilterExpression, record: &PacketRecord) -> bool {
    expr.evaluate(record)
}

/// The filtered view: indices of matching records, in store order
pub fn apply(expr: &FilterExpression, store: &PacketStore) -> Vec<RecordRef> {
    store
        .records()
        .iter()
        .enumerate()
        .filter(|(_, loaded)| expr.evaluate(&loaded.record))
        .map(|(index, _)| index)
        .collect()
}
