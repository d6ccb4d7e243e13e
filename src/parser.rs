//! Tokenize a format string into units using PEST.
//!
//! The scan is best-effort: characters that do not form `digits* (letter | ?)`
//! are skipped. Run the format through a [`FormatOracle`](crate::host::FormatOracle)
//! first; only the oracle decides whether a string is valid.

use crate::ast::{ByteOrder, FormatUnit, TypeCode};
use pest::Parser;
use pest_derive::Parser as PestParser;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct FormatParser;

/// Tokenized format: optional leading marker plus units in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFormat {
    pub byte_order: Option<ByteOrder>,
    pub units: Vec<FormatUnit>,
}

/// Split off a single leading byte-order marker, if present.
pub fn split_byte_order(fmt: &str) -> (Option<ByteOrder>, &str) {
    let mut chars = fmt.chars();
    match chars.next().and_then(ByteOrder::from_marker) {
        Some(order) => (Some(order), chars.as_str()),
        None => (None, fmt),
    }
}

/// Parse format source into units.
pub fn parse(fmt: &str) -> Result<ParsedFormat, String> {
    let (byte_order, body) = split_byte_order(fmt);
    let pairs = FormatParser::parse(Rule::format_body, body)
        .map_err(|e| format!("Parse error: {}", e))?;
    let pair = pairs.into_iter().next().ok_or("Empty parse")?;

    let mut units = Vec::new();
    for inner in pair.into_inner() {
        if inner.as_rule() == Rule::unit {
            units.push(build_unit(inner)?);
        }
    }
    Ok(ParsedFormat { byte_order, units })
}

fn build_unit(pair: pest::iterators::Pair<Rule>) -> Result<FormatUnit, String> {
    let mut count = None;
    let mut code = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::count => {
                let digits = inner.as_str();
                let n = digits
                    .parse::<usize>()
                    .map_err(|e| format!("repeat count {}: {}", digits, e))?;
                count = Some(n);
            }
            Rule::code => code = inner.as_str().chars().next().map(TypeCode),
            _ => {}
        }
    }
    Ok(FormatUnit {
        count,
        code: code.ok_or("unit: missing type code")?,
    })
}
