//! FILENAME: core/report-engine/src/eval.rs
//! PURPOSE: Resolves template expressions against the current record.
//! CONTEXT: An expression cell yields one of three things: a plain value, a
//! formula to write as-is, or a macro call whose formula is built by a
//! registered macro at render time.

use report_model::{CellValue, Record};

use crate::error::EvalError;
use crate::source::lookup_scoped;

/// What an expression cell resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluated {
    Value(CellValue),
    /// Formula text without the leading '='.
    Formula(String),
    Macro { name: String, args: String },
}

pub trait CellEvaluator {
    /// `scopes` holds the enclosing records, outermost first.
    fn evaluate(&self, expr: &str, record: &Record, scopes: &[Record]) -> Result<Evaluated, EvalError>;
}

/// Expression syntax:
/// - `=SUM(A1:A3)` is a formula, written as-is
/// - `#NAME(args)` is a macro call
/// - anything else names a field, looked up in the record and then in the
///   enclosing scopes, innermost first
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldEvaluator;

impl FieldEvaluator {
    pub fn new() -> Self {
        FieldEvaluator
    }
}

impl CellEvaluator for FieldEvaluator {
    fn evaluate(&self, expr: &str, record: &Record, scopes: &[Record]) -> Result<Evaluated, EvalError> {
        let expr = expr.trim();

        if let Some(formula) = expr.strip_prefix('=') {
            return Ok(Evaluated::Formula(formula.to_string()));
        }

        if let Some(call) = expr.strip_prefix('#') {
            return parse_macro_call(call)
                .map(|(name, args)| Evaluated::Macro {
                    name: name.to_string(),
                    args: args.to_string(),
                })
                .ok_or_else(|| EvalError::MalformedMacro(expr.to_string()));
        }

        record
            .get(expr)
            .or_else(|| lookup_scoped(scopes, expr))
            .cloned()
            .map(Evaluated::Value)
            .ok_or_else(|| EvalError::UnknownField(expr.to_string()))
    }
}

/// Splits `NAME(args)` into its parts. The name must be a plain identifier.
fn parse_macro_call(call: &str) -> Option<(&str, &str)> {
    let open = call.find('(')?;
    let args = call[open + 1..].strip_suffix(')')?;
    let name = call[..open].trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some((name, args.trim()))
}
