//! Translation of runtime errors into plain data.

use crate::errors::{EvalError, Frame};
use crate::value::Value;

/// A runtime error reduced to its message and backtrace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrokedError {
    pub error: String,
    /// Outermost first.
    pub backtrace: Vec<Frame>,
}

impl GrokedError {
    /// `{"error": message, "backtrace": [[module, line, attr], ...]}`
    pub fn to_value(&self) -> Value {
        let backtrace = self
            .backtrace
            .iter()
            .map(|frame| {
                Value::list(vec![
                    Value::str(&frame.module),
                    Value::Int(i64::from(frame.line)),
                    Value::str(&frame.attr),
                ])
            })
            .collect();
        Value::map_from([
            ("error", Value::str(&self.error)),
            ("backtrace", Value::list(backtrace)),
        ])
    }
}

/// Reduce `err` to its message and the attribute frames it unwound through.
pub fn grok_runtime_exception(err: &EvalError) -> GrokedError {
    GrokedError {
        error: err.message.clone(),
        backtrace: err.backtrace().cloned().collect(),
    }
}
