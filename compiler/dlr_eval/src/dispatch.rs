//! Attribute access and indexing on arbitrary receivers.
//!
//! Receivers fall into a closed set of categories:
//! - `nil` yields `nil` for any access.
//! - Mappings look up the key, trying the symbol form of a string key
//!   second. Missing keys yield `nil`.
//! - Node calls and node types evaluate the named attribute.
//! - Host records read the named field.
//! - Everything else is treated as a zero-argument method call and goes
//!   through the sandbox.

use crate::builtins::normalize_index;
use crate::env::Env;
use crate::errors::{invalid_get_attribute, invalid_index, EvalError, EvalResult};
use crate::interpreter::eval_attr;
use crate::module::Module;
use crate::sandbox;
use crate::value::{Map, StrKey, Value};

/// Look up `key`, falling back to the symbol form of a string key.
pub(crate) fn map_get<'m>(map: &'m Map, key: &Value) -> Option<&'m Value> {
    map.get(key).or_else(|| match key {
        Value::Str(s) => map.get(&Value::Symbol(s.clone())),
        _ => None,
    })
}

/// `receiver.attr`
pub(crate) fn get_attr(env: &mut Env, home: &Module, receiver: &Value, attr: &str) -> EvalResult {
    match receiver {
        Value::Nil => Ok(Value::Nil),
        Value::Map(entries) => Ok(entries
            .get(&StrKey(attr))
            .or_else(|| entries.get(&Value::symbol(attr)))
            .cloned()
            .unwrap_or(Value::Nil)),
        Value::NodeCall(call) => call.evaluate(attr),
        Value::Node(node) => eval_attr(env, node, attr),
        Value::Record(record) => Ok(record.get(attr).cloned().unwrap_or(Value::Nil)),
        _ => sandbox::instance_call(&home.whitelist(), receiver, attr, &[])
            .map_err(|err| invalid_get_attribute(attr, receiver.type_name(), err.message)),
    }
}

/// `receiver[args]`
pub(crate) fn index(env: &mut Env, home: &Module, receiver: &Value, args: &[Value]) -> EvalResult {
    match receiver {
        Value::Nil => Ok(Value::Nil),
        Value::Map(entries) => {
            let key = single_arg(receiver, args)?;
            Ok(map_get(entries, key).cloned().unwrap_or(Value::Nil))
        }
        Value::NodeCall(_) | Value::Node(_) | Value::Record(_) => match single_arg(receiver, args)? {
            Value::Str(name) => get_attr(env, home, receiver, name),
            other => Err(invalid_index(
                receiver.type_name(),
                format!("attribute name must be a String, got {}", other.type_name()),
            )),
        },
        Value::List(items) => Ok(match select(receiver, args, items.len())? {
            Selection::One(i) => items[i].clone(),
            Selection::Range(start, end) => Value::list(items[start..end].to_vec()),
            Selection::Nothing => Value::Nil,
        }),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            Ok(match select(receiver, args, chars.len())? {
                Selection::One(i) => Value::from(chars[i].to_string()),
                Selection::Range(start, end) => Value::from(chars[start..end].iter().collect::<String>()),
                Selection::Nothing => Value::Nil,
            })
        }
        _ => Err(invalid_index(receiver.type_name(), "value cannot be indexed")),
    }
}

fn single_arg<'v>(receiver: &Value, args: &'v [Value]) -> Result<&'v Value, EvalError> {
    match args {
        [key] => Ok(key),
        _ => Err(invalid_index(
            receiver.type_name(),
            format!("expected 1 argument, got {}", args.len()),
        )),
    }
}

enum Selection {
    One(usize),
    /// Half-open, already clamped to the sequence length.
    Range(usize, usize),
    Nothing,
}

/// Interpret `[i]` or `[start, count]` against a sequence of `len` items.
/// Negative positions count from the end.
fn select(receiver: &Value, args: &[Value], len: usize) -> Result<Selection, EvalError> {
    match args {
        [Value::Int(i)] => Ok(normalize_index(*i, len).map_or(Selection::Nothing, Selection::One)),
        [Value::Int(start), Value::Int(count)] => {
            let total = i64::try_from(len).unwrap_or(i64::MAX);
            let start = if *start < 0 { start + total } else { *start };
            if start < 0 || start > total || *count < 0 {
                return Ok(Selection::Nothing);
            }
            let end = start.saturating_add(*count).min(total);
            match (usize::try_from(start), usize::try_from(end)) {
                (Ok(start), Ok(end)) => Ok(Selection::Range(start, end)),
                _ => Ok(Selection::Nothing),
            }
        }
        _ => Err(invalid_index(
            receiver.type_name(),
            "expected 1 or 2 Integer arguments",
        )),
    }
}

#[cfg(test)]
mod tests;
