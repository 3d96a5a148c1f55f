//! Methods on built-in values.
//!
//! Only reached through the sandbox after the matcher registry accepted the
//! call, so argument types here are already known to match the registered
//! rules. Anything unexpected still reports an error instead of panicking.

use std::cmp::Ordering;

use indexmap::IndexSet;

use crate::dispatch::map_get;
use crate::errors::{
    host_error, integer_overflow, invalid_index, no_such_method, EvalError, EvalResult,
};
use crate::operators::{compare, evaluate_binary, values_equal};
use crate::value::Value;
use dlr_ir::BinaryOp;

#[expect(
    clippy::cast_possible_wrap,
    reason = "collection lengths fit in i64"
)]
fn len_value(n: usize) -> Value {
    Value::Int(n as i64)
}

fn float_to_int(f: f64) -> EvalResult {
    if !f.is_finite() {
        return Err(host_error(format!("cannot convert {f} to an integer")));
    }
    let truncated = f.trunc();
    let bound = 2.0_f64.powi(63);
    if truncated >= bound || truncated < -bound {
        return Err(host_error(format!("float {f} out of range for an integer")));
    }
    format!("{truncated:.0}")
        .parse::<i64>()
        .map(Value::Int)
        .map_err(|_| host_error(format!("float {f} out of range for an integer")))
}

/// Leading integer of a string, or 0.
fn parse_int_prefix(s: &str) -> i64 {
    let s = s.trim_start();
    let end = s
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+')))
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);
    s[..end].parse().unwrap_or(0)
}

/// Leading float of a string, or 0.0.
fn parse_float_prefix(s: &str) -> f64 {
    let s = s.trim();
    (1..=s.len())
        .rev()
        .filter(|end| s.is_char_boundary(*end))
        .find_map(|end| s[..end].parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn round_to(f: f64, digits: i64) -> f64 {
    let digits = i32::try_from(digits.clamp(-300, 300)).unwrap_or(0);
    let scale = 10f64.powi(digits);
    (f * scale).round() / scale
}

fn sorted(items: &[Value]) -> Result<Vec<Value>, EvalError> {
    let mut out = items.to_vec();
    let mut failure = None;
    out.sort_by(|a, b| {
        compare(a, b, "sort").unwrap_or_else(|err| {
            failure.get_or_insert(err);
            Ordering::Equal
        })
    });
    match failure {
        Some(err) => Err(err),
        None => Ok(out),
    }
}

fn extreme<'a>(
    items: impl Iterator<Item = &'a Value>,
    keep: Ordering,
    name: &str,
) -> EvalResult {
    let mut best: Option<&Value> = None;
    for item in items {
        let replace = match best {
            None => true,
            Some(current) => compare(item, current, name)? == keep,
        };
        if replace {
            best = Some(item);
        }
    }
    Ok(best.cloned().unwrap_or(Value::Nil))
}

fn flatten_into(items: &[Value], out: &mut Vec<Value>) {
    for item in items {
        match item {
            Value::List(inner) => flatten_into(inner, out),
            other => out.push(other.clone()),
        }
    }
}

/// Resolve a possibly negative index against a length.
pub(crate) fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let index = if index < 0 { index + len } else { index };
    if (0..len).contains(&index) {
        usize::try_from(index).ok()
    } else {
        None
    }
}

/// Invoke a registered method on a built-in value.
pub(crate) fn call(receiver: &Value, method: &str, args: &[Value]) -> EvalResult {
    let arg = |i: usize| args.get(i).unwrap_or(&Value::Nil);

    let result = match (method, receiver) {
        ("length", Value::Str(s)) => len_value(s.chars().count()),
        ("length", Value::List(items)) => len_value(items.len()),
        ("length", Value::Set(items)) => len_value(items.len()),
        ("length", Value::Map(entries)) => len_value(entries.len()),

        ("is_empty", Value::Str(s)) => Value::Bool(s.is_empty()),
        ("is_empty", Value::List(items)) => Value::Bool(items.is_empty()),
        ("is_empty", Value::Set(items)) => Value::Bool(items.is_empty()),
        ("is_empty", Value::Map(entries)) => Value::Bool(entries.is_empty()),

        ("to_s", v) => Value::from(v.to_string()),

        ("to_i", Value::Int(v)) => Value::Int(*v),
        ("to_i", Value::Float(f)) => float_to_int(*f)?,
        ("to_i", Value::Str(s)) => Value::Int(parse_int_prefix(s)),
        ("to_i", Value::Nil) => Value::Int(0),

        ("to_f", Value::Str(s)) => Value::Float(parse_float_prefix(s)),
        ("to_f", Value::Nil) => Value::Float(0.0),
        ("to_f", v @ (Value::Int(_) | Value::Float(_))) => {
            Value::Float(v.as_float().unwrap_or_default())
        }

        ("round", Value::Int(v)) => Value::Int(*v),
        ("round", Value::Float(f)) => match args.first() {
            Some(Value::Int(digits)) => Value::Float(round_to(*f, *digits)),
            _ => float_to_int(f.round())?,
        },
        ("floor", Value::Int(v)) | ("ceil", Value::Int(v)) => Value::Int(*v),
        ("floor", Value::Float(f)) => float_to_int(f.floor())?,
        ("ceil", Value::Float(f)) => float_to_int(f.ceil())?,
        ("abs", Value::Int(v)) => {
            Value::Int(v.checked_abs().ok_or_else(|| integer_overflow("abs"))?)
        }
        ("abs", Value::Float(f)) => Value::Float(f.abs()),

        ("upcase", Value::Str(s)) => Value::from(s.to_uppercase()),
        ("downcase", Value::Str(s)) => Value::from(s.to_lowercase()),
        ("strip", Value::Str(s)) => Value::str(s.trim()),
        ("split", Value::Str(s)) => match arg(0) {
            Value::Str(sep) if sep.is_empty() => {
                Value::list(s.chars().map(|c| Value::from(c.to_string())).collect())
            }
            Value::Str(sep) => Value::list(s.split(&**sep).map(Value::str).collect()),
            _ => Value::list(s.split_whitespace().map(Value::str).collect()),
        },
        ("starts_with", Value::Str(s)) => {
            Value::Bool(arg(0).as_str().is_some_and(|p| s.starts_with(p)))
        }
        ("ends_with", Value::Str(s)) => {
            Value::Bool(arg(0).as_str().is_some_and(|p| s.ends_with(p)))
        }

        ("contains", Value::Str(s)) => {
            Value::Bool(arg(0).as_str().is_some_and(|p| s.contains(p)))
        }
        ("contains", Value::List(items)) => {
            Value::Bool(items.iter().any(|item| values_equal(item, arg(0))))
        }
        ("contains", Value::Set(items)) => Value::Bool(items.contains(arg(0))),
        ("contains", Value::Map(entries)) => Value::Bool(entries.contains_key(arg(0))),

        ("keys", Value::Map(entries)) => Value::list(entries.keys().cloned().collect()),
        ("values", Value::Map(entries)) => Value::list(entries.values().cloned().collect()),
        ("merge", Value::Map(entries)) => match arg(0) {
            Value::Map(other) => {
                let mut merged = (**entries).clone();
                merged.extend(other.iter().map(|(k, v)| (k.clone(), v.clone())));
                Value::map(merged)
            }
            other => return Err(host_error(format!("cannot merge {}", other.type_name()))),
        },
        ("fetch", Value::Map(entries)) => match map_get(entries, arg(0)) {
            Some(v) => v.clone(),
            None if args.len() > 1 => arg(1).clone(),
            None => return Err(invalid_index("Map", format!("key not found: {}", arg(0).inspect()))),
        },
        ("fetch", Value::List(items)) => {
            let found = arg(0)
                .as_int()
                .and_then(|i| normalize_index(i, items.len()))
                .and_then(|i| items.get(i));
            match found {
                Some(v) => v.clone(),
                None if args.len() > 1 => arg(1).clone(),
                None => return Err(invalid_index("List", format!("index {} out of range", arg(0)))),
            }
        }

        ("first", Value::List(items)) => items.first().cloned().unwrap_or(Value::Nil),
        ("last", Value::List(items)) => items.last().cloned().unwrap_or(Value::Nil),
        ("reverse", Value::List(items)) => Value::list(items.iter().rev().cloned().collect()),
        ("reverse", Value::Str(s)) => Value::from(s.chars().rev().collect::<String>()),
        ("sort", Value::List(items)) => Value::list(sorted(items)?),
        ("uniq", Value::List(items)) => Value::list(
            items
                .iter()
                .cloned()
                .collect::<IndexSet<_>>()
                .into_iter()
                .collect(),
        ),
        ("flatten", Value::List(items)) => {
            let mut out = Vec::with_capacity(items.len());
            flatten_into(items, &mut out);
            Value::list(out)
        }
        ("compact", Value::List(items)) => {
            Value::list(items.iter().filter(|v| !v.is_nil()).cloned().collect())
        }
        ("compact", Value::Map(entries)) => Value::map(
            entries
                .iter()
                .filter(|(_, v)| !v.is_nil())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        ("join", Value::List(items)) => {
            let sep = arg(0).as_str().unwrap_or("");
            let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
            Value::from(parts.join(sep))
        }

        ("sum", Value::List(items)) => sum(items.iter())?,
        ("sum", Value::Set(items)) => sum(items.iter())?,
        ("min", Value::List(items)) => extreme(items.iter(), Ordering::Less, "min")?,
        ("min", Value::Set(items)) => extreme(items.iter(), Ordering::Less, "min")?,
        ("max", Value::List(items)) => extreme(items.iter(), Ordering::Greater, "max")?,
        ("max", Value::Set(items)) => extreme(items.iter(), Ordering::Greater, "max")?,

        ("to_a", Value::List(_)) => receiver.clone(),
        ("to_a", Value::Set(items)) => Value::list(items.iter().cloned().collect()),
        ("to_a", Value::Map(entries)) => Value::list(
            entries
                .iter()
                .map(|(k, v)| Value::list(vec![k.clone(), v.clone()]))
                .collect(),
        ),

        _ => return Err(no_such_method(method, Some(receiver.type_name()))),
    };
    Ok(result)
}

fn sum<'a>(items: impl Iterator<Item = &'a Value>) -> EvalResult {
    items.fold(Ok(Value::Int(0)), |acc, item| {
        evaluate_binary(&acc?, item, BinaryOp::Add)
    })
}
