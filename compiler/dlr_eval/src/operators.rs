//! Binary and unary operator implementations.
//!
//! Direct enum dispatch over the operand pair. Integer arithmetic is checked;
//! mixing an integer with a float promotes to float. Integer division and
//! remainder round toward negative infinity. Short-circuit operators never
//! reach this module; the interpreter handles them before evaluating the
//! right operand.

use std::cmp::Ordering;
use std::sync::Arc;

use dlr_ir::{BinaryOp, UnaryOp};

use crate::errors::{division_by_zero, integer_overflow, type_mismatch, EvalResult, EvalError};
use crate::value::{Set, Value};

#[inline]
fn checked_arith(result: Option<i64>, op_name: &'static str) -> EvalResult {
    result.map(Value::Int).ok_or_else(|| integer_overflow(op_name))
}

fn floor_div(a: i64, b: i64) -> EvalResult {
    if b == 0 {
        return Err(division_by_zero());
    }
    let q = a.checked_div(b).ok_or_else(|| integer_overflow("division"))?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Ok(Value::Int(q - 1))
    } else {
        Ok(Value::Int(q))
    }
}

fn floor_mod(a: i64, b: i64) -> EvalResult {
    if b == 0 {
        return Err(division_by_zero());
    }
    let r = a.checked_rem(b).ok_or_else(|| integer_overflow("remainder"))?;
    if r != 0 && ((r < 0) != (b < 0)) {
        Ok(Value::Int(r + b))
    } else {
        Ok(Value::Int(r))
    }
}

/// Evaluate a non-short-circuit binary operator.
pub fn evaluate_binary(left: &Value, right: &Value, op: BinaryOp) -> EvalResult {
    match op {
        BinaryOp::Eq => return Ok(Value::Bool(values_equal(left, right))),
        BinaryOp::NotEq => return Ok(Value::Bool(!values_equal(left, right))),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            let ordering = compare(left, right, op.as_symbol())?;
            let result = match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::LtEq => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            return Ok(Value::Bool(result));
        }
        _ => {}
    }

    match (left, right) {
        (Value::Int(a), Value::Int(b)) => eval_int_binary(*a, *b, op),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            match (left.as_float(), right.as_float()) {
                (Some(a), Some(b)) => eval_float_binary(a, b, op, left, right),
                _ => Err(type_mismatch(op.as_symbol(), left, Some(right))),
            }
        }
        (Value::Str(a), Value::Str(b)) if op == BinaryOp::Add => {
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(a);
            joined.push_str(b);
            Ok(Value::from(joined))
        }
        (Value::Str(a), Value::Int(n)) if op == BinaryOp::Mul => {
            let n = repeat_count(*n, a.len(), left, right)?;
            Ok(Value::from(a.repeat(n)))
        }
        (Value::List(a), Value::List(b)) => eval_list_binary(a, b, op, left, right),
        (Value::List(a), Value::Int(n)) if op == BinaryOp::Mul => {
            let n = repeat_count(*n, a.len(), left, right)?;
            let mut out = Vec::with_capacity(a.len() * n);
            for _ in 0..n {
                out.extend(a.iter().cloned());
            }
            Ok(Value::list(out))
        }
        (Value::Set(a), Value::Set(b)) => eval_set_binary(a, b, op, left, right),
        _ => Err(type_mismatch(op.as_symbol(), left, Some(right))),
    }
}

/// Largest string (in bytes) or list (in elements) `*` may produce.
const MAX_REPEAT_LEN: usize = 1 << 24;

/// Validate `n` for repeating a sequence of `len` units.
fn repeat_count(n: i64, len: usize, left: &Value, right: &Value) -> Result<usize, EvalError> {
    let n = usize::try_from(n).map_err(|_| type_mismatch("*", left, Some(right)))?;
    match len.checked_mul(n) {
        Some(0) => Ok(0),
        Some(total) if total <= MAX_REPEAT_LEN => Ok(n),
        _ => Err(integer_overflow("repetition")),
    }
}

fn eval_int_binary(a: i64, b: i64, op: BinaryOp) -> EvalResult {
    match op {
        BinaryOp::Add => checked_arith(a.checked_add(b), "addition"),
        BinaryOp::Sub => checked_arith(a.checked_sub(b), "subtraction"),
        BinaryOp::Mul => checked_arith(a.checked_mul(b), "multiplication"),
        BinaryOp::Div => floor_div(a, b),
        BinaryOp::Mod => floor_mod(a, b),
        _ => Err(type_mismatch(op.as_symbol(), &Value::Int(a), Some(&Value::Int(b)))),
    }
}

fn eval_float_binary(a: f64, b: f64, op: BinaryOp, left: &Value, right: &Value) -> EvalResult {
    match op {
        BinaryOp::Add => Ok(Value::Float(a + b)),
        BinaryOp::Sub => Ok(Value::Float(a - b)),
        BinaryOp::Mul => Ok(Value::Float(a * b)),
        BinaryOp::Div => Ok(Value::Float(a / b)),
        BinaryOp::Mod => Ok(Value::Float(a - b * (a / b).floor())),
        _ => Err(type_mismatch(op.as_symbol(), left, Some(right))),
    }
}

fn eval_list_binary(
    a: &Arc<Vec<Value>>,
    b: &Arc<Vec<Value>>,
    op: BinaryOp,
    left: &Value,
    right: &Value,
) -> EvalResult {
    match op {
        BinaryOp::Add => {
            let mut out = Vec::with_capacity(a.len() + b.len());
            out.extend(a.iter().cloned());
            out.extend(b.iter().cloned());
            Ok(Value::list(out))
        }
        BinaryOp::Sub => Ok(Value::list(
            a.iter()
                .filter(|item| !b.iter().any(|other| values_equal(item, other)))
                .cloned()
                .collect(),
        )),
        _ => Err(type_mismatch(op.as_symbol(), left, Some(right))),
    }
}

fn eval_set_binary(a: &Arc<Set>, b: &Arc<Set>, op: BinaryOp, left: &Value, right: &Value) -> EvalResult {
    match op {
        BinaryOp::Add => Ok(Value::set(a.union(b).cloned())),
        BinaryOp::Sub => Ok(Value::set(a.difference(b).cloned())),
        _ => Err(type_mismatch(op.as_symbol(), left, Some(right))),
    }
}

/// Equality as seen by `==`: numbers compare by value across integer and
/// float, everything else structurally.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(_), Value::Float(_)) | (Value::Float(_), Value::Int(_)) => {
            left.as_float() == right.as_float()
        }
        (Value::Float(a), Value::Float(b)) => a == b,
        _ => left == right,
    }
}

/// Order two values. Only numbers and strings are ordered.
pub fn compare(left: &Value, right: &Value, op_name: &str) -> Result<Ordering, EvalError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => left
            .as_float()
            .zip(right.as_float())
            .and_then(|(a, b)| a.partial_cmp(&b))
            .ok_or_else(|| type_mismatch(op_name, left, Some(right))),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        _ => Err(type_mismatch(op_name, left, Some(right))),
    }
}

pub fn evaluate_unary(operand: &Value, op: UnaryOp) -> EvalResult {
    match (op, operand) {
        (UnaryOp::Not, v) => Ok(Value::Bool(!v.is_truthy())),
        (UnaryOp::Neg, Value::Int(v)) => checked_arith(v.checked_neg(), "negation"),
        (UnaryOp::Neg, Value::Float(v)) => Ok(Value::Float(-v)),
        (UnaryOp::Neg, v) => Err(type_mismatch(op.as_symbol(), v, None)),
    }
}
