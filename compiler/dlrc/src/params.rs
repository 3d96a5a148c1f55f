//! Parameter bags from `name=value` command line arguments.

use dlr_eval::{Params, Value};

/// Interpret a command line literal: integers, floats, `true`, `false` and
/// `nil` keep their type, anything else is a string.
pub fn parse_value(text: &str) -> Value {
    match text {
        "nil" => Value::Nil,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => {
            if let Ok(v) = text.parse::<i64>() {
                Value::Int(v)
            } else if let Some(v) = text.parse::<f64>().ok().filter(|v| v.is_finite()) {
                Value::Float(v)
            } else {
                Value::str(text)
            }
        }
    }
}

/// Build a parameter bag from `name=value` pairs.
pub fn parse_params<S: AsRef<str>>(args: &[S]) -> Result<Params, String> {
    let mut params = Params::new();
    for arg in args {
        let arg = arg.as_ref();
        let Some((name, value)) = arg.split_once('=') else {
            return Err(format!("expected name=value, got '{arg}'"));
        };
        if name.is_empty() {
            return Err(format!("missing parameter name in '{arg}'"));
        }
        params.insert(Value::str(name), parse_value(value));
    }
    Ok(params)
}
