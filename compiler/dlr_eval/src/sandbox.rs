//! Policed method calls.
//!
//! Instance methods run only when the matcher registry permits them. Class
//! functions run only when the class declares a signature whose arity
//! accepts the call.

use crate::builtins;
use crate::errors::{bad_call, host_error, no_such_method, EvalResult};
use crate::host::HostClass;
use crate::value::Value;
use crate::whitelist::Whitelist;

/// Aliases may chain; a longer chain is treated as a loop.
const MAX_ALIAS_DEPTH: usize = 8;

/// Call `method` on `receiver`.
pub(crate) fn instance_call(
    whitelist: &Whitelist,
    receiver: &Value,
    method: &str,
    args: &[Value],
) -> EvalResult {
    match receiver {
        Value::Class(class) => return class_call(&**class, method, args),
        Value::Node(node) => {
            return Err(bad_call(node.name(), format!("nodes have no function {method}")));
        }
        _ => {}
    }

    let mut method: &str = method;
    for _ in 0..MAX_ALIAS_DEPTH {
        let matcher = whitelist
            .matcher(method)
            .ok_or_else(|| no_such_method(method, None))?;
        if let Some(target) = matcher.match_to() {
            method = target;
            continue;
        }
        matcher.check(receiver, args)?;

        tracing::trace!(method, receiver = receiver.type_name(), "sandboxed call");
        return match receiver {
            Value::Foreign(object) => object
                .call_method(method, args)
                .map_err(|err| host_error(err.message)),
            _ => builtins::call(receiver, method, args),
        };
    }
    Err(no_such_method(method, None))
}

/// Call class-level `function` on `class`.
pub(crate) fn class_call(class: &dyn HostClass, function: &str, args: &[Value]) -> EvalResult {
    let arity = class
        .signature(function)
        .ok_or_else(|| bad_call(class.name(), format!("no function {function}")))?;
    if !arity.accepts(args.len()) {
        return Err(bad_call(
            class.name(),
            format!("{function} takes {arity} args, got {}", args.len()),
        ));
    }
    class
        .call(function, args)
        .map_err(|err| host_error(err.message))
}
