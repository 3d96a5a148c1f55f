//! Deferred node invocations.
//!
//! A [`NodeCall`] pairs a node type with a parameter bag. Attributes read
//! through it are evaluated lazily and memoized in an environment the call
//! owns, so reading the same attribute twice through one call evaluates it
//! once. Amending a call produces a new call with a fresh environment.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::env::{Env, Params};
use crate::errors::{type_mismatch, EvalError, EvalResult};
use crate::grok::grok_runtime_exception;
use crate::interpreter::eval_attr;
use crate::module::NodeRef;
use crate::value::{Map, Value};

pub struct NodeCall {
    node: NodeRef,
    params: Params,
    env: Mutex<Option<Env>>,
}

impl NodeCall {
    pub fn new(node: NodeRef, params: Params) -> Self {
        Self {
            node,
            params,
            env: Mutex::new(None),
        }
    }

    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Evaluate one attribute, memoized in this call's environment.
    pub fn evaluate(&self, attr: &str) -> EvalResult {
        if let Some(mut guard) = self.env.try_lock() {
            let env = guard.get_or_insert_with(|| Env::new(self.params.clone()));
            return eval_attr(env, &self.node, attr);
        }
        // Held by another evaluation: compute without sharing the memo.
        tracing::trace!(node = self.node.name(), attr, "environment busy");
        eval_attr(&mut Env::new(self.params.clone()), &self.node, attr)
    }

    /// `call % [names]`: evaluate every named attribute into a mapping,
    /// failing on the first error.
    pub fn bulk_strict(&self, attrs: &Value) -> EvalResult {
        let Value::List(names) = attrs else {
            return Err(type_mismatch("%", attrs, None));
        };
        let mut out = Map::with_capacity(names.len());
        for name in names.iter() {
            let Value::Str(attr) = name else {
                return Err(type_mismatch("%", name, None));
            };
            out.insert(name.clone(), self.evaluate(attr)?);
        }
        Ok(Value::map(out))
    }

    /// `call / names`: like [`bulk_strict`](Self::bulk_strict) but a failing
    /// attribute yields its translated error instead of aborting the rest.
    /// A single string evaluates one attribute.
    pub fn bulk_safe(&self, attrs: &Value) -> Value {
        let safe = |result: EvalResult| {
            result.unwrap_or_else(|err| grok_runtime_exception(&err).to_value())
        };
        match attrs {
            Value::Str(attr) => safe(self.evaluate(attr)),
            Value::List(names) => Value::map(
                names
                    .iter()
                    .map(|name| {
                        let result = match name {
                            Value::Str(attr) => self.evaluate(attr),
                            other => Err(type_mismatch("/", other, None)),
                        };
                        (name.clone(), safe(result))
                    })
                    .collect(),
            ),
            other => safe(Err(type_mismatch("/", other, None))),
        }
    }

    /// `call + {k: v}`: a new call on the same node with merged parameters.
    #[must_use]
    pub fn amend(&self, params: &Params) -> NodeCall {
        let mut merged = self.params.clone();
        merged.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        NodeCall::new(self.node.clone(), merged)
    }

    /// Evaluate `attrs` into a name-to-value mapping.
    pub fn eval_to_hash(&self, attrs: &[&str]) -> Result<Map, EvalError> {
        attrs
            .iter()
            .map(|attr| Ok((Value::str(attr), self.evaluate(attr)?)))
            .collect()
    }
}

/// Build the node call for `target(params)` evaluated inside `current`.
pub(crate) fn make_call(target: Value, params: Params, current: &NodeRef) -> EvalResult {
    let call = match target {
        Value::NodeCall(call) => call.amend(&params),
        Value::Node(node) => NodeCall::new(node, params),
        Value::Nil => NodeCall::new(current.clone(), params),
        other => return Err(type_mismatch("()", &other, None)),
    };
    Ok(Value::NodeCall(Arc::new(call)))
}

impl fmt::Display for NodeCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.node.name())?;
        for (i, (k, v)) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}: {}", v.inspect())?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for NodeCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeCall")
            .field("node", &self.node)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
