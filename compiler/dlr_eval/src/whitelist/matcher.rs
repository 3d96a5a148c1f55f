//! Receiver and argument rules for a single method name.

use std::fmt;

use crate::errors::{bad_argument, no_such_method, EvalError};
use crate::value::Value;

/// Accepted types for one positional argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArgSpec {
    types: Vec<String>,
    nilable: bool,
}

impl ArgSpec {
    pub fn of(types: &[&str]) -> Self {
        Self {
            types: types.iter().map(|t| (*t).to_string()).collect(),
            nilable: false,
        }
    }

    /// Any non-nil value.
    pub fn any() -> Self {
        Self::of(&["Object"])
    }

    /// Also accept `nil`, which allows the argument to be omitted when it is
    /// trailing.
    #[must_use]
    pub fn or_nil(mut self) -> Self {
        self.nilable = true;
        self
    }

    fn accepts(&self, value: &Value) -> bool {
        if value.is_nil() {
            return self.nilable;
        }
        self.types.iter().any(|ty| value.is_a(ty))
    }
}

impl fmt::Display for ArgSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, ty) in self.types.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(ty)?;
        }
        if self.nilable {
            f.write_str(", nil")?;
        }
        f.write_str("]")
    }
}

#[derive(Clone, Debug)]
struct ReceiverRule {
    receiver: String,
    args: Vec<ArgSpec>,
}

/// Rules for calling one method name.
#[derive(Clone, Debug)]
pub struct MethodMatcher {
    name: String,
    match_to: Option<String>,
    rules: Vec<ReceiverRule>,
}

impl MethodMatcher {
    pub(super) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            match_to: None,
            rules: Vec::new(),
        }
    }

    pub(super) fn alias(name: &str, target: &str) -> Self {
        Self {
            name: name.to_string(),
            match_to: Some(target.to_string()),
            rules: Vec::new(),
        }
    }

    /// Permit calls on values of type `receiver` (or a subtype) with the
    /// given positional argument rules. Rules are tried in declaration order.
    pub fn called_on(&mut self, receiver: &str, args: Vec<ArgSpec>) -> &mut Self {
        self.rules.push(ReceiverRule {
            receiver: receiver.to_string(),
            args,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Method this name redirects to, for aliases.
    pub fn match_to(&self) -> Option<&str> {
        self.match_to.as_deref()
    }

    /// Validate a call of this method on `receiver` with `args`.
    pub fn check(&self, receiver: &Value, args: &[Value]) -> Result<(), EvalError> {
        let name = &self.name;
        let rule = self
            .rules
            .iter()
            .find(|rule| receiver.is_a(&rule.receiver))
            .ok_or_else(|| no_such_method(name, Some(receiver.type_name())))?;

        if args.len() > rule.args.len() {
            return Err(bad_argument(name, format!("too many args to {name}")));
        }

        let nil = Value::Nil;
        for (i, spec) in rule.args.iter().enumerate() {
            let arg = args.get(i).unwrap_or(&nil);
            if !spec.accepts(arg) {
                return Err(bad_argument(
                    name,
                    format!("bad arg {i}, method {name}: {arg}/{} {spec}", arg.type_name()),
                ));
            }
        }
        Ok(())
    }
}
