//! Method matcher registry.
//!
//! Every method call on a host value or built-in value is checked against a
//! [`Whitelist`] before it runs. A method is reachable only if a matcher is
//! registered under its name, one of the matcher's receiver rules covers the
//! receiver's type, and the arguments satisfy that rule.
//!
//! A process-wide registry is installed lazily with the builtin rules and can
//! be replaced with [`set_global`]. Engines may carry their own registry,
//! which takes precedence over the global one.

mod defaults;
mod matcher;

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

pub use matcher::{ArgSpec, MethodMatcher};

#[derive(Clone, Debug)]
pub struct Whitelist {
    matchers: FxHashMap<String, MethodMatcher>,
}

impl Whitelist {
    /// A registry that permits nothing.
    pub fn empty() -> Self {
        Self {
            matchers: FxHashMap::default(),
        }
    }

    /// Register `name`, letting `define` declare its receiver rules.
    ///
    /// Re-registering a name replaces the earlier matcher.
    pub fn add_method(
        &mut self,
        name: &str,
        define: impl FnOnce(&mut MethodMatcher),
    ) -> &mut Self {
        let mut matcher = MethodMatcher::new(name);
        define(&mut matcher);
        self.matchers.insert(name.to_string(), matcher);
        self
    }

    /// Register `name` as a redirect to the method `target`.
    pub fn add_method_alias(&mut self, name: &str, target: &str) -> &mut Self {
        self.matchers
            .insert(name.to_string(), MethodMatcher::alias(name, target));
        self
    }

    pub fn matcher(&self, name: &str) -> Option<&MethodMatcher> {
        self.matchers.get(name)
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

impl Default for Whitelist {
    /// The builtin rule set covering methods on built-in values.
    fn default() -> Self {
        let mut whitelist = Self::empty();
        defaults::register_builtins(&mut whitelist);
        whitelist
    }
}

static GLOBAL: RwLock<Option<Arc<Whitelist>>> = RwLock::new(None);

/// The process-wide registry, installing the builtin rules on first use.
pub fn global() -> Arc<Whitelist> {
    if let Some(whitelist) = GLOBAL.read().as_ref() {
        return Arc::clone(whitelist);
    }
    let mut slot = GLOBAL.write();
    Arc::clone(slot.get_or_insert_with(|| Arc::new(Whitelist::default())))
}

/// Replace the process-wide registry.
pub fn set_global(whitelist: Whitelist) {
    *GLOBAL.write() = Some(Arc::new(whitelist));
}
