//! Contracts between the runtime and host-provided code.
//!
//! Host code plugs in at three seams:
//! - [`HostClass`]: class-level functions callable as `Class.fn(args)`, with
//!   a declared arity that the compiler checks up front.
//! - [`HostObject`]: opaque values whose methods are reachable only through
//!   the matcher registry.
//! - [`Record`]: plain structured data whose fields read with `.field`.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::value::Value;

/// Failure reported by host code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostError {
    pub message: String,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HostError {}

/// Accepted argument counts for a class function.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    /// `None` means variadic.
    pub max: Option<usize>,
}

impl Arity {
    pub const fn exact(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    pub const fn range(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    pub const fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    pub fn accepts(self, count: usize) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{max}"),
            Some(max) => write!(f, "{}..{max}", self.min),
            None => write!(f, "{}+", self.min),
        }
    }
}

/// A host class exposing class-level functions.
pub trait HostClass: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Declared arity of `function`, or `None` if the class has no such
    /// callable function.
    fn signature(&self, function: &str) -> Option<Arity>;

    fn call(&self, function: &str, args: &[Value]) -> Result<Value, HostError>;
}

/// An opaque host value.
pub trait HostObject: Send + Sync + fmt::Debug {
    /// Type names from most to least specific, without the implicit `Object`.
    fn type_chain(&self) -> &[&'static str];

    /// Invoke `method`. Only reached after the matcher registry accepted the
    /// call.
    fn call_method(&self, method: &str, args: &[Value]) -> Result<Value, HostError>;
}

/// Structured host data with named fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub type_name: Arc<str>,
    pub fields: IndexMap<Arc<str>, Value>,
}

impl Record {
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: Arc::from(type_name),
            fields: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(Arc::from(field), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<{}", self.type_name)?;
        for (name, value) in &self.fields {
            write!(f, " {name}={}", value.inspect())?;
        }
        f.write_str(">")
    }
}

type ClassFn = Box<dyn Fn(&[Value]) -> Result<Value, HostError> + Send + Sync>;

/// A [`HostClass`] assembled from closures.
///
/// ```text
/// let math = FnClass::new("Math")
///     .function("max", Arity::at_least(1), |args| ...);
/// ```
pub struct FnClass {
    name: String,
    functions: FxHashMap<String, (Arity, ClassFn)>,
}

impl FnClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn function<F>(mut self, name: &str, arity: Arity, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, HostError> + Send + Sync + 'static,
    {
        self.functions.insert(name.to_string(), (arity, Box::new(f)));
        self
    }
}

impl fmt::Debug for FnClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("FnClass")
            .field("name", &self.name)
            .field("functions", &names)
            .finish()
    }
}

impl HostClass for FnClass {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self, function: &str) -> Option<Arity> {
        self.functions.get(function).map(|(arity, _)| *arity)
    }

    fn call(&self, function: &str, args: &[Value]) -> Result<Value, HostError> {
        match self.functions.get(function) {
            Some((_, f)) => f(args),
            None => Err(HostError::new(format!(
                "{} has no function {function}",
                self.name
            ))),
        }
    }
}

/// Host classes visible to a module by name.
#[derive(Clone, Debug, Default)]
pub struct ClassRegistry {
    classes: FxHashMap<String, Arc<dyn HostClass>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, class: Arc<dyn HostClass>) {
        self.classes.insert(class.name().to_string(), class);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn HostClass>> {
        self.classes.get(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
