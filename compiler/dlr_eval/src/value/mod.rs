//! Runtime values.
//!
//! Scalars are stored inline; every heap value is behind an `Arc` so values
//! are cheap to clone and can cross threads. The closed set of receiver
//! categories the runtime dispatcher distinguishes is exactly the set of
//! variants here: `Nil`, mappings, node calls, node types, host records, and
//! everything else (opaque host objects and built-in scalars/collections),
//! which goes through the matcher registry.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::{Equivalent, IndexMap, IndexSet};

use crate::host::{HostClass, HostObject, Record};
use crate::module::NodeRef;
use crate::node_call::NodeCall;

/// Ordered mapping from values to values.
pub type Map = IndexMap<Value, Value>;

/// Ordered set of values.
pub type Set = IndexSet<Value>;

#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    /// Interned host-side key, distinct from a string with the same text.
    Symbol(Arc<str>),
    List(Arc<Vec<Value>>),
    Set(Arc<Set>),
    Map(Arc<Map>),
    /// Deferred invocation of a node.
    NodeCall(Arc<NodeCall>),
    /// A node type used as a value (`A` in `A.b`).
    Node(NodeRef),
    /// A host class exposing class-level functions.
    Class(Arc<dyn HostClass>),
    /// Structured host record with named fields.
    Record(Arc<Record>),
    /// Opaque host object; all method calls are policed by the matcher registry.
    Foreign(Arc<dyn HostObject>),
}

impl Value {
    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    pub fn symbol(s: impl AsRef<str>) -> Self {
        Value::Symbol(Arc::from(s.as_ref()))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(items))
    }

    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Set(Arc::new(items.into_iter().collect()))
    }

    pub fn map(entries: Map) -> Self {
        Value::Map(Arc::new(entries))
    }

    /// Build a map with string keys.
    pub fn map_from<K: AsRef<str>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::map(
            entries
                .into_iter()
                .map(|(k, v)| (Value::str(k), v))
                .collect(),
        )
    }

    pub fn record(record: Record) -> Self {
        Value::Record(Arc::new(record))
    }

    pub fn foreign(object: impl HostObject + 'static) -> Self {
        Value::Foreign(Arc::new(object))
    }

    /// `nil` and `false` are falsy; everything else, including `0`, is truthy.
    #[inline]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            #[expect(clippy::cast_precision_loss, reason = "numeric promotion follows float semantics")]
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Most specific type name, used in diagnostics and matcher rules.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Nil => "Nil",
            Value::Bool(_) => "Boolean",
            Value::Int(_) => "Integer",
            Value::Float(_) => "Float",
            Value::Str(_) => "String",
            Value::Symbol(_) => "Symbol",
            Value::List(_) => "List",
            Value::Set(_) => "Set",
            Value::Map(_) => "Map",
            Value::NodeCall(_) => "NodeCall",
            Value::Node(_) => "Node",
            Value::Class(_) => "Class",
            Value::Record(r) => &r.type_name,
            Value::Foreign(o) => o.type_chain().first().copied().unwrap_or("Object"),
        }
    }

    /// Whether this value is an instance of the named type or one of its
    /// ancestors. Every value is an `Object`; integers and floats are
    /// `Numeric`.
    pub fn is_a(&self, ty: &str) -> bool {
        if ty == "Object" || ty == self.type_name() {
            return true;
        }
        match self {
            Value::Int(_) | Value::Float(_) => ty == "Numeric",
            Value::Record(_) => ty == "Record",
            Value::Foreign(o) => o.type_chain().contains(&ty),
            _ => false,
        }
    }

    /// Render like a literal: strings quoted, collections recursive.
    pub fn inspect(&self) -> String {
        match self {
            Value::Str(s) => format!("{:?}", &**s),
            Value::Symbol(s) => format!(":{s}"),
            _ => self.to_string(),
        }
    }
}

/// Key adapter for looking up string-keyed entries without allocating.
#[derive(Copy, Clone, Debug)]
pub(crate) struct StrKey<'a>(pub(crate) &'a str);

impl Hash for StrKey<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(TAG_STR);
        self.0.hash(state);
    }
}

impl Equivalent<Value> for StrKey<'_> {
    fn equivalent(&self, key: &Value) -> bool {
        matches!(key, Value::Str(s) if &**s == self.0)
    }
}

const TAG_NIL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_STR: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_SYMBOL: u8 = 5;
const TAG_LIST: u8 = 6;
const TAG_SET: u8 = 7;
const TAG_MAP: u8 = 8;
const TAG_NODE_CALL: u8 = 9;
const TAG_NODE: u8 = 10;
const TAG_CLASS: u8 = 11;
const TAG_RECORD: u8 = 12;
const TAG_FOREIGN: u8 = 13;

/// Address of an `Arc` payload, ignoring any trait-object metadata.
fn addr<T: ?Sized>(arc: &Arc<T>) -> usize {
    Arc::as_ptr(arc).cast::<()>() as usize
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) | (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::NodeCall(a), Value::NodeCall(b)) => Arc::ptr_eq(a, b),
            (Value::Node(a), Value::Node(b)) => a == b,
            (Value::Class(a), Value::Class(b)) => a.name() == b.name(),
            (Value::Record(a), Value::Record(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::Foreign(a), Value::Foreign(b)) => addr(a) == addr(b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Nil => state.write_u8(TAG_NIL),
            Value::Bool(b) => {
                state.write_u8(TAG_BOOL);
                b.hash(state);
            }
            Value::Int(v) => {
                state.write_u8(TAG_INT);
                v.hash(state);
            }
            Value::Float(v) => {
                state.write_u8(TAG_FLOAT);
                v.to_bits().hash(state);
            }
            Value::Str(s) => {
                state.write_u8(TAG_STR);
                s.hash(state);
            }
            Value::Symbol(s) => {
                state.write_u8(TAG_SYMBOL);
                s.hash(state);
            }
            Value::List(items) => {
                state.write_u8(TAG_LIST);
                items.hash(state);
            }
            // Set and map equality ignores order, so only the size is hashed.
            Value::Set(items) => {
                state.write_u8(TAG_SET);
                items.len().hash(state);
            }
            Value::Map(entries) => {
                state.write_u8(TAG_MAP);
                entries.len().hash(state);
            }
            Value::NodeCall(nc) => {
                state.write_u8(TAG_NODE_CALL);
                addr(nc).hash(state);
            }
            Value::Node(node) => {
                state.write_u8(TAG_NODE);
                node.key().hash(state);
            }
            Value::Class(class) => {
                state.write_u8(TAG_CLASS);
                class.name().hash(state);
            }
            Value::Record(record) => {
                state.write_u8(TAG_RECORD);
                record.type_name.hash(state);
            }
            Value::Foreign(object) => {
                state.write_u8(TAG_FOREIGN);
                addr(object).hash(state);
            }
        }
    }
}

/// Float rendering keeps a trailing `.0` on integral values.
fn fmt_float(v: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        write!(f, "{v:.1}")
    } else {
        write!(f, "{v}")
    }
}

fn fmt_seq<'a>(
    f: &mut fmt::Formatter<'_>,
    open: &str,
    items: impl Iterator<Item = &'a Value>,
    close: &str,
) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        f.write_str(&item.inspect())?;
    }
    f.write_str(close)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => fmt_float(*v, f),
            Value::Str(s) | Value::Symbol(s) => f.write_str(s),
            Value::List(items) => fmt_seq(f, "[", items.iter(), "]"),
            Value::Set(items) => fmt_seq(f, "#{", items.iter(), "}"),
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k.inspect(), v.inspect())?;
                }
                f.write_str("}")
            }
            Value::NodeCall(nc) => write!(f, "{nc}"),
            Value::Node(node) => f.write_str(node.name()),
            Value::Class(class) => f.write_str(class.name()),
            Value::Record(record) => write!(f, "{record}"),
            Value::Foreign(_) => write!(f, "#<{}>", self.type_name()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(v) => write!(f, "Float({v:?})"),
            Value::Foreign(o) => write!(f, "Foreign({o:?})"),
            _ => f.write_str(&self.inspect()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}
