//! Per-invocation evaluation environment.
//!
//! An [`Env`] holds the parameter bag supplied by the caller and the memo
//! cache of attribute values computed under that bag. It belongs to a single
//! evaluation chain and is never shared between unrelated invocations.

use rustc_hash::FxHashMap;

use crate::module::NodeRef;
use crate::value::{Map, StrKey, Value};

/// Parameter bag: ordered mapping of keys to values.
pub type Params = Map;

/// Build a parameter bag with string keys.
pub fn params<K: AsRef<str>>(entries: impl IntoIterator<Item = (K, Value)>) -> Params {
    entries
        .into_iter()
        .map(|(k, v)| (Value::str(k), v))
        .collect()
}

/// Identity of one attribute on one node type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct CacheKey {
    module: u32,
    node: u32,
    slot: u32,
}

impl CacheKey {
    pub(crate) fn new(node: &NodeRef, slot: u32) -> Self {
        let (module, node) = node.key();
        Self { module, node, slot }
    }
}

#[derive(Debug, Default)]
pub struct Env {
    params: Params,
    cache: FxHashMap<CacheKey, Value>,
}

impl Env {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            cache: FxHashMap::default(),
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Raw caller-supplied value for `name`, if any.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(&StrKey(name))
    }

    pub(crate) fn cached(&self, key: &CacheKey) -> Option<&Value> {
        self.cache.get(key)
    }

    pub(crate) fn store(&mut self, key: CacheKey, value: Value) {
        self.cache.insert(key, value);
    }

    /// Number of memoized attribute values.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Parameters visible to `_`: integer keys and identifier-like string
    /// keys (`[a-z][A-Za-z0-9_]*`). Internal entries are dropped.
    pub fn visible_params(&self) -> Params {
        self.params
            .iter()
            .filter(|(k, _)| is_visible_key(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

fn is_visible_key(key: &Value) -> bool {
    match key {
        Value::Int(_) => true,
        Value::Str(s) => {
            let mut chars = s.chars();
            chars.next().is_some_and(|c| c.is_ascii_lowercase())
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
