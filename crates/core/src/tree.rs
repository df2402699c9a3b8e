//! Configuration tree: the dynamically shaped value exchanged with the configuration store.
//!
//! Presence is significant. A key missing from a `Map` means "unset", which is distinct from
//! a key holding a zero value.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::{ReconcileError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConfigTree {
    Str(String),
    Int(i64),
    Bool(bool),
    /// Ordered sequence; element order is meaningful.
    List(Vec<ConfigTree>),
    /// Unordered set of scalars, held in canonical (sorted) order.
    Set(BTreeSet<String>),
    Map(BTreeMap<String, ConfigTree>),
}

impl Default for ConfigTree {
    fn default() -> Self { ConfigTree::Map(BTreeMap::new()) }
}

impl ConfigTree {
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, ConfigTree)>) -> Self {
        ConfigTree::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// A nested block declared "at most one": a single-element list holding a map.
    pub fn block<K: Into<String>>(entries: impl IntoIterator<Item = (K, ConfigTree)>) -> Self {
        ConfigTree::List(vec![ConfigTree::map(entries)])
    }

    pub fn list(items: impl IntoIterator<Item = ConfigTree>) -> Self {
        ConfigTree::List(items.into_iter().collect())
    }

    pub fn set<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        ConfigTree::Set(items.into_iter().map(Into::into).collect())
    }

    pub fn str(s: impl Into<String>) -> Self { ConfigTree::Str(s.into()) }

    pub fn strings<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        ConfigTree::List(items.into_iter().map(|s| ConfigTree::Str(s.into())).collect())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigTree::Str(_) => "string",
            ConfigTree::Int(_) => "int",
            ConfigTree::Bool(_) => "bool",
            ConfigTree::List(_) => "list",
            ConfigTree::Set(_) => "set",
            ConfigTree::Map(_) => "map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self { ConfigTree::Str(s) => Some(s), _ => None }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self { ConfigTree::Int(i) => Some(*i), _ => None }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self { ConfigTree::Bool(b) => Some(*b), _ => None }
    }

    pub fn as_list(&self) -> Option<&[ConfigTree]> {
        match self { ConfigTree::List(l) => Some(l), _ => None }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, ConfigTree>> {
        match self { ConfigTree::Map(m) => Some(m), _ => None }
    }

    pub fn get(&self, key: &str) -> Option<&ConfigTree> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Resolve a dotted path such as `spec.0.template.0.metadata`.
    ///
    /// Numeric segments index into lists; every other segment is a map key. The empty path
    /// resolves to the tree itself.
    pub fn lookup(&self, path: &str) -> Option<&ConfigTree> {
        if path.is_empty() { return Some(self); }
        let mut cur = self;
        for seg in path.split('.') {
            cur = match cur {
                ConfigTree::Map(m) => m.get(seg)?,
                ConfigTree::List(l) => l.get(seg.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(cur)
    }

    /// Insert a top-level key, turning a non-map root into an empty map first.
    pub fn insert(&mut self, key: impl Into<String>, value: ConfigTree) {
        if !matches!(self, ConfigTree::Map(_)) { *self = ConfigTree::default(); }
        if let ConfigTree::Map(m) = self { m.insert(key.into(), value); }
    }

    pub fn remove(&mut self, key: &str) -> Option<ConfigTree> {
        match self { ConfigTree::Map(m) => m.remove(key), _ => None }
    }
}

impl From<&str> for ConfigTree {
    fn from(s: &str) -> Self { ConfigTree::Str(s.to_string()) }
}

impl From<String> for ConfigTree {
    fn from(s: String) -> Self { ConfigTree::Str(s) }
}

impl From<i64> for ConfigTree {
    fn from(i: i64) -> Self { ConfigTree::Int(i) }
}

impl From<i32> for ConfigTree {
    fn from(i: i32) -> Self { ConfigTree::Int(i64::from(i)) }
}

impl From<bool> for ConfigTree {
    fn from(b: bool) -> Self { ConfigTree::Bool(b) }
}

/// JSON arrays become ordered lists; `null` object members are treated as absent.
impl TryFrom<serde_json::Value> for ConfigTree {
    type Error = ReconcileError;

    fn try_from(v: serde_json::Value) -> Result<Self> {
        use serde_json::Value as Json;
        match v {
            Json::String(s) => Ok(ConfigTree::Str(s)),
            Json::Bool(b) => Ok(ConfigTree::Bool(b)),
            Json::Number(n) => n
                .as_i64()
                .map(ConfigTree::Int)
                .ok_or_else(|| ReconcileError::validation(format!("non-integer number {} in configuration", n))),
            Json::Array(items) => items.into_iter().map(ConfigTree::try_from).collect::<Result<Vec<_>>>().map(ConfigTree::List),
            Json::Object(obj) => {
                let mut out = BTreeMap::new();
                for (k, v) in obj {
                    if v.is_null() { continue; }
                    out.insert(k, ConfigTree::try_from(v)?);
                }
                Ok(ConfigTree::Map(out))
            }
            Json::Null => Err(ReconcileError::validation("null is not a configuration value")),
        }
    }
}
