//! Typed readers over configuration maps (expansion) and the matching map builder (flattening).
//!
//! All type checks happen here, once, at the expansion boundary. Readers carry their dotted
//! path so validation errors point at the offending key.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kubeform_core::{ConfigTree, ReconcileError, Result};

fn mismatch(path: &str, want: &str, got: &ConfigTree) -> ReconcileError {
    ReconcileError::validation(format!("{}: expected {}, found {}", path, want, got.type_name()))
}

#[derive(Debug, Clone)]
pub(crate) struct Fields<'a> {
    path: String,
    map: &'a BTreeMap<String, ConfigTree>,
}

impl<'a> Fields<'a> {
    pub(crate) fn root(tree: &'a ConfigTree) -> Result<Self> {
        match tree {
            ConfigTree::Map(map) => Ok(Self { path: String::new(), map }),
            other => Err(mismatch("<root>", "map", other)),
        }
    }

    fn at(&self, key: &str) -> String {
        if self.path.is_empty() { key.to_string() } else { format!("{}.{}", self.path, key) }
    }

    pub(crate) fn path(&self) -> &str { &self.path }

    pub(crate) fn string(&self, key: &str) -> Result<Option<String>> {
        match self.map.get(key) {
            None => Ok(None),
            Some(ConfigTree::Str(s)) => Ok(Some(s.clone())),
            Some(other) => Err(mismatch(&self.at(key), "string", other)),
        }
    }

    pub(crate) fn required_string(&self, key: &str) -> Result<String> {
        self.string(key)?.ok_or_else(|| ReconcileError::validation(format!("{}: required", self.at(key))))
    }

    pub(crate) fn int(&self, key: &str) -> Result<Option<i64>> {
        match self.map.get(key) {
            None => Ok(None),
            Some(ConfigTree::Int(i)) => Ok(Some(*i)),
            Some(other) => Err(mismatch(&self.at(key), "int", other)),
        }
    }

    pub(crate) fn int32(&self, key: &str) -> Result<Option<i32>> {
        match self.int(key)? {
            None => Ok(None),
            Some(i) => i32::try_from(i)
                .map(Some)
                .map_err(|_| ReconcileError::validation(format!("{}: {} out of range", self.at(key), i))),
        }
    }

    pub(crate) fn required_int32(&self, key: &str) -> Result<i32> {
        self.int32(key)?.ok_or_else(|| ReconcileError::validation(format!("{}: required", self.at(key))))
    }

    pub(crate) fn boolean(&self, key: &str) -> Result<Option<bool>> {
        match self.map.get(key) {
            None => Ok(None),
            Some(ConfigTree::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(mismatch(&self.at(key), "bool", other)),
        }
    }

    /// Ordered list of strings; order is preserved.
    pub(crate) fn strings(&self, key: &str) -> Result<Option<Vec<String>>> {
        match self.map.get(key) {
            None => Ok(None),
            Some(ConfigTree::List(items)) => items
                .iter()
                .enumerate()
                .map(|(i, v)| v.as_str().map(str::to_string).ok_or_else(|| mismatch(&format!("{}.{}", self.at(key), i), "string", v)))
                .collect::<Result<Vec<_>>>()
                .map(Some),
            Some(other) => Err(mismatch(&self.at(key), "list", other)),
        }
    }

    /// Unordered set of strings, returned sorted and de-duplicated. A list is accepted too.
    pub(crate) fn set(&self, key: &str) -> Result<Option<Vec<String>>> {
        match self.map.get(key) {
            Some(ConfigTree::Set(items)) => Ok(Some(items.iter().cloned().collect())),
            Some(ConfigTree::List(_)) => Ok(self.strings(key)?.map(|mut v| {
                v.sort();
                v.dedup();
                v
            })),
            Some(other) => Err(mismatch(&self.at(key), "set", other)),
            None => Ok(None),
        }
    }

    pub(crate) fn required_set(&self, key: &str) -> Result<Vec<String>> {
        self.set(key)?.ok_or_else(|| ReconcileError::validation(format!("{}: required", self.at(key))))
    }

    pub(crate) fn string_map(&self, key: &str) -> Result<Option<BTreeMap<String, String>>> {
        match self.map.get(key) {
            None => Ok(None),
            Some(ConfigTree::Map(m)) => m
                .iter()
                .map(|(k, v)| match v {
                    ConfigTree::Str(s) => Ok((k.clone(), s.clone())),
                    other => Err(mismatch(&format!("{}.{}", self.at(key), k), "string", other)),
                })
                .collect::<Result<BTreeMap<_, _>>>()
                .map(Some),
            Some(other) => Err(mismatch(&self.at(key), "map", other)),
        }
    }

    /// Nested block declared "at most one". An absent or empty list yields `None`.
    pub(crate) fn block(&self, key: &str) -> Result<Option<Fields<'a>>> {
        match self.map.get(key) {
            None => Ok(None),
            Some(ConfigTree::List(items)) => match items.as_slice() {
                [] => Ok(None),
                [ConfigTree::Map(map)] => Ok(Some(Fields { path: format!("{}.0", self.at(key)), map })),
                [other] => Err(mismatch(&format!("{}.0", self.at(key)), "map", other)),
                _ => Err(ReconcileError::validation(format!(
                    "{}: at most one block allowed, found {}",
                    self.at(key),
                    items.len()
                ))),
            },
            Some(other) => Err(mismatch(&self.at(key), "list", other)),
        }
    }

    pub(crate) fn required_block(&self, key: &str) -> Result<Fields<'a>> {
        self.block(key)?
            .ok_or_else(|| ReconcileError::validation(format!("{}: required block missing", self.at(key))))
    }

    /// Repeated block: every element must be a map.
    pub(crate) fn blocks(&self, key: &str) -> Result<Option<Vec<Fields<'a>>>> {
        match self.map.get(key) {
            None => Ok(None),
            Some(ConfigTree::List(items)) => items
                .iter()
                .enumerate()
                .map(|(i, v)| match v {
                    ConfigTree::Map(map) => Ok(Fields { path: format!("{}.{}", self.at(key), i), map }),
                    other => Err(mismatch(&format!("{}.{}", self.at(key), i), "map", other)),
                })
                .collect::<Result<Vec<_>>>()
                .map(Some),
            Some(other) => Err(mismatch(&self.at(key), "list", other)),
        }
    }

    /// Integer-or-string values are strings in the tree; numeric strings become integers.
    pub(crate) fn int_or_string(&self, key: &str) -> Result<Option<IntOrString>> {
        Ok(self.string(key)?.map(|s| match s.parse::<i32>() {
            Ok(i) => IntOrString::Int(i),
            Err(_) => IntOrString::String(s),
        }))
    }
}

pub(crate) fn int_or_string_to_tree(v: &IntOrString) -> ConfigTree {
    match v {
        IntOrString::Int(i) => ConfigTree::Str(i.to_string()),
        IntOrString::String(s) => ConfigTree::Str(s.clone()),
    }
}

/// Map builder for flattening. Every setter skips `None`, so absent fields never produce keys.
#[derive(Debug, Default)]
pub(crate) struct Att(BTreeMap<String, ConfigTree>);

impl Att {
    pub(crate) fn new() -> Self { Self::default() }

    pub(crate) fn put(mut self, key: &str, v: Option<ConfigTree>) -> Self {
        if let Some(v) = v { self.0.insert(key.to_string(), v); }
        self
    }

    pub(crate) fn string(self, key: &str, v: Option<&String>) -> Self {
        self.put(key, v.map(|s| ConfigTree::Str(s.clone())))
    }

    pub(crate) fn int<I: Into<i64> + Copy>(self, key: &str, v: Option<I>) -> Self {
        self.put(key, v.map(|i| ConfigTree::Int(i.into())))
    }

    pub(crate) fn boolean(self, key: &str, v: Option<bool>) -> Self {
        self.put(key, v.map(ConfigTree::Bool))
    }

    pub(crate) fn strings(self, key: &str, v: Option<&Vec<String>>) -> Self {
        self.put(key, v.map(|items| ConfigTree::strings(items.iter().cloned())))
    }

    pub(crate) fn set(self, key: &str, v: Option<&Vec<String>>) -> Self {
        self.put(key, v.map(|items| ConfigTree::set(items.iter().cloned())))
    }

    pub(crate) fn string_map(self, key: &str, v: Option<&BTreeMap<String, String>>) -> Self {
        self.put(key, v.map(|m| ConfigTree::map(m.iter().map(|(k, v)| (k.clone(), ConfigTree::Str(v.clone()))))))
    }

    pub(crate) fn int_or_string(self, key: &str, v: Option<&IntOrString>) -> Self {
        self.put(key, v.map(int_or_string_to_tree))
    }

    /// `v` is the already-flattened block (a list holding one map).
    pub(crate) fn block(self, key: &str, v: Option<ConfigTree>) -> Self { self.put(key, v) }

    pub(crate) fn list(self, key: &str, v: Option<Vec<ConfigTree>>) -> Self {
        self.put(key, v.map(ConfigTree::List))
    }

    pub(crate) fn into_map(self) -> ConfigTree { ConfigTree::Map(self.0) }

    pub(crate) fn into_block(self) -> ConfigTree { ConfigTree::List(vec![ConfigTree::Map(self.0)]) }
}
