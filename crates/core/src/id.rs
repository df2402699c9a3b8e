//! Identity codec: the opaque object id persisted by the caller as the primary key.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ReconcileError, Result};

const SEP: char = '/';

/// Whether a kind lives inside a namespace or at cluster level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Scope {
    Namespaced,
    Cluster,
}

/// Decoded identity of a remote object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ObjectId {
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectId {
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self { namespace: Some(namespace.into()), name: name.into() }
    }

    pub fn cluster(name: impl Into<String>) -> Self {
        Self { namespace: None, name: name.into() }
    }

    pub fn scope(&self) -> Scope {
        if self.namespace.is_some() { Scope::Namespaced } else { Scope::Cluster }
    }

    pub fn namespace(&self) -> Option<&str> { self.namespace.as_deref() }

    /// Encode as `namespace/name` or bare `name`.
    pub fn encode(&self) -> String { self.to_string() }

    /// Decode an id for a kind of the given scope.
    ///
    /// Exactly two non-empty segments for namespaced kinds, exactly one for cluster kinds.
    pub fn decode(id: &str, scope: Scope) -> Result<Self> {
        let parts: Vec<&str> = id.split(SEP).collect();
        match (scope, parts.as_slice()) {
            (Scope::Namespaced, [ns, name]) if !ns.is_empty() && !name.is_empty() => {
                Ok(Self::namespaced(*ns, *name))
            }
            (Scope::Cluster, [name]) if !name.is_empty() => Ok(Self::cluster(*name)),
            (Scope::Namespaced, _) => Err(ReconcileError::validation(format!(
                "unexpected id format {:?}: expected namespace/name", id
            ))),
            (Scope::Cluster, _) => Err(ReconcileError::validation(format!(
                "unexpected id format {:?}: expected a bare name", id
            ))),
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}{}{}", ns, SEP, self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_namespaced_and_cluster_ids() {
        assert_eq!(ObjectId::namespaced("ns", "foo").encode(), "ns/foo");
        assert_eq!(ObjectId::cluster("admin").encode(), "admin");
    }

    #[test]
    fn decode_round_trips() {
        let id = ObjectId::decode("ns/foo", Scope::Namespaced).expect("decode");
        assert_eq!(id, ObjectId::namespaced("ns", "foo"));
        assert_eq!(id.encode(), "ns/foo");
        let id = ObjectId::decode("admin", Scope::Cluster).expect("decode");
        assert_eq!(id.namespace(), None);
        assert_eq!(id.name, "admin");
    }

    #[test]
    fn decode_fails_closed() {
        assert!(ObjectId::decode("badid", Scope::Namespaced).is_err());
        assert!(ObjectId::decode("a/b/c", Scope::Namespaced).is_err());
        assert!(ObjectId::decode("/foo", Scope::Namespaced).is_err());
        assert!(ObjectId::decode("ns/", Scope::Namespaced).is_err());
        assert!(ObjectId::decode("", Scope::Cluster).is_err());
        assert!(ObjectId::decode("ns/foo", Scope::Cluster).is_err());
    }

    #[test]
    fn decode_error_is_validation() {
        let err = ObjectId::decode("badid", Scope::Namespaced).unwrap_err();
        assert!(matches!(err, ReconcileError::Validation(_)), "err={:?}", err);
    }
}
