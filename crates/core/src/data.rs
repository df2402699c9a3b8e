//! Configuration store accessor.
//!
//! The reconciler never owns configuration state; it reads the desired tree, writes the
//! observed tree back and asks whether a path changed since the last apply.

use crate::tree::ConfigTree;

pub trait ConfigAccessor {
    /// Persisted identity of the object, if it was created or imported.
    fn id(&self) -> Option<&str>;
    fn set_id(&mut self, id: Option<String>);
    /// Desired value at a dotted path.
    fn get(&self, path: &str) -> Option<&ConfigTree>;
    /// Last observed (applied) value at a dotted path.
    fn get_prior(&self, path: &str) -> Option<&ConfigTree>;
    /// Record an observed top-level key after a successful store call.
    fn set(&mut self, key: &str, value: ConfigTree);
    /// Drop an observed top-level key that the live object no longer carries.
    fn unset(&mut self, key: &str);
    /// True when the desired value at `path` differs from the observed one.
    fn has_change(&self, path: &str) -> bool {
        self.get(path) != self.get_prior(path)
    }
    fn desired(&self) -> &ConfigTree;
    fn prior(&self) -> &ConfigTree;
}

/// In-memory accessor holding the desired tree and the last observed tree side by side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    id: Option<String>,
    desired: ConfigTree,
    observed: ConfigTree,
}

impl ResourceData {
    pub fn new(desired: ConfigTree) -> Self {
        Self { id: None, desired, observed: ConfigTree::default() }
    }

    /// State for an object that already exists remotely (e.g. an import by id).
    pub fn with_id(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()), ..Default::default() }
    }

    pub fn set_desired(&mut self, desired: ConfigTree) { self.desired = desired; }

    /// Accept the observed state as the new desired state, as an apply would.
    pub fn commit(&mut self) { self.desired = self.observed.clone(); }

    pub fn observed(&self) -> &ConfigTree { &self.observed }
}

impl ConfigAccessor for ResourceData {
    fn id(&self) -> Option<&str> { self.id.as_deref() }

    fn set_id(&mut self, id: Option<String>) {
        if id.is_none() { self.observed = ConfigTree::default(); }
        self.id = id;
    }

    fn get(&self, path: &str) -> Option<&ConfigTree> { self.desired.lookup(path) }

    fn get_prior(&self, path: &str) -> Option<&ConfigTree> { self.observed.lookup(path) }

    fn set(&mut self, key: &str, value: ConfigTree) { self.observed.insert(key, value); }

    fn unset(&mut self, key: &str) { self.observed.remove(key); }

    fn desired(&self) -> &ConfigTree { &self.desired }

    fn prior(&self) -> &ConfigTree { &self.observed }
}
