//! Kubeform schema: expand configuration trees into typed Kubernetes objects and flatten them back.
//!
//! Every supported kind implements [`Kind`]. Expansion validates the tree once at this boundary;
//! flattening emits a key only for fields that are present on the object.

#![forbid(unsafe_code)]

use std::fmt::Debug;
use std::time::Duration;

use kube::Resource;
use kubeform_core::{ConfigTree, ObjectId, ReconcileError, Result, Scope};
use serde::{de::DeserializeOwned, Serialize};

mod cronjob;
mod fields;
mod ingress;
pub mod kinds;
mod meta;
pub mod plan;
mod pod;
mod rbac;
mod workloads;

pub use kinds::{ClusterRole, ClusterRoleBinding, CronJob, DaemonSet, Deployment, Ingress, Role, RoleBinding, StatefulSet};
pub use plan::{is_server_managed, FieldPolicy, FieldRule, KeyDiff};

/// How in-place updates are submitted to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Minimal JSON Patch generated from the field plan.
    JsonPatch,
    /// The whole expanded object, as a strategic merge patch.
    Resubmit,
}

/// Scalar readiness counter of a converging object: `ready` moves towards `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyCounter {
    pub target: i32,
    pub ready: i32,
}

/// A reconcilable object kind.
pub trait Kind: Send + Sync + 'static {
    type Object: Resource<DynamicType = ()> + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static;

    const NAME: &'static str;
    const SCOPE: Scope;
    const UPDATE: UpdateMode;
    /// Default bound on the readiness wait after create; `None` for kinds without a counter.
    const READINESS_TIMEOUT: Option<Duration> = None;

    fn expand(tree: &ConfigTree) -> Result<Self::Object>;
    fn flatten(obj: &Self::Object) -> ConfigTree;
    /// Ordered field plan; patch operations follow this order.
    fn field_plan() -> &'static [FieldRule];
    fn readiness(_obj: &Self::Object) -> Option<ReadyCounter> { None }
}

/// Identity of a live (or about to be created) object, per the kind's scope.
pub fn object_id<K: Kind>(obj: &K::Object) -> Result<ObjectId> {
    let meta = obj.meta();
    let name = meta
        .name
        .clone()
        .ok_or_else(|| ReconcileError::validation(format!("{} has no name", K::NAME)))?;
    match K::SCOPE {
        Scope::Cluster => Ok(ObjectId::cluster(name)),
        Scope::Namespaced => meta
            .namespace
            .clone()
            .map(|ns| ObjectId::namespaced(ns, name.clone()))
            .ok_or_else(|| ReconcileError::validation(format!("{} {} has no namespace", K::NAME, name))),
    }
}

pub mod prelude {
    pub use super::{object_id, FieldPolicy, FieldRule, KeyDiff, Kind, ReadyCounter, UpdateMode};
}
