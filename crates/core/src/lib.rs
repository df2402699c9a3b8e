//! Kubeform core types: configuration tree, object identity and the shared error taxonomy.

#![forbid(unsafe_code)]

pub mod data;
pub mod error;
pub mod id;
pub mod tree;

pub use data::{ConfigAccessor, ResourceData};
pub use error::{ReconcileError, Result};
pub use id::{ObjectId, Scope};
pub use tree::ConfigTree;

pub mod prelude {
    pub use super::{ConfigAccessor, ConfigTree, ObjectId, ReconcileError, ResourceData, Result, Scope};
}
