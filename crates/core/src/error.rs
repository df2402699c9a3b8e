use std::time::Duration;

/// Errors surfaced by every reconciliation entry point.
///
/// Only `NotFound` is ever recovered locally (inside the existence probe); every other
/// variant is returned to the caller as-is.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("not_found: {0}")]
    NotFound(String),
    /// Optimistic-lock mismatch reported by the store. Never retried here.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Malformed input detected before any store call.
    #[error("validation: {0}")]
    Validation(String),
    /// A field declared force-new differs; the object must be destroyed and recreated.
    #[error("force_new: {kind} cannot update {} in place", .fields.join(", "))]
    ForceNew { kind: &'static str, fields: Vec<&'static str> },
    /// The readiness counter reported a label outside the pending set.
    #[error("unexpected state: observed {label:?} while waiting for {target:?}")]
    UnexpectedState { label: String, target: String },
    #[error("timeout: waited {}s for {target} (last observed {}){events}", .waited.as_secs(), .last.as_deref().unwrap_or("nothing"))]
    Timeout {
        target: String,
        last: Option<String>,
        waited: Duration,
        /// Pre-rendered warning events appended to the message; empty when none were found.
        events: String,
    },
    /// The caller cancelled a readiness wait.
    #[error("cancelled while waiting for {target}")]
    Cancelled { target: String },
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl ReconcileError {
    pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

    pub fn is_not_found(&self) -> bool { matches!(self, Self::NotFound(_)) }

    pub fn is_timeout(&self) -> bool { matches!(self, Self::Timeout { .. }) }
}

pub type Result<T, E = ReconcileError> = std::result::Result<T, E>;
