//! Runtime configuration: defaults with `KUBEFORM_*` environment overrides.

use std::str::FromStr;
use std::time::Duration;

use kubeform_schema::Kind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconcileConfig {
    /// Readiness bound for Deployments after create.
    pub deployment_timeout: Duration,
    /// Readiness bound for StatefulSets after create.
    pub statefulset_timeout: Duration,
    /// How many warning events to attach to a readiness timeout.
    pub warning_events: usize,
    pub poll_min: Duration,
    pub poll_max: Duration,
    /// Applied to namespaced objects whose metadata names no namespace.
    pub default_namespace: String,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            deployment_timeout: Duration::from_secs(20 * 60),
            statefulset_timeout: Duration::from_secs(5 * 60),
            warning_events: 3,
            poll_min: Duration::from_millis(100),
            poll_max: Duration::from_secs(10),
            default_namespace: "default".to_string(),
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|s| s.trim().parse::<T>().ok())
}

impl ReconcileConfig {
    /// Read overrides from the process environment; unparsable values keep the default.
    pub fn from_env() -> Self { Self::from_lookup(|k| std::env::var(k).ok()) }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        Self {
            deployment_timeout: parsed(&lookup, "KUBEFORM_DEPLOYMENT_TIMEOUT_SECS").map(Duration::from_secs).unwrap_or(d.deployment_timeout),
            statefulset_timeout: parsed(&lookup, "KUBEFORM_STATEFULSET_TIMEOUT_SECS").map(Duration::from_secs).unwrap_or(d.statefulset_timeout),
            warning_events: parsed(&lookup, "KUBEFORM_WARNING_EVENTS").unwrap_or(d.warning_events),
            poll_min: parsed(&lookup, "KUBEFORM_POLL_MIN_MS").map(Duration::from_millis).unwrap_or(d.poll_min),
            poll_max: parsed(&lookup, "KUBEFORM_POLL_MAX_MS").map(Duration::from_millis).unwrap_or(d.poll_max),
            default_namespace: lookup("KUBEFORM_DEFAULT_NAMESPACE")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(d.default_namespace),
        }
    }

    /// Readiness bound for `K`, or `None` when the kind has no readiness counter.
    pub fn readiness_timeout<K: Kind>(&self) -> Option<Duration> {
        K::READINESS_TIMEOUT.map(|fallback| match K::NAME {
            "Deployment" => self.deployment_timeout,
            "StatefulSet" => self.statefulset_timeout,
            _ => fallback,
        })
    }
}
