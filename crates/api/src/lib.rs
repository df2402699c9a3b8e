//! Kubeform reconciliation entry points.
//!
//! A [`Reconciler`] drives one object kind at a time through create, read, update, delete,
//! existence and import against an [`ObjectStore`]. Configuration state is never owned here:
//! every operation reads the desired tree from a [`ConfigAccessor`] and writes the observed
//! tree back into it.

#![forbid(unsafe_code)]

use std::time::Instant;

use anyhow::Context;
use kube::{core::ApiResource, Resource};
use kubeform_apply::{diff, replacement_fields};
use kubeform_core::{ConfigAccessor, ConfigTree, ObjectId, ReconcileError, Result, Scope};
use kubeform_kubehub::{api_resource, EventSource, ObjectStore, StorePatch};
use kubeform_ops::{wait_with_diagnostics, Backoff, Poller, ReadinessState};
use kubeform_schema::{object_id, Kind, UpdateMode};
use metrics::{counter, histogram};
use serde_json::Value as Json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

mod config;

pub use config::ReconcileConfig;
pub use kubeform_core::ResourceData;

pub struct Reconciler<S> {
    store: S,
    config: ReconcileConfig,
    cancel: Option<CancellationToken>,
}

fn observe<T>(verb: &'static str, kind: &'static str, t0: Instant, res: &Result<T>) {
    let took = t0.elapsed();
    histogram!("reconcile_latency_ms", took.as_secs_f64() * 1000.0, "verb" => verb, "kind" => kind);
    match res {
        Ok(_) => {
            counter!("reconcile_ok", 1u64, "verb" => verb, "kind" => kind);
            info!(verb, kind, took_ms = %took.as_millis(), "reconcile: ok");
        }
        Err(e) => {
            counter!("reconcile_err", 1u64, "verb" => verb, "kind" => kind);
            warn!(verb, kind, took_ms = %took.as_millis(), error = %e, "reconcile: failed");
        }
    }
}

fn encode_object<K: Kind>(obj: &K::Object) -> Result<Json> {
    serde_json::to_value(obj).map_err(|e| ReconcileError::validation(format!("{}: cannot encode: {}", K::NAME, e)))
}

fn decode_object<K: Kind>(v: Json) -> Result<K::Object> {
    serde_json::from_value(v)
        .with_context(|| format!("decoding {} from store", K::NAME))
        .map_err(ReconcileError::from)
}

async fn fetch<K: Kind, S: ObjectStore + ?Sized>(store: &S, ar: &ApiResource, id: &ObjectId) -> Result<K::Object> {
    decode_object::<K>(store.get(ar, id).await?)
}

/// Identity recorded in the accessor, checked against the kind's scope.
fn stored_id<K: Kind>(data: &impl ConfigAccessor) -> Result<ObjectId> {
    let raw = data
        .id()
        .ok_or_else(|| ReconcileError::validation(format!("{}: no id recorded", K::NAME)))?;
    ObjectId::decode(raw, K::SCOPE)
}

impl<S: ObjectStore + EventSource> Reconciler<S> {
    pub fn new(store: S, config: ReconcileConfig) -> Self { Self { store, config, cancel: None } }

    /// Abort readiness waits when `token` fires.
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn store(&self) -> &S { &self.store }

    pub fn config(&self) -> &ReconcileConfig { &self.config }

    fn poller(&self) -> Poller {
        let poller = Poller::new().backoff(Backoff { min: self.config.poll_min, max: self.config.poll_max });
        match &self.cancel {
            Some(token) => poller.cancel_on(token.clone()),
            None => poller,
        }
    }

    /// Expand the desired tree, submit it, record the id and wait for readiness if the
    /// kind converges on a replica counter. Ends with a read.
    pub async fn create<K: Kind>(&self, data: &mut impl ConfigAccessor) -> Result<()> {
        let t0 = Instant::now();
        let res = self.create_inner::<K>(data).await;
        observe("create", K::NAME, t0, &res);
        res
    }

    async fn create_inner<K: Kind>(&self, data: &mut impl ConfigAccessor) -> Result<()> {
        let mut obj = K::expand(data.desired())?;
        let namespace = match K::SCOPE {
            Scope::Namespaced => {
                let meta = obj.meta_mut();
                let ns = meta.namespace.get_or_insert_with(|| self.config.default_namespace.clone());
                Some(ns.clone())
            }
            Scope::Cluster => None,
        };
        let ar = api_resource::<K::Object>();
        info!(kind = K::NAME, ns = ?namespace, name = ?obj.meta().name, "reconcile: create start");
        let created = decode_object::<K>(self.store.create(&ar, namespace.as_deref(), encode_object::<K>(&obj)?).await?)?;
        let id = object_id::<K>(&created)?;
        data.set_id(Some(id.encode()));
        debug!(kind = K::NAME, id = %id, "reconcile: created");

        if let (Some(counter), Some(timeout)) = (K::readiness(&created), self.config.readiness_timeout::<K>()) {
            let state = ReadinessState::replica_count(counter.target, timeout);
            let (store, ar_ref, id_ref) = (&self.store, &ar, &id);
            let refresh = move || async move {
                let live = fetch::<K, S>(store, ar_ref, id_ref).await?;
                let label = K::readiness(&live).map(|c| c.ready.to_string()).unwrap_or_default();
                Ok((live, label))
            };
            wait_with_diagnostics(&self.poller(), &state, refresh, &self.store, K::NAME, &id, self.config.warning_events)
                .await?;
            info!(kind = K::NAME, id = %id, target = %state.target, "reconcile: ready");
        }
        self.read_inner::<K>(data).await
    }

    /// Fetch the live object and write its flattened form into the observed state.
    pub async fn read<K: Kind>(&self, data: &mut impl ConfigAccessor) -> Result<()> {
        let t0 = Instant::now();
        let res = self.read_inner::<K>(data).await;
        observe("read", K::NAME, t0, &res);
        res
    }

    async fn read_inner<K: Kind>(&self, data: &mut impl ConfigAccessor) -> Result<()> {
        let id = stored_id::<K>(data)?;
        let live = fetch::<K, S>(&self.store, &api_resource::<K::Object>(), &id).await?;
        let observed = match K::flatten(&live) {
            ConfigTree::Map(m) => m,
            other => return Err(ReconcileError::validation(format!("{}: flattened to {}", K::NAME, other.type_name()))),
        };
        let stale: Vec<String> = data
            .prior()
            .as_map()
            .map(|m| m.keys().filter(|k| !observed.contains_key(*k)).cloned().collect())
            .unwrap_or_default();
        for key in stale {
            data.unset(&key);
        }
        debug!(kind = K::NAME, id = %id, keys = observed.len(), "reconcile: observed");
        for (key, value) in observed {
            data.set(&key, value);
        }
        Ok(())
    }

    /// Apply in-place changes. Fails with `ForceNew` before any store call when a
    /// replacement field changed.
    pub async fn update<K: Kind>(&self, data: &mut impl ConfigAccessor) -> Result<()> {
        let t0 = Instant::now();
        let res = self.update_inner::<K>(data).await;
        observe("update", K::NAME, t0, &res);
        res
    }

    async fn update_inner<K: Kind>(&self, data: &mut impl ConfigAccessor) -> Result<()> {
        let id = stored_id::<K>(data)?;
        if data.prior().as_map().map_or(true, |m| m.is_empty()) {
            self.read_inner::<K>(data).await?;
        }
        let fields = replacement_fields::<K>(data)?;
        if !fields.is_empty() {
            return Err(ReconcileError::ForceNew { kind: K::NAME, fields });
        }
        let ar = api_resource::<K::Object>();
        match K::UPDATE {
            UpdateMode::JsonPatch => {
                let ops = diff::<K>(data.prior(), data.desired())?;
                if ops.is_empty() {
                    debug!(kind = K::NAME, id = %id, "reconcile: nothing to patch");
                } else {
                    let s = ops.summary();
                    info!(kind = K::NAME, id = %id, adds = s.adds, updates = s.updates, removes = s.removes, "reconcile: patch");
                    self.store.patch(&ar, &id, &StorePatch::Json(ops.to_json_patch()?)).await?;
                }
            }
            UpdateMode::Resubmit => {
                let mut obj = K::expand(data.desired())?;
                if let Some(ns) = id.namespace() {
                    obj.meta_mut().namespace = Some(ns.to_string());
                }
                info!(kind = K::NAME, id = %id, "reconcile: resubmit");
                self.store.patch(&ar, &id, &StorePatch::Strategic(encode_object::<K>(&obj)?)).await?;
            }
        }
        self.read_inner::<K>(data).await
    }

    /// Remove the remote object and clear the recorded id.
    pub async fn delete<K: Kind>(&self, data: &mut impl ConfigAccessor) -> Result<()> {
        let t0 = Instant::now();
        let res: Result<()> = async {
            let id = stored_id::<K>(data)?;
            info!(kind = K::NAME, id = %id, "reconcile: delete start");
            self.store.delete(&api_resource::<K::Object>(), &id).await?;
            data.set_id(None);
            Ok(())
        }
        .await;
        observe("delete", K::NAME, t0, &res);
        res
    }

    /// Whether the recorded object still exists. Not-found is `Ok(false)`; every other
    /// store failure propagates.
    pub async fn exists<K: Kind>(&self, data: &impl ConfigAccessor) -> Result<bool> {
        let t0 = Instant::now();
        let res: Result<bool> = async {
            let id = stored_id::<K>(data)?;
            match self.store.get(&api_resource::<K::Object>(), &id).await {
                Ok(_) => Ok(true),
                Err(e) if e.is_not_found() => {
                    debug!(kind = K::NAME, id = %id, "reconcile: gone");
                    Ok(false)
                }
                Err(e) => Err(e),
            }
        }
        .await;
        observe("exists", K::NAME, t0, &res);
        res
    }

    /// Adopt an existing object by its encoded id and read it into the observed state.
    pub async fn import<K: Kind>(&self, id: &str, data: &mut impl ConfigAccessor) -> Result<()> {
        let t0 = Instant::now();
        let res: Result<()> = async {
            let parsed = ObjectId::decode(id, K::SCOPE)?;
            data.set_id(Some(parsed.encode()));
            let res = self.read_inner::<K>(data).await;
            if res.is_err() {
                data.set_id(None);
            }
            res
        }
        .await;
        observe("import", K::NAME, t0, &res);
        res
    }
}
