//! Kubeform kubehub: the remote object store interface and its kube-rs implementation.
//!
//! The reconciler only talks to [`ObjectStore`] and [`EventSource`]; objects cross the seam as
//! JSON so one implementation serves every kind through `DynamicObject`.

#![forbid(unsafe_code)]

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Event;
use kube::{
    api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams},
    core::{ApiResource, DynamicObject},
    Client, Resource,
};
use kubeform_core::{ObjectId, ReconcileError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tracing::debug;

/// Update payloads accepted by the store.
#[derive(Debug, Clone)]
pub enum StorePatch {
    /// RFC 6902 operations, applied atomically.
    Json(json_patch::Patch),
    /// Whole object, merged with the store's per-field strategy.
    Strategic(Json),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn create(&self, ar: &ApiResource, namespace: Option<&str>, obj: Json) -> Result<Json>;
    async fn get(&self, ar: &ApiResource, id: &ObjectId) -> Result<Json>;
    async fn patch(&self, ar: &ApiResource, id: &ObjectId, patch: &StorePatch) -> Result<Json>;
    async fn delete(&self, ar: &ApiResource, id: &ObjectId) -> Result<()>;
}

/// A warning-class event recorded against an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningEvent {
    pub reason: String,
    pub message: String,
    pub last_seen: Option<DateTime<Utc>>,
    pub count: Option<i32>,
}

#[async_trait]
pub trait EventSource: Send + Sync {
    /// Warning events whose involved object is `kind` `id`, in no particular order.
    async fn warning_events(&self, kind: &str, id: &ObjectId) -> Result<Vec<WarningEvent>>;
}

/// Type-erased API resource for a statically known object type.
pub fn api_resource<R: Resource<DynamicType = ()>>() -> ApiResource { ApiResource::erase::<R>(&()) }

/// Build a client from the ambient kubeconfig or in-cluster environment.
pub async fn connect() -> anyhow::Result<Client> {
    Client::try_default().await.context("building kube client")
}

/// Map store failures onto the reconciliation taxonomy: 404 and 409 are distinguished,
/// everything else is transport.
pub fn classify(err: kube::Error) -> ReconcileError {
    match err {
        kube::Error::Api(ae) if ae.code == 404 => ReconcileError::NotFound(ae.message),
        kube::Error::Api(ae) if ae.code == 409 => ReconcileError::Conflict(ae.message),
        other => ReconcileError::Transport(anyhow::Error::new(other)),
    }
}

fn to_json(obj: DynamicObject) -> Result<Json> {
    serde_json::to_value(obj).context("serializing store object").map_err(ReconcileError::from)
}

fn warning_selector(kind: &str, id: &ObjectId) -> String {
    let mut sel = format!("involvedObject.kind={},involvedObject.name={},type=Warning", kind, id.name);
    if let Some(ns) = id.namespace() {
        sel.push_str(&format!(",involvedObject.namespace={}", ns));
    }
    sel
}

fn warning_from(ev: Event) -> WarningEvent {
    let last_seen = ev
        .last_timestamp
        .map(|t| t.0)
        .or_else(|| ev.event_time.map(|t| t.0))
        .or_else(|| ev.first_timestamp.map(|t| t.0));
    WarningEvent {
        reason: ev.reason.unwrap_or_default(),
        message: ev.message.unwrap_or_default(),
        last_seen,
        count: ev.count,
    }
}

/// [`ObjectStore`] and [`EventSource`] over a shared kube client.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self { Self { client } }

    fn api(&self, ar: &ApiResource, namespace: Option<&str>) -> Api<DynamicObject> {
        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, ar),
            None => Api::all_with(self.client.clone(), ar),
        }
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn create(&self, ar: &ApiResource, namespace: Option<&str>, obj: Json) -> Result<Json> {
        let obj: DynamicObject = serde_json::from_value(obj).context("decoding object for create")?;
        debug!(kind = %ar.kind, ns = ?namespace, "create");
        let created = self.api(ar, namespace).create(&PostParams::default(), &obj).await.map_err(classify)?;
        to_json(created)
    }

    async fn get(&self, ar: &ApiResource, id: &ObjectId) -> Result<Json> {
        let obj = self.api(ar, id.namespace()).get(&id.name).await.map_err(classify)?;
        to_json(obj)
    }

    async fn patch(&self, ar: &ApiResource, id: &ObjectId, patch: &StorePatch) -> Result<Json> {
        let api = self.api(ar, id.namespace());
        let pp = PatchParams::default();
        let obj = match patch {
            StorePatch::Json(p) => api.patch(&id.name, &pp, &Patch::Json::<()>(p.clone())).await,
            StorePatch::Strategic(v) => api.patch(&id.name, &pp, &Patch::Strategic(v)).await,
        }
        .map_err(classify)?;
        to_json(obj)
    }

    async fn delete(&self, ar: &ApiResource, id: &ObjectId) -> Result<()> {
        self.api(ar, id.namespace()).delete(&id.name, &DeleteParams::default()).await.map_err(classify)?;
        Ok(())
    }
}

#[async_trait]
impl EventSource for KubeStore {
    async fn warning_events(&self, kind: &str, id: &ObjectId) -> Result<Vec<WarningEvent>> {
        let api: Api<Event> = match id.namespace() {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };
        let lp = ListParams::default().fields(&warning_selector(kind, id));
        let list = api.list(&lp).await.map_err(classify)?;
        debug!(kind, id = %id, count = list.items.len(), "listed warning events");
        Ok(list.items.into_iter().map(warning_from).collect())
    }
}
