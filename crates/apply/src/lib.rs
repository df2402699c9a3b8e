//! Kubeform apply: two-way patch generation from previous and desired configuration.
//!
//! Both trees are expanded to typed objects and serialized, then compared rule by rule along
//! the kind's field plan. Force-new rules never produce operations; callers check them first
//! with [`replacement_fields`].

#![forbid(unsafe_code)]

use kubeform_core::{ConfigAccessor, ConfigTree, ReconcileError, Result};
use kubeform_schema::{is_server_managed, FieldRule, KeyDiff, Kind};
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    Add,
    Remove,
    Replace,
}

/// One JSON Patch operation; `path` is a JSON pointer into the serialized object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOp {
    pub op: Op,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Json>,
}

impl PatchOp {
    pub fn add(path: impl Into<String>, value: Json) -> Self { Self { op: Op::Add, path: path.into(), value: Some(value) } }
    pub fn remove(path: impl Into<String>) -> Self { Self { op: Op::Remove, path: path.into(), value: None } }
    pub fn replace(path: impl Into<String>, value: Json) -> Self {
        Self { op: Op::Replace, path: path.into(), value: Some(value) }
    }
}

/// Ordered operations, applied atomically by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchSet(Vec<PatchOp>);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary { pub adds: usize, pub updates: usize, pub removes: usize }

impl PatchSet {
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn ops(&self) -> &[PatchOp] { &self.0 }
    pub fn push(&mut self, op: PatchOp) { self.0.push(op); }

    pub fn summary(&self) -> DiffSummary {
        let mut s = DiffSummary::default();
        for op in &self.0 {
            match op.op {
                Op::Add => s.adds += 1,
                Op::Replace => s.updates += 1,
                Op::Remove => s.removes += 1,
            }
        }
        s
    }

    /// Encode to the store's JSON Patch type. Nothing is sent when this fails.
    pub fn to_json_patch(&self) -> Result<json_patch::Patch> {
        let raw = serde_json::to_value(self).map_err(|e| ReconcileError::validation(format!("encoding patch: {}", e)))?;
        serde_json::from_value(raw).map_err(|e| ReconcileError::validation(format!("encoding patch: {}", e)))
    }
}

impl From<Vec<PatchOp>> for PatchSet {
    fn from(ops: Vec<PatchOp>) -> Self { Self(ops) }
}

/// True when every value present in `desired` is present and equal in `prior`.
///
/// Maps may carry extra keys on the prior side (store defaults); arrays must have the same
/// length and be contained element-wise.
pub fn contained(desired: &Json, prior: &Json) -> bool {
    match (desired, prior) {
        (Json::Object(d), Json::Object(p)) => d.iter().all(|(k, dv)| p.get(k).is_some_and(|pv| contained(dv, pv))),
        (Json::Array(d), Json::Array(p)) => d.len() == p.len() && d.iter().zip(p).all(|(dv, pv)| contained(dv, pv)),
        (d, p) => d == p,
    }
}

fn differs(rule: &FieldRule, desired: &Json, prior: &Json) -> bool {
    if rule.computed { !contained(desired, prior) } else { desired != prior }
}

fn escape_key(key: &str) -> String { key.replace('~', "~0").replace('/', "~1") }

/// Map fields patched key by key. A map missing on the prior side is added whole; otherwise
/// each new or changed key is an `add` and each dropped key a `remove`.
fn diff_keys(rule: &FieldRule, prev: Option<&Json>, desired: Option<&Json>, out: &mut PatchSet) {
    let empty = serde_json::Map::new();
    let d = desired.and_then(Json::as_object);
    let p = match prev.and_then(Json::as_object) {
        Some(p) => p,
        None => {
            if let Some(d) = d.filter(|d| !d.is_empty()) {
                out.push(PatchOp::add(rule.pointer, Json::Object(d.clone())));
            }
            return;
        }
    };
    let d = d.unwrap_or(&empty);
    for (k, v) in d {
        if p.get(k) != Some(v) {
            out.push(PatchOp::add(format!("{}/{}", rule.pointer, escape_key(k)), v.clone()));
        }
    }
    for k in p.keys().filter(|k| !d.contains_key(*k)) {
        if rule.keys == KeyDiff::PerKeyUnmanaged && is_server_managed(k) { continue; }
        out.push(PatchOp::remove(format!("{}/{}", rule.pointer, escape_key(k))));
    }
}

/// Compare two serialized objects along a field plan.
///
/// Rules whose owner pointer is set in `desired` are skipped; per-key rules go through
/// [`diff_keys`]. For the rest, in plan order: absent on both sides is unchanged; present only
/// in `prev` is a `remove` (kept when the rule is computed); present only in `desired` is an
/// `add`. When both sides hold arrays of equal length each differing index gets its own
/// `replace`; any other difference replaces the whole value.
pub fn diff_values(prev: &Json, desired: &Json, plan: &[FieldRule]) -> PatchSet {
    let mut out = PatchSet::default();
    for rule in plan.iter().filter(|r| !r.is_force_new()) {
        if rule.owner.is_some_and(|owner| desired.pointer(owner).is_some()) { continue; }
        if rule.keys != KeyDiff::Whole {
            diff_keys(rule, prev.pointer(rule.pointer), desired.pointer(rule.pointer), &mut out);
            continue;
        }
        match (prev.pointer(rule.pointer), desired.pointer(rule.pointer)) {
            (None, None) => {}
            (Some(_), None) => {
                if !rule.computed { out.push(PatchOp::remove(rule.pointer)); }
            }
            (None, Some(d)) => out.push(PatchOp::add(rule.pointer, d.clone())),
            (Some(p), Some(d)) => {
                if !differs(rule, d, p) { continue; }
                match (p, d) {
                    (Json::Array(pa), Json::Array(da)) if pa.len() == da.len() => {
                        for (i, (pv, dv)) in pa.iter().zip(da).enumerate() {
                            if differs(rule, dv, pv) {
                                out.push(PatchOp::replace(format!("{}/{}", rule.pointer, i), dv.clone()));
                            }
                        }
                    }
                    _ => out.push(PatchOp::replace(rule.pointer, d.clone())),
                }
            }
        }
    }
    out
}

fn expand_json<K: Kind>(tree: &ConfigTree) -> Result<Json> {
    let obj = K::expand(tree)?;
    serde_json::to_value(&obj).map_err(|e| ReconcileError::validation(format!("serializing {}: {}", K::NAME, e)))
}

/// Patch turning the previously applied configuration into the desired one.
pub fn diff<K: Kind>(prev: &ConfigTree, desired: &ConfigTree) -> Result<PatchSet> {
    let set = diff_values(&expand_json::<K>(prev)?, &expand_json::<K>(desired)?, K::field_plan());
    counter!("patch_ops_total", set.len() as u64, "kind" => K::NAME);
    debug!(kind = K::NAME, ops = set.len(), "generated patch");
    Ok(set)
}

/// Force-new fields whose desired value differs from the applied one.
///
/// Change detection on the accessor narrows the candidates before any expansion happens.
pub fn replacement_fields<K: Kind>(data: &impl ConfigAccessor) -> Result<Vec<&'static str>> {
    let candidates: Vec<&FieldRule> = K::field_plan().iter().filter(|r| r.is_force_new() && data.has_change(r.name)).collect();
    if candidates.is_empty() { return Ok(Vec::new()); }
    let prev = expand_json::<K>(data.prior())?;
    let desired = expand_json::<K>(data.desired())?;
    Ok(candidates
        .into_iter()
        .filter(|rule| match (prev.pointer(rule.pointer), desired.pointer(rule.pointer)) {
            (None, None) => false,
            (Some(_), None) => !rule.computed,
            (None, Some(_)) => true,
            (Some(p), Some(d)) => differs(rule, d, p),
        })
        .map(|rule| rule.name)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubeform_core::ResourceData;
    use kubeform_schema::{ClusterRole, Deployment, Role, StatefulSet};
    use serde_json::json;

    const PLAN: [FieldRule; 4] = [
        FieldRule::force_new("spec.0.selector", "/spec/selector"),
        FieldRule::mutable("spec.0.replicas", "/spec/replicas").computed(),
        FieldRule::mutable("spec.0.name", "/spec/name"),
        FieldRule::mutable("spec.0.items", "/spec/items"),
    ];

    #[test]
    fn identical_objects_produce_no_ops() {
        let v = json!({ "spec": { "selector": { "a": "b" }, "replicas": 2, "name": "x", "items": [1, 2] } });
        assert!(diff_values(&v, &v, &PLAN).is_empty());
    }

    #[test]
    fn one_op_per_changed_scalar_in_plan_order() {
        let prev = json!({ "spec": { "replicas": 2, "name": "x" } });
        let desired = json!({ "spec": { "replicas": 3, "name": "y" } });
        let set = diff_values(&prev, &desired, &PLAN);
        assert_eq!(set.ops(), &[PatchOp::replace("/spec/replicas", json!(3)), PatchOp::replace("/spec/name", json!("y"))]);
    }

    #[test]
    fn equal_length_arrays_replace_per_index() {
        let prev = json!({ "spec": { "items": [1, 2, 3] } });
        let desired = json!({ "spec": { "items": [1, 5, 6] } });
        let set = diff_values(&prev, &desired, &PLAN);
        assert_eq!(set.ops(), &[PatchOp::replace("/spec/items/1", json!(5)), PatchOp::replace("/spec/items/2", json!(6))]);
    }

    #[test]
    fn resized_arrays_replace_whole() {
        let prev = json!({ "spec": { "items": [1, 2, 3] } });
        let desired = json!({ "spec": { "items": [1, 2] } });
        let set = diff_values(&prev, &desired, &PLAN);
        assert_eq!(set.ops(), &[PatchOp::replace("/spec/items", json!([1, 2]))]);
    }

    #[test]
    fn add_and_remove_follow_presence() {
        let prev = json!({ "spec": { "name": "x" } });
        let desired = json!({ "spec": { "items": [1] } });
        let set = diff_values(&prev, &desired, &PLAN);
        assert_eq!(set.ops(), &[PatchOp::remove("/spec/name"), PatchOp::add("/spec/items", json!([1]))]);
        assert_eq!(set.summary(), DiffSummary { adds: 1, updates: 0, removes: 1 });
    }

    #[test]
    fn computed_fields_keep_store_values() {
        let prev = json!({ "spec": { "replicas": 1 } });
        let desired = json!({ "spec": {} });
        assert!(diff_values(&prev, &desired, &PLAN).is_empty());
    }

    #[test]
    fn force_new_rules_never_patch() {
        let prev = json!({ "spec": { "selector": { "a": "b" } } });
        let desired = json!({ "spec": { "selector": { "a": "c" } } });
        assert!(diff_values(&prev, &desired, &PLAN).is_empty());
    }

    #[test]
    fn containment_allows_extra_prior_keys() {
        assert!(contained(&json!({ "a": 1 }), &json!({ "a": 1, "b": 2 })));
        assert!(!contained(&json!({ "a": 1, "b": 2 }), &json!({ "a": 1 })));
        assert!(contained(&json!([{ "x": 1 }]), &json!([{ "x": 1, "y": 2 }])));
        assert!(!contained(&json!([1]), &json!([1, 2])));
    }

    #[test]
    fn wire_encoding_round_trips_through_json_patch() {
        let set = PatchSet::from(vec![PatchOp::replace("/spec/replicas", json!(3)), PatchOp::remove("/metadata/labels")]);
        let patch = set.to_json_patch().expect("encode");
        assert_eq!(patch.0.len(), 2);
        let mut doc = json!({ "metadata": { "labels": { "a": "b" } }, "spec": { "replicas": 1 } });
        json_patch::patch(&mut doc, &patch.0).expect("apply");
        assert_eq!(doc, json!({ "metadata": {}, "spec": { "replicas": 3 } }));
    }

    #[test]
    fn malformed_ops_fail_to_encode() {
        let set = PatchSet::from(vec![
            PatchOp::replace("/spec/replicas", json!(3)),
            PatchOp { op: Op::Add, path: "/metadata/labels".into(), value: None },
        ]);
        let err = set.to_json_patch().unwrap_err();
        assert!(matches!(err, ReconcileError::Validation(_)), "err={:?}", err);
        assert!(err.to_string().contains("encoding patch"), "err={}", err);
    }

    fn deployment(replicas: Option<i64>, image: &str, labels: &[(&str, &str)]) -> ConfigTree {
        let mut spec = vec![
            ("selector", ConfigTree::block([("match_labels", ConfigTree::map([("app", ConfigTree::str("web"))]))])),
            (
                "template",
                ConfigTree::block([
                    ("metadata", ConfigTree::block([("labels", ConfigTree::map([("app", ConfigTree::str("web"))]))])),
                    (
                        "spec",
                        ConfigTree::block([(
                            "containers",
                            ConfigTree::list([ConfigTree::map([("name", ConfigTree::str("web")), ("image", ConfigTree::str(image))])]),
                        )]),
                    ),
                ]),
            ),
        ];
        if let Some(r) = replicas { spec.push(("replicas", ConfigTree::Int(r))); }
        let mut meta = vec![("name", ConfigTree::str("web")), ("namespace", ConfigTree::str("apps"))];
        if !labels.is_empty() {
            meta.push(("labels", ConfigTree::map(labels.iter().map(|(k, v)| (*k, ConfigTree::str(*v))))));
        }
        ConfigTree::map([("metadata", ConfigTree::block(meta)), ("spec", ConfigTree::block(spec))])
    }

    #[test]
    fn deployment_diff_touches_only_changed_fields() {
        let prev = deployment(Some(2), "nginx:1.24", &[]);
        assert!(diff::<Deployment>(&prev, &prev).expect("diff").is_empty());

        let desired = deployment(Some(3), "nginx:1.25", &[("team", "web")]);
        let set = diff::<Deployment>(&prev, &desired).expect("diff");
        let paths: Vec<&str> = set.ops().iter().map(|o| o.path.as_str()).collect();
        assert_eq!(paths, vec!["/metadata/labels", "/spec/replicas", "/spec/template/spec"]);
        assert_eq!(set.ops()[0].op, Op::Add);
    }

    #[test]
    fn role_rules_replace_per_index() {
        let role = |verbs: &[&str]| {
            ConfigTree::map([
                ("metadata", ConfigTree::block([("name", ConfigTree::str("reader")), ("namespace", ConfigTree::str("apps"))])),
                (
                    "rule",
                    ConfigTree::list([
                        ConfigTree::map([("resources", ConfigTree::set(["pods"])), ("verbs", ConfigTree::set(verbs.iter().copied()))]),
                        ConfigTree::map([("resources", ConfigTree::set(["services"])), ("verbs", ConfigTree::set(["get"]))]),
                    ]),
                ),
            ])
        };
        let set = diff::<Role>(&role(&["get"]), &role(&["list", "get"])).expect("diff");
        assert_eq!(set.ops(), &[PatchOp::replace("/rules/0", json!({ "resources": ["pods"], "verbs": ["get", "list"] }))]);
    }

    #[test]
    fn replacement_fields_reports_changed_force_new_rules() {
        let sts = |service: &str| {
            ConfigTree::map([
                ("metadata", ConfigTree::block([("name", ConfigTree::str("db")), ("namespace", ConfigTree::str("apps"))])),
                (
                    "spec",
                    ConfigTree::block([
                        ("selector", ConfigTree::block([("match_labels", ConfigTree::map([("app", ConfigTree::str("db"))]))])),
                        ("service_name", ConfigTree::str(service)),
                        (
                            "template",
                            ConfigTree::block([(
                                "spec",
                                ConfigTree::block([(
                                    "containers",
                                    ConfigTree::list([ConfigTree::map([("name", ConfigTree::str("db"))])]),
                                )]),
                            )]),
                        ),
                    ]),
                ),
            ])
        };
        let mut data = ResourceData::new(sts("db"));
        for (k, v) in sts("db").as_map().cloned().unwrap_or_default() { data.set(&k, v); }
        assert!(replacement_fields::<StatefulSet>(&data).expect("check").is_empty());

        data.set_desired(sts("db-headless"));
        assert_eq!(replacement_fields::<StatefulSet>(&data).expect("check"), vec!["spec.0.service_name"]);
    }

    fn annotated(annotations: &[(&str, &str)]) -> ConfigTree {
        let mut tree = deployment(Some(2), "nginx:1.25", &[]);
        if let ConfigTree::Map(root) = &mut tree {
            if let Some(ConfigTree::List(meta)) = root.get_mut("metadata") {
                if let Some(m) = meta.first_mut() {
                    m.insert("annotations", ConfigTree::map(annotations.iter().map(|(k, v)| (*k, ConfigTree::str(*v)))));
                }
            }
        }
        tree
    }

    #[test]
    fn controller_annotations_are_left_alone() {
        let observed = annotated(&[("deployment.kubernetes.io/revision", "3")]);
        let unannotated = deployment(Some(2), "nginx:1.25", &[]);
        assert!(diff::<Deployment>(&observed, &unannotated).expect("diff").is_empty());

        let observed = annotated(&[("deployment.kubernetes.io/revision", "3"), ("example.com/owner", "web")]);
        let set = diff::<Deployment>(&observed, &annotated(&[("example.com/owner", "api")])).expect("diff");
        assert_eq!(set.ops(), &[PatchOp::add("/metadata/annotations/example.com~1owner", json!("api"))]);

        let set = diff::<Deployment>(&observed, &unannotated).expect("diff");
        assert_eq!(set.ops(), &[PatchOp::remove("/metadata/annotations/example.com~1owner")]);
    }

    #[test]
    fn labels_patch_per_key() {
        let prev = deployment(Some(2), "nginx:1.25", &[("team", "web"), ("tier", "fe")]);
        let desired = deployment(Some(2), "nginx:1.25", &[("team", "api")]);
        let set = diff::<Deployment>(&prev, &desired).expect("diff");
        assert_eq!(set.ops(), &[PatchOp::add("/metadata/labels/team", json!("api")), PatchOp::remove("/metadata/labels/tier")]);

        let mut doc = json!({ "metadata": { "labels": { "team": "web", "tier": "fe", "extra": "x" } } });
        json_patch::patch(&mut doc, &set.to_json_patch().expect("encode").0).expect("apply");
        assert_eq!(doc["metadata"]["labels"], json!({ "team": "api", "extra": "x" }));
    }

    #[test]
    fn aggregated_cluster_role_rules_belong_to_the_controller() {
        let metadata = ("metadata", ConfigTree::block([("name", ConfigTree::str("monitoring"))]));
        let aggregation = (
            "aggregation_rule",
            ConfigTree::block([(
                "cluster_role_selectors",
                ConfigTree::list([ConfigTree::map([("match_labels", ConfigTree::map([("rbac", ConfigTree::str("monitoring"))]))])]),
            )]),
        );
        let rules = (
            "rule",
            ConfigTree::list([ConfigTree::map([("resources", ConfigTree::set(["pods"])), ("verbs", ConfigTree::set(["get"]))])]),
        );
        let observed = ConfigTree::map([metadata.clone(), aggregation.clone(), rules.clone()]);
        let desired = ConfigTree::map([metadata.clone(), aggregation]);
        assert!(diff::<ClusterRole>(&observed, &desired).expect("diff").is_empty());

        let plain = ConfigTree::map([metadata.clone(), rules]);
        let set = diff::<ClusterRole>(&plain, &ConfigTree::map([metadata])).expect("diff");
        assert_eq!(set.ops(), &[PatchOp::remove("/rules")]);
    }
}
