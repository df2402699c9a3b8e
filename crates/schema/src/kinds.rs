//! Supported kinds: expansion, flattening, field plans and readiness counters.

use std::time::Duration;

use k8s_openapi::api::apps::v1 as apps;
use k8s_openapi::api::batch::v1 as batch;
use k8s_openapi::api::networking::v1 as networking;
use k8s_openapi::api::rbac::v1 as rbac_v1;
use kubeform_core::{ConfigTree, Result, Scope};

use crate::cronjob::{expand_cronjob_spec, flatten_cronjob_spec};
use crate::fields::{Att, Fields};
use crate::ingress::{expand_ingress_spec, flatten_ingress_spec};
use crate::meta::{expand_object_metadata, flatten_metadata};
use crate::plan::{FieldRule, ANNOTATIONS, LABELS};
use crate::rbac::{
    expand_aggregation_rule, expand_role_ref, expand_rules, expand_subjects, flatten_aggregation_rule, flatten_role_ref,
    flatten_rules, flatten_subjects,
};
use crate::workloads::{
    expand_daemonset_spec, expand_deployment_spec, expand_statefulset_spec, flatten_daemonset_spec,
    flatten_deployment_spec, flatten_statefulset_spec,
};
use crate::{Kind, ReadyCounter, UpdateMode};

fn with_metadata(meta: &k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta) -> Att {
    Att::new().block("metadata", Some(flatten_metadata(meta)))
}

fn replica_counter(replicas: Option<i32>, ready: Option<i32>) -> ReadyCounter {
    ReadyCounter { target: replicas.unwrap_or(1), ready: ready.unwrap_or(0) }
}

pub struct Deployment;

static DEPLOYMENT_PLAN: [FieldRule; 11] = [
    LABELS,
    ANNOTATIONS,
    FieldRule::force_new("spec.0.selector", "/spec/selector"),
    FieldRule::mutable("spec.0.replicas", "/spec/replicas").computed(),
    FieldRule::mutable("spec.0.min_ready_seconds", "/spec/minReadySeconds"),
    FieldRule::mutable("spec.0.strategy", "/spec/strategy").computed(),
    FieldRule::mutable("spec.0.revision_history_limit", "/spec/revisionHistoryLimit").computed(),
    FieldRule::mutable("spec.0.progress_deadline_seconds", "/spec/progressDeadlineSeconds").computed(),
    FieldRule::mutable("spec.0.paused", "/spec/paused"),
    FieldRule::mutable("spec.0.template.0.metadata", "/spec/template/metadata"),
    FieldRule::mutable("spec.0.template.0.spec", "/spec/template/spec").computed(),
];

impl Kind for Deployment {
    type Object = apps::Deployment;
    const NAME: &'static str = "Deployment";
    const SCOPE: Scope = Scope::Namespaced;
    const UPDATE: UpdateMode = UpdateMode::JsonPatch;
    const READINESS_TIMEOUT: Option<Duration> = Some(Duration::from_secs(20 * 60));

    fn expand(tree: &ConfigTree) -> Result<Self::Object> {
        let root = Fields::root(tree)?;
        Ok(apps::Deployment {
            metadata: expand_object_metadata(&root)?,
            spec: Some(expand_deployment_spec(&root.required_block("spec")?)?),
            status: None,
        })
    }

    fn flatten(obj: &Self::Object) -> ConfigTree {
        with_metadata(&obj.metadata).block("spec", obj.spec.as_ref().map(flatten_deployment_spec)).into_map()
    }

    fn field_plan() -> &'static [FieldRule] { &DEPLOYMENT_PLAN }

    fn readiness(obj: &Self::Object) -> Option<ReadyCounter> {
        Some(replica_counter(obj.spec.as_ref().and_then(|s| s.replicas), obj.status.as_ref().and_then(|s| s.ready_replicas)))
    }
}

pub struct StatefulSet;

static STATEFULSET_PLAN: [FieldRule; 12] = [
    LABELS,
    ANNOTATIONS,
    FieldRule::force_new("spec.0.selector", "/spec/selector"),
    FieldRule::force_new("spec.0.service_name", "/spec/serviceName"),
    FieldRule::force_new("spec.0.volume_claim_template", "/spec/volumeClaimTemplates").computed(),
    FieldRule::force_new("spec.0.pod_management_policy", "/spec/podManagementPolicy").computed(),
    FieldRule::mutable("spec.0.replicas", "/spec/replicas").computed(),
    FieldRule::mutable("spec.0.update_strategy", "/spec/updateStrategy").computed(),
    FieldRule::mutable("spec.0.revision_history_limit", "/spec/revisionHistoryLimit").computed(),
    FieldRule::mutable("spec.0.min_ready_seconds", "/spec/minReadySeconds"),
    FieldRule::mutable("spec.0.template.0.metadata", "/spec/template/metadata"),
    FieldRule::mutable("spec.0.template.0.spec", "/spec/template/spec").computed(),
];

impl Kind for StatefulSet {
    type Object = apps::StatefulSet;
    const NAME: &'static str = "StatefulSet";
    const SCOPE: Scope = Scope::Namespaced;
    const UPDATE: UpdateMode = UpdateMode::JsonPatch;
    const READINESS_TIMEOUT: Option<Duration> = Some(Duration::from_secs(5 * 60));

    fn expand(tree: &ConfigTree) -> Result<Self::Object> {
        let root = Fields::root(tree)?;
        Ok(apps::StatefulSet {
            metadata: expand_object_metadata(&root)?,
            spec: Some(expand_statefulset_spec(&root.required_block("spec")?)?),
            status: None,
        })
    }

    fn flatten(obj: &Self::Object) -> ConfigTree {
        with_metadata(&obj.metadata).block("spec", obj.spec.as_ref().map(flatten_statefulset_spec)).into_map()
    }

    fn field_plan() -> &'static [FieldRule] { &STATEFULSET_PLAN }

    fn readiness(obj: &Self::Object) -> Option<ReadyCounter> {
        Some(replica_counter(obj.spec.as_ref().and_then(|s| s.replicas), obj.status.as_ref().and_then(|s| s.ready_replicas)))
    }
}

pub struct DaemonSet;

static DAEMONSET_PLAN: [FieldRule; 8] = [
    LABELS,
    ANNOTATIONS,
    FieldRule::force_new("spec.0.selector", "/spec/selector"),
    FieldRule::mutable("spec.0.update_strategy", "/spec/updateStrategy").computed(),
    FieldRule::mutable("spec.0.min_ready_seconds", "/spec/minReadySeconds"),
    FieldRule::mutable("spec.0.revision_history_limit", "/spec/revisionHistoryLimit").computed(),
    FieldRule::mutable("spec.0.template.0.metadata", "/spec/template/metadata"),
    FieldRule::mutable("spec.0.template.0.spec", "/spec/template/spec").computed(),
];

impl Kind for DaemonSet {
    type Object = apps::DaemonSet;
    const NAME: &'static str = "DaemonSet";
    const SCOPE: Scope = Scope::Namespaced;
    const UPDATE: UpdateMode = UpdateMode::Resubmit;

    fn expand(tree: &ConfigTree) -> Result<Self::Object> {
        let root = Fields::root(tree)?;
        Ok(apps::DaemonSet {
            metadata: expand_object_metadata(&root)?,
            spec: Some(expand_daemonset_spec(&root.required_block("spec")?)?),
            status: None,
        })
    }

    fn flatten(obj: &Self::Object) -> ConfigTree {
        with_metadata(&obj.metadata).block("spec", obj.spec.as_ref().map(flatten_daemonset_spec)).into_map()
    }

    fn field_plan() -> &'static [FieldRule] { &DAEMONSET_PLAN }
}

pub struct CronJob;

static CRONJOB_PLAN: [FieldRule; 10] = [
    LABELS,
    ANNOTATIONS,
    FieldRule::mutable("spec.0.schedule", "/spec/schedule"),
    FieldRule::mutable("spec.0.time_zone", "/spec/timeZone"),
    FieldRule::mutable("spec.0.concurrency_policy", "/spec/concurrencyPolicy").computed(),
    FieldRule::mutable("spec.0.suspend", "/spec/suspend").computed(),
    FieldRule::mutable("spec.0.starting_deadline_seconds", "/spec/startingDeadlineSeconds"),
    FieldRule::mutable("spec.0.successful_jobs_history_limit", "/spec/successfulJobsHistoryLimit").computed(),
    FieldRule::mutable("spec.0.failed_jobs_history_limit", "/spec/failedJobsHistoryLimit").computed(),
    FieldRule::mutable("spec.0.job_template", "/spec/jobTemplate").computed(),
];

impl Kind for CronJob {
    type Object = batch::CronJob;
    const NAME: &'static str = "CronJob";
    const SCOPE: Scope = Scope::Namespaced;
    const UPDATE: UpdateMode = UpdateMode::JsonPatch;

    fn expand(tree: &ConfigTree) -> Result<Self::Object> {
        let root = Fields::root(tree)?;
        Ok(batch::CronJob {
            metadata: expand_object_metadata(&root)?,
            spec: Some(expand_cronjob_spec(&root.required_block("spec")?)?),
            status: None,
        })
    }

    fn flatten(obj: &Self::Object) -> ConfigTree {
        with_metadata(&obj.metadata).block("spec", obj.spec.as_ref().map(flatten_cronjob_spec)).into_map()
    }

    fn field_plan() -> &'static [FieldRule] { &CRONJOB_PLAN }
}

pub struct Ingress;

static INGRESS_PLAN: [FieldRule; 6] = [
    LABELS,
    ANNOTATIONS,
    FieldRule::mutable("spec.0.ingress_class_name", "/spec/ingressClassName"),
    FieldRule::mutable("spec.0.backend", "/spec/defaultBackend"),
    FieldRule::mutable("spec.0.tls", "/spec/tls"),
    FieldRule::mutable("spec.0.rules", "/spec/rules"),
];

impl Kind for Ingress {
    type Object = networking::Ingress;
    const NAME: &'static str = "Ingress";
    const SCOPE: Scope = Scope::Namespaced;
    const UPDATE: UpdateMode = UpdateMode::Resubmit;

    fn expand(tree: &ConfigTree) -> Result<Self::Object> {
        let root = Fields::root(tree)?;
        Ok(networking::Ingress {
            metadata: expand_object_metadata(&root)?,
            spec: Some(expand_ingress_spec(&root.required_block("spec")?)?),
            status: None,
        })
    }

    fn flatten(obj: &Self::Object) -> ConfigTree {
        with_metadata(&obj.metadata).block("spec", obj.spec.as_ref().map(flatten_ingress_spec)).into_map()
    }

    fn field_plan() -> &'static [FieldRule] { &INGRESS_PLAN }
}

pub struct Role;

static ROLE_PLAN: [FieldRule; 3] = [LABELS, ANNOTATIONS, FieldRule::mutable("rule", "/rules")];

impl Kind for Role {
    type Object = rbac_v1::Role;
    const NAME: &'static str = "Role";
    const SCOPE: Scope = Scope::Namespaced;
    const UPDATE: UpdateMode = UpdateMode::JsonPatch;

    fn expand(tree: &ConfigTree) -> Result<Self::Object> {
        let root = Fields::root(tree)?;
        Ok(rbac_v1::Role { metadata: expand_object_metadata(&root)?, rules: expand_rules(&root)? })
    }

    fn flatten(obj: &Self::Object) -> ConfigTree {
        with_metadata(&obj.metadata).put("rule", flatten_rules(obj.rules.as_ref())).into_map()
    }

    fn field_plan() -> &'static [FieldRule] { &ROLE_PLAN }
}

pub struct ClusterRole;

static CLUSTER_ROLE_PLAN: [FieldRule; 4] = [
    LABELS,
    ANNOTATIONS,
    FieldRule::mutable("rule", "/rules").owned_by("/aggregationRule"),
    FieldRule::mutable("aggregation_rule", "/aggregationRule"),
];

impl Kind for ClusterRole {
    type Object = rbac_v1::ClusterRole;
    const NAME: &'static str = "ClusterRole";
    const SCOPE: Scope = Scope::Cluster;
    const UPDATE: UpdateMode = UpdateMode::JsonPatch;

    fn expand(tree: &ConfigTree) -> Result<Self::Object> {
        let root = Fields::root(tree)?;
        Ok(rbac_v1::ClusterRole {
            metadata: expand_object_metadata(&root)?,
            rules: expand_rules(&root)?,
            aggregation_rule: root.block("aggregation_rule")?.map(|a| expand_aggregation_rule(&a)).transpose()?,
        })
    }

    fn flatten(obj: &Self::Object) -> ConfigTree {
        with_metadata(&obj.metadata)
            .put("rule", flatten_rules(obj.rules.as_ref()))
            .block("aggregation_rule", obj.aggregation_rule.as_ref().map(flatten_aggregation_rule))
            .into_map()
    }

    fn field_plan() -> &'static [FieldRule] { &CLUSTER_ROLE_PLAN }
}

static BINDING_PLAN: [FieldRule; 4] = [
    LABELS,
    ANNOTATIONS,
    FieldRule::force_new("role_ref", "/roleRef"),
    FieldRule::mutable("subject", "/subjects").computed(),
];

pub struct RoleBinding;

impl Kind for RoleBinding {
    type Object = rbac_v1::RoleBinding;
    const NAME: &'static str = "RoleBinding";
    const SCOPE: Scope = Scope::Namespaced;
    const UPDATE: UpdateMode = UpdateMode::JsonPatch;

    fn expand(tree: &ConfigTree) -> Result<Self::Object> {
        let root = Fields::root(tree)?;
        Ok(rbac_v1::RoleBinding {
            metadata: expand_object_metadata(&root)?,
            role_ref: expand_role_ref(&root.required_block("role_ref")?)?,
            subjects: expand_subjects(&root)?,
        })
    }

    fn flatten(obj: &Self::Object) -> ConfigTree {
        with_metadata(&obj.metadata)
            .block("role_ref", Some(flatten_role_ref(&obj.role_ref)))
            .put("subject", flatten_subjects(obj.subjects.as_ref()))
            .into_map()
    }

    fn field_plan() -> &'static [FieldRule] { &BINDING_PLAN }
}

pub struct ClusterRoleBinding;

impl Kind for ClusterRoleBinding {
    type Object = rbac_v1::ClusterRoleBinding;
    const NAME: &'static str = "ClusterRoleBinding";
    const SCOPE: Scope = Scope::Cluster;
    const UPDATE: UpdateMode = UpdateMode::JsonPatch;

    fn expand(tree: &ConfigTree) -> Result<Self::Object> {
        let root = Fields::root(tree)?;
        Ok(rbac_v1::ClusterRoleBinding {
            metadata: expand_object_metadata(&root)?,
            role_ref: expand_role_ref(&root.required_block("role_ref")?)?,
            subjects: expand_subjects(&root)?,
        })
    }

    fn flatten(obj: &Self::Object) -> ConfigTree {
        with_metadata(&obj.metadata)
            .block("role_ref", Some(flatten_role_ref(&obj.role_ref)))
            .put("subject", flatten_subjects(obj.subjects.as_ref()))
            .into_map()
    }

    fn field_plan() -> &'static [FieldRule] { &BINDING_PLAN }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubeform_core::ReconcileError;

    fn metadata(name: &str) -> ConfigTree {
        ConfigTree::block([
            ("name", ConfigTree::str(name)),
            ("namespace", ConfigTree::str("apps")),
            ("labels", ConfigTree::map([("app", ConfigTree::str(name))])),
        ])
    }

    fn template(image: &str) -> ConfigTree {
        ConfigTree::block([
            ("metadata", ConfigTree::block([("labels", ConfigTree::map([("app", ConfigTree::str("web"))]))])),
            (
                "spec",
                ConfigTree::block([(
                    "containers",
                    ConfigTree::list([ConfigTree::map([("name", ConfigTree::str("web")), ("image", ConfigTree::str(image))])]),
                )]),
            ),
        ])
    }

    fn selector() -> ConfigTree {
        ConfigTree::block([("match_labels", ConfigTree::map([("app", ConfigTree::str("web"))]))])
    }

    fn assert_round_trip<K: Kind>(tree: ConfigTree) {
        let obj = K::expand(&tree).expect("expand");
        assert_eq!(K::flatten(&obj), tree, "{} round trip", K::NAME);
    }

    #[test]
    fn deployment_round_trips() {
        assert_round_trip::<Deployment>(ConfigTree::map([
            ("metadata", metadata("web")),
            (
                "spec",
                ConfigTree::block([
                    ("replicas", ConfigTree::Int(0)),
                    ("selector", selector()),
                    ("template", template("nginx:1.25")),
                    (
                        "strategy",
                        ConfigTree::block([
                            ("type", ConfigTree::str("RollingUpdate")),
                            (
                                "rolling_update",
                                ConfigTree::block([("max_surge", ConfigTree::str("25%")), ("max_unavailable", ConfigTree::str("1"))]),
                            ),
                        ]),
                    ),
                    ("paused", ConfigTree::Bool(false)),
                ]),
            ),
        ]));
    }

    #[test]
    fn statefulset_round_trips() {
        assert_round_trip::<StatefulSet>(ConfigTree::map([
            ("metadata", metadata("db")),
            (
                "spec",
                ConfigTree::block([
                    ("replicas", ConfigTree::Int(3)),
                    ("selector", selector()),
                    ("service_name", ConfigTree::str("db")),
                    ("template", template("postgres:16")),
                    (
                        "volume_claim_template",
                        ConfigTree::list([ConfigTree::map([
                            ("metadata", ConfigTree::block([("name", ConfigTree::str("data"))])),
                            ("spec", ConfigTree::block([("access_modes", ConfigTree::set(["ReadWriteOnce"]))])),
                        ])]),
                    ),
                    ("pod_management_policy", ConfigTree::str("Parallel")),
                    (
                        "update_strategy",
                        ConfigTree::block([
                            ("type", ConfigTree::str("RollingUpdate")),
                            ("rolling_update", ConfigTree::block([("partition", ConfigTree::Int(1))])),
                        ]),
                    ),
                ]),
            ),
        ]));
    }

    #[test]
    fn daemonset_round_trips() {
        assert_round_trip::<DaemonSet>(ConfigTree::map([
            ("metadata", metadata("agent")),
            (
                "spec",
                ConfigTree::block([
                    ("selector", selector()),
                    ("template", template("agent:2")),
                    ("update_strategy", ConfigTree::block([("type", ConfigTree::str("OnDelete"))])),
                    ("revision_history_limit", ConfigTree::Int(5)),
                ]),
            ),
        ]));
    }

    #[test]
    fn cronjob_round_trips() {
        assert_round_trip::<CronJob>(ConfigTree::map([
            ("metadata", metadata("backup")),
            (
                "spec",
                ConfigTree::block([
                    ("schedule", ConfigTree::str("*/5 * * * *")),
                    ("concurrency_policy", ConfigTree::str("Forbid")),
                    ("suspend", ConfigTree::Bool(true)),
                    ("starting_deadline_seconds", ConfigTree::Int(60)),
                    (
                        "job_template",
                        ConfigTree::block([(
                            "spec",
                            ConfigTree::block([("backoff_limit", ConfigTree::Int(2)), ("template", template("backup:1"))]),
                        )]),
                    ),
                ]),
            ),
        ]));
    }

    #[test]
    fn ingress_round_trips() {
        assert_round_trip::<Ingress>(ConfigTree::map([
            ("metadata", metadata("edge")),
            (
                "spec",
                ConfigTree::block([
                    (
                        "backend",
                        ConfigTree::block([("service_name", ConfigTree::str("web")), ("service_port", ConfigTree::str("http"))]),
                    ),
                    ("tls", ConfigTree::list([ConfigTree::map([("secret_name", ConfigTree::str("cert"))])])),
                ]),
            ),
        ]));
    }

    fn rules() -> ConfigTree {
        ConfigTree::list([
            ConfigTree::map([
                ("api_groups", ConfigTree::set([""])),
                ("resources", ConfigTree::set(["pods", "services"])),
                ("verbs", ConfigTree::set(["get", "list", "watch"])),
            ]),
            ConfigTree::map([("non_resource_urls", ConfigTree::set(["/healthz"])), ("verbs", ConfigTree::set(["get"]))]),
        ])
    }

    #[test]
    fn roles_round_trip() {
        assert_round_trip::<Role>(ConfigTree::map([("metadata", metadata("reader")), ("rule", rules())]));
        assert_round_trip::<ClusterRole>(ConfigTree::map([
            ("metadata", ConfigTree::block([("name", ConfigTree::str("aggregate"))])),
            (
                "aggregation_rule",
                ConfigTree::block([(
                    "cluster_role_selectors",
                    ConfigTree::list([ConfigTree::map([("match_labels", ConfigTree::map([("rbac", ConfigTree::str("true"))]))])]),
                )]),
            ),
        ]));
    }

    #[test]
    fn bindings_round_trip() {
        let role_ref = ConfigTree::block([
            ("api_group", ConfigTree::str("rbac.authorization.k8s.io")),
            ("kind", ConfigTree::str("ClusterRole")),
            ("name", ConfigTree::str("reader")),
        ]);
        let subjects = ConfigTree::list([
            ConfigTree::map([("kind", ConfigTree::str("ServiceAccount")), ("name", ConfigTree::str("ci")), ("namespace", ConfigTree::str("apps"))]),
            ConfigTree::map([
                ("kind", ConfigTree::str("User")),
                ("name", ConfigTree::str("jane")),
                ("api_group", ConfigTree::str("rbac.authorization.k8s.io")),
            ]),
        ]);
        assert_round_trip::<RoleBinding>(ConfigTree::map([
            ("metadata", metadata("ci-reader")),
            ("role_ref", role_ref.clone()),
            ("subject", subjects.clone()),
        ]));
        assert_round_trip::<ClusterRoleBinding>(ConfigTree::map([
            ("metadata", ConfigTree::block([("name", ConfigTree::str("ci-reader"))])),
            ("role_ref", role_ref),
            ("subject", subjects),
        ]));
    }

    #[test]
    fn omitted_optional_blocks_expand_to_absent_fields() {
        let tree = ConfigTree::map([
            ("metadata", ConfigTree::block([("name", ConfigTree::str("web"))])),
            ("spec", ConfigTree::block([("selector", selector()), ("template", template("nginx")), ("strategy", ConfigTree::List(vec![]))])),
        ]);
        let obj = Deployment::expand(&tree).expect("expand");
        let spec = obj.spec.as_ref().expect("spec");
        assert_eq!(spec.replicas, None);
        assert_eq!(spec.strategy, None);
        assert_eq!(spec.paused, None);
        assert_eq!(obj.metadata.namespace, None);
        assert_eq!(obj.metadata.labels, None);

        let role = Role::expand(&ConfigTree::map([("metadata", ConfigTree::block([("name", ConfigTree::str("r"))]))])).expect("expand");
        assert_eq!(role.rules, None);
        let ing = Ingress::expand(&ConfigTree::map([
            ("metadata", ConfigTree::block([("name", ConfigTree::str("i"))])),
            ("spec", ConfigTree::block(Vec::<(&str, ConfigTree)>::new())),
        ]))
        .expect("expand");
        let spec = ing.spec.as_ref().expect("spec");
        assert!(spec.rules.is_none() && spec.tls.is_none() && spec.default_backend.is_none());
    }

    #[test]
    fn missing_required_block_is_a_validation_error() {
        let tree = ConfigTree::map([("metadata", ConfigTree::block([("name", ConfigTree::str("web"))]))]);
        let err = Deployment::expand(&tree).unwrap_err();
        assert!(matches!(err, ReconcileError::Validation(_)), "err={:?}", err);
        assert!(err.to_string().contains("spec: required block missing"));

        let err = RoleBinding::expand(&tree).unwrap_err();
        assert!(err.to_string().contains("role_ref: required block missing"), "err={}", err);
    }

    #[test]
    fn replica_readiness_defaults() {
        let tree = ConfigTree::map([
            ("metadata", ConfigTree::block([("name", ConfigTree::str("web"))])),
            ("spec", ConfigTree::block([("selector", selector()), ("template", template("nginx"))])),
        ]);
        let obj = Deployment::expand(&tree).expect("expand");
        assert_eq!(Deployment::readiness(&obj), Some(ReadyCounter { target: 1, ready: 0 }));
        assert_eq!(Role::readiness(&Role::expand(&ConfigTree::map([("metadata", ConfigTree::block([("name", ConfigTree::str("r"))]))])).expect("expand")), None);
    }

    #[test]
    fn plans_declare_force_new_fields() {
        let force_new = |plan: &[FieldRule]| plan.iter().filter(|r| r.is_force_new()).map(|r| r.name).collect::<Vec<_>>();
        assert_eq!(force_new(Deployment::field_plan()), vec!["spec.0.selector"]);
        assert_eq!(
            force_new(StatefulSet::field_plan()),
            vec!["spec.0.selector", "spec.0.service_name", "spec.0.volume_claim_template", "spec.0.pod_management_policy"]
        );
        assert_eq!(force_new(RoleBinding::field_plan()), vec!["role_ref"]);
        assert!(force_new(CronJob::field_plan()).is_empty());
    }
}
