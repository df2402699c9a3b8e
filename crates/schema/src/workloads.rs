//! Replica-scaled and per-node workloads (apps/v1).

use k8s_openapi::api::apps::v1::{
    DaemonSetSpec, DaemonSetUpdateStrategy, DeploymentSpec, DeploymentStrategy, RollingUpdateDaemonSet,
    RollingUpdateDeployment, RollingUpdateStatefulSetStrategy, StatefulSetSpec, StatefulSetUpdateStrategy,
};
use kubeform_core::{ConfigTree, Result};

use crate::fields::{Att, Fields};
use crate::meta::{expand_label_selector, flatten_label_selector};
use crate::pod::{expand_claim_template, expand_pod_template, flatten_claim_template, flatten_pod_template};

fn expand_deployment_strategy(s: &Fields<'_>) -> Result<DeploymentStrategy> {
    let rolling_update = match s.block("rolling_update")? {
        Some(r) => Some(RollingUpdateDeployment {
            max_surge: r.int_or_string("max_surge")?,
            max_unavailable: r.int_or_string("max_unavailable")?,
        }),
        None => None,
    };
    Ok(DeploymentStrategy { type_: s.string("type")?, rolling_update })
}

fn flatten_deployment_strategy(s: &DeploymentStrategy) -> ConfigTree {
    let rolling = s.rolling_update.as_ref().map(|r| {
        Att::new()
            .int_or_string("max_surge", r.max_surge.as_ref())
            .int_or_string("max_unavailable", r.max_unavailable.as_ref())
            .into_block()
    });
    Att::new().string("type", s.type_.as_ref()).block("rolling_update", rolling).into_block()
}

pub(crate) fn expand_deployment_spec(s: &Fields<'_>) -> Result<DeploymentSpec> {
    Ok(DeploymentSpec {
        replicas: s.int32("replicas")?,
        selector: expand_label_selector(&s.required_block("selector")?)?,
        template: expand_pod_template(&s.required_block("template")?)?,
        strategy: s.block("strategy")?.map(|b| expand_deployment_strategy(&b)).transpose()?,
        min_ready_seconds: s.int32("min_ready_seconds")?,
        revision_history_limit: s.int32("revision_history_limit")?,
        progress_deadline_seconds: s.int32("progress_deadline_seconds")?,
        paused: s.boolean("paused")?,
    })
}

pub(crate) fn flatten_deployment_spec(s: &DeploymentSpec) -> ConfigTree {
    Att::new()
        .int("replicas", s.replicas)
        .block("selector", Some(flatten_label_selector(&s.selector)))
        .block("template", Some(flatten_pod_template(&s.template)))
        .block("strategy", s.strategy.as_ref().map(flatten_deployment_strategy))
        .int("min_ready_seconds", s.min_ready_seconds)
        .int("revision_history_limit", s.revision_history_limit)
        .int("progress_deadline_seconds", s.progress_deadline_seconds)
        .boolean("paused", s.paused)
        .into_block()
}

fn expand_statefulset_strategy(s: &Fields<'_>) -> Result<StatefulSetUpdateStrategy> {
    let rolling_update = match s.block("rolling_update")? {
        Some(r) => Some(RollingUpdateStatefulSetStrategy {
            partition: r.int32("partition")?,
            max_unavailable: r.int_or_string("max_unavailable")?,
        }),
        None => None,
    };
    Ok(StatefulSetUpdateStrategy { type_: s.string("type")?, rolling_update })
}

fn flatten_statefulset_strategy(s: &StatefulSetUpdateStrategy) -> ConfigTree {
    let rolling = s.rolling_update.as_ref().map(|r| {
        Att::new()
            .int("partition", r.partition)
            .int_or_string("max_unavailable", r.max_unavailable.as_ref())
            .into_block()
    });
    Att::new().string("type", s.type_.as_ref()).block("rolling_update", rolling).into_block()
}

pub(crate) fn expand_statefulset_spec(s: &Fields<'_>) -> Result<StatefulSetSpec> {
    let volume_claim_templates = s
        .blocks("volume_claim_template")?
        .map(|items| items.iter().map(expand_claim_template).collect::<Result<Vec<_>>>())
        .transpose()?;
    Ok(StatefulSetSpec {
        replicas: s.int32("replicas")?,
        selector: expand_label_selector(&s.required_block("selector")?)?,
        service_name: s.required_string("service_name")?,
        template: expand_pod_template(&s.required_block("template")?)?,
        volume_claim_templates,
        update_strategy: s.block("update_strategy")?.map(|b| expand_statefulset_strategy(&b)).transpose()?,
        pod_management_policy: s.string("pod_management_policy")?,
        revision_history_limit: s.int32("revision_history_limit")?,
        min_ready_seconds: s.int32("min_ready_seconds")?,
        ..Default::default()
    })
}

pub(crate) fn flatten_statefulset_spec(s: &StatefulSetSpec) -> ConfigTree {
    let claims = s.volume_claim_templates.as_ref().map(|items| items.iter().map(flatten_claim_template).collect());
    Att::new()
        .int("replicas", s.replicas)
        .block("selector", Some(flatten_label_selector(&s.selector)))
        .string("service_name", Some(&s.service_name))
        .block("template", Some(flatten_pod_template(&s.template)))
        .list("volume_claim_template", claims)
        .block("update_strategy", s.update_strategy.as_ref().map(flatten_statefulset_strategy))
        .string("pod_management_policy", s.pod_management_policy.as_ref())
        .int("revision_history_limit", s.revision_history_limit)
        .int("min_ready_seconds", s.min_ready_seconds)
        .into_block()
}

fn expand_daemonset_strategy(s: &Fields<'_>) -> Result<DaemonSetUpdateStrategy> {
    let rolling_update = match s.block("rolling_update")? {
        Some(r) => Some(RollingUpdateDaemonSet {
            max_surge: r.int_or_string("max_surge")?,
            max_unavailable: r.int_or_string("max_unavailable")?,
        }),
        None => None,
    };
    Ok(DaemonSetUpdateStrategy { type_: s.string("type")?, rolling_update })
}

fn flatten_daemonset_strategy(s: &DaemonSetUpdateStrategy) -> ConfigTree {
    let rolling = s.rolling_update.as_ref().map(|r| {
        Att::new()
            .int_or_string("max_surge", r.max_surge.as_ref())
            .int_or_string("max_unavailable", r.max_unavailable.as_ref())
            .into_block()
    });
    Att::new().string("type", s.type_.as_ref()).block("rolling_update", rolling).into_block()
}

pub(crate) fn expand_daemonset_spec(s: &Fields<'_>) -> Result<DaemonSetSpec> {
    Ok(DaemonSetSpec {
        selector: expand_label_selector(&s.required_block("selector")?)?,
        template: expand_pod_template(&s.required_block("template")?)?,
        update_strategy: s.block("update_strategy")?.map(|b| expand_daemonset_strategy(&b)).transpose()?,
        min_ready_seconds: s.int32("min_ready_seconds")?,
        revision_history_limit: s.int32("revision_history_limit")?,
    })
}

pub(crate) fn flatten_daemonset_spec(s: &DaemonSetSpec) -> ConfigTree {
    Att::new()
        .block("selector", Some(flatten_label_selector(&s.selector)))
        .block("template", Some(flatten_pod_template(&s.template)))
        .block("update_strategy", s.update_strategy.as_ref().map(flatten_daemonset_strategy))
        .int("min_ready_seconds", s.min_ready_seconds)
        .int("revision_history_limit", s.revision_history_limit)
        .into_block()
}
