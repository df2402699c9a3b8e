//! RBAC policy rules, role references and subjects (rbac.authorization.k8s.io/v1).

use k8s_openapi::api::rbac::v1::{AggregationRule, PolicyRule, RoleRef, Subject};
use kubeform_core::{ConfigTree, Result};

use crate::fields::{Att, Fields};
use crate::meta::{expand_label_selector, flatten_label_selector_map};

fn expand_rule(r: &Fields<'_>) -> Result<PolicyRule> {
    Ok(PolicyRule {
        api_groups: r.set("api_groups")?,
        resources: r.set("resources")?,
        resource_names: r.set("resource_names")?,
        non_resource_urls: r.set("non_resource_urls")?,
        verbs: r.required_set("verbs")?,
    })
}

fn flatten_rule(r: &PolicyRule) -> ConfigTree {
    Att::new()
        .set("api_groups", r.api_groups.as_ref())
        .set("resources", r.resources.as_ref())
        .set("resource_names", r.resource_names.as_ref())
        .set("non_resource_urls", r.non_resource_urls.as_ref())
        .set("verbs", Some(&r.verbs))
        .into_map()
}

/// Rules are ordered; the permissions inside each rule are sets.
pub(crate) fn expand_rules(root: &Fields<'_>) -> Result<Option<Vec<PolicyRule>>> {
    root.blocks("rule")?.map(|items| items.iter().map(expand_rule).collect::<Result<Vec<_>>>()).transpose()
}

pub(crate) fn flatten_rules(rules: Option<&Vec<PolicyRule>>) -> Option<ConfigTree> {
    rules.map(|items| ConfigTree::List(items.iter().map(flatten_rule).collect()))
}

pub(crate) fn expand_aggregation_rule(a: &Fields<'_>) -> Result<AggregationRule> {
    let cluster_role_selectors = a
        .blocks("cluster_role_selectors")?
        .map(|items| items.iter().map(expand_label_selector).collect::<Result<Vec<_>>>())
        .transpose()?;
    Ok(AggregationRule { cluster_role_selectors })
}

pub(crate) fn flatten_aggregation_rule(a: &AggregationRule) -> ConfigTree {
    let selectors = a.cluster_role_selectors.as_ref().map(|items| items.iter().map(flatten_label_selector_map).collect());
    Att::new().list("cluster_role_selectors", selectors).into_block()
}

pub(crate) fn expand_role_ref(r: &Fields<'_>) -> Result<RoleRef> {
    Ok(RoleRef {
        api_group: r.string("api_group")?.unwrap_or_else(|| "rbac.authorization.k8s.io".to_string()),
        kind: r.required_string("kind")?,
        name: r.required_string("name")?,
    })
}

pub(crate) fn flatten_role_ref(r: &RoleRef) -> ConfigTree {
    Att::new()
        .string("api_group", Some(&r.api_group))
        .string("kind", Some(&r.kind))
        .string("name", Some(&r.name))
        .into_block()
}

pub(crate) fn expand_subjects(root: &Fields<'_>) -> Result<Option<Vec<Subject>>> {
    root.blocks("subject")?
        .map(|items| {
            items
                .iter()
                .map(|s| {
                    Ok(Subject {
                        kind: s.required_string("kind")?,
                        name: s.required_string("name")?,
                        namespace: s.string("namespace")?,
                        api_group: s.string("api_group")?,
                    })
                })
                .collect::<Result<Vec<_>>>()
        })
        .transpose()
}

pub(crate) fn flatten_subjects(subjects: Option<&Vec<Subject>>) -> Option<ConfigTree> {
    subjects.map(|items| {
        ConfigTree::List(
            items
                .iter()
                .map(|s| {
                    Att::new()
                        .string("kind", Some(&s.kind))
                        .string("name", Some(&s.name))
                        .string("namespace", s.namespace.as_ref())
                        .string("api_group", s.api_group.as_ref())
                        .into_map()
                })
                .collect(),
        )
    })
}
