//! Pod templates, containers and persistent volume claim templates.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, PersistentVolumeClaim, PersistentVolumeClaimSpec, PodSpec, PodTemplateSpec,
    ResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kubeform_core::{ConfigTree, ReconcileError, Result};

use crate::fields::{Att, Fields};
use crate::meta::{expand_metadata, flatten_metadata};

fn quantities(m: Option<BTreeMap<String, String>>) -> Option<BTreeMap<String, Quantity>> {
    m.map(|m| m.into_iter().map(|(k, v)| (k, Quantity(v))).collect())
}

fn quantity_strings(m: Option<&BTreeMap<String, Quantity>>) -> Option<BTreeMap<String, String>> {
    m.map(|m| m.iter().map(|(k, v)| (k.clone(), v.0.clone())).collect())
}

fn flatten_resources(limits: Option<&BTreeMap<String, Quantity>>, requests: Option<&BTreeMap<String, Quantity>>) -> ConfigTree {
    Att::new()
        .string_map("limits", quantity_strings(limits).as_ref())
        .string_map("requests", quantity_strings(requests).as_ref())
        .into_block()
}

fn expand_container(c: &Fields<'_>) -> Result<Container> {
    let env = c
        .blocks("env")?
        .map(|items| {
            items
                .iter()
                .map(|e| Ok(EnvVar { name: e.required_string("name")?, value: e.string("value")?, ..Default::default() }))
                .collect::<Result<Vec<_>>>()
        })
        .transpose()?;
    let ports = c
        .blocks("port")?
        .map(|items| {
            items
                .iter()
                .map(|p| {
                    Ok(ContainerPort {
                        container_port: p.required_int32("container_port")?,
                        name: p.string("name")?,
                        protocol: p.string("protocol")?,
                        ..Default::default()
                    })
                })
                .collect::<Result<Vec<_>>>()
        })
        .transpose()?;
    let resources = match c.block("resources")? {
        Some(r) => Some(ResourceRequirements {
            limits: quantities(r.string_map("limits")?),
            requests: quantities(r.string_map("requests")?),
            ..Default::default()
        }),
        None => None,
    };
    Ok(Container {
        name: c.required_string("name")?,
        image: c.string("image")?,
        command: c.strings("command")?,
        args: c.strings("args")?,
        working_dir: c.string("working_dir")?,
        image_pull_policy: c.string("image_pull_policy")?,
        env,
        ports,
        resources,
        ..Default::default()
    })
}

fn flatten_container(c: &Container) -> ConfigTree {
    let env = c.env.as_ref().map(|items| {
        items
            .iter()
            .map(|e| Att::new().string("name", Some(&e.name)).string("value", e.value.as_ref()).into_map())
            .collect()
    });
    let ports = c.ports.as_ref().map(|items| {
        items
            .iter()
            .map(|p| {
                Att::new()
                    .int("container_port", Some(p.container_port))
                    .string("name", p.name.as_ref())
                    .string("protocol", p.protocol.as_ref())
                    .into_map()
            })
            .collect()
    });
    Att::new()
        .string("name", Some(&c.name))
        .string("image", c.image.as_ref())
        .strings("command", c.command.as_ref())
        .strings("args", c.args.as_ref())
        .string("working_dir", c.working_dir.as_ref())
        .string("image_pull_policy", c.image_pull_policy.as_ref())
        .list("env", env)
        .list("port", ports)
        .block("resources", c.resources.as_ref().map(|r| flatten_resources(r.limits.as_ref(), r.requests.as_ref())))
        .into_map()
}

pub(crate) fn expand_pod_spec(s: &Fields<'_>) -> Result<PodSpec> {
    let containers = s
        .blocks("containers")?
        .map(|items| items.iter().map(expand_container).collect::<Result<Vec<_>>>())
        .transpose()?
        .ok_or_else(|| ReconcileError::validation(format!("{}.containers: required", s.path())))?;
    Ok(PodSpec {
        containers,
        service_account_name: s.string("service_account_name")?,
        node_selector: s.string_map("node_selector")?,
        restart_policy: s.string("restart_policy")?,
        termination_grace_period_seconds: s.int("termination_grace_period_seconds")?,
        hostname: s.string("hostname")?,
        subdomain: s.string("subdomain")?,
        active_deadline_seconds: s.int("active_deadline_seconds")?,
        priority_class_name: s.string("priority_class_name")?,
        ..Default::default()
    })
}

pub(crate) fn flatten_pod_spec(s: &PodSpec) -> ConfigTree {
    Att::new()
        .list("containers", Some(s.containers.iter().map(flatten_container).collect()))
        .string("service_account_name", s.service_account_name.as_ref())
        .string_map("node_selector", s.node_selector.as_ref())
        .string("restart_policy", s.restart_policy.as_ref())
        .int("termination_grace_period_seconds", s.termination_grace_period_seconds)
        .string("hostname", s.hostname.as_ref())
        .string("subdomain", s.subdomain.as_ref())
        .int("active_deadline_seconds", s.active_deadline_seconds)
        .string("priority_class_name", s.priority_class_name.as_ref())
        .into_block()
}

pub(crate) fn expand_pod_template(t: &Fields<'_>) -> Result<PodTemplateSpec> {
    Ok(PodTemplateSpec {
        metadata: t.block("metadata")?.map(|m| expand_metadata(&m)).transpose()?,
        spec: Some(expand_pod_spec(&t.required_block("spec")?)?),
    })
}

pub(crate) fn flatten_pod_template(t: &PodTemplateSpec) -> ConfigTree {
    Att::new()
        .block("metadata", t.metadata.as_ref().map(flatten_metadata))
        .block("spec", t.spec.as_ref().map(flatten_pod_spec))
        .into_block()
}

pub(crate) fn expand_claim_template(c: &Fields<'_>) -> Result<PersistentVolumeClaim> {
    let spec = match c.block("spec")? {
        None => None,
        Some(s) => {
            let mut spec = PersistentVolumeClaimSpec {
                access_modes: s.set("access_modes")?,
                storage_class_name: s.string("storage_class_name")?,
                volume_mode: s.string("volume_mode")?,
                ..Default::default()
            };
            if let Some(r) = s.block("resources")? {
                let res = spec.resources.get_or_insert_with(Default::default);
                res.limits = quantities(r.string_map("limits")?);
                res.requests = quantities(r.string_map("requests")?);
            }
            Some(spec)
        }
    };
    Ok(PersistentVolumeClaim {
        metadata: c.block("metadata")?.map(|m| expand_metadata(&m)).transpose()?.unwrap_or_default(),
        spec,
        ..Default::default()
    })
}

pub(crate) fn flatten_claim_template(c: &PersistentVolumeClaim) -> ConfigTree {
    let spec = c.spec.as_ref().map(|s| {
        Att::new()
            .set("access_modes", s.access_modes.as_ref())
            .string("storage_class_name", s.storage_class_name.as_ref())
            .string("volume_mode", s.volume_mode.as_ref())
            .block("resources", s.resources.as_ref().map(|r| flatten_resources(r.limits.as_ref(), r.requests.as_ref())))
            .into_block()
    });
    Att::new().block("metadata", Some(flatten_metadata(&c.metadata))).block("spec", spec).into_map()
}
