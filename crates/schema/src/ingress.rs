//! HTTP ingress (networking/v1).

use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, IngressBackend, IngressRule, IngressServiceBackend, IngressSpec, IngressTLS,
    ServiceBackendPort,
};
use kubeform_core::{ConfigTree, Result};

use crate::fields::{Att, Fields};

/// `service_port` is a string in the tree: a number selects the port by number, anything
/// else by name.
fn expand_backend(b: &Fields<'_>) -> Result<IngressBackend> {
    let port = b.string("service_port")?.map(|p| match p.parse::<i32>() {
        Ok(number) => ServiceBackendPort { number: Some(number), name: None },
        Err(_) => ServiceBackendPort { number: None, name: Some(p) },
    });
    Ok(IngressBackend {
        service: Some(IngressServiceBackend { name: b.required_string("service_name")?, port }),
        resource: None,
    })
}

fn flatten_backend(b: &IngressBackend) -> ConfigTree {
    let svc = b.service.as_ref();
    let port = svc.and_then(|s| s.port.as_ref()).and_then(|p| match (p.number, &p.name) {
        (Some(n), _) => Some(n.to_string()),
        (None, Some(name)) => Some(name.clone()),
        (None, None) => None,
    });
    Att::new()
        .string("service_name", svc.map(|s| &s.name))
        .string("service_port", port.as_ref())
        .into_block()
}

fn expand_rule(r: &Fields<'_>) -> Result<IngressRule> {
    let http = match r.block("http")? {
        None => None,
        Some(h) => {
            let paths = h
                .blocks("paths")?
                .unwrap_or_default()
                .iter()
                .map(|p| {
                    Ok(HTTPIngressPath {
                        path: p.string("path")?,
                        path_type: p.string("path_type")?.unwrap_or_else(|| "ImplementationSpecific".to_string()),
                        backend: expand_backend(&p.required_block("backend")?)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Some(HTTPIngressRuleValue { paths })
        }
    };
    Ok(IngressRule { host: r.string("host")?, http })
}

fn flatten_rule(r: &IngressRule) -> ConfigTree {
    let http = r.http.as_ref().map(|h| {
        let paths = h
            .paths
            .iter()
            .map(|p| {
                Att::new()
                    .string("path", p.path.as_ref())
                    .string("path_type", Some(&p.path_type))
                    .block("backend", Some(flatten_backend(&p.backend)))
                    .into_map()
            })
            .collect();
        Att::new().list("paths", Some(paths)).into_block()
    });
    Att::new().string("host", r.host.as_ref()).block("http", http).into_map()
}

pub(crate) fn expand_ingress_spec(s: &Fields<'_>) -> Result<IngressSpec> {
    let rules = s.blocks("rules")?.map(|items| items.iter().map(expand_rule).collect::<Result<Vec<_>>>()).transpose()?;
    let tls = s
        .blocks("tls")?
        .map(|items| {
            items
                .iter()
                .map(|t| Ok(IngressTLS { hosts: t.strings("hosts")?, secret_name: t.string("secret_name")? }))
                .collect::<Result<Vec<_>>>()
        })
        .transpose()?;
    Ok(IngressSpec {
        ingress_class_name: s.string("ingress_class_name")?,
        default_backend: s.block("backend")?.map(|b| expand_backend(&b)).transpose()?,
        rules,
        tls,
    })
}

pub(crate) fn flatten_ingress_spec(s: &IngressSpec) -> ConfigTree {
    let tls = s.tls.as_ref().map(|items| {
        items
            .iter()
            .map(|t| Att::new().strings("hosts", t.hosts.as_ref()).string("secret_name", t.secret_name.as_ref()).into_map())
            .collect()
    });
    Att::new()
        .string("ingress_class_name", s.ingress_class_name.as_ref())
        .block("backend", s.default_backend.as_ref().map(flatten_backend))
        .list("rules", s.rules.as_ref().map(|items| items.iter().map(flatten_rule).collect()))
        .list("tls", tls)
        .into_block()
}
