//! Object metadata and label selectors, shared by every kind.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, LabelSelectorRequirement, ObjectMeta};
use kubeform_core::{ConfigTree, ReconcileError, Result};

use crate::fields::{Att, Fields};

/// Expand the configurable part of a metadata block.
///
/// Computed keys (`uid`, `resource_version`, `generation`, `self_link`) are read-only and
/// never sent to the store.
pub(crate) fn expand_metadata(m: &Fields<'_>) -> Result<ObjectMeta> {
    Ok(ObjectMeta {
        name: m.string("name")?,
        generate_name: m.string("generate_name")?,
        namespace: m.string("namespace")?,
        labels: m.string_map("labels")?,
        annotations: m.string_map("annotations")?,
        ..Default::default()
    })
}

/// Top-level object metadata: required, and must name the object one way or another.
pub(crate) fn expand_object_metadata(root: &Fields<'_>) -> Result<ObjectMeta> {
    let m = root.required_block("metadata")?;
    let meta = expand_metadata(&m)?;
    if meta.name.is_none() && meta.generate_name.is_none() {
        return Err(ReconcileError::validation(format!("{}: one of name or generate_name is required", m.path())));
    }
    Ok(meta)
}

pub(crate) fn flatten_metadata(meta: &ObjectMeta) -> ConfigTree {
    Att::new()
        .string("name", meta.name.as_ref())
        .string("generate_name", meta.generate_name.as_ref())
        .string("namespace", meta.namespace.as_ref())
        .string_map("labels", meta.labels.as_ref())
        .string_map("annotations", meta.annotations.as_ref())
        .string("uid", meta.uid.as_ref())
        .string("resource_version", meta.resource_version.as_ref())
        .int("generation", meta.generation)
        .string("self_link", meta.self_link.as_ref())
        .into_block()
}

pub(crate) fn expand_label_selector(s: &Fields<'_>) -> Result<LabelSelector> {
    let match_expressions = match s.blocks("match_expressions")? {
        None => None,
        Some(items) => Some(
            items
                .iter()
                .map(|e| {
                    Ok(LabelSelectorRequirement {
                        key: e.required_string("key")?,
                        operator: e.required_string("operator")?,
                        values: e.strings("values")?,
                    })
                })
                .collect::<Result<Vec<_>>>()?,
        ),
    };
    Ok(LabelSelector { match_labels: s.string_map("match_labels")?, match_expressions })
}

pub(crate) fn flatten_label_selector(s: &LabelSelector) -> ConfigTree {
    ConfigTree::List(vec![flatten_label_selector_map(s)])
}

/// Selector as a bare map, for repeated selector lists.
pub(crate) fn flatten_label_selector_map(s: &LabelSelector) -> ConfigTree {
    let exprs = s.match_expressions.as_ref().map(|items| {
        items
            .iter()
            .map(|e| {
                Att::new()
                    .string("key", Some(&e.key))
                    .string("operator", Some(&e.operator))
                    .strings("values", e.values.as_ref())
                    .into_map()
            })
            .collect()
    });
    Att::new()
        .string_map("match_labels", s.match_labels.as_ref())
        .list("match_expressions", exprs)
        .into_map()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta_tree(entries: Vec<(&str, ConfigTree)>) -> ConfigTree {
        ConfigTree::map([("metadata", ConfigTree::block(entries))])
    }

    #[test]
    fn metadata_requires_a_name() {
        let t = meta_tree(vec![("namespace", ConfigTree::str("ns"))]);
        let err = expand_object_metadata(&Fields::root(&t).expect("root")).unwrap_err().to_string();
        assert!(err.contains("one of name or generate_name"), "err={}", err);

        let t = ConfigTree::default();
        let err = expand_object_metadata(&Fields::root(&t).expect("root")).unwrap_err().to_string();
        assert!(err.contains("metadata: required block missing"), "err={}", err);
    }

    #[test]
    fn computed_metadata_is_flattened_but_not_expanded() {
        let t = meta_tree(vec![("name", ConfigTree::str("web")), ("uid", ConfigTree::str("1234"))]);
        let meta = expand_object_metadata(&Fields::root(&t).expect("root")).expect("meta");
        assert_eq!(meta.name.as_deref(), Some("web"));
        assert_eq!(meta.uid, None);

        let live = ObjectMeta { name: Some("web".into()), uid: Some("1234".into()), generation: Some(2), ..Default::default() };
        let flat = flatten_metadata(&live);
        assert_eq!(flat.lookup("0.uid"), Some(&ConfigTree::str("1234")));
        assert_eq!(flat.lookup("0.generation"), Some(&ConfigTree::Int(2)));
        assert_eq!(flat.lookup("0.labels"), None);
    }

    #[test]
    fn selector_round_trips() {
        let sel = ConfigTree::block([
            ("match_labels", ConfigTree::map([("app", ConfigTree::str("web"))])),
            (
                "match_expressions",
                ConfigTree::list([ConfigTree::map([
                    ("key", ConfigTree::str("tier")),
                    ("operator", ConfigTree::str("In")),
                    ("values", ConfigTree::strings(["fe", "be"])),
                ])]),
            ),
        ]);
        let root = ConfigTree::map([("selector", sel.clone())]);
        let f = Fields::root(&root).expect("root");
        let expanded = expand_label_selector(&f.required_block("selector").expect("block")).expect("expand");
        assert_eq!(flatten_label_selector(&expanded), sel);
    }
}
