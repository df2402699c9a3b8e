//! Per-kind field plans: which top-level fields may be patched in place.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldPolicy {
    Mutable,
    /// Any change requires destroying and recreating the object.
    ForceNew,
}

/// How a map-valued field is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyDiff {
    /// The value is compared and replaced as a whole.
    Whole,
    /// One operation per changed key, so keys written by others survive.
    PerKey,
    /// As `PerKey`, and prior keys under a `kubernetes.io` domain are never removed.
    PerKeyUnmanaged,
}

/// True for keys whose domain prefix is `kubernetes.io` or one of its subdomains.
pub fn is_server_managed(key: &str) -> bool {
    match key.split_once('/') {
        Some((domain, _)) => domain == "kubernetes.io" || domain.ends_with(".kubernetes.io"),
        None => false,
    }
}

/// One planned field.
///
/// `name` is the dotted configuration-tree path used for change detection; `pointer` is the
/// JSON pointer of the same field inside the serialized domain object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldRule {
    pub name: &'static str,
    pub pointer: &'static str,
    pub policy: FieldPolicy,
    /// Defaulted by the store: absence from the desired tree keeps the stored value.
    pub computed: bool,
    pub keys: KeyDiff,
    /// When the desired object sets this pointer, a controller owns the field and it is left alone.
    pub owner: Option<&'static str>,
}

impl FieldRule {
    pub const fn mutable(name: &'static str, pointer: &'static str) -> Self {
        Self { name, pointer, policy: FieldPolicy::Mutable, computed: false, keys: KeyDiff::Whole, owner: None }
    }

    pub const fn force_new(name: &'static str, pointer: &'static str) -> Self {
        Self { name, pointer, policy: FieldPolicy::ForceNew, computed: false, keys: KeyDiff::Whole, owner: None }
    }

    pub const fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub const fn per_key(mut self, keys: KeyDiff) -> Self {
        self.keys = keys;
        self
    }

    pub const fn owned_by(mut self, pointer: &'static str) -> Self {
        self.owner = Some(pointer);
        self
    }

    pub fn is_force_new(&self) -> bool { self.policy == FieldPolicy::ForceNew }
}

pub(crate) const LABELS: FieldRule = FieldRule::mutable("metadata.0.labels", "/metadata/labels").per_key(KeyDiff::PerKey);
pub(crate) const ANNOTATIONS: FieldRule =
    FieldRule::mutable("metadata.0.annotations", "/metadata/annotations").per_key(KeyDiff::PerKeyUnmanaged);
