//! `Props`: the opaque, JSON-valued bag carried by every [`crate::SearchBox`]
//! and [`crate::BackendComponent`].

use std::collections::BTreeMap;

/// A mapping from string to opaque scalar or compound JSON value.
///
/// `BTreeMap` rather than `serde_json::Map` so two `Props` with the same
/// bindings compare and hash equal regardless of insertion order, which
/// `Build` idempotence (deep-equality of repeated builds) depends on.
pub type Props = BTreeMap<String, serde_json::Value>;

/// Merges `overlay` on top of `base`, right-hand (`overlay`) winning on key
/// conflicts. Used for both the Root `{"name": ...}` merge and the Virtual
/// component-props merge into each emitted `SearchBox`.
pub fn merge_props(base: &Props, overlay: &Props) -> Props {
    let mut merged = base.clone();
    for (key, value) in overlay {
        merged.insert(key.clone(), value.clone());
    }
    merged
}
