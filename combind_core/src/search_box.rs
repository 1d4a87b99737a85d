//! The persisted unit ([`SearchBox`]) and its external-record counterpart
//! ([`BackendComponent`]).

use combind_key::{canonical_hash, dedup, Key, KeyHash};

use crate::props::Props;

/// A record read from the component store by a Root component.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BackendComponent {
    /// Stable identifier within `type_`, becomes a Root's `SearchBox::key`.
    pub code: String,
    /// Owning component type name.
    pub r#type: String,
    /// Short display name; seeds `Props::name`.
    pub name: String,
    /// Long display name.
    pub long_name: String,
    /// Arbitrary extra properties carried through to the built `SearchBox`.
    pub props: Props,
}

/// The unit of output produced by every component's `Build`.
///
/// One `SearchBox` exists per (`type`, `key`) pair within a build; it is
/// flattened into one persisted document per entry of `matches` at save
/// time (one document per `(type, key, match)`, id `type_key_hash(match)`).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SearchBox {
    /// Owning component's type name.
    pub r#type: String,
    /// Human identifier within the type: a rule's bucket name for Virtual
    /// output, or the backend record's code for Root output.
    pub key: String,
    /// Opaque properties, merged right-wins from component-level props.
    pub props: Props,
    /// Deduplicated (by canonical form) multiset of unified keys.
    pub matches: Vec<Key>,
}

impl SearchBox {
    /// Builds a new box and deduplicates its initial matches.
    pub fn new(r#type: impl Into<String>, key: impl Into<String>, props: Props, matches: Vec<Key>) -> Self {
        Self {
            r#type: r#type.into(),
            key: key.into(),
            props,
            matches: dedup(matches),
        }
    }

    /// Appends `new_matches` and re-deduplicates.
    pub fn append_matches(&mut self, new_matches: impl IntoIterator<Item = Key>) {
        self.matches.extend(new_matches);
        self.matches = dedup(std::mem::take(&mut self.matches));
    }

    /// The flattened per-match documents this box expands into at persist
    /// time.
    pub fn documents(&self) -> Vec<Document> {
        self.matches
            .iter()
            .map(|m| Document::new(&self.r#type, &self.key, self.props.clone(), m.clone()))
            .collect()
    }
}

/// A single persisted document: one per (`type`, `key`, `match`).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Document {
    /// Document id: `{type}_{key}_{hash_match}`.
    pub id: String,
    /// Owning `SearchBox`'s key.
    pub key: String,
    /// Owning `SearchBox`'s type.
    pub r#type: String,
    /// Owning `SearchBox`'s props, copied onto every one of its documents.
    pub props: Props,
    /// The individual match this document represents.
    pub r#match: Key,
    /// Canonical hash of `match`.
    pub hash_match: KeyHash,
}

impl Document {
    /// Builds a document, computing `id` and `hash_match` from `key_match`.
    pub fn new(r#type: impl Into<String>, key: impl Into<String>, props: Props, key_match: Key) -> Self {
        let r#type = r#type.into();
        let key = key.into();
        let hash_match = canonical_hash(&key_match);
        let id = format!("{type}_{key}_{hash_match}");
        Self {
            id,
            key,
            r#type,
            props,
            r#match: key_match,
            hash_match,
        }
    }
}
