//! [`Combination`]: the intermediate join record produced by the dependency
//! combiner and consumed by a Virtual component's rules.

use std::collections::BTreeMap;

use combind_key::Key;

use crate::search_box::SearchBox;

/// For a point in the Cartesian product of a Virtual component's
/// dependencies: the contributing [`SearchBox`] per dependency type, and the
/// deduplicated unification of their matches.
#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    /// Dependency type name → the `SearchBox` from that dependency
    /// contributing to this combination.
    pub types: BTreeMap<String, SearchBox>,
    /// Deduplicated unification of the contributing boxes' matches.
    pub matches: Vec<Key>,
}

impl Combination {
    /// Builds a combination from its parts, without deduplicating `matches`
    /// (callers are expected to hand over already-merged, already-deduped
    /// match lists from [`combind_key::merge_list`]).
    pub fn new(types: BTreeMap<String, SearchBox>, matches: Vec<Key>) -> Self {
        Self { types, matches }
    }
}
