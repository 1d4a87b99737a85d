//! The key algebra: unifiable mappings over named dimensions.
//!
//! A [`Key`] binds [`Dimension`]s to non-empty string values. Two keys are
//! compatible when every dimension bound in both agrees; their unification is
//! the union of their bindings. This module provides the primitive
//! operations used by the dependency combiner and the virtual-component
//! build pipeline: [`unify`], [`merge_list`], [`intersect_list`], [`dedup`].
//!
//! Keys are stored in a sorted map internally so the canonical
//! `(dimension, value)` sequence falls out of iteration order for free, and
//! construction always drops empty-string values: a dimension present with
//! an empty value is equivalent to absent.

mod hash;

pub use hash::{canonical_hash, KeyHash};

use std::collections::BTreeMap;
use std::fmt;

/// A named axis of the domain.
pub type Dimension = String;

/// A mapping from [`Dimension`] to a non-empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct Key(BTreeMap<Dimension, String>);

impl Key {
    /// Builds a key from `(dimension, value)` pairs, dropping empty values.
    pub fn new<I, D, V>(bindings: I) -> Self
    where
        I: IntoIterator<Item = (D, V)>,
        D: Into<Dimension>,
        V: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (dim, val) in bindings {
            let val = val.into();
            if !val.is_empty() {
                map.insert(dim.into(), val);
            }
        }
        Key(map)
    }

    /// A key binding a single dimension, if the value is non-empty.
    pub fn singleton(dimension: impl Into<Dimension>, value: impl Into<String>) -> Self {
        Self::new([(dimension.into(), value.into())])
    }

    /// The empty key (arity zero).
    pub fn empty() -> Self {
        Key(BTreeMap::new())
    }

    /// Number of non-empty bindings (the key's arity).
    pub fn arity(&self) -> usize {
        self.0.len()
    }

    /// Whether this key has no bindings.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value bound to `dimension`, if any.
    pub fn get(&self, dimension: &str) -> Option<&str> {
        self.0.get(dimension).map(String::as_str)
    }

    /// The set of bound dimensions, in canonical (sorted) order.
    pub fn dimensions(&self) -> Vec<Dimension> {
        self.0.keys().cloned().collect()
    }

    /// Canonical `(dimension, value)` pairs, sorted by dimension.
    pub fn canonical_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(d, v)| (d.as_str(), v.as_str()))
    }

    /// Whether `self` and `other` are compatible: every dimension bound in
    /// both carries the same value.
    pub fn compatible_with(&self, other: &Key) -> bool {
        for (dim, val) in &self.0 {
            if let Some(other_val) = other.0.get(dim) {
                if other_val != val {
                    return false;
                }
            }
        }
        true
    }

    /// Whether `self` and `other` share at least one bound dimension with an
    /// equal, non-empty value — a *positive overlap*, used by
    /// [`intersect_list`].
    pub fn overlaps_with(&self, other: &Key) -> bool {
        for (dim, val) in &self.0 {
            if other.0.get(dim) == Some(val) {
                return true;
            }
        }
        false
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (dim, val) in &self.0 {
            if !first {
                write!(f, ";")?;
            }
            first = false;
            write!(f, "{dim}={val}")?;
        }
        Ok(())
    }
}

impl<D, V> FromIterator<(D, V)> for Key
where
    D: Into<Dimension>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (D, V)>>(iter: I) -> Self {
        Key::new(iter)
    }
}

/// Compatibility test plus union. Fails (returns `None`) iff some dimension
/// bound in both `a` and `b` differs.
///
/// Unification is commutative, associative, and idempotent. This
/// implementation performs a single-direction union; probing both
/// `unify(a, b)` and `unify(b, a)` is redundant once results are
/// deduplicated and is not reproduced here.
pub fn unify(a: &Key, b: &Key) -> Option<Key> {
    if !a.compatible_with(b) {
        return None;
    }
    let mut merged = a.0.clone();
    for (dim, val) in &b.0 {
        merged.insert(dim.clone(), val.clone());
    }
    Some(Key(merged))
}

/// Coalesces `keys` by canonical form, dropping duplicates.
pub fn dedup(keys: Vec<Key>) -> Vec<Key> {
    let mut seen = std::collections::HashSet::with_capacity(keys.len());
    keys.into_iter().filter(|k| seen.insert(k.clone())).collect()
}

/// Unifies every compatible pair `(a, b)` with `a` drawn from `lhs` and `b`
/// from `rhs`, then deduplicates.
///
/// Empty inputs produce empty outputs; incompatible pairs contribute
/// nothing.
pub fn merge_list(lhs: &[Key], rhs: &[Key]) -> Vec<Key> {
    use itertools::iproduct;
    let merged: Vec<Key> = iproduct!(lhs, rhs).filter_map(|(a, b)| unify(a, b)).collect();
    dedup(merged)
}

/// Like [`merge_list`], but a pair is only considered when it has a
/// *positive overlap* (shares at least one dimension with an equal,
/// non-empty value) — vacuous compatibility (no shared dimensions at all)
/// does not qualify.
///
/// Parallelized over `lhs` when the `parallel` feature is enabled, using one
/// task per left-hand element.
pub fn intersect_list(lhs: &[Key], rhs: &[Key]) -> Vec<Key> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        let merged: Vec<Key> = lhs
            .par_iter()
            .flat_map_iter(|a| {
                rhs.iter()
                    .filter(move |b| a.overlaps_with(b))
                    .filter_map(move |b| unify(a, b))
            })
            .collect();
        dedup(merged)
    }
    #[cfg(not(feature = "parallel"))]
    {
        use itertools::iproduct;
        let merged: Vec<Key> = iproduct!(lhs, rhs)
            .filter(|(a, b)| a.overlaps_with(b))
            .filter_map(|(a, b)| unify(a, b))
            .collect();
        dedup(merged)
    }
}

/// Hint: `true` iff the first key of each dependency's key-set contributes a
/// disjoint set of bound dimensions (no dimension appears twice). Callers
/// may use this to skip `intersect_list` in favor of `merge_list`; output
/// sets must be identical regardless.
pub fn mutually_exclusive<'a, I>(dependency_first_keys: I) -> bool
where
    I: IntoIterator<Item = &'a Key>,
{
    let mut seen = std::collections::HashSet::new();
    for key in dependency_first_keys {
        for dim in key.dimensions() {
            if !seen.insert(dim) {
                return false;
            }
        }
    }
    true
}
