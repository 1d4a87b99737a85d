//! External collaborator contracts: the component store a Root component
//! reads backend records from, and the search-box store a Coordinator
//! persists built output to.
//!
//! Only the contracts live here — concrete drivers (an in-memory stand-in,
//! or a real search-engine client) are provided by `combind_store`, which
//! depends on this crate rather than the other way around.

use crate::error::CombindError;
use crate::props::Props;
use crate::search_box::{BackendComponent, SearchBox};

/// Storage of [`BackendComponent`] records, read by Root components and
/// written by whatever ingestion process owns the business domain's master
/// data.
pub trait ComponentStore: Send + Sync {
    /// All backend components of `component_type`.
    ///
    /// # Errors
    ///
    /// Returns [`CombindError::Store`] on backend I/O failure.
    fn find(&self, component_type: &str) -> Result<Vec<BackendComponent>, CombindError>;

    /// Backend components of `component_type` matching `filter`: every
    /// `(key, value)` in `filter` must be present with an equal value in
    /// the component's `props`.
    ///
    /// # Errors
    ///
    /// Returns [`CombindError::Store`] on backend I/O failure.
    fn search(&self, component_type: &str, filter: &Props) -> Result<Vec<BackendComponent>, CombindError>;

    /// Persists (inserts or overwrites) `components`.
    ///
    /// # Errors
    ///
    /// Returns [`CombindError::Store`] on backend I/O failure.
    fn save(&self, components: &[BackendComponent]) -> Result<(), CombindError>;

    /// Removes `components`.
    ///
    /// # Errors
    ///
    /// Returns [`CombindError::Store`] on backend I/O failure.
    fn delete(&self, components: &[BackendComponent]) -> Result<(), CombindError>;

    /// Removes every component of `component_type` matching `filter`,
    /// returning the number of components removed.
    ///
    /// # Errors
    ///
    /// Returns [`CombindError::Store`] on backend I/O failure.
    fn filtered_delete(&self, component_type: &str, filter: &Props) -> Result<usize, CombindError>;
}

/// Storage of persisted [`SearchBox`]es, behind a serving alias that
/// `save` swaps atomically once a new generation is fully indexed.
pub trait SearchBoxStore: Send + Sync {
    /// Ensures the serving `index` name is an alias rather than a bare
    /// index, reindexing into a concrete generation and swapping if
    /// necessary.
    ///
    /// # Errors
    ///
    /// Returns [`CombindError::Store`] on backend I/O failure.
    fn init(&self, index: &str) -> Result<(), CombindError>;

    /// All persisted boxes of `box_type` behind `index`'s current alias
    /// target.
    ///
    /// # Errors
    ///
    /// Returns [`CombindError::Store`] on backend I/O failure.
    fn find(&self, box_type: &str, index: &str) -> Result<Vec<SearchBox>, CombindError>;

    /// Builds a new generation behind `index`, flattens every box into one
    /// document per match, verifies the indexed count, then atomically
    /// swaps the alias and drops the prior generation.
    ///
    /// # Errors
    ///
    /// Returns [`CombindError::IndexIntegrity`] if the indexed document
    /// count does not match the intended count (the new generation is
    /// discarded and the alias left unchanged), or [`CombindError::Store`]
    /// on backend I/O failure.
    fn save(&self, index: &str, boxes: &[SearchBox]) -> Result<(), CombindError>;
}
