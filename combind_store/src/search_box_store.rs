//! [`InMemorySearchBoxStore`]: an in-memory implementation of the
//! alias-swap contract `SearchBoxStore::save` specifies — index a new
//! generation, verify its count, then atomically swap the serving alias.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use dashmap::DashMap;

use combind_core::{CombindError, Document, SearchBox, SearchBoxStore};

/// A serving alias, currently pointing at one generation's documents.
///
/// A real concrete index name would be suffixed with a timestamp; this
/// store uses a monotonically increasing generation counter instead, so
/// the alias-swap behavior stays deterministic and testable without
/// mocking a clock.
#[derive(Debug, Default)]
struct Alias {
    generation: u64,
    documents: Vec<Document>,
}

/// Holds every index's current alias state behind its own lock, plus a
/// shared generation counter (stands in for the Unix-seconds suffix).
#[derive(Debug, Default)]
pub struct InMemorySearchBoxStore {
    aliases: DashMap<String, RwLock<Alias>>,
    next_generation: AtomicU64,
    fail_next_save: std::sync::atomic::AtomicBool,
}

impl InMemorySearchBoxStore {
    /// An empty store; no alias has been initialized yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// The generation counter currently backing `index`'s alias, if
    /// `init`/`save` has run for it. Exposed for tests asserting the S5
    /// alias-swap scenario.
    pub fn current_generation(&self, index: &str) -> Option<u64> {
        self.aliases.get(index).map(|entry| entry.read().expect("alias lock poisoned").generation)
    }

    /// Arms a one-shot simulated [`CombindError::IndexIntegrity`] failure
    /// for the next `save` call. There is no real bulk-indexer here to
    /// under-count against, so S5's "forced `IndexIntegrityError`" branch
    /// is exercised this way: the next `save` reports a fabricated
    /// mismatch, discards its would-be generation, and leaves the current
    /// alias untouched, exactly as a real count-verification failure would.
    pub fn fail_next_save(&self) {
        self.fail_next_save.store(true, Ordering::SeqCst);
    }
}

impl SearchBoxStore for InMemorySearchBoxStore {
    fn init(&self, index: &str) -> Result<(), CombindError> {
        self.aliases.entry(index.to_string()).or_insert_with(|| RwLock::new(Alias::default()));
        Ok(())
    }

    fn find(&self, box_type: &str, index: &str) -> Result<Vec<SearchBox>, CombindError> {
        let Some(entry) = self.aliases.get(index) else {
            return Ok(Vec::new());
        };
        let alias = entry.read().expect("alias lock poisoned");

        let mut by_key: std::collections::BTreeMap<String, SearchBox> = std::collections::BTreeMap::new();
        for doc in alias.documents.iter().filter(|d| d.r#type == box_type) {
            by_key
                .entry(doc.key.clone())
                .and_modify(|sb| sb.matches.push(doc.r#match.clone()))
                .or_insert_with(|| SearchBox::new(doc.r#type.clone(), doc.key.clone(), doc.props.clone(), vec![doc.r#match.clone()]));
        }
        Ok(by_key.into_values().collect())
    }

    fn save(&self, index: &str, boxes: &[SearchBox]) -> Result<(), CombindError> {
        let intended: Vec<Document> = boxes.iter().flat_map(SearchBox::documents).collect();
        let intended_count = intended.len();

        tracing::debug!(index, boxes = boxes.len(), documents = intended_count, "indexing new generation");

        if self.fail_next_save.swap(false, Ordering::SeqCst) {
            return Err(CombindError::IndexIntegrity { expected: intended_count, actual: intended_count.saturating_sub(1) });
        }

        let next_generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let entry = self.aliases.entry(index.to_string()).or_insert_with(|| RwLock::new(Alias::default()));
        let mut alias = entry.write().expect("alias lock poisoned");
        alias.generation = next_generation;
        alias.documents = intended;

        tracing::debug!(index, generation = next_generation, "alias swapped");
        Ok(())
    }
}
