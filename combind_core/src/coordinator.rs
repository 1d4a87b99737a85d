//! The Coordinator: the graph driver that enumerates top-level
//! components, builds each, and hands their output to the search-box
//! store.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info_span};

use crate::component::{BuildContext, Component, ComponentKind};
use crate::error::CombindError;
use crate::search_box::{BackendComponent, SearchBox};
use crate::store::SearchBoxStore;

/// Holds the registered top-level components and the search-box store they
/// persist to.
pub struct Coordinator<S> {
    components: Vec<Arc<dyn Component>>,
    search_box_store: Arc<S>,
}

impl<S: SearchBoxStore> Coordinator<S> {
    /// Registers `components` as the top-level DAG roots this coordinator
    /// drives, persisting through `search_box_store`.
    pub fn new(search_box_store: Arc<S>, components: Vec<Arc<dyn Component>>) -> Self {
        Self { components, search_box_store }
    }

    /// The type names of the registered top-level components, useful for
    /// diagnostics.
    pub fn component_types(&self) -> Vec<String> {
        self.components.iter().map(|c| c.type_name().to_string()).collect()
    }

    /// Builds every top-level component with `rebuild=true`, concatenates
    /// their output, and persists it to `index` via the search-box store.
    /// Any component error aborts the save; no partial persistence occurs.
    ///
    /// # Errors
    ///
    /// Propagates the first component build failure, or a store failure
    /// from `search_box_store.save`.
    pub fn save(&self, ctx: &BuildContext, index: &str) -> Result<Vec<SearchBox>, CombindError> {
        let _span = info_span!("save", index).entered();
        let total_start = Instant::now();

        let mut all = Vec::new();
        for component in &self.components {
            let start = Instant::now();
            let built = component.build(ctx, true)?;
            debug!(component = component.type_name(), elapsed_ms = start.elapsed().as_millis(), "component built");
            all.extend(built);
        }

        self.search_box_store.save(index, &all)?;
        debug!(total_elapsed_ms = total_start.elapsed().as_millis(), "save complete");
        Ok(all)
    }

    /// Recomputes only the components whose root set intersects the types
    /// of `changed_backend_components`, diffs their rebuilt output against
    /// what is currently persisted at `index`, and returns the union of
    /// created and updated boxes (keyed by `SearchBox::key`).
    ///
    /// Deletions are computed but intentionally not returned — see the
    /// "Deleted boxes" Open Question in DESIGN.md; the caller owns whether
    /// and how to apply them.
    ///
    /// # Errors
    ///
    /// Propagates any component build failure, store failure, or a detected
    /// cycle in a component's dependency graph.
    pub fn update(
        &self,
        ctx: &BuildContext,
        index: &str,
        changed_backend_components: &[BackendComponent],
    ) -> Result<Vec<SearchBox>, CombindError> {
        let changed_types: HashSet<&str> = changed_backend_components.iter().map(|bc| bc.r#type.as_str()).collect();

        let mut touched = HashMap::new();
        for component in &self.components {
            let roots = root_set(component)?;
            if roots.iter().any(|r| changed_types.contains(r.as_str())) {
                touched.insert(component.type_name().to_string(), Arc::clone(component));
            }
        }

        let mut out = Vec::new();
        for component in touched.values() {
            let existing = self.search_box_store.find(component.type_name(), index)?;
            let built = component.build(ctx, true)?;

            let existing_index: HashMap<&str, &SearchBox> = existing.iter().map(|sb| (sb.key.as_str(), sb)).collect();

            for build in &built {
                match existing_index.get(build.key.as_str()) {
                    None => out.push(build.clone()),
                    Some(existing_box) if *existing_box != build => out.push(build.clone()),
                    Some(_) => {}
                }
            }
        }

        Ok(out)
    }
}

/// Computes the set of Root types reachable from `component`: `{c.Type}`
/// when `component` is itself a Root, otherwise the deduplicated union of
/// its children's root sets.
///
/// Cycle detection: a defensive visited-set along the current traversal
/// path, per the design notes (the graph's acyclicity is not structurally
/// enforced elsewhere).
///
/// # Errors
///
/// Returns [`CombindError::Cycle`] if `component` is reachable from itself.
pub fn root_set(component: &Arc<dyn Component>) -> Result<BTreeSet<String>, CombindError> {
    let mut visiting = HashSet::new();
    root_set_rec(component, &mut visiting)
}

fn root_set_rec(component: &Arc<dyn Component>, visiting: &mut HashSet<String>) -> Result<BTreeSet<String>, CombindError> {
    if !visiting.insert(component.type_name().to_string()) {
        return Err(CombindError::Cycle(component.type_name().to_string()));
    }

    let result = if component.kind() == ComponentKind::Root {
        BTreeSet::from([component.type_name().to_string()])
    } else {
        let mut roots = BTreeSet::new();
        for child in component.children() {
            roots.extend(root_set_rec(&child, visiting)?);
        }
        roots
    };

    visiting.remove(component.type_name());
    Ok(result)
}
