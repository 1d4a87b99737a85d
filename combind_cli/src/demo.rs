//! Assembles a small, runnable component DAG so `combind` has something to
//! `Save`/`Update` end to end: two roots joined by one virtual component
//! with a classification rule, registered alongside the bare roots as
//! additional top-level components.

use std::sync::Arc;

use combind_core::{BackendComponent, Component, Coordinator, Props, RootComponent, VirtualComponent};
use combind_store::{InMemoryComponentStore, InMemorySearchBoxStore};

/// Backend records seeded into the demo's component store.
fn seed_records() -> Vec<BackendComponent> {
    let mut records = Vec::new();
    for code in ["p1", "p2"] {
        records.push(BackendComponent {
            code: code.to_string(),
            r#type: "policy".to_string(),
            name: format!("Policy {code}"),
            long_name: String::new(),
            props: Props::new(),
        });
    }
    for code in ["m1", "m2"] {
        records.push(BackendComponent {
            code: code.to_string(),
            r#type: "market".to_string(),
            name: format!("Market {code}"),
            long_name: String::new(),
            props: Props::new(),
        });
    }
    records
}

/// A ready-to-use Coordinator plus the stores backing it, for the CLI to
/// drive directly.
pub struct Demo {
    /// The component store backing the demo's Root components.
    pub component_store: Arc<InMemoryComponentStore>,
    /// The coordinator driving the demo DAG.
    pub coordinator: Coordinator<InMemorySearchBoxStore>,
}

/// Builds the demo DAG: `policy` and `market` roots, a `coverage` virtual
/// component joining them behind a trivial rule, all three registered as
/// top-level components.
pub fn build() -> Demo {
    let component_store = Arc::new(InMemoryComponentStore::seeded(seed_records()));
    let search_box_store = Arc::new(InMemorySearchBoxStore::new());

    let policy: Arc<dyn Component> = Arc::new(RootComponent::builder("policy", Arc::clone(&component_store)).build());
    let market: Arc<dyn Component> = Arc::new(RootComponent::builder("market", Arc::clone(&component_store)).build());

    let coverage: Arc<dyn Component> = Arc::new(
        VirtualComponent::builder("coverage")
            .with_dependency(Arc::clone(&policy))
            .with_dependency(Arc::clone(&market))
            .with_rule(Box::new(|combination| {
                if combination.matches.is_empty() {
                    return None;
                }
                Some(combind_core::SearchBox::new("coverage", "covered", Props::new(), combination.matches.clone()))
            }))
            .build(),
    );

    let coordinator = Coordinator::new(search_box_store, vec![policy, market, coverage]);

    Demo { component_store, coordinator }
}
