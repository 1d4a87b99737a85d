//! Named scenario tests covering two roots joined through a virtual
//! component (S1–S6), plus a mutual-exclusion scenario (S7).

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use combind_key::{intersect_list, merge_list, Key};

use combind_core::*;

struct FixedStore {
    records: Vec<BackendComponent>,
    find_calls: AtomicUsize,
}

impl FixedStore {
    fn new(records: Vec<BackendComponent>) -> Self {
        Self { records, find_calls: AtomicUsize::new(0) }
    }
}

impl ComponentStore for FixedStore {
    fn find(&self, _component_type: &str) -> Result<Vec<BackendComponent>, CombindError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.clone())
    }
    fn search(&self, _component_type: &str, _filter: &Props) -> Result<Vec<BackendComponent>, CombindError> {
        Ok(Vec::new())
    }
    fn save(&self, _components: &[BackendComponent]) -> Result<(), CombindError> {
        Ok(())
    }
    fn delete(&self, _components: &[BackendComponent]) -> Result<(), CombindError> {
        Ok(())
    }
    fn filtered_delete(&self, _component_type: &str, _filter: &Props) -> Result<usize, CombindError> {
        Ok(0)
    }
}

fn backend(type_: &str, code: &str) -> BackendComponent {
    BackendComponent {
        code: code.to_string(),
        r#type: type_.to_string(),
        name: format!("{type_} {code}"),
        long_name: String::new(),
        props: Props::new(),
    }
}

fn root(type_name: &str, dim: &str, codes: &[&str]) -> Arc<dyn Component> {
    let store = Arc::new(FixedStore::new(codes.iter().map(|c| backend(type_name, c)).collect()));
    Arc::new(RootComponent::builder(type_name, store).key_dimension(dim).build())
}

/// S1 — Two roots, one virtual, trivial rule.
#[test]
fn s1_two_roots_trivial_rule() {
    let a = root("A", "A", &["a1", "a2"]);
    let b = root("B", "B", &["b1", "b2"]);

    let v = VirtualComponent::builder("V")
        .with_dependency(Arc::clone(&a))
        .with_dependency(Arc::clone(&b))
        .with_rule(Box::new(|combination: &Combination| {
            Some(SearchBox::new("V", "all", Props::new(), combination.matches.clone()))
        }))
        .build();

    let out = v.build(&BuildContext::new(), false).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].key, "all");
    assert_eq!(out[0].matches.len(), 4);
    for m in &out[0].matches {
        assert_eq!(m.arity(), 2);
    }
}

/// S2 — Incompatible dimensions: the only non-mapping output (if emitted)
/// has empty matches, consistently across runs.
#[test]
fn s2_incompatible_dimensions() {
    let a = root("A", "D", &["x"]);
    let b = root("B", "D", &["y"]);

    let v = VirtualComponent::builder("V")
        .with_dependency(Arc::clone(&a))
        .with_dependency(Arc::clone(&b))
        .with_rule(Box::new(|combination: &Combination| {
            if combination.matches.is_empty() {
                None
            } else {
                Some(SearchBox::new("V", "all", Props::new(), combination.matches.clone()))
            }
        }))
        .build();

    let first = v.build(&BuildContext::new(), false).unwrap();
    let second = v.build(&BuildContext::new(), true).unwrap();

    assert!(first.iter().all(|sb| sb.key == "not-mapped" && sb.matches.is_empty()));
    assert_eq!(first, second);
}

/// S3 — Rule ordering and max-hits.
#[test]
fn s3_rule_ordering_and_max_hits() {
    let a = root("A", "A", &["a1"]);
    let b = root("B", "B", &["b1"]);

    let make = |max: Option<usize>| {
        let mut builder = VirtualComponent::builder("V")
            .with_dependency(Arc::clone(&a))
            .with_dependency(Arc::clone(&b))
            .with_rule(Box::new(|combination: &Combination| {
                Some(SearchBox::new("V", "a", Props::new(), combination.matches.clone()))
            }))
            .with_rule(Box::new(|combination: &Combination| {
                Some(SearchBox::new("V", "b", Props::new(), combination.matches.clone()))
            }));
        if let Some(max) = max {
            builder = builder.max_rule_hits(max);
        }
        builder.build()
    };

    let capped = make(Some(1)).build(&BuildContext::new(), false).unwrap();
    assert_eq!(capped.len(), 1);
    assert_eq!(capped[0].key, "a");

    let uncapped = make(None).build(&BuildContext::new(), false).unwrap();
    let mut keys: Vec<_> = uncapped.iter().map(|sb| sb.key.clone()).collect();
    keys.sort();
    assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    for sb in &uncapped {
        assert_eq!(sb.matches.len(), 1);
    }
}

/// S4 — Memoization: a second `build(false)` does not re-invoke the store.
#[test]
fn s4_memoization() {
    let store = Arc::new(FixedStore::new(vec![backend("A", "a1")]));
    let a: Arc<dyn Component> = Arc::new(RootComponent::builder("A", Arc::clone(&store)).build());

    a.build(&BuildContext::new(), false).unwrap();
    a.build(&BuildContext::new(), false).unwrap();
    assert_eq!(store.find_calls.load(Ordering::SeqCst), 1);

    a.build(&BuildContext::new(), true).unwrap();
    assert_eq!(store.find_calls.load(Ordering::SeqCst), 2);
}

/// S6 — Update diff: updated + created, no deletes returned.
#[test]
fn s6_update_diff() {
    struct FixedSearchBoxStore {
        existing: Vec<SearchBox>,
    }
    impl SearchBoxStore for FixedSearchBoxStore {
        fn init(&self, _index: &str) -> Result<(), CombindError> {
            Ok(())
        }
        fn find(&self, _box_type: &str, _index: &str) -> Result<Vec<SearchBox>, CombindError> {
            Ok(self.existing.clone())
        }
        fn save(&self, _index: &str, _boxes: &[SearchBox]) -> Result<(), CombindError> {
            Ok(())
        }
    }

    let mut old_props = Props::new();
    old_props.insert("v".to_string(), serde_json::json!(1));
    let k1_before = SearchBox::new("V", "k1", old_props, vec![Key::singleton("A", "a1")]);

    let store = FixedSearchBoxStore { existing: vec![k1_before] };

    let mut new_props_k1 = BTreeMap::new();
    new_props_k1.insert("v".to_string(), serde_json::json!(2));
    let k1_after = SearchBox::new("V", "k1", new_props_k1, vec![Key::singleton("A", "a1")]);
    let k2_after = SearchBox::new("V", "k2", Props::new(), vec![Key::singleton("A", "a2")]);

    struct FixedVirtual {
        output: Vec<SearchBox>,
    }
    impl Component for FixedVirtual {
        fn type_name(&self) -> &str {
            "V"
        }
        fn kind(&self) -> ComponentKind {
            ComponentKind::Virtual
        }
        fn children(&self) -> Vec<Arc<dyn Component>> {
            vec![root("A", "A", &["a1", "a2"])]
        }
        fn build(&self, _ctx: &BuildContext, _rebuild: bool) -> Result<Vec<SearchBox>, CombindError> {
            Ok(self.output.clone())
        }
    }

    let v: Arc<dyn Component> = Arc::new(FixedVirtual { output: vec![k1_after.clone(), k2_after.clone()] });
    let coordinator = Coordinator::new(Arc::new(store), vec![v]);

    let changed = vec![backend("A", "a1")];
    let mut result = coordinator.update(&BuildContext::new(), "idx", &changed).unwrap();
    result.sort_by(|a, b| a.key.cmp(&b.key));

    assert_eq!(result, vec![k1_after, k2_after]);
}

/// S7 — disjoint-dimension dependencies are correctly classified mutually
/// exclusive (where `merge_list` is the only sound choice —
/// `intersect_list` would vacuously drop every pair, since disjoint
/// dimensions never have positive overlap); dependencies sharing a
/// dimension are not, and there `intersect_list`'s output is always a
/// subset of `merge_list`'s.
#[test]
fn s7_mutual_exclusion_predicate_and_intersect_subset_law() {
    let disjoint_a = Key::singleton("A", "a1");
    let disjoint_b = Key::singleton("B", "b1");
    assert!(combind_key::mutually_exclusive([&disjoint_a, &disjoint_b]));

    let a = vec![disjoint_a.clone()];
    let b = vec![disjoint_b.clone()];
    assert_eq!(merge_list(&a, &b).len(), 1, "merge_list is the sound choice when mutually exclusive");
    assert!(intersect_list(&a, &b).is_empty(), "intersect_list vacuously drops disjoint-dimension pairs");

    // Two roots sharing dimension "region": not mutually exclusive.
    let shared_a = Key::new([("region", "eu"), ("market", "m1")]);
    let shared_b = Key::new([("region", "eu"), ("product", "p1")]);
    assert!(!combind_key::mutually_exclusive([&shared_a, &shared_b]));

    let a = vec![shared_a, Key::new([("region", "us"), ("market", "m2")])];
    let b = vec![shared_b];
    let merged: std::collections::HashSet<_> = merge_list(&a, &b).into_iter().collect();
    let intersected: std::collections::HashSet<_> = intersect_list(&a, &b).into_iter().collect();
    assert!(intersected.is_subset(&merged));
    assert!(!intersected.is_empty());
}
