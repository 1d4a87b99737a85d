//! Root components: leaves that materialize their output by reading
//! backend records of a given type and emitting one `SearchBox` per
//! record.

use std::sync::{Arc, RwLock};

use combind_key::{dedup, Key};

use crate::component::{BuildContext, Component, ComponentKind, Query, QueryResult};
use crate::error::CombindError;
use crate::props::{merge_props, Props};
use crate::search_box::SearchBox;
use crate::store::ComponentStore;

/// Mutates a freshly constructed `SearchBox` before dedup and caching.
pub type Modifier = Box<dyn Fn(&mut SearchBox) + Send + Sync>;

/// Mutates the final `SearchBox` vector after dedup, once per build.
pub type ResultModifier = Box<dyn Fn(&mut Vec<SearchBox>) + Send + Sync>;

/// A leaf component reading `BackendComponent`s of a single type from a
/// [`ComponentStore`].
pub struct RootComponent<S> {
    store: Arc<S>,
    type_name: String,
    key_dimension: String,
    modifiers: Vec<Modifier>,
    result_modifiers: Vec<ResultModifier>,
    cache: RwLock<Option<Vec<SearchBox>>>,
}

impl<S: ComponentStore> RootComponent<S> {
    /// Starts building a Root component of `type_name`, reading from
    /// `store`. The key dimension defaults to `type_name` itself; override
    /// with [`RootBuilder::key_dimension`].
    pub fn builder(type_name: impl Into<String>, store: Arc<S>) -> RootBuilder<S> {
        RootBuilder::new(type_name.into(), store)
    }
}

impl<S: ComponentStore> Component for RootComponent<S> {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Root
    }

    fn children(&self) -> Vec<Arc<dyn Component>> {
        Vec::new()
    }

    fn build(&self, ctx: &BuildContext, rebuild: bool) -> Result<Vec<SearchBox>, CombindError> {
        ctx.check_cancelled()?;

        if !rebuild {
            if let Some(cached) = self.cache.read().expect("root cache lock poisoned").clone() {
                return Ok(cached);
            }
        }

        let records = self.store.find(&self.type_name)?;

        let mut boxes: Vec<SearchBox> = records
            .into_iter()
            .map(|record| {
                let key = Key::singleton(self.key_dimension.clone(), record.code.clone());
                let mut name_props = Props::new();
                name_props.insert("name".to_string(), serde_json::Value::String(record.name.clone()));
                let props = merge_props(&name_props, &record.props);
                let mut sb = SearchBox::new(self.type_name.clone(), record.code, props, vec![key]);
                for modifier in &self.modifiers {
                    modifier(&mut sb);
                }
                sb.matches = dedup(std::mem::take(&mut sb.matches));
                sb
            })
            .collect();

        for result_modifier in &self.result_modifiers {
            result_modifier(&mut boxes);
        }

        *self.cache.write().expect("root cache lock poisoned") = Some(boxes.clone());
        Ok(boxes)
    }

    fn build_query(&self, _query: &mut Query) {}

    fn handle(&self, result: QueryResult) -> Result<QueryResult, CombindError> {
        Ok(result)
    }
}

/// Builder for [`RootComponent`]: typestate-free method chaining over the
/// key dimension, per-box modifiers, and result modifiers.
pub struct RootBuilder<S> {
    store: Arc<S>,
    type_name: String,
    key_dimension: Option<String>,
    modifiers: Vec<Modifier>,
    result_modifiers: Vec<ResultModifier>,
}

impl<S: ComponentStore> RootBuilder<S> {
    fn new(type_name: String, store: Arc<S>) -> Self {
        Self {
            store,
            type_name,
            key_dimension: None,
            modifiers: Vec::new(),
            result_modifiers: Vec::new(),
        }
    }

    /// Overrides the key dimension written into each match (default: the
    /// component's own type name).
    #[must_use]
    pub fn key_dimension(mut self, dimension: impl Into<String>) -> Self {
        self.key_dimension = Some(dimension.into());
        self
    }

    /// Adds a per-box modifier, applied to every `SearchBox` after default
    /// construction, before dedup.
    #[must_use]
    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    /// Adds a result modifier, applied to the final vector once per build.
    #[must_use]
    pub fn with_result_modifier(mut self, modifier: ResultModifier) -> Self {
        self.result_modifiers.push(modifier);
        self
    }

    /// Finishes configuration and builds the `RootComponent`.
    pub fn build(self) -> RootComponent<S> {
        RootComponent {
            store: self.store,
            key_dimension: self.key_dimension.unwrap_or_else(|| self.type_name.clone()),
            type_name: self.type_name,
            modifiers: self.modifiers,
            result_modifiers: self.result_modifiers,
            cache: RwLock::new(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search_box::BackendComponent;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedStore {
        records: Vec<BackendComponent>,
        find_calls: AtomicUsize,
    }

    impl ComponentStore for FixedStore {
        fn find(&self, _component_type: &str) -> Result<Vec<BackendComponent>, CombindError> {
            self.find_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.records.clone())
        }
        fn search(&self, _: &str, _: &Props) -> Result<Vec<BackendComponent>, CombindError> {
            Ok(Vec::new())
        }
        fn save(&self, _: &[BackendComponent]) -> Result<(), CombindError> {
            Ok(())
        }
        fn delete(&self, _: &[BackendComponent]) -> Result<(), CombindError> {
            Ok(())
        }
        fn filtered_delete(&self, _: &str, _: &Props) -> Result<usize, CombindError> {
            Ok(0)
        }
    }

    fn record(code: &str) -> BackendComponent {
        BackendComponent {
            code: code.to_string(),
            r#type: "policy".to_string(),
            name: format!("Policy {code}"),
            long_name: String::new(),
            props: Props::new(),
        }
    }

    #[test]
    fn root_output_has_arity_one_matches_on_key_dimension() {
        let store = Arc::new(FixedStore {
            records: vec![record("p1"), record("p2")],
            find_calls: AtomicUsize::new(0),
        });
        let root = RootComponent::builder("policy", store).build();
        let boxes = root.build(&BuildContext::new(), false).unwrap();
        assert_eq!(boxes.len(), 2);
        for sb in &boxes {
            assert_eq!(sb.matches.len(), 1);
            assert_eq!(sb.matches[0].arity(), 1);
            assert_eq!(sb.matches[0].get("policy"), Some(sb.key.as_str()));
        }
    }

    #[test]
    fn root_build_is_memoized() {
        let store = Arc::new(FixedStore {
            records: vec![record("p1")],
            find_calls: AtomicUsize::new(0),
        });
        let root = RootComponent::builder("policy", Arc::clone(&store)).build();
        root.build(&BuildContext::new(), false).unwrap();
        root.build(&BuildContext::new(), false).unwrap();
        assert_eq!(store.find_calls.load(Ordering::SeqCst), 1);

        root.build(&BuildContext::new(), true).unwrap();
        assert_eq!(store.find_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn modifiers_run_before_cache_and_dedup() {
        let store = Arc::new(FixedStore {
            records: vec![record("p1")],
            find_calls: AtomicUsize::new(0),
        });
        let root = RootComponent::builder("policy", store)
            .with_modifier(Box::new(|sb: &mut SearchBox| {
                sb.props.insert("tag".to_string(), serde_json::Value::String("x".to_string()));
            }))
            .build();
        let boxes = root.build(&BuildContext::new(), false).unwrap();
        assert_eq!(boxes[0].props.get("tag").and_then(|v| v.as_str()), Some("x"));
    }
}
