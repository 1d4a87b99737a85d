//! Virtual components: inner nodes that combine their dependencies'
//! output and classify each combination into a named bucket via an
//! ordered list of rules.

use std::collections::BTreeMap;
use std::sync::{Mutex, RwLock};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use combind_key::{canonical_hash, dedup, KeyHash};

use crate::combination::Combination;
use crate::combiner::combine;
use crate::component::{BuildContext, Component, ComponentKind, Query, QueryResult};
use crate::error::CombindError;
use crate::props::{merge_props, Props};
use crate::search_box::SearchBox;

/// A partial function from a [`Combination`] to the `SearchBox` it should
/// contribute to. Returns `None` when the rule does not apply.
pub type Rule = Box<dyn Fn(&Combination) -> Option<SearchBox> + Send + Sync>;

/// The fixed size of the worker pool that consumes the combiner's output
/// stream.
pub const VIRTUAL_BUILD_WORKERS: usize = 50;

/// An inner component combining its dependencies and applying rules.
pub struct VirtualComponent {
    type_name: String,
    dependencies: BTreeMap<String, std::sync::Arc<dyn Component>>,
    rules: Vec<Rule>,
    no_mapping_rule: Rule,
    max_rule_hits: usize,
    props: Props,
    cache: RwLock<Option<Vec<SearchBox>>>,
}

/// Builds the spec's default no-mapping rule for a component of `type_name`:
/// `{Type: type_name, Key: "not-mapped", Props: {}, Matches: combination.Matches}`.
fn default_no_mapping_rule(type_name: String) -> Rule {
    Box::new(move |combination: &Combination| {
        Some(SearchBox::new(
            type_name.clone(),
            "not-mapped",
            Props::new(),
            combination.matches.clone(),
        ))
    })
}

impl VirtualComponent {
    /// Starts building a Virtual component of `type_name`.
    pub fn builder(type_name: impl Into<String>) -> VirtualBuilder {
        let type_name = type_name.into();
        VirtualBuilder {
            type_name: type_name.clone(),
            dependencies: BTreeMap::new(),
            rules: Vec::new(),
            no_mapping_rule: default_no_mapping_rule(type_name),
            max_rule_hits: usize::MAX,
            props: Props::new(),
        }
    }
}

impl Component for VirtualComponent {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Virtual
    }

    fn children(&self) -> Vec<std::sync::Arc<dyn Component>> {
        self.dependencies.values().cloned().collect()
    }

    fn build(&self, ctx: &BuildContext, rebuild: bool) -> Result<Vec<SearchBox>, CombindError> {
        ctx.check_cancelled()?;

        if !rebuild {
            if let Some(cached) = self.cache.read().expect("virtual cache lock poisoned").clone() {
                return Ok(cached);
            }
        }

        let mut built_dependencies = Vec::with_capacity(self.dependencies.len());
        for (dep_type, dependency) in &self.dependencies {
            let built = dependency.build(ctx, false).map_err(|source| {
                CombindError::dependency_build(format!("{}<-{}", self.type_name, dep_type), source)
            })?;
            built_dependencies.push(built);
        }

        let stream = combine(Vec::new(), built_dependencies);

        let results: DashMap<String, SearchBox> = DashMap::new();
        let mapped_keys: DashMap<KeyHash, ()> = DashMap::new();
        let unmatched: Mutex<Vec<Combination>> = Mutex::new(Vec::new());

        std::thread::scope(|scope| {
            for _ in 0..VIRTUAL_BUILD_WORKERS {
                let receiver = stream.clone();
                let results = &results;
                let mapped_keys = &mapped_keys;
                let unmatched = &unmatched;
                scope.spawn(move || {
                    for combination in receiver.iter() {
                        self.apply_rules(&combination, results, mapped_keys, unmatched);
                    }
                });
            }
        });

        for combination in unmatched.into_inner().expect("unmatched lock poisoned") {
            self.apply_no_mapping_rule(&combination, &results, &mapped_keys);
        }

        let mut output: Vec<SearchBox> = results
            .into_iter()
            .map(|(_, mut sb)| {
                sb.matches = dedup(std::mem::take(&mut sb.matches));
                sb
            })
            .collect();
        output.sort_by(|a, b| a.key.cmp(&b.key));

        *self.cache.write().expect("virtual cache lock poisoned") = Some(output.clone());
        Ok(output)
    }

    fn build_query(&self, _query: &mut Query) {}

    fn handle(&self, result: QueryResult) -> Result<QueryResult, CombindError> {
        Ok(result)
    }
}

impl VirtualComponent {
    /// Applies `self.rules` in order to `combination`, inserting or
    /// appending into `results` and recording claimed keys into
    /// `mapped_keys`. Combinations matching no rule are pushed to
    /// `unmatched` for the no-mapping fallback pass.
    fn apply_rules(
        &self,
        combination: &Combination,
        results: &DashMap<String, SearchBox>,
        mapped_keys: &DashMap<KeyHash, ()>,
        unmatched: &Mutex<Vec<Combination>>,
    ) {
        let mut hits = 0usize;
        for rule in &self.rules {
            let Some(mut sb) = rule(combination) else {
                continue;
            };
            sb.props = merge_props(&self.props, &sb.props);
            insert_or_append(results, mapped_keys, sb);
            hits += 1;
            if hits >= self.max_rule_hits {
                break;
            }
        }
        if hits == 0 {
            unmatched.lock().expect("unmatched lock poisoned").push(combination.clone());
        }
    }

    /// Applies the no-mapping rule to an unmatched combination: its matches
    /// are filtered to exclude anything already claimed by another rule for
    /// the same component, so the fallback bucket never steals a key.
    ///
    /// A fallback rule that returns `None` is a
    /// [`CombindError::NoMappingFallback`]: logged at `warn` and the
    /// combination is skipped, not fatal to the overall build.
    fn apply_no_mapping_rule(&self, combination: &Combination, results: &DashMap<String, SearchBox>, mapped_keys: &DashMap<KeyHash, ()>) {
        let Some(mut sb) = (self.no_mapping_rule)(combination) else {
            let err = CombindError::NoMappingFallback {
                component: self.type_name.clone(),
            };
            tracing::warn!(component = %self.type_name, %err, "no-mapping fallback failed; skipping combination");
            return;
        };
        sb.props = merge_props(&self.props, &sb.props);
        sb.matches.retain(|m| !mapped_keys.contains_key(&canonical_hash(m)));
        insert_or_append(results, mapped_keys, sb);
    }
}

/// Inserts `sb` into `results` if its key is new, otherwise appends its
/// matches onto the existing entry; either way, every match in the
/// resulting entry is recorded into `mapped_keys`. Performed within a
/// single `results` shard lock scope so the two maps are updated
/// atomically with respect to other workers touching the same key.
fn insert_or_append(results: &DashMap<String, SearchBox>, mapped_keys: &DashMap<KeyHash, ()>, sb: SearchBox) {
    match results.entry(sb.key.clone()) {
        Entry::Occupied(mut occupied) => {
            occupied.get_mut().append_matches(sb.matches);
            for m in &occupied.get().matches {
                mapped_keys.insert(canonical_hash(m), ());
            }
        }
        Entry::Vacant(vacant) => {
            let inserted = vacant.insert(sb);
            for m in &inserted.matches {
                mapped_keys.insert(canonical_hash(m), ());
            }
        }
    }
}

/// Builder for [`VirtualComponent`]: typestate-free method chaining over
/// its dependencies, rules, fallback rule, hit cap, and props.
pub struct VirtualBuilder {
    type_name: String,
    dependencies: BTreeMap<String, std::sync::Arc<dyn Component>>,
    rules: Vec<Rule>,
    no_mapping_rule: Rule,
    max_rule_hits: usize,
    props: Props,
}

impl VirtualBuilder {
    /// Registers `dependency`, keyed by its own type name.
    #[must_use]
    pub fn with_dependency(mut self, dependency: std::sync::Arc<dyn Component>) -> Self {
        self.dependencies.insert(dependency.type_name().to_string(), dependency);
        self
    }

    /// Appends a rule, run in declared order after all previously added
    /// rules.
    #[must_use]
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Overrides the fallback rule applied to combinations matched by no
    /// rule (default: emit `{Key: "not-mapped", Matches: combination.Matches}`).
    #[must_use]
    pub fn with_no_mapping_rule(mut self, rule: Rule) -> Self {
        self.no_mapping_rule = rule;
        self
    }

    /// Caps the number of rules allowed to match a single combination
    /// (default: unbounded).
    #[must_use]
    pub fn max_rule_hits(mut self, max_rule_hits: usize) -> Self {
        self.max_rule_hits = max_rule_hits;
        self
    }

    /// Properties merged (right-wins, i.e. rule output wins) into every
    /// emitted `SearchBox`.
    #[must_use]
    pub fn props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    /// Finishes configuration and builds the `VirtualComponent`.
    pub fn build(self) -> VirtualComponent {
        VirtualComponent {
            type_name: self.type_name,
            dependencies: self.dependencies,
            rules: self.rules,
            no_mapping_rule: self.no_mapping_rule,
            max_rule_hits: self.max_rule_hits,
            props: self.props,
            cache: RwLock::new(None),
        }
    }
}
