//! [`InMemoryComponentStore`]: a `DashMap`-backed stand-in for the
//! document store Root components read `BackendComponent`s from.

use dashmap::DashMap;

use combind_core::{BackendComponent, CombindError, ComponentStore, Props};

/// Backend components keyed by type, held entirely in memory. Stands in
/// for the document store a real deployment would back this with.
#[derive(Debug, Default)]
pub struct InMemoryComponentStore {
    by_type: DashMap<String, Vec<BackendComponent>>,
}

impl InMemoryComponentStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with `records`, grouped by their own `type` field.
    pub fn seeded(records: impl IntoIterator<Item = BackendComponent>) -> Self {
        let store = Self::new();
        for record in records {
            store.by_type.entry(record.r#type.clone()).or_default().push(record);
        }
        store
    }
}

/// Whether every `(key, value)` pair in `filter` is present with an equal
/// value in `props`.
fn matches_filter(props: &Props, filter: &Props) -> bool {
    filter.iter().all(|(key, value)| props.get(key) == Some(value))
}

impl ComponentStore for InMemoryComponentStore {
    fn find(&self, component_type: &str) -> Result<Vec<BackendComponent>, CombindError> {
        Ok(self.by_type.get(component_type).map(|entry| entry.clone()).unwrap_or_default())
    }

    fn search(&self, component_type: &str, filter: &Props) -> Result<Vec<BackendComponent>, CombindError> {
        Ok(self
            .find(component_type)?
            .into_iter()
            .filter(|record| matches_filter(&record.props, filter))
            .collect())
    }

    fn save(&self, components: &[BackendComponent]) -> Result<(), CombindError> {
        for component in components {
            let mut entry = self.by_type.entry(component.r#type.clone()).or_default();
            if let Some(existing) = entry.iter_mut().find(|r| r.code == component.code) {
                *existing = component.clone();
            } else {
                entry.push(component.clone());
            }
        }
        Ok(())
    }

    fn delete(&self, components: &[BackendComponent]) -> Result<(), CombindError> {
        for component in components {
            if let Some(mut entry) = self.by_type.get_mut(&component.r#type) {
                entry.retain(|r| r.code != component.code);
            }
        }
        Ok(())
    }

    fn filtered_delete(&self, component_type: &str, filter: &Props) -> Result<usize, CombindError> {
        let Some(mut entry) = self.by_type.get_mut(component_type) else {
            return Ok(0);
        };
        let before = entry.len();
        entry.retain(|record| !matches_filter(&record.props, filter));
        Ok(before - entry.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("policy", 2)]
    #[case("market", 1)]
    #[case("missing", 0)]
    fn find_counts_records_by_type(#[case] queried_type: &str, #[case] expected: usize) {
        let store = InMemoryComponentStore::seeded(vec![record("policy", "p1"), record("policy", "p2"), record("market", "m1")]);
        assert_eq!(store.find(queried_type).unwrap().len(), expected);
    }

    fn record(type_: &str, code: &str) -> BackendComponent {
        BackendComponent {
            code: code.to_string(),
            r#type: type_.to_string(),
            name: format!("{type_} {code}"),
            long_name: String::new(),
            props: Props::new(),
        }
    }

    #[test]
    fn find_returns_seeded_records_of_type() {
        let store = InMemoryComponentStore::seeded(vec![record("policy", "p1"), record("market", "m1")]);
        assert_eq!(store.find("policy").unwrap().len(), 1);
        assert_eq!(store.find("market").unwrap().len(), 1);
        assert_eq!(store.find("missing").unwrap().len(), 0);
    }

    #[test]
    fn save_overwrites_existing_code() {
        let store = InMemoryComponentStore::seeded(vec![record("policy", "p1")]);
        let mut updated = record("policy", "p1");
        updated.name = "Renamed".to_string();
        store.save(&[updated]).unwrap();
        let found = store.find("policy").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Renamed");
    }

    #[test]
    fn delete_removes_matching_code() {
        let store = InMemoryComponentStore::seeded(vec![record("policy", "p1"), record("policy", "p2")]);
        store.delete(&[record("policy", "p1")]).unwrap();
        let found = store.find("policy").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code, "p2");
    }

    #[test]
    fn filtered_delete_counts_removed() {
        let mut tagged = record("policy", "p1");
        tagged.props.insert("archived".to_string(), serde_json::json!(true));
        let store = InMemoryComponentStore::seeded(vec![tagged, record("policy", "p2")]);

        let mut filter = Props::new();
        filter.insert("archived".to_string(), serde_json::json!(true));
        let removed = store.filtered_delete("policy", &filter).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.find("policy").unwrap().len(), 1);
    }
}
