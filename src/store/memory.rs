//! In-memory store
//!
//! Module state is held behind `Rc` and copied on write, so readers holding
//! a previous state keep a consistent snapshot.

use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::getters::GetterFn;
use super::mutations::{MutationFn, MutationPayload};
use super::Store;

/// In-memory [`Store`]
#[derive(Default)]
pub struct MemoryStore {
    modules: IndexMap<String, Rc<Value>>,
    getters: HashMap<String, GetterFn>,
    mutations: HashMap<String, (String, MutationFn)>,
    revision: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module with its initial state
    pub fn with_module(mut self, path: impl Into<String>, state: Value) -> Self {
        self.register_module(path, state);
        self
    }

    pub fn register_module(&mut self, path: impl Into<String>, state: Value) {
        self.modules.insert(path.into(), Rc::new(state));
    }

    /// Registered module paths in registration order
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }
}

impl Store for MemoryStore {
    fn state(&self, path: &str) -> StoreResult<Rc<Value>> {
        self.modules
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::UnknownModule(path.to_string()))
    }

    fn replace_state(&mut self, path: &str, state: Value) {
        self.modules.insert(path.to_string(), Rc::new(state));
        self.revision += 1;
    }

    fn getter(&self, path: &str) -> Option<GetterFn> {
        self.getters.get(path).cloned()
    }

    fn has_mutation(&self, path: &str) -> bool {
        self.mutations.contains_key(path)
    }

    fn install_getters(&mut self, getters: Vec<(String, GetterFn)>) {
        self.getters.extend(getters);
    }

    fn install_mutations(&mut self, module: &str, mutations: Vec<(String, MutationFn)>) {
        for (path, mutation) in mutations {
            self.mutations.insert(path, (module.to_string(), mutation));
        }
    }

    fn commit(&mut self, path: &str, payload: &MutationPayload) -> StoreResult<()> {
        let (module, mutation) = self
            .mutations
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::UnknownMutation(path.to_string()))?;
        let state = self
            .modules
            .get_mut(&module)
            .ok_or_else(|| StoreError::UnknownModule(module.clone()))?;

        mutation(&module, Rc::make_mut(state), payload)?;
        self.revision += 1;
        Ok(())
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set_name() -> MutationFn {
        Rc::new(|module: &str, state: &mut Value, payload: &MutationPayload| {
            let target = state
                .get_mut(payload.key.as_str())
                .ok_or_else(|| StoreError::TargetNotFound {
                    path: module.to_string(),
                    key: payload.key.clone(),
                })?;
            target["name"] = payload.new_value.clone();
            Ok(())
        })
    }

    #[test]
    fn test_unknown_module() {
        let store = MemoryStore::new();
        assert_eq!(
            store.state("users").unwrap_err(),
            StoreError::UnknownModule("users".into())
        );
    }

    #[test]
    fn test_commit_bumps_revision() {
        let mut store = MemoryStore::new().with_module("items", json!({"1": {"id": 1, "name": "Pen"}}));
        store.install_mutations("items", vec![("items/$SET_NAME".into(), set_name())]);
        assert!(store.has_mutation("items/$SET_NAME"));

        let payload = MutationPayload::new("1", json!("Pencil"));
        store.commit("items/$SET_NAME", &payload).unwrap();

        assert_eq!(store.revision(), 1);
        assert_eq!(store.state("items").unwrap()["1"]["name"], "Pencil");
    }

    #[test]
    fn test_commit_keeps_old_snapshot() {
        let mut store = MemoryStore::new().with_module("items", json!({"1": {"id": 1, "name": "Pen"}}));
        store.install_mutations("items", vec![("items/$SET_NAME".into(), set_name())]);

        let before = store.state("items").unwrap();
        store
            .commit("items/$SET_NAME", &MutationPayload::new("1", json!("Pencil")))
            .unwrap();

        assert_eq!(before["1"]["name"], "Pen");
    }

    #[test]
    fn test_unknown_mutation() {
        let mut store = MemoryStore::new();
        let err = store
            .commit("items/$SET_NAME", &MutationPayload::new("1", json!(null)))
            .unwrap_err();
        assert_eq!(err.code(), "STOREQL_UNKNOWN_MUTATION");
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_modules_in_registration_order() {
        let store = MemoryStore::new()
            .with_module("users", json!([]))
            .with_module("items", json!({}));
        assert_eq!(store.modules().collect::<Vec<_>>(), vec!["users", "items"]);
    }
}
