//! Database facade
//!
//! Owns the model registry, the store and the configuration. Queries and
//! wrapped records share it as `Rc<Database>`; execution is single-threaded
//! and synchronous.
//!
//! Every storage read goes through the getters installed for a model type,
//! and every write through its mutations. Using a model type before
//! `install` is a hard error.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use convert_case::{Case, Casing};
use indexmap::IndexMap;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::index::{pick_keys, ItemIndex, PositionIndex, Record};
use crate::model::{ModelRegistry, ModelType, StorageShape};
use crate::observability::{Logger, QueryMetrics};
use crate::query::Query;
use crate::record::Model;
use crate::store::{
    model_getters, model_mutations, GetterValue, MutationPayload, Store, StoreError,
};

/// Query engine entry point
pub struct Database {
    registry: ModelRegistry,
    store: RefCell<Box<dyn Store>>,
    config: EngineConfig,
    metrics: QueryMetrics,
    getters_installed: RefCell<HashSet<String>>,
    mutations_installed: RefCell<HashSet<String>>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("models", &self.registry.names().collect::<Vec<_>>())
            .field("config", &self.config)
            .field("revision", &self.revision())
            .finish()
    }
}

impl Database {
    /// Creates a database over `store`; nothing is installed yet.
    pub fn new(registry: ModelRegistry, store: impl Store + 'static, config: EngineConfig) -> Rc<Self> {
        Logger::set_min_severity(config.log_level);
        Rc::new(Self {
            registry,
            store: RefCell::new(Box::new(store)),
            config,
            metrics: QueryMetrics::new(),
            getters_installed: RefCell::new(HashSet::new()),
            mutations_installed: RefCell::new(HashSet::new()),
        })
    }

    pub fn with_defaults(registry: ModelRegistry, store: impl Store + 'static) -> Rc<Self> {
        Self::new(registry, store, EngineConfig::default())
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &QueryMetrics {
        &self.metrics
    }

    /// Store revision; changes on every state write
    pub fn revision(&self) -> u64 {
        self.store.borrow().revision()
    }

    pub fn model(&self, name: &str) -> Result<Rc<ModelType>> {
        Ok(self.registry.get(name)?)
    }

    /// New query over a model type
    pub fn query(self: &Rc<Self>, model: &str) -> Query {
        Query::new(Rc::clone(self), model)
    }

    // =========================================================================
    // Installation
    // =========================================================================

    /// Installs getter and mutation tables for one model type
    pub fn install(&self, model: &str) -> Result<()> {
        self.install_getters(model)?;
        self.install_mutations(model)
    }

    /// Installs every registered model type
    pub fn install_all(&self) -> Result<()> {
        let names: Vec<String> = self.registry.names().map(str::to_string).collect();
        for name in names {
            self.install(&name)?;
        }
        Ok(())
    }

    pub fn install_getters(&self, model: &str) -> Result<()> {
        let model = self.model(model)?;
        let getters: Vec<_> = model_getters(&model)
            .into_iter()
            .map(|(name, getter)| (self.getter_path(&model, &name), getter))
            .collect();
        let count = getters.len().to_string();

        self.store.borrow_mut().install_getters(getters);
        self.getters_installed
            .borrow_mut()
            .insert(model.name().to_string());

        Logger::info(
            "MODEL_GETTERS_INSTALLED",
            &[("model", model.name()), ("count", &count)],
        );
        Ok(())
    }

    pub fn install_mutations(&self, model: &str) -> Result<()> {
        let model = self.model(model)?;
        let mutations: Vec<_> = model_mutations(&model)
            .into_iter()
            .map(|(field, mutation)| (self.mutation_path(&model, &field), mutation))
            .collect();
        let count = mutations.len().to_string();

        self.store
            .borrow_mut()
            .install_mutations(model.path(), mutations);
        self.mutations_installed
            .borrow_mut()
            .insert(model.name().to_string());

        Logger::info(
            "MODEL_MUTATIONS_INSTALLED",
            &[("model", model.name()), ("count", &count)],
        );
        Ok(())
    }

    /// Generated getter name, before namespacing
    pub fn getter_name(&self, model: &ModelType, name: &str) -> String {
        if self.config.namespaced {
            format!("{}{}", self.config.prefix, name)
        } else {
            let name = format!("{} {}", model.path(), name).to_case(Case::Camel);
            format!("{}{}", self.config.prefix, name)
        }
    }

    /// Generated mutation name for a plain field, before namespacing
    pub fn mutation_name(&self, model: &ModelType, field: &str) -> String {
        let target = if self.config.namespaced {
            field.to_case(Case::UpperSnake)
        } else {
            format!("{} {}", model.path(), field).to_case(Case::UpperSnake)
        };
        format!("{}SET_{}", self.config.prefix, target)
    }

    fn getter_path(&self, model: &ModelType, name: &str) -> String {
        self.config
            .store_path(model.path(), &self.getter_name(model, name))
    }

    fn mutation_path(&self, model: &ModelType, field: &str) -> String {
        self.config
            .store_path(model.path(), &self.mutation_name(model, field))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Raw state of a store module
    pub fn state(&self, path: &str) -> Result<Rc<Value>> {
        Ok(self.store.borrow().state(path)?)
    }

    /// Runs an installed getter of `model`
    pub fn getter(
        self: &Rc<Self>,
        model: &ModelType,
        name: &str,
        arg: Option<&Value>,
    ) -> Result<GetterValue> {
        if !self.getters_installed.borrow().contains(model.name()) {
            return Err(StoreError::GettersNotInstalled(model.name().to_string()).into());
        }
        let path = self.getter_path(model, name);
        // released before the call: getters read the store themselves
        let getter = self.store.borrow().getter(&path);
        match getter {
            Some(getter) => getter(self, arg),
            None => Err(StoreError::UnknownGetter(path).into()),
        }
    }

    /// Records in storage order, or those with the given keys in key order
    pub fn fetch_items(self: &Rc<Self>, model: &ModelType, keys: Option<&[String]>) -> Result<Vec<Record>> {
        match keys {
            None => {
                let path = self.getter_path(model, "items");
                Ok(self.getter(model, "items", None)?.into_items(&path)?)
            }
            Some(keys) => Ok(self.fetch_index(model, Some(keys))?.into_values().collect()),
        }
    }

    /// Key to record; with keys, only those present, in key order
    pub fn fetch_index(self: &Rc<Self>, model: &ModelType, keys: Option<&[String]>) -> Result<ItemIndex> {
        let path = self.getter_path(model, "index");
        let index = self.getter(model, "index", None)?.into_index(&path)?;
        Ok(match keys {
            None => index,
            Some(keys) => pick_keys(&index, keys),
        })
    }

    /// Wrapped records in storage order, or those with the given keys
    pub fn fetch_models(self: &Rc<Self>, model: &ModelType, keys: Option<&[String]>) -> Result<Vec<Model>> {
        match keys {
            None => {
                let path = self.getter_path(model, "models");
                Ok(self.getter(model, "models", None)?.into_models(&path)?)
            }
            Some(keys) => Ok(self.fetch_model_index(model, Some(keys))?.into_values().collect()),
        }
    }

    pub fn fetch_model_index(
        self: &Rc<Self>,
        model: &ModelType,
        keys: Option<&[String]>,
    ) -> Result<IndexMap<String, Model>> {
        let path = self.getter_path(model, "modelIndex");
        let index = self.getter(model, "modelIndex", None)?.into_model_index(&path)?;
        Ok(match keys {
            None => index,
            Some(keys) => pick_keys(&index, keys),
        })
    }

    fn lookup_keys(&self, model: &ModelType, keys: &[Value]) -> Option<Vec<String>> {
        if keys.is_empty() {
            None
        } else {
            Some(model.keys_of(keys))
        }
    }

    /// Records of `model`; an empty key list means all
    pub fn items(self: &Rc<Self>, model: &str, keys: &[Value]) -> Result<Vec<Record>> {
        let model = self.model(model)?;
        let keys = self.lookup_keys(&model, keys);
        self.fetch_items(&model, keys.as_deref())
    }

    pub fn index(self: &Rc<Self>, model: &str, keys: &[Value]) -> Result<ItemIndex> {
        let model = self.model(model)?;
        let keys = self.lookup_keys(&model, keys);
        self.fetch_index(&model, keys.as_deref())
    }

    pub fn models(self: &Rc<Self>, model: &str, keys: &[Value]) -> Result<Vec<Model>> {
        let model = self.model(model)?;
        let keys = self.lookup_keys(&model, keys);
        self.fetch_models(&model, keys.as_deref())
    }

    pub fn model_index(self: &Rc<Self>, model: &str, keys: &[Value]) -> Result<IndexMap<String, Model>> {
        let model = self.model(model)?;
        let keys = self.lookup_keys(&model, keys);
        self.fetch_model_index(&model, keys.as_deref())
    }

    /// Key to array position; `None` unless stored as an ordered list
    pub fn position_index(self: &Rc<Self>, model: &str) -> Result<Option<PositionIndex>> {
        let model = self.model(model)?;
        if model.shape() != StorageShape::ArrayCollection {
            return Ok(None);
        }
        let path = self.getter_path(&model, "positionIndex");
        Ok(Some(
            self.getter(&model, "positionIndex", None)?
                .into_position_index(&path)?,
        ))
    }

    pub fn key_of(&self, model: &str, value: &Value) -> Result<String> {
        Ok(self.model(model)?.key_of(value))
    }

    pub fn keys_of(&self, model: &str, values: &[Value]) -> Result<Vec<String>> {
        Ok(self.model(model)?.keys_of(values))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Writes one field of the record with `key` through its mutation.
    ///
    /// For ordered-list storage the record's position is resolved first.
    pub fn commit(self: &Rc<Self>, model: &str, field: &str, key: &str, value: Value) -> Result<()> {
        let model = self.model(model)?;
        if !self.mutations_installed.borrow().contains(model.name()) {
            return Err(StoreError::MutationsNotInstalled(model.name().to_string()).into());
        }

        let mut payload = MutationPayload::new(key, value);
        if model.shape() == StorageShape::ArrayCollection {
            let path = self.getter_path(&model, "positionIndex");
            let positions = self
                .getter(&model, "positionIndex", None)?
                .into_position_index(&path)?;
            let position = positions.get(key).copied().ok_or_else(|| StoreError::TargetNotFound {
                path: model.path().to_string(),
                key: key.to_string(),
            })?;
            payload = payload.with_position(position);
        }

        let path = self.mutation_path(&model, field);
        self.store.borrow_mut().commit(&path, &payload)?;
        self.metrics.increment_commits();

        Logger::info(
            "STORE_COMMIT",
            &[("model", model.name()), ("mutation", &path), ("key", key)],
        );
        Ok(())
    }

    /// Replaces the whole state of a model's store module
    pub fn replace_state(&self, model: &str, state: Value) -> Result<()> {
        let model = self.model(model)?;
        self.store.borrow_mut().replace_state(model.path(), state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn database(config: EngineConfig) -> Rc<Database> {
        let user = ModelType::builder("User")
            .path("users")
            .shape(StorageShape::ArrayCollection)
            .primary_key("id")
            .prop("name")
            .prop("favoriteItemIds")
            .build()
            .unwrap();
        let registry = ModelRegistry::build([user]).unwrap();
        let store = MemoryStore::new().with_module(
            "users",
            json!([{"id": 1, "name": "George"}, {"id": 2, "name": "Susan"}]),
        );
        Database::new(registry, store, config)
    }

    #[test]
    fn test_read_before_install() {
        let db = database(EngineConfig::default());
        let err = db.items("User", &[]).unwrap_err();
        assert_eq!(err.code(), "STOREQL_GETTERS_NOT_INSTALLED");

        let err = db.commit("User", "name", "1", json!("x")).unwrap_err();
        assert_eq!(err.code(), "STOREQL_MUTATIONS_NOT_INSTALLED");
    }

    #[test]
    fn test_items_by_keys() {
        let db = database(EngineConfig::default());
        db.install_all().unwrap();

        assert_eq!(db.items("User", &[]).unwrap().len(), 2);
        let picked = db.items("User", &[json!(2), json!(7)]).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0]["name"], "Susan");
    }

    #[test]
    fn test_generated_names() {
        let db = database(EngineConfig::default());
        let user = db.model("User").unwrap();
        assert_eq!(db.getter_name(&user, "index"), "$index");
        assert_eq!(db.mutation_name(&user, "favoriteItemIds"), "$SET_FAVORITE_ITEM_IDS");

        let flat = database(EngineConfig {
            namespaced: false,
            ..Default::default()
        });
        assert_eq!(flat.getter_name(&user, "modelIndex"), "$usersModelIndex");
        assert_eq!(flat.mutation_name(&user, "name"), "$SET_USERS_NAME");
    }

    #[test]
    fn test_flat_names_still_resolve() {
        let db = database(EngineConfig {
            namespaced: false,
            ..Default::default()
        });
        db.install_all().unwrap();
        assert_eq!(db.index("User", &[]).unwrap().len(), 2);
    }

    #[test]
    fn test_commit_resolves_position() {
        let db = database(EngineConfig::default());
        db.install_all().unwrap();

        db.commit("User", "name", "2", json!("Sue")).unwrap();
        assert_eq!(db.state("users").unwrap()[1]["name"], "Sue");
        assert_eq!(db.revision(), 1);
        assert_eq!(db.metrics().snapshot().commits, 1);

        let err = db.commit("User", "name", "9", json!("x")).unwrap_err();
        assert_eq!(err.code(), "STOREQL_TARGET_NOT_FOUND");
    }

    #[test]
    fn test_position_index() {
        let db = database(EngineConfig::default());
        db.install_all().unwrap();
        let positions = db.position_index("User").unwrap().unwrap();
        assert_eq!(positions.get("2"), Some(&1));
    }
}
