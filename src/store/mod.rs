//! Store collaborator
//!
//! The engine reads model state only through named getters and writes it
//! only through named mutations, both installed into the store per model
//! type. `MemoryStore` is the in-process implementation.

mod errors;
mod getters;
mod memory;
mod mutations;

use std::rc::Rc;

use serde_json::Value;

pub use errors::{StoreError, StoreResult};
pub use getters::{GetterFn, GetterValue};
pub use memory::MemoryStore;
pub use mutations::{MutationFn, MutationPayload};

pub(crate) use getters::model_getters;
pub(crate) use mutations::model_mutations;

/// Key-value store holding one state value per module path
pub trait Store {
    /// Current state of a module
    fn state(&self, path: &str) -> StoreResult<Rc<Value>>;

    /// Replaces the state of a module, registering it when new
    fn replace_state(&mut self, path: &str, state: Value);

    /// Getter registered under a full path
    fn getter(&self, path: &str) -> Option<GetterFn>;

    fn has_mutation(&self, path: &str) -> bool;

    /// Registers getters under their full paths
    fn install_getters(&mut self, getters: Vec<(String, GetterFn)>);

    /// Registers mutations under their full paths, applied to `module` state
    fn install_mutations(&mut self, module: &str, mutations: Vec<(String, MutationFn)>);

    /// Applies one registered mutation
    fn commit(&mut self, path: &str, payload: &MutationPayload) -> StoreResult<()>;

    /// Incremented on every state change
    fn revision(&self) -> u64;
}
