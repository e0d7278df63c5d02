//! Durable key-value storage for saved windows.
//!
//! This module provides:
//! - `Store` - get/set/delete of JSON values by key
//! - `FileStore` - every key in one JSON file, written through atomically
//! - `MemoryStore` - in-process storage for tests and ephemeral sessions
//! - Key helpers shared by everything that reads saved windows

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde_json::Value;

use crate::error::StoreError;

/// Key holding the ordered list of saved window names.
pub const NAMES_KEY: &str = "savedWindowNames";

/// Prefix of every saved window record key.
const WINDOW_KEY_PREFIX: &str = "window:";

/// Store key for the record of a saved window.
///
/// Records are namespaced so a window can never be named after `NAMES_KEY`.
pub fn window_key(name: &str) -> String {
    format!("{WINDOW_KEY_PREFIX}{name}")
}

/// Synchronous key-value storage of JSON values.
pub trait Store {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Removing an absent key is not an error.
    fn delete(&mut self, key: &str) -> Result<(), StoreError>;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key)
    }
}
