//! Dictionary persistence
//!
//! One key-value store backs both the background refresh (writer) and the
//! term set loader (reader). The browser build uses `chrome.storage.local`.

use std::cell::RefCell;
use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::LoadError;

/// Storage key for the persisted term list
pub const TERMS_KEY: &str = "medicalTerms";

/// Async key-value store holding string lists
#[async_trait(?Send)]
pub trait DictionaryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<String>>, LoadError>;
    async fn set(&self, key: &str, values: Vec<String>) -> Result<(), LoadError>;
}

/// In-process store for tests and headless use
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, Vec<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait(?Send)]
impl DictionaryStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<String>>, LoadError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    async fn set(&self, key: &str, values: Vec<String>) -> Result<(), LoadError> {
        self.entries.borrow_mut().insert(key.to_string(), values);
        Ok(())
    }
}
