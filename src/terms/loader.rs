//! TermSetLoader: dictionary sources and the never-failing load path
//!
//! Sources return raw term lists; the loader normalizes them into a
//! [`TermSet`]. Any source failure degrades to an empty set so highlighting
//! becomes a no-op instead of breaking the page.

use std::rc::Rc;

use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::http::HttpClient;
use crate::terms::set::TermSet;
use crate::terms::store::{DictionaryStore, TERMS_KEY};

// =============================================================================
// Sources
// =============================================================================

/// Shape of the bundled `medical-terms.json` resource
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct DictionaryDocument {
    pub terms: Vec<String>,
}

impl DictionaryDocument {
    pub fn parse(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Anything that can produce the raw term list
#[async_trait(?Send)]
pub trait DictionarySource {
    async fn read_terms(&self) -> Result<Vec<String>, LoadError>;
}

/// A dictionary document already held in memory
pub struct BundledDictionary {
    json: String,
}

impl BundledDictionary {
    pub fn new(json: impl Into<String>) -> Self {
        Self { json: json.into() }
    }
}

#[async_trait(?Send)]
impl DictionarySource for BundledDictionary {
    async fn read_terms(&self) -> Result<Vec<String>, LoadError> {
        Ok(DictionaryDocument::parse(&self.json)?.terms)
    }
}

/// A dictionary document fetched from a URL (the extension's packaged
/// resource in the browser build)
pub struct ResourceDictionary {
    client: Rc<dyn HttpClient>,
    url: String,
}

impl ResourceDictionary {
    pub fn new(client: Rc<dyn HttpClient>, url: impl Into<String>) -> Self {
        Self { client, url: url.into() }
    }
}

#[async_trait(?Send)]
impl DictionarySource for ResourceDictionary {
    async fn read_terms(&self) -> Result<Vec<String>, LoadError> {
        let body = self.client.get_text(&self.url).await?;
        Ok(DictionaryDocument::parse(&body)?.terms)
    }
}

/// The persisted term list, falling back to another source while the store
/// has never been populated by a refresh
pub struct StoredDictionary {
    store: Rc<dyn DictionaryStore>,
    fallback: Rc<dyn DictionarySource>,
}

impl StoredDictionary {
    pub fn new(store: Rc<dyn DictionaryStore>, fallback: Rc<dyn DictionarySource>) -> Self {
        Self { store, fallback }
    }
}

#[async_trait(?Send)]
impl DictionarySource for StoredDictionary {
    async fn read_terms(&self) -> Result<Vec<String>, LoadError> {
        match self.store.get(TERMS_KEY).await {
            Ok(Some(terms)) if !terms.is_empty() => Ok(terms),
            Ok(_) => self.fallback.read_terms().await,
            Err(e) => {
                warn!("[TermSetLoader] store read failed, using fallback: {}", e);
                self.fallback.read_terms().await
            }
        }
    }
}

// =============================================================================
// TermSetLoader
// =============================================================================

pub struct TermSetLoader {
    source: Rc<dyn DictionarySource>,
}

impl TermSetLoader {
    pub fn new(source: Rc<dyn DictionarySource>) -> Self {
        Self { source }
    }

    /// Load the current dictionary. Never fails; errors yield an empty set.
    pub async fn load(&self) -> TermSet {
        match self.source.read_terms().await {
            Ok(raw) => {
                let set: TermSet = raw.iter().collect();
                debug!("[TermSetLoader] loaded {} terms ({} raw)", set.len(), raw.len());
                set
            }
            Err(e) => {
                warn!("[TermSetLoader] error loading medical terms: {}", e);
                TermSet::new()
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::http::mock::MockClient;
    use crate::terms::store::MemoryStore;
    use futures::executor::block_on;

    fn loader(source: impl DictionarySource + 'static) -> TermSetLoader {
        TermSetLoader::new(Rc::new(source))
    }

    // -------------------------------------------------------------------------
    // Requirement 1: Bundled terms are lower-cased into a set
    // -------------------------------------------------------------------------
    #[test]
    fn test_bundled_terms_lowercased() {
        let terms = block_on(
            loader(BundledDictionary::new(r#"{"terms": ["Diabetes", "Heart Attack", "diabetes"]}"#)).load(),
        );

        assert_eq!(terms.len(), 2);
        assert!(terms.contains("diabetes"));
        assert!(terms.contains("heart attack"));
    }

    // -------------------------------------------------------------------------
    // Requirement 2: Parse failure degrades to an empty set
    // -------------------------------------------------------------------------
    #[test]
    fn test_malformed_dictionary_yields_empty_set() {
        let terms = block_on(loader(BundledDictionary::new("{not json")).load());
        assert!(terms.is_empty());

        let terms = block_on(loader(BundledDictionary::new(r#"{"words": []}"#)).load());
        assert!(terms.is_empty());
    }

    // -------------------------------------------------------------------------
    // Requirement 3: Resource fetch failure degrades to an empty set
    // -------------------------------------------------------------------------
    #[test]
    fn test_resource_fetch_failure_yields_empty_set() {
        let client = Rc::new(MockClient::new());
        client.fail("ext://medical-terms.json", FetchError::Network("offline".into()));

        let terms = block_on(loader(ResourceDictionary::new(client.clone(), "ext://medical-terms.json")).load());
        assert!(terms.is_empty());
        assert_eq!(client.request_count(), 1);
    }

    #[test]
    fn test_resource_dictionary_reads_document() {
        let client = Rc::new(MockClient::new());
        client.respond("ext://medical-terms.json", r#"{"terms": ["Gout"]}"#);

        let terms = block_on(loader(ResourceDictionary::new(client, "ext://medical-terms.json")).load());
        assert!(terms.contains("gout"));
    }

    // -------------------------------------------------------------------------
    // Requirement 4: Persisted terms take precedence over the bundled document
    // -------------------------------------------------------------------------
    #[test]
    fn test_stored_terms_preferred() {
        let store = Rc::new(MemoryStore::new());
        block_on(store.set(TERMS_KEY, vec!["Asthma".to_string()])).unwrap();
        let fallback = Rc::new(BundledDictionary::new(r#"{"terms": ["Gout"]}"#));

        let terms = block_on(loader(StoredDictionary::new(store, fallback)).load());
        assert!(terms.contains("asthma"));
        assert!(!terms.contains("gout"));
    }

    #[test]
    fn test_empty_store_falls_back() {
        let store = Rc::new(MemoryStore::new());
        let fallback = Rc::new(BundledDictionary::new(r#"{"terms": ["Gout"]}"#));

        let terms = block_on(loader(StoredDictionary::new(store, fallback)).load());
        assert!(terms.contains("gout"));
    }
}
