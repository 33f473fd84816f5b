//! DefinitionCache: the only path from a term to the network
//!
//! Results live for the page view. Redirect chains are followed iteratively
//! with a visited set and a hop limit; every name on the chain ends up keyed
//! to the canonical result, so an alias never costs a second round-trip.
//!
//! Single-threaded: the `RefCell` is never borrowed across an `.await`.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::{AnnotatorConfig, Endpoints};
use crate::definition::api::{PageLookup, QueryResponse};
use crate::definition::excerpt;
use crate::definition::Definition;
use crate::error::LookupError;
use crate::http::HttpClient;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub network_requests: u64,
}

pub struct DefinitionCache {
    client: Rc<dyn HttpClient>,
    endpoints: Endpoints,
    max_sentences: usize,
    max_redirects: usize,
    thumbnail_size: u32,
    entries: RefCell<HashMap<String, Definition>>,
    hits: Cell<u64>,
    network_requests: Cell<u64>,
}

impl DefinitionCache {
    pub fn new(config: &AnnotatorConfig, client: Rc<dyn HttpClient>) -> Self {
        Self {
            client,
            endpoints: config.endpoints(),
            max_sentences: config.max_sentences,
            max_redirects: config.max_redirects,
            thumbnail_size: config.thumbnail_size,
            entries: RefCell::new(HashMap::new()),
            hits: Cell::new(0),
            network_requests: Cell::new(0),
        }
    }

    /// Cached entry for an exact term, without any I/O
    pub fn cached(&self, term: &str) -> Option<Definition> {
        self.entries.borrow().get(term).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.get(),
            network_requests: self.network_requests.get(),
        }
    }

    /// Definition for `term`. Never fails: missing pages and redirect cycles
    /// yield the not-available fallback (cached), transport and parse errors
    /// yield the error fallback (not cached, so a later hover retries).
    pub async fn fetch(&self, term: &str) -> Definition {
        if let Some(hit) = self.cached(term) {
            self.hits.set(self.hits.get() + 1);
            return hit;
        }

        match self.resolve(term).await {
            Ok(definition) => definition,
            Err(e @ LookupError::RedirectCycle { .. }) => {
                warn!("[DefinitionCache] {}", e);
                let fallback = Definition::not_available();
                self.store(&[term.to_string()], &fallback);
                fallback
            }
            Err(e) => {
                warn!("[DefinitionCache] error fetching definition for '{}': {}", term, e);
                Definition::error()
            }
        }
    }

    async fn resolve(&self, term: &str) -> Result<Definition, LookupError> {
        let mut chain: Vec<String> = Vec::new();
        let mut current = term.to_string();

        loop {
            if let Some(hit) = self.cached(&current) {
                self.store(&chain, &hit);
                return Ok(hit);
            }
            if chain.contains(&current) || chain.len() > self.max_redirects {
                return Err(LookupError::RedirectCycle {
                    term: term.to_string(),
                    hops: chain.len(),
                });
            }
            chain.push(current.clone());

            let url = self.endpoints.definition_url(&current, self.thumbnail_size);
            self.network_requests.set(self.network_requests.get() + 1);
            let body = self.client.get_text(&url).await?;

            let definition = match QueryResponse::parse(&body)?.classify(&current) {
                Ok(PageLookup::Redirect(target)) => {
                    debug!("[DefinitionCache] redirected: {} -> {}", current, target);
                    current = target;
                    continue;
                }
                Ok(PageLookup::Article { extract, image_url }) => Definition {
                    excerpt: excerpt::summarize(&extract, self.max_sentences),
                    image_url,
                },
                Err(LookupError::NotFoundOrAmbiguous(title)) => {
                    debug!("[DefinitionCache] disambiguation or missing content for term: {}", title);
                    Definition::not_available()
                }
                Err(e) => return Err(e),
            };

            self.store(&chain, &definition);
            return Ok(definition);
        }
    }

    fn store(&self, keys: &[String], definition: &Definition) {
        let mut entries = self.entries.borrow_mut();
        for key in keys {
            entries.insert(key.clone(), definition.clone());
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{ERROR_TEXT, NOT_AVAILABLE_TEXT};
    use crate::error::FetchError;
    use crate::http::mock::MockClient;
    use futures::executor::block_on;

    fn url(term: &str) -> String {
        Endpoints::default().definition_url(term, 200)
    }

    fn article(title: &str, extract: &str) -> String {
        serde_json::json!({
            "query": { "pages": { "12": { "pageid": 12, "title": title, "extract": extract } } }
        })
        .to_string()
    }

    fn redirect(from: &str, to: &str) -> String {
        serde_json::json!({
            "query": { "redirects": [{ "from": from, "to": to }], "pages": {} }
        })
        .to_string()
    }

    fn setup() -> (Rc<MockClient>, DefinitionCache) {
        let client = Rc::new(MockClient::new());
        let cache = DefinitionCache::new(&AnnotatorConfig::default(), client.clone());
        (client, cache)
    }

    // -------------------------------------------------------------------------
    // Requirement 1: A cache hit performs no network call
    // -------------------------------------------------------------------------
    #[test]
    fn test_repeated_fetch_hits_cache() {
        let (client, cache) = setup();
        client.respond(url("gout"), article("Gout", "<p>Gout is arthritis. It hurts.</p>"));

        let first = block_on(cache.fetch("gout"));
        let second = block_on(cache.fetch("gout"));

        assert_eq!(first.excerpt, "Gout is arthritis. It hurts.");
        assert_eq!(first, second);
        assert_eq!(client.request_count(), 1);
        assert_eq!(cache.stats().hits, 1);
    }

    // -------------------------------------------------------------------------
    // Requirement 2: Redirects resolve and cache under both names
    // -------------------------------------------------------------------------
    #[test]
    fn test_redirect_cached_under_alias_and_canonical() {
        let (client, cache) = setup();
        client.respond(url("OldName"), redirect("OldName", "NewName"));
        client.respond(url("NewName"), article("NewName", "<p>Canonical text.</p>"));

        let via_alias = block_on(cache.fetch("OldName"));
        assert_eq!(client.request_count(), 2);

        let direct = block_on(cache.fetch("NewName"));
        let alias_again = block_on(cache.fetch("OldName"));

        assert_eq!(via_alias, direct);
        assert_eq!(alias_again, direct);
        assert_eq!(client.request_count(), 2, "no further network calls");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_redirect_to_already_cached_target_skips_fetch() {
        let (client, cache) = setup();
        client.respond(url("NewName"), article("NewName", "<p>Canonical text.</p>"));
        client.respond(url("OldName"), redirect("OldName", "NewName"));

        block_on(cache.fetch("NewName"));
        let via_alias = block_on(cache.fetch("OldName"));

        assert_eq!(via_alias.excerpt, "Canonical text.");
        assert_eq!(client.requests_for(&url("NewName")), 1);
    }

    // -------------------------------------------------------------------------
    // Requirement 3: Redirect cycles are bounded
    // -------------------------------------------------------------------------
    #[test]
    fn test_redirect_cycle_falls_back() {
        let (client, cache) = setup();
        client.respond(url("A"), redirect("A", "B"));
        client.respond(url("B"), redirect("B", "A"));

        let result = block_on(cache.fetch("A"));
        assert_eq!(result.excerpt, NOT_AVAILABLE_TEXT);
        assert_eq!(client.request_count(), 2);

        block_on(cache.fetch("A"));
        assert_eq!(client.request_count(), 2, "cycle result is cached");
    }

    #[test]
    fn test_long_redirect_chain_is_cut_off() {
        let (client, cache) = setup();
        for i in 0..20 {
            client.respond(url(&format!("T{}", i)), redirect(&format!("T{}", i), &format!("T{}", i + 1)));
        }

        let result = block_on(cache.fetch("T0"));
        assert_eq!(result.excerpt, NOT_AVAILABLE_TEXT);
        assert_eq!(client.request_count(), DEFAULT_HOPS + 1);
    }

    const DEFAULT_HOPS: usize = crate::config::DEFAULT_MAX_REDIRECTS;

    // -------------------------------------------------------------------------
    // Requirement 4: Missing pages are cached as not-available
    // -------------------------------------------------------------------------
    #[test]
    fn test_missing_page_cached_as_fallback() {
        let (client, cache) = setup();
        client.respond(url("zzz"), r#"{"query":{"pages":{"-1":{"ns":0,"title":"Zzz","missing":""}}}}"#);

        let result = block_on(cache.fetch("zzz"));
        assert_eq!(result, Definition::not_available());

        block_on(cache.fetch("zzz"));
        assert_eq!(client.request_count(), 1);
    }

    // -------------------------------------------------------------------------
    // Requirement 5: Transport and parse failures are not cached
    // -------------------------------------------------------------------------
    #[test]
    fn test_network_failure_not_cached() {
        let (client, cache) = setup();
        client.fail(url("gout"), FetchError::Network("offline".into()));

        let result = block_on(cache.fetch("gout"));
        assert_eq!(result.excerpt, ERROR_TEXT);
        assert!(result.image_url.is_none());
        assert!(cache.is_empty());

        client.respond(url("gout"), article("Gout", "<p>Gout is arthritis.</p>"));
        let retry = block_on(cache.fetch("gout"));
        assert_eq!(retry.excerpt, "Gout is arthritis.");
        assert_eq!(client.request_count(), 2);
    }

    #[test]
    fn test_parse_failure_not_cached() {
        let (client, cache) = setup();
        client.respond(url("gout"), "<!DOCTYPE html>");

        assert_eq!(block_on(cache.fetch("gout")), Definition::error());
        assert!(cache.cached("gout").is_none());
    }

    // -------------------------------------------------------------------------
    // Requirement 6: Thumbnails and sentence limit
    // -------------------------------------------------------------------------
    #[test]
    fn test_thumbnail_and_sentence_limit() {
        let (client, cache) = setup();
        let body = serde_json::json!({
            "query": { "pages": { "5": {
                "pageid": 5,
                "title": "Asthma",
                "extract": "<p>One. Two. Three. Four. Five.</p>",
                "thumbnail": { "source": "https://mdwiki.org/asthma.png" }
            } } }
        });
        client.respond(url("asthma"), body.to_string());

        let result = block_on(cache.fetch("asthma"));
        assert_eq!(result.excerpt, "One. Two. Three.");
        assert_eq!(result.image_url.as_deref(), Some("https://mdwiki.org/asthma.png"));
    }
}
