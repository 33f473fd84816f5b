//! Annotator configuration and MDWiki endpoint construction
//!
//! Every field has a default, so an empty JS object (or `null`) is a valid
//! configuration.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

// =============================================================================
// Defaults
// =============================================================================

pub const DEFAULT_WIKI_BASE: &str = "https://mdwiki.org";
pub const DEFAULT_BATCH_SIZE: usize = 20;
pub const DEFAULT_DEBOUNCE_MS: u32 = 200;
pub const DEFAULT_HIDE_DELAY_MS: u32 = 300;
pub const DEFAULT_MAX_SENTENCES: usize = 3;
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

/// Attribute placed on every element the annotator creates
pub const PROCESSED_ATTRIBUTE: &str = "data-processed";

fn default_wiki_base() -> String { DEFAULT_WIKI_BASE.to_string() }
fn default_batch_size() -> usize { DEFAULT_BATCH_SIZE }
fn default_debounce_ms() -> u32 { DEFAULT_DEBOUNCE_MS }
fn default_hide_delay_ms() -> u32 { DEFAULT_HIDE_DELAY_MS }
fn default_max_sentences() -> usize { DEFAULT_MAX_SENTENCES }
fn default_max_redirects() -> usize { DEFAULT_MAX_REDIRECTS }
fn default_thumbnail_size() -> u32 { 200 }
fn default_tooltip_max_width() -> u32 { 400 }
fn default_image_max_width() -> u32 { 100 }
fn default_processed_attribute() -> String { PROCESSED_ATTRIBUTE.to_string() }
fn default_link_class() -> String { "highlighted-term".to_string() }
fn default_tooltip_class() -> String { "term-tooltip".to_string() }
fn default_refresh_page_limit() -> u32 { 1000 }
fn default_max_refresh_pages() -> usize { 10 }
fn default_log_level() -> String { "info".to_string() }

// =============================================================================
// AnnotatorConfig
// =============================================================================

/// Configuration for a page annotator and its background refresh
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AnnotatorConfig {
    /// Encyclopedia origin; API and article URLs derive from it
    #[serde(default = "default_wiki_base")]
    pub wiki_base: String,
    /// Text nodes processed per animation frame
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,
    /// Grace period before a tooltip closes after the pointer leaves
    #[serde(default = "default_hide_delay_ms")]
    pub hide_delay_ms: u32,
    #[serde(default = "default_max_sentences")]
    pub max_sentences: usize,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_size: u32,
    #[serde(default = "default_tooltip_max_width")]
    pub tooltip_max_width_px: u32,
    #[serde(default = "default_image_max_width")]
    pub image_max_width_px: u32,
    #[serde(default = "default_processed_attribute")]
    pub processed_attribute: String,
    #[serde(default = "default_link_class")]
    pub link_class: String,
    #[serde(default = "default_tooltip_class")]
    pub tooltip_class: String,
    /// `aplimit` for each term-list request
    #[serde(default = "default_refresh_page_limit")]
    pub refresh_page_limit: u32,
    /// Upper bound on `continue` round-trips during one refresh
    #[serde(default = "default_max_refresh_pages")]
    pub max_refresh_pages: usize,
    /// `error`, `warn`, `info`, `debug`, `trace` or `off`
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            wiki_base: default_wiki_base(),
            batch_size: default_batch_size(),
            debounce_ms: default_debounce_ms(),
            hide_delay_ms: default_hide_delay_ms(),
            max_sentences: default_max_sentences(),
            max_redirects: default_max_redirects(),
            thumbnail_size: default_thumbnail_size(),
            tooltip_max_width_px: default_tooltip_max_width(),
            image_max_width_px: default_image_max_width(),
            processed_attribute: default_processed_attribute(),
            link_class: default_link_class(),
            tooltip_class: default_tooltip_class(),
            refresh_page_limit: default_refresh_page_limit(),
            max_refresh_pages: default_max_refresh_pages(),
            log_level: default_log_level(),
        }
    }
}

impl AnnotatorConfig {
    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(&self.wiki_base)
    }

    /// Parsed `log_level`; unknown names fall back to `Info`
    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

// =============================================================================
// Endpoints
// =============================================================================

/// Same escape set as JavaScript's `encodeURIComponent`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// MDWiki URL builder
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    api: String,
    article: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_WIKI_BASE)
    }
}

impl Endpoints {
    pub fn new(wiki_base: &str) -> Self {
        let base = wiki_base.trim_end_matches('/');
        Self {
            api: format!("{}/w/api.php", base),
            article: format!("{}/wiki/", base),
        }
    }

    /// Extract + thumbnail query for one title
    pub fn definition_url(&self, title: &str, thumbnail_size: u32) -> String {
        format!(
            "{}?action=query&prop=extracts|pageimages&exintro&titles={}&format=json&pithumbsize={}&redirects=1&origin=*",
            self.api,
            encode_component(title),
            thumbnail_size
        )
    }

    /// One page of the `allpages` listing
    pub fn all_pages_url(&self, limit: u32, continue_from: Option<&str>) -> String {
        let mut url = format!(
            "{}?action=query&list=allpages&aplimit={}&format=json&origin=*",
            self.api, limit
        );
        if let Some(token) = continue_from {
            url.push_str("&apcontinue=");
            url.push_str(&encode_component(token));
        }
        url
    }

    /// Article link target for a highlighted term
    pub fn article_url(&self, term: &str) -> String {
        format!("{}{}", self.article, encode_component(term))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = AnnotatorConfig::default();
        assert_eq!(config.batch_size, 20);
        assert_eq!(config.debounce_ms, 200);
        assert_eq!(config.hide_delay_ms, 300);
        assert_eq!(config.max_sentences, 3);
        assert_eq!(config.processed_attribute, "data-processed");
        assert_eq!(config.level_filter(), log::LevelFilter::Info);
    }

    #[test]
    fn test_log_level_parsing() {
        let config: AnnotatorConfig = serde_json::from_str(r#"{"log_level": "debug"}"#).unwrap();
        assert_eq!(config.level_filter(), log::LevelFilter::Debug);

        let config: AnnotatorConfig = serde_json::from_str(r#"{"log_level": "chatty"}"#).unwrap();
        assert_eq!(config.level_filter(), log::LevelFilter::Info);
    }

    #[test]
    fn test_partial_config_parsing() {
        let json = r#"{"batch_size": 5, "wiki_base": "https://example.org/"}"#;
        let config: AnnotatorConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.batch_size, 5);
        assert_eq!(config.debounce_ms, 200);
        assert_eq!(config.endpoints().article_url("x"), "https://example.org/wiki/x");
    }

    #[test]
    fn test_article_url_matches_encode_uri_component() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.article_url("type 2 diabetes"),
            "https://mdwiki.org/wiki/type%202%20diabetes"
        );
        assert_eq!(
            endpoints.article_url("crohn's disease (adult)"),
            "https://mdwiki.org/wiki/crohn's%20disease%20(adult)"
        );
        assert_eq!(endpoints.article_url("ménière"), "https://mdwiki.org/wiki/m%C3%A9ni%C3%A8re");
    }

    #[test]
    fn test_definition_url() {
        let url = Endpoints::default().definition_url("Heart attack", 200);
        assert_eq!(
            url,
            "https://mdwiki.org/w/api.php?action=query&prop=extracts|pageimages&exintro&titles=Heart%20attack&format=json&pithumbsize=200&redirects=1&origin=*"
        );
    }

    #[test]
    fn test_all_pages_url_with_continue() {
        let endpoints = Endpoints::default();
        assert!(!endpoints.all_pages_url(1000, None).contains("apcontinue"));
        assert!(endpoints
            .all_pages_url(1000, Some("Abdominal pain"))
            .ends_with("&apcontinue=Abdominal%20pain"));
    }
}
