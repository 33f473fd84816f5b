//! MDWiki extract/pageimages response parsing

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::LookupError;

#[derive(Deserialize, Debug, Default)]
pub struct QueryResponse {
    #[serde(default)]
    pub query: Option<Query>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Query {
    #[serde(default)]
    pub redirects: Vec<Redirect>,
    /// Keyed by page id; `"-1"` for missing pages
    #[serde(default)]
    pub pages: BTreeMap<String, Page>,
}

#[derive(Deserialize, Debug)]
pub struct Redirect {
    pub from: Option<String>,
    pub to: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct Page {
    pub pageid: Option<u64>,
    pub title: Option<String>,
    /// Present (usually as `""`) when the title does not exist
    pub missing: Option<serde_json::Value>,
    pub extract: Option<String>,
    pub thumbnail: Option<Thumbnail>,
}

#[derive(Deserialize, Debug)]
pub struct Thumbnail {
    pub source: String,
}

/// What a single definition response tells us
#[derive(Debug, Clone, PartialEq)]
pub enum PageLookup {
    /// The title is an alias; look up the target instead
    Redirect(String),
    /// A real article intro (HTML) and optional thumbnail
    Article { extract: String, image_url: Option<String> },
}

/// Disambiguation pages list alternatives instead of defining anything
fn looks_like_disambiguation(extract: &str) -> bool {
    let lower = extract.to_lowercase();
    lower.contains("may refer to") || lower.contains("may also refer to")
}

impl QueryResponse {
    pub fn parse(body: &str) -> Result<Self, LookupError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Classify the response for `term`. Missing pages, empty extracts and
    /// disambiguation pages all map to `NotFoundOrAmbiguous`.
    pub fn classify(self, term: &str) -> Result<PageLookup, LookupError> {
        let not_found = || LookupError::NotFoundOrAmbiguous(term.to_string());
        let query = self.query.ok_or_else(not_found)?;

        if let Some(redirect) = query.redirects.into_iter().next() {
            return Ok(PageLookup::Redirect(redirect.to));
        }

        let page = query.pages.into_values().next().ok_or_else(not_found)?;
        if page.pageid.is_none() || page.missing.is_some() {
            return Err(not_found());
        }

        match page.extract {
            Some(extract) if !extract.trim().is_empty() && !looks_like_disambiguation(&extract) => {
                Ok(PageLookup::Article {
                    extract,
                    image_url: page.thumbnail.map(|t| t.source),
                })
            }
            _ => Err(not_found()),
        }
    }
}
