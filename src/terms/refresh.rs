//! Background dictionary refresh
//!
//! Pulls the MDWiki `allpages` listing and persists the titles under
//! [`TERMS_KEY`]. On any failure the stored dictionary is left untouched, so
//! a stale dictionary survives until the next successful run.

use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use serde::Deserialize;

use crate::config::{AnnotatorConfig, Endpoints};
use crate::error::RefreshError;
use crate::http::HttpClient;
use crate::terms::store::{DictionaryStore, TERMS_KEY};

/// 30 days, the alarm period registered by the extension shim
pub const REFRESH_PERIOD_MINUTES: u32 = 43_200;

// =============================================================================
// Wire format
// =============================================================================

#[derive(Deserialize, Debug)]
struct AllPagesResponse {
    query: Option<AllPagesQuery>,
    #[serde(rename = "continue")]
    continuation: Option<Continuation>,
}

#[derive(Deserialize, Debug)]
struct AllPagesQuery {
    allpages: Vec<PageTitle>,
}

#[derive(Deserialize, Debug)]
struct PageTitle {
    title: String,
}

#[derive(Deserialize, Debug)]
struct Continuation {
    apcontinue: Option<String>,
}

// =============================================================================
// DictionaryRefresher
// =============================================================================

pub struct DictionaryRefresher {
    client: Rc<dyn HttpClient>,
    store: Rc<dyn DictionaryStore>,
    endpoints: Endpoints,
    page_limit: u32,
    max_pages: usize,
}

impl DictionaryRefresher {
    pub fn new(
        config: &AnnotatorConfig,
        client: Rc<dyn HttpClient>,
        store: Rc<dyn DictionaryStore>,
    ) -> Self {
        Self {
            client,
            store,
            endpoints: config.endpoints(),
            page_limit: config.refresh_page_limit,
            max_pages: config.max_refresh_pages.max(1),
        }
    }

    /// Fetch the full term list and persist it. Returns the number of titles
    /// stored.
    pub async fn refresh(&self) -> Result<usize, RefreshError> {
        let mut titles = Vec::new();
        let mut continue_from: Option<String> = None;

        for _ in 0..self.max_pages {
            let url = self.endpoints.all_pages_url(self.page_limit, continue_from.as_deref());
            let body = self.client.get_text(&url).await?;
            let response: AllPagesResponse = serde_json::from_str(&body)?;

            let query = response.query.ok_or(RefreshError::MissingQuery)?;
            titles.extend(query.allpages.into_iter().map(|p| p.title));

            continue_from = response.continuation.and_then(|c| c.apcontinue);
            if continue_from.is_none() {
                break;
            }
        }

        if titles.is_empty() {
            return Err(RefreshError::Empty);
        }

        let count = titles.len();
        self.store.set(TERMS_KEY, titles).await?;
        info!("[DictionaryRefresher] medical terms updated and stored ({} titles)", count);
        Ok(count)
    }

    /// [`refresh`](Self::refresh) with the error logged instead of returned
    pub async fn refresh_logged(&self) -> Option<usize> {
        match self.refresh().await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!("[DictionaryRefresher] error fetching medical terms: {}", e);
                None
            }
        }
    }
}

// =============================================================================
// RefreshSchedule
// =============================================================================

/// Fixed-period schedule for the background refresh
#[derive(Debug, Clone, Copy)]
pub struct RefreshSchedule {
    period: Duration,
}

impl Default for RefreshSchedule {
    fn default() -> Self {
        Self {
            period: Duration::minutes(REFRESH_PERIOD_MINUTES as i64),
        }
    }
}

impl RefreshSchedule {
    pub fn period_minutes(&self) -> i64 {
        self.period.num_minutes()
    }

    /// A refresh that has never run is always due
    pub fn is_due(&self, last_run: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match last_run {
            None => true,
            Some(last) => now - last >= self.period,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
