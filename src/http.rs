//! HTTP seam
//!
//! The engine never talks to the network directly; the browser build plugs in
//! a `fetch`-backed client and tests plug in canned responses.

use async_trait::async_trait;

use crate::error::FetchError;

/// Minimal GET client returning the response body as text
#[async_trait(?Send)]
pub trait HttpClient {
    async fn get_text(&self, url: &str) -> Result<String, FetchError>;
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Canned responses keyed by exact URL, with a request log
    #[derive(Default)]
    pub struct MockClient {
        responses: RefCell<HashMap<String, Result<String, FetchError>>>,
        requests: RefCell<Vec<String>>,
    }

    impl MockClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(&self, url: impl Into<String>, body: impl Into<String>) {
            self.responses.borrow_mut().insert(url.into(), Ok(body.into()));
        }

        pub fn fail(&self, url: impl Into<String>, error: FetchError) {
            self.responses.borrow_mut().insert(url.into(), Err(error));
        }

        pub fn request_count(&self) -> usize {
            self.requests.borrow().len()
        }

        pub fn requests_for(&self, url: &str) -> usize {
            self.requests.borrow().iter().filter(|u| u.as_str() == url).count()
        }
    }

    #[async_trait(?Send)]
    impl HttpClient for MockClient {
        async fn get_text(&self, url: &str) -> Result<String, FetchError> {
            self.requests.borrow_mut().push(url.to_string());
            self.responses
                .borrow()
                .get(url)
                .cloned()
                .unwrap_or(Err(FetchError::Status(404)))
        }
    }
}
