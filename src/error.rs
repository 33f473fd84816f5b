//! Error types
//!
//! None of these ever reach the host page: definition errors become fallback
//! text, dictionary errors become an empty term set, DOM errors are logged.

use thiserror::Error;

/// Transport-level failure from an [`HttpClient`](crate::http::HttpClient)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("network request failed: {0}")]
    Network(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),
}

/// Failure while resolving a definition
#[derive(Error, Debug)]
pub enum LookupError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("malformed definition response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no usable page for '{0}'")]
    NotFoundOrAmbiguous(String),

    #[error("redirect cycle while resolving '{term}' after {hops} hops")]
    RedirectCycle { term: String, hops: usize },
}

/// Failure while reading the term dictionary
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("dictionary read failed: {0}")]
    Read(String),

    #[error("malformed dictionary: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Failure during the background term-list refresh
#[derive(Error, Debug)]
pub enum RefreshError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("malformed term list: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("term list response has no `query.allpages`")]
    MissingQuery,

    #[error("term list is empty")]
    Empty,

    #[error("could not persist term list: {0}")]
    Store(#[from] LoadError),
}

/// Failure while mutating the document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomError {
    #[error("node is not a text node")]
    NotText,

    #[error("range {start}..{end} is invalid for text of length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("document has no body")]
    NoBody,

    #[error("host DOM error: {0}")]
    Host(String),
}
