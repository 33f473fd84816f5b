pub mod api;
pub mod excerpt;
pub mod cache;

pub use api::*;
pub use cache::*;

use serde::{Deserialize, Serialize};

pub const NOT_AVAILABLE_TEXT: &str = "Disambiguation or definition not available.";
pub const ERROR_TEXT: &str = "Error retrieving definition.";

/// Tooltip payload for one term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    /// Plain text, at most `max_sentences` sentences
    pub excerpt: String,
    pub image_url: Option<String>,
}

impl Definition {
    pub fn not_available() -> Self {
        Self {
            excerpt: NOT_AVAILABLE_TEXT.to_string(),
            image_url: None,
        }
    }

    pub fn error() -> Self {
        Self {
            excerpt: ERROR_TEXT.to_string(),
            image_url: None,
        }
    }

    /// Transient failure text, worth retrying on a later hover
    pub fn is_error(&self) -> bool {
        self.image_url.is_none() && self.excerpt == ERROR_TEXT
    }
}
