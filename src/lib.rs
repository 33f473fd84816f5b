//! MedLens: medical term highlighting + MDWiki definition tooltips
//!
//! A Rust/WASM content engine for a browser extension. It finds dictionary
//! terms in the visible text of a page, turns each whole-word occurrence
//! into a link to its encyclopedia article, and shows a short definition
//! when the pointer rests on a link.
//!
//! # Architecture
//!
//! ## Core (target independent)
//! - `terms/` - TermSet, dictionary sources, TermSetLoader, DictionaryRefresher
//! - `definition/` - DefinitionCache: MDWiki lookups, redirects, excerpts
//! - `dom/` - Dom trait, MemoryDom, TextScanner
//! - `highlight/` - TermMatcher (Aho-Corasick) and batched HighlightPass
//! - `page/` - PageAnnotator, MutationCoordinator, TooltipController
//!
//! ## Browser (wasm32 only)
//! - `wasm/` - BrowserDom, BrowserHost, FetchClient, ChromeStore, ConsoleLogger
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { ContentScript, refreshDictionary, refreshPeriodMinutes } from 'medlens';
//!
//! await init();
//!
//! // Content script: highlight now, keep up with page changes
//! const script = new ContentScript({ batch_size: 20 });
//! script.activate();
//! console.log(script.getStats());
//!
//! // Background worker: refresh the stored term list
//! chrome.alarms.create('refresh', { periodInMinutes: refreshPeriodMinutes() });
//! const stored = await refreshDictionary();
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod terms;
pub mod definition;
pub mod dom;
pub mod highlight;
pub mod page;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use config::*;
pub use error::*;
pub use http::HttpClient;

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("medlens v{}", env!("CARGO_PKG_VERSION"))
}
