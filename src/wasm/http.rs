use async_trait::async_trait;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Response, Window, WorkerGlobalScope};

use crate::error::FetchError;
use crate::http::HttpClient;

fn network(e: JsValue) -> FetchError {
    FetchError::Network(format!("{:?}", e))
}

/// `fetch` from whichever global scope we run in: a page window for the
/// content script, a service worker for the background refresh.
fn fetch(url: &str) -> Result<js_sys::Promise, FetchError> {
    let global = js_sys::global();
    if let Some(window) = global.dyn_ref::<Window>() {
        return Ok(window.fetch_with_str(url));
    }
    if let Some(worker) = global.dyn_ref::<WorkerGlobalScope>() {
        return Ok(worker.fetch_with_str(url));
    }
    Err(FetchError::Network("no fetch in this global scope".to_string()))
}

/// `fetch` client for windows and workers
#[derive(Debug, Default, Clone, Copy)]
pub struct FetchClient;

#[async_trait(?Send)]
impl HttpClient for FetchClient {
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let resp_value = JsFuture::from(fetch(url)?).await.map_err(network)?;
        let resp: Response = resp_value
            .dyn_into()
            .map_err(|_| FetchError::Network("response is not a Response".to_string()))?;

        if !resp.ok() {
            return Err(FetchError::Status(resp.status()));
        }

        let body = JsFuture::from(resp.text().map_err(network)?)
            .await
            .map_err(network)?;
        body.as_string()
            .ok_or_else(|| FetchError::Network("response body is not text".to_string()))
    }
}
