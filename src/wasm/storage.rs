//! `chrome.storage.local` and packaged resources

use async_trait::async_trait;
use js_sys::{Object, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::error::LoadError;
use crate::terms::DictionaryStore;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = get)]
    fn storage_get(keys: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = set)]
    fn storage_set(items: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "runtime"], js_name = getURL)]
    fn runtime_get_url(path: &str) -> Result<String, JsValue>;
}

fn read_error(e: JsValue) -> LoadError {
    LoadError::Read(format!("{:?}", e))
}

/// URL of a file packaged with the extension, or the path itself outside one
pub fn resource_url(path: &str) -> String {
    runtime_get_url(path).unwrap_or_else(|_| path.to_string())
}

/// [`DictionaryStore`] over `chrome.storage.local`
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromeStore;

#[async_trait(?Send)]
impl DictionaryStore for ChromeStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<String>>, LoadError> {
        let items = JsFuture::from(storage_get(&JsValue::from_str(key)).map_err(read_error)?)
            .await
            .map_err(read_error)?;
        let value = Reflect::get(&items, &JsValue::from_str(key)).map_err(read_error)?;
        if value.is_undefined() || value.is_null() {
            return Ok(None);
        }
        serde_wasm_bindgen::from_value(value)
            .map(Some)
            .map_err(|e| LoadError::Read(e.to_string()))
    }

    async fn set(&self, key: &str, values: Vec<String>) -> Result<(), LoadError> {
        let items = Object::new();
        let list = serde_wasm_bindgen::to_value(&values).map_err(|e| LoadError::Read(e.to_string()))?;
        Reflect::set(&items, &JsValue::from_str(key), &list).map_err(read_error)?;
        JsFuture::from(storage_set(&items).map_err(read_error)?)
            .await
            .map_err(read_error)?;
        Ok(())
    }
}
