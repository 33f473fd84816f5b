//! Browser bindings
//!
//! `ContentScript` is the content-script entry point: one instance per page.
//! `refreshDictionary` and friends are meant for the background worker.
//!
//! ```javascript,ignore
//! import init, { ContentScript } from 'medlens';
//!
//! await init();
//! const script = new ContentScript({ log_level: 'debug' });
//! script.activate();
//! ```

pub mod dom;
pub mod host;
pub mod http;
pub mod logger;
pub mod storage;

pub use dom::BrowserDom;
pub use host::BrowserHost;
pub use http::FetchClient;
pub use storage::ChromeStore;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use chrono::{DateTime, Utc};
use log::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Event, Window};

use crate::config::AnnotatorConfig;
use crate::definition::DefinitionCache;
use crate::http::HttpClient;
use crate::page::{run_followup, Followup, PageAnnotator, PageEvent};
use crate::terms::{
    DictionaryRefresher, RefreshSchedule, ResourceDictionary, StoredDictionary, TermSetLoader,
    REFRESH_PERIOD_MINUTES,
};

/// Packaged fallback dictionary
pub const BUNDLED_DICTIONARY: &str = "medical-terms.json";

/// Callback used by listeners, timers and observers to reach the page
pub type EventSink = Rc<dyn Fn(PageEvent)>;

type BrowserPage = PageAnnotator<BrowserDom, BrowserHost>;

fn js_error(message: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&message.to_string())
}

fn parse_config(config: JsValue) -> Result<AnnotatorConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(AnnotatorConfig::default());
    }
    serde_wasm_bindgen::from_value(config).map_err(|e| js_error(format!("invalid config: {}", e)))
}

fn spawn(page: Rc<RefCell<BrowserPage>>, followup: Followup) {
    wasm_bindgen_futures::spawn_local(async move {
        run_followup(&page, followup).await;
    });
}

fn event_sink(page: Weak<RefCell<BrowserPage>>) -> EventSink {
    Rc::new(move |event: PageEvent| {
        let Some(page) = page.upgrade() else {
            return;
        };
        let followup = match page.try_borrow_mut() {
            Ok(mut annotator) => annotator.handle(event),
            Err(_) => {
                warn!("[ContentScript] dropped {:?} delivered during an update", event);
                return;
            }
        };
        if let Some(followup) = followup {
            spawn(page, followup);
        }
    })
}

fn stylesheet(config: &AnnotatorConfig) -> String {
    format!(
        ".{link} {{ text-decoration: underline; text-decoration-color: green; color: inherit; cursor: pointer; }}\n\
         .{link}:visited {{ color: inherit; text-decoration-color: green; }}\n\
         .{link}:hover {{ text-decoration: underline; text-decoration-color: blue; color: inherit; }}\n\
         .{tooltip} {{ font-size: 16px; background-color: white; color: black; border: 1px solid gray; \
         padding: 5px; position: absolute; z-index: 1000; max-width: {width}px; word-wrap: break-word; \
         border-radius: 5px; box-shadow: 0px 4px 12px rgba(0, 0, 0, 0.1); }}",
        link = config.link_class,
        tooltip = config.tooltip_class,
        width = config.tooltip_max_width_px,
    )
}

fn inject_stylesheet(document: &Document, config: &AnnotatorConfig) -> Result<(), JsValue> {
    let Some(head) = document.head() else {
        return Ok(());
    };
    let style = document.create_element("style")?;
    style.set_attribute(&config.processed_attribute, "true")?;
    style.set_text_content(Some(&stylesheet(config)));
    head.append_child(&style)?;
    Ok(())
}

// =============================================================================
// ContentScript
// =============================================================================

#[wasm_bindgen]
pub struct ContentScript {
    page: Rc<RefCell<BrowserPage>>,
    window: Window,
    on_scroll: Option<Closure<dyn FnMut(Event)>>,
}

#[wasm_bindgen]
impl ContentScript {
    /// Build the page controller. `config` may be `undefined` or any subset
    /// of the configuration fields.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<ContentScript, JsValue> {
        let config = parse_config(config)?;
        logger::init(config.level_filter());

        let window = web_sys::window().ok_or_else(|| js_error("no window"))?;
        let document = window.document().ok_or_else(|| js_error("no document"))?;
        inject_stylesheet(&document, &config)?;

        let client: Rc<dyn HttpClient> = Rc::new(FetchClient);
        let definitions = Rc::new(DefinitionCache::new(&config, Rc::clone(&client)));
        let bundled = Rc::new(ResourceDictionary::new(client, storage::resource_url(BUNDLED_DICTIONARY)));
        let loader = Rc::new(TermSetLoader::new(Rc::new(StoredDictionary::new(
            Rc::new(ChromeStore),
            bundled,
        ))));

        let page = Rc::new_cyclic(|weak: &Weak<RefCell<BrowserPage>>| {
            let sink = event_sink(weak.clone());
            let body = document.body().map(|b| b.unchecked_into());
            let host = BrowserHost::new(window.clone(), body, Rc::clone(&sink), &config.processed_attribute);
            let dom = BrowserDom::new(window.clone(), document.clone(), sink);
            RefCell::new(PageAnnotator::new(config, dom, host, definitions, loader))
        });

        Ok(ContentScript {
            page,
            window,
            on_scroll: None,
        })
    }

    /// Highlight the page and keep it highlighted as it changes
    pub fn activate(&mut self) -> Result<(), JsValue> {
        if self.on_scroll.is_none() {
            let page = Rc::downgrade(&self.page);
            let sink = event_sink(page);
            let on_scroll: Closure<dyn FnMut(Event)> = Closure::new(move |_: Event| sink(PageEvent::Scroll));
            self.window
                .add_event_listener_with_callback("scroll", on_scroll.as_ref().unchecked_ref())?;
            self.on_scroll = Some(on_scroll);
        }
        let followup = self.page.borrow_mut().activate();
        if let Some(followup) = followup {
            spawn(Rc::clone(&self.page), followup);
        }
        Ok(())
    }

    /// Rescan right away, skipping the debounce
    pub fn rescan(&mut self) -> Result<(), JsValue> {
        self.activate()
    }

    /// Stop observing and remove the tooltip. Existing links stay.
    pub fn dispose(&mut self) {
        self.page.borrow_mut().dispose();
        if let Some(on_scroll) = self.on_scroll.take() {
            let _ = self
                .window
                .remove_event_listener_with_callback("scroll", on_scroll.as_ref().unchecked_ref());
        }
    }

    #[wasm_bindgen(js_name = getStats)]
    pub fn get_stats(&self) -> Result<JsValue, JsValue> {
        let stats = self.page.borrow().stats();
        serde_wasm_bindgen::to_value(&stats).map_err(js_error)
    }
}

// =============================================================================
// Background worker
// =============================================================================

/// Fetch the full term list from the encyclopedia and persist it. Resolves
/// to the number of stored terms, or `undefined` after a logged failure that
/// left the store unchanged. Rejects only for an invalid config.
#[wasm_bindgen(js_name = refreshDictionary)]
pub async fn refresh_dictionary(config: JsValue) -> Result<Option<u32>, JsValue> {
    let config = parse_config(config)?;
    logger::init(config.level_filter());
    let refresher = DictionaryRefresher::new(&config, Rc::new(FetchClient), Rc::new(ChromeStore));
    Ok(refresher.refresh_logged().await.map(|count| count as u32))
}

/// Alarm period for the background refresh
#[wasm_bindgen(js_name = refreshPeriodMinutes)]
pub fn refresh_period_minutes() -> u32 {
    u32::try_from(RefreshSchedule::default().period_minutes()).unwrap_or(REFRESH_PERIOD_MINUTES)
}

/// Whether a refresh last run at `last_run_ms` (epoch millis) is due now
#[wasm_bindgen(js_name = isRefreshDue)]
pub fn is_refresh_due(last_run_ms: Option<f64>) -> bool {
    let last_run = last_run_ms.and_then(|ms| DateTime::<Utc>::from_timestamp_millis(ms as i64));
    let now = DateTime::<Utc>::from_timestamp_millis(js_sys::Date::now() as i64).unwrap_or_default();
    RefreshSchedule::default().is_due(last_run, now)
}
