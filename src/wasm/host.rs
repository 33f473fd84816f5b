//! BrowserHost: timers, animation frames and the mutation observer
//!
//! Each kind of callback is one long-lived closure; timers pass their own id
//! as the `setTimeout` argument, so nothing is allocated or leaked per timer.

use std::collections::HashMap;

use js_sys::Array;
use log::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, MutationObserver, MutationObserverInit, MutationRecord, Node, Window};

use crate::page::{Host, PageEvent, TimerId};
use crate::wasm::EventSink;

pub struct BrowserHost {
    window: Window,
    body: Option<Node>,
    timers: HashMap<TimerId, i32>,
    next_timer: u32,
    on_timeout: Closure<dyn FnMut(JsValue)>,
    on_frame: Closure<dyn FnMut(f64)>,
    observer: Option<MutationObserver>,
    _on_mutations: Closure<dyn FnMut(Array, MutationObserver)>,
}

/// Whether a record added anything besides our own marked elements
fn adds_foreign_content(record: &MutationRecord, processed_attribute: &str) -> bool {
    let added = record.added_nodes();
    (0..added.length())
        .filter_map(|i| added.get(i))
        .any(|node| {
            node.dyn_ref::<Element>()
                .map_or(true, |el| !el.has_attribute(processed_attribute))
        })
}

impl BrowserHost {
    pub fn new(window: Window, body: Option<Node>, sink: EventSink, processed_attribute: &str) -> Self {
        let timer_sink = sink.clone();
        let on_timeout = Closure::new(move |id: JsValue| {
            if let Some(id) = id.as_f64() {
                timer_sink(PageEvent::Timer(TimerId(id as u32)));
            }
        });

        let frame_sink = sink.clone();
        let on_frame = Closure::new(move |_timestamp: f64| frame_sink(PageEvent::Frame));

        let attribute = processed_attribute.to_string();
        let on_mutations = Closure::new(move |records: Array, _observer: MutationObserver| {
            let relevant = records
                .iter()
                .filter_map(|r| r.dyn_into::<MutationRecord>().ok())
                .filter(|r| adds_foreign_content(r, &attribute))
                .count();
            if relevant > 0 {
                sink(PageEvent::Mutations(relevant));
            }
        });

        let observer = match MutationObserver::new(on_mutations.as_ref().unchecked_ref()) {
            Ok(observer) => Some(observer),
            Err(e) => {
                warn!("[BrowserHost] MutationObserver unavailable: {:?}", e);
                None
            }
        };

        Self {
            window,
            body,
            timers: HashMap::new(),
            next_timer: 0,
            on_timeout,
            on_frame,
            observer,
            _on_mutations: on_mutations,
        }
    }
}

impl Host for BrowserHost {
    fn set_timeout(&mut self, delay_ms: u32) -> TimerId {
        self.next_timer += 1;
        let id = TimerId(self.next_timer);
        match self.window.set_timeout_with_callback_and_timeout_and_arguments_1(
            self.on_timeout.as_ref().unchecked_ref(),
            delay_ms as i32,
            &JsValue::from(id.0),
        ) {
            Ok(handle) => {
                self.timers.insert(id, handle);
            }
            Err(e) => warn!("[BrowserHost] setTimeout failed: {:?}", e),
        }
        id
    }

    fn clear_timeout(&mut self, id: TimerId) {
        if let Some(handle) = self.timers.remove(&id) {
            self.window.clear_timeout_with_handle(handle);
        }
    }

    fn timer_elapsed(&mut self, id: TimerId) {
        self.timers.remove(&id);
    }

    fn request_frame(&mut self) {
        if let Err(e) = self
            .window
            .request_animation_frame(self.on_frame.as_ref().unchecked_ref())
        {
            warn!("[BrowserHost] requestAnimationFrame failed: {:?}", e);
        }
    }

    fn observe(&mut self) {
        let (Some(observer), Some(body)) = (&self.observer, &self.body) else {
            return;
        };
        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        if let Err(e) = observer.observe_with_options(body, &options) {
            warn!("[BrowserHost] could not observe body: {:?}", e);
        }
    }

    fn disconnect(&mut self) {
        if let Some(observer) = &self.observer {
            observer.disconnect();
        }
    }
}
