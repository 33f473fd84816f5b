use std::cell::RefCell;
use std::rc::Rc;

use futures::executor::block_on;

use crate::config::AnnotatorConfig;
use crate::definition::DefinitionCache;
use crate::dom::{LinkId, MemoryDom, NodeId, LINK_ID_ATTRIBUTE, TOOLTIP_ID_ATTRIBUTE};
use crate::http::mock::MockClient;
use crate::page::{run_followup, Followup, Host, PageAnnotator, PageEvent, TimerId};
use crate::terms::{BundledDictionary, TermSetLoader};

/// Host with a virtual clock. Timers fire only when the test advances time.
#[derive(Debug, Default)]
pub struct ManualHost {
    now: u64,
    next_id: u32,
    timers: Vec<(TimerId, u64)>,
    frame_requested: bool,
    pub observing: bool,
    pub connects: usize,
}

impl ManualHost {
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    pub fn take_frame(&mut self) -> bool {
        std::mem::take(&mut self.frame_requested)
    }

    /// Earliest timer due at or before `until`, moving the clock to it
    pub fn pop_due(&mut self, until: u64) -> Option<TimerId> {
        let (index, &(id, deadline)) = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, (_, deadline))| *deadline <= until)
            .min_by_key(|(_, (id, deadline))| (*deadline, id.0))?;
        self.timers.remove(index);
        self.now = deadline;
        Some(id)
    }

    pub fn set_now(&mut self, now: u64) {
        self.now = now;
    }
}

impl Host for ManualHost {
    fn set_timeout(&mut self, delay_ms: u32) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.timers.push((id, self.now + u64::from(delay_ms)));
        id
    }

    fn clear_timeout(&mut self, id: TimerId) {
        self.timers.retain(|(t, _)| *t != id);
    }

    fn request_frame(&mut self) {
        self.frame_requested = true;
    }

    fn observe(&mut self) {
        self.observing = true;
        self.connects += 1;
    }

    fn disconnect(&mut self) {
        self.observing = false;
    }
}

pub type TestPage = PageAnnotator<MemoryDom, ManualHost>;

pub struct Harness {
    pub page: RefCell<TestPage>,
    pub client: Rc<MockClient>,
}

impl Harness {
    pub fn new(paragraphs: &[&str], terms: &[&str]) -> Self {
        let json = serde_json::json!({ "terms": terms }).to_string();
        Self::with_dictionary(paragraphs, &json)
    }

    pub fn with_dictionary(paragraphs: &[&str], dictionary_json: &str) -> Self {
        let config = AnnotatorConfig::default();
        let client = Rc::new(MockClient::new());
        let definitions = Rc::new(DefinitionCache::new(&config, client.clone()));
        let loader = Rc::new(TermSetLoader::new(Rc::new(BundledDictionary::new(dictionary_json))));
        let (dom, _) = MemoryDom::with_paragraphs(paragraphs);
        let page = PageAnnotator::new(config, dom, ManualHost::default(), definitions, loader);
        Self {
            page: RefCell::new(page),
            client,
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut TestPage) -> R) -> R {
        f(&mut self.page.borrow_mut())
    }

    pub fn resolve(&self, followup: Option<Followup>) {
        if let Some(followup) = followup {
            block_on(run_followup(&self.page, followup));
        }
    }

    /// Deliver an event and resolve whatever it asks for
    pub fn dispatch(&self, event: PageEvent) {
        let followup = self.page.borrow_mut().handle(event);
        self.resolve(followup);
    }

    /// Run animation frames until none is requested
    pub fn run_frames(&self) {
        while self.with(|p| p.host_mut().take_frame()) {
            self.dispatch(PageEvent::Frame);
        }
    }

    /// Activate and let the first pass finish
    pub fn activate(&self) {
        let followup = self.with(|p| p.activate());
        self.resolve(followup);
        self.run_frames();
    }

    pub fn rescan(&self) {
        let followup = self.with(|p| p.rescan_now());
        self.resolve(followup);
        self.run_frames();
    }

    /// Move the virtual clock forward, firing due timers in order and
    /// running any frames they cause
    pub fn advance(&self, ms: u64) {
        let until = self.with(|p| p.host().now()) + ms;
        while let Some(id) = self.with(|p| p.host_mut().pop_due(until)) {
            self.dispatch(PageEvent::Timer(id));
            self.run_frames();
        }
        self.with(|p| p.host_mut().set_now(until));
    }

    pub fn link_texts(&self) -> Vec<String> {
        self.with(|p| {
            let dom = p.dom();
            dom.links().iter().map(|&n| dom.text_content(n)).collect()
        })
    }

    /// Id of the `index`-th link in document order
    pub fn link_id(&self, index: usize) -> LinkId {
        self.with(|p| {
            let dom = p.dom();
            let node = dom.links()[index];
            let raw = dom.attribute(node, LINK_ID_ATTRIBUTE).unwrap_or("0");
            LinkId(raw.parse().unwrap())
        })
    }

    pub fn tooltip_nodes(&self) -> Vec<NodeId> {
        self.with(|p| p.dom().tooltips())
    }

    pub fn tooltip_text(&self) -> Option<String> {
        self.with(|p| {
            let dom = p.dom();
            dom.tooltips().first().map(|&n| dom.text_content(n))
        })
    }

    pub fn tooltip_id_attribute(&self) -> Option<String> {
        self.with(|p| {
            let dom = p.dom();
            dom.tooltips()
                .first()
                .and_then(|&n| dom.attribute(n, TOOLTIP_ID_ATTRIBUTE).map(str::to_string))
        })
    }

    pub fn body_text(&self) -> String {
        self.with(|p| p.dom().text_content(p.dom().body_id()))
    }
}
