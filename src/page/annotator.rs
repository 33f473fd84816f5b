//! PageAnnotator: the page-scoped controller
//!
//! Owns the document, host services, link registry, current highlight pass,
//! mutation coordinator and tooltip controller. It reacts to [`PageEvent`]s
//! synchronously; anything that needs I/O comes back as a [`Followup`] for
//! the caller to resolve (see [`run_followup`](crate::page::run_followup)).
//!
//! Every rescan request takes a fresh ticket. A pass only starts if its
//! ticket is still the latest, and a newer pass replaces an in-flight one.

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::AnnotatorConfig;
use crate::definition::{CacheStats, Definition, DefinitionCache};
use crate::dom::{Dom, LinkId, TextScanner};
use crate::highlight::{HighlightPass, LinkIds, LinkTemplate, TermMatcher};
use crate::page::coordinator::{CoordinatorState, MutationCoordinator};
use crate::page::host::{Host, HoverTarget, PageEvent, TimerId};
use crate::page::tooltip::TooltipController;
use crate::terms::{TermSet, TermSetLoader};

/// Rescan request number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PassTicket(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionRequest {
    pub link: LinkId,
    pub term: String,
}

/// Asynchronous work requested by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Followup {
    /// Load the term set, then call [`PageAnnotator::begin_pass`]
    LoadTerms(PassTicket),
    /// Fetch a definition, then call [`PageAnnotator::definition_ready`]
    FetchDefinition(DefinitionRequest),
}

#[derive(Debug, Clone)]
pub struct LinkState<N> {
    pub node: N,
    pub term: String,
    pub definition: Option<Definition>,
    /// A definition request for this link is in flight
    pub fetching: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatorStats {
    pub rescans_requested: u64,
    pub passes_completed: u64,
    pub passes_discarded: u64,
    pub links: usize,
    pub tooltips_shown: u64,
    pub definitions: CacheStats,
}

pub struct PageAnnotator<D: Dom, H: Host> {
    config: AnnotatorConfig,
    dom: D,
    host: H,
    definitions: Rc<DefinitionCache>,
    loader: Rc<TermSetLoader>,
    scanner: TextScanner,
    link_template: LinkTemplate,
    link_ids: LinkIds,
    links: HashMap<LinkId, LinkState<D::Node>>,
    coordinator: MutationCoordinator,
    tooltips: TooltipController<D::Node>,
    pass: Option<HighlightPass<D::Node>>,
    pass_started: Option<instant::Instant>,
    latest_ticket: u64,
    matcher: Option<(u64, Rc<TermMatcher>)>,
    frame_pending: bool,
    active: bool,
    stats: AnnotatorStats,
}

impl<D: Dom, H: Host> PageAnnotator<D, H> {
    pub fn new(
        config: AnnotatorConfig,
        dom: D,
        host: H,
        definitions: Rc<DefinitionCache>,
        loader: Rc<TermSetLoader>,
    ) -> Self {
        Self {
            scanner: TextScanner::new(config.processed_attribute.clone()),
            link_template: LinkTemplate::new(&config),
            link_ids: LinkIds::default(),
            links: HashMap::new(),
            coordinator: MutationCoordinator::new(config.debounce_ms),
            tooltips: TooltipController::new(&config),
            pass: None,
            pass_started: None,
            latest_ticket: 0,
            matcher: None,
            frame_pending: false,
            active: false,
            stats: AnnotatorStats::default(),
            config,
            dom,
            host,
            definitions,
            loader,
        }
    }

    // ==================== ACCESSORS ====================

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    pub fn definitions(&self) -> Rc<DefinitionCache> {
        Rc::clone(&self.definitions)
    }

    pub fn loader(&self) -> Rc<TermSetLoader> {
        Rc::clone(&self.loader)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn coordinator_state(&self) -> CoordinatorState {
        self.coordinator.state()
    }

    pub fn is_pass_running(&self) -> bool {
        self.pass.is_some()
    }

    pub fn link(&self, id: LinkId) -> Option<&LinkState<D::Node>> {
        self.links.get(&id)
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn tooltips(&self) -> &TooltipController<D::Node> {
        &self.tooltips
    }

    pub fn stats(&self) -> AnnotatorStats {
        AnnotatorStats {
            links: self.links.len(),
            definitions: self.definitions.stats(),
            ..self.stats
        }
    }

    // ==================== LIFECYCLE ====================

    /// Start highlighting this page. Calling it again rescans.
    pub fn activate(&mut self) -> Option<Followup> {
        if !self.active {
            info!("[PageAnnotator] activated");
            self.active = true;
        }
        Some(self.request_rescan())
    }

    /// User-triggered rescan
    pub fn rescan_now(&mut self) -> Option<Followup> {
        self.activate()
    }

    /// Stop observing, drop the tooltip and any in-flight pass. Links
    /// already in the page stay.
    pub fn dispose(&mut self) {
        self.coordinator.detach(&mut self.host);
        self.tooltips.dismiss(&mut self.dom, &mut self.host);
        if self.pass.take().is_some() {
            self.stats.passes_discarded += 1;
        }
        self.latest_ticket += 1;
        self.active = false;
        info!("[PageAnnotator] disposed");
    }

    fn request_rescan(&mut self) -> Followup {
        self.coordinator.suspend(&mut self.host);
        self.latest_ticket += 1;
        self.stats.rescans_requested += 1;
        debug!("[PageAnnotator] rescan requested, ticket {}", self.latest_ticket);
        Followup::LoadTerms(PassTicket(self.latest_ticket))
    }

    // ==================== HIGHLIGHT PASSES ====================

    /// Start a pass over the current document with a freshly loaded term
    /// set. Ignored when a newer rescan has been requested since.
    pub fn begin_pass(&mut self, ticket: PassTicket, terms: &TermSet) {
        if !self.active || ticket.0 != self.latest_ticket {
            debug!(
                "[PageAnnotator] discarding stale pass {} (latest {})",
                ticket.0, self.latest_ticket
            );
            self.stats.passes_discarded += 1;
            return;
        }

        if self.pass.take().is_some() {
            debug!("[PageAnnotator] replacing in-flight pass");
            self.stats.passes_discarded += 1;
        }
        self.coordinator.suspend(&mut self.host);
        self.prune_detached_links();

        let matcher = match self.matcher_for(terms) {
            Ok(matcher) => matcher,
            Err(e) => {
                warn!("[PageAnnotator] could not build matcher: {}", e);
                self.finish_pass(ticket.0);
                return;
            }
        };

        let nodes: Vec<D::Node> = match self.dom.body() {
            Some(body) => self.scanner.scan(&self.dom, &body).collect(),
            None => Vec::new(),
        };
        debug!(
            "[PageAnnotator] pass {}: {} terms, {} text nodes",
            ticket.0,
            terms.len(),
            nodes.len()
        );

        if nodes.is_empty() || matcher.pattern_count() == 0 {
            self.finish_pass(ticket.0);
            return;
        }

        self.pass = Some(HighlightPass::new(ticket.0, matcher, nodes));
        self.pass_started = Some(instant::Instant::now());
        self.schedule_frame();
    }

    /// Matcher for `terms`, rebuilt only when the term set changed
    fn matcher_for(&mut self, terms: &TermSet) -> Result<Rc<TermMatcher>, aho_corasick::BuildError> {
        let fingerprint = terms.fingerprint();
        if let Some((cached, matcher)) = &self.matcher {
            if *cached == fingerprint {
                return Ok(Rc::clone(matcher));
            }
        }
        let matcher = Rc::new(TermMatcher::build(terms)?);
        self.matcher = Some((fingerprint, Rc::clone(&matcher)));
        Ok(matcher)
    }

    fn schedule_frame(&mut self) {
        if !self.frame_pending {
            self.frame_pending = true;
            self.host.request_frame();
        }
    }

    /// Animation frame: apply one batch of the current pass
    pub fn on_frame(&mut self) {
        self.frame_pending = false;
        let Some(pass) = self.pass.as_mut() else {
            return;
        };

        let report = pass.run_batch(
            &mut self.dom,
            &self.scanner,
            &self.link_template,
            &mut self.link_ids,
            self.config.batch_size,
        );
        for link in report.links {
            self.links.insert(
                link.id,
                LinkState {
                    node: link.node,
                    term: link.term,
                    definition: None,
                    fetching: false,
                },
            );
        }

        if report.done {
            let generation = pass.generation();
            self.pass = None;
            self.finish_pass(generation);
        } else {
            self.schedule_frame();
        }
    }

    /// The observer reconnects only once the latest requested rescan is
    /// done; an older pass finishing first leaves it suspended.
    fn finish_pass(&mut self, generation: u64) {
        self.stats.passes_completed += 1;
        if let Some(started) = self.pass_started.take() {
            info!(
                "[PageAnnotator] pass complete: {} links in {:?}",
                self.links.len(),
                started.elapsed()
            );
        }
        if generation == self.latest_ticket {
            self.coordinator.resume(&mut self.host);
        } else {
            debug!(
                "[PageAnnotator] pass {} done, rescan {} still pending",
                generation, self.latest_ticket
            );
        }
    }

    /// Forget links the page has removed since the last pass
    fn prune_detached_links(&mut self) {
        let dom = &self.dom;
        let gone: Vec<LinkId> = self
            .links
            .iter()
            .filter(|(_, state)| !dom.is_connected(&state.node))
            .map(|(&id, _)| id)
            .collect();
        if gone.is_empty() {
            return;
        }
        if self.tooltips.active().is_some_and(|a| gone.contains(&a.link)) {
            self.tooltips.dismiss(&mut self.dom, &mut self.host);
        }
        for id in &gone {
            self.links.remove(id);
            self.dom.release_link(*id);
        }
        debug!("[PageAnnotator] pruned {} detached links", gone.len());
    }

    // ==================== EVENTS ====================

    pub fn on_mutations(&mut self, records: usize) {
        if records > 0 && self.coordinator.on_mutations(&mut self.host) {
            debug!("[PageAnnotator] {} mutation records, debouncing", records);
        }
    }

    pub fn on_timer(&mut self, id: TimerId) -> Option<Followup> {
        self.host.timer_elapsed(id);
        if self.coordinator.on_timer(&mut self.host, id) {
            return Some(self.request_rescan());
        }
        self.tooltips.on_timer(&mut self.dom, &mut self.host, id);
        None
    }

    pub fn pointer_enter(&mut self, target: HoverTarget) -> Option<Followup> {
        match target {
            HoverTarget::Link(id) => self.link_entered(id),
            HoverTarget::Tooltip(id) => {
                self.tooltips.tooltip_entered(&mut self.host, id);
                None
            }
        }
    }

    pub fn pointer_leave(&mut self, target: HoverTarget) {
        match target {
            HoverTarget::Link(id) => self.tooltips.link_left(&mut self.host, id),
            HoverTarget::Tooltip(id) => self.tooltips.tooltip_left(&mut self.host, id),
        }
    }

    fn link_entered(&mut self, id: LinkId) -> Option<Followup> {
        if !self.links.contains_key(&id) {
            return None;
        }
        self.tooltips.link_entered(&mut self.dom, &mut self.host, id);
        if self.tooltips.is_showing(id) {
            return None;
        }

        let state = self.links.get_mut(&id)?;
        if state.definition.is_none() {
            state.definition = self.definitions.cached(&state.term);
        }
        if let Some(definition) = state.definition.clone() {
            self.show_tooltip(id, &definition);
            return None;
        }
        if state.fetching {
            return None;
        }

        state.fetching = true;
        Some(Followup::FetchDefinition(DefinitionRequest {
            link: id,
            term: state.term.clone(),
        }))
    }

    /// A requested definition arrived. It is kept on the link unless it is
    /// the transient error text; the tooltip only opens if the pointer is
    /// on that link when it arrives.
    pub fn definition_ready(&mut self, request: DefinitionRequest, definition: Definition) {
        let Some(state) = self.links.get_mut(&request.link) else {
            return;
        };
        state.fetching = false;
        if !definition.is_error() {
            state.definition = Some(definition.clone());
        }

        if self.active && self.tooltips.is_hovering(request.link) {
            self.show_tooltip(request.link, &definition);
        } else {
            debug!("[PageAnnotator] pointer left '{}' before its definition arrived", request.term);
        }
    }

    fn show_tooltip(&mut self, id: LinkId, definition: &Definition) {
        let Some(state) = self.links.get(&id) else {
            return;
        };
        match self
            .tooltips
            .show(&mut self.dom, &mut self.host, &state.node, id, definition)
        {
            Ok(_) => self.stats.tooltips_shown += 1,
            Err(e) => warn!("[PageAnnotator] could not show tooltip for '{}': {}", state.term, e),
        }
    }

    pub fn on_scroll(&mut self) {
        self.tooltips.on_scroll(&mut self.dom, &mut self.host);
    }

    /// Dispatch one environment event
    pub fn handle(&mut self, event: PageEvent) -> Option<Followup> {
        match event {
            PageEvent::Timer(id) => self.on_timer(id),
            PageEvent::Frame => {
                self.on_frame();
                None
            }
            PageEvent::Mutations(records) => {
                self.on_mutations(records);
                None
            }
            PageEvent::PointerEnter(target) => self.pointer_enter(target),
            PageEvent::PointerLeave(target) => {
                self.pointer_leave(target);
                None
            }
            PageEvent::Scroll => {
                self.on_scroll();
                None
            }
        }
    }
}
