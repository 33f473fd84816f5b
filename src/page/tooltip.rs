//! TooltipController: at most one tooltip, explicit hover state
//!
//! The tooltip survives while the pointer is over its link or over the
//! tooltip itself. Leaving either starts one pending-removal timer; entering
//! either cancels it. Scrolling removes the tooltip immediately.

use log::debug;

use crate::config::AnnotatorConfig;
use crate::definition::Definition;
use crate::dom::{Dom, LinkId, TooltipId, TooltipSpec};
use crate::error::DomError;
use crate::page::host::{Host, TimerId};

/// Shared attributes for every tooltip
#[derive(Debug, Clone)]
pub struct TooltipTemplate {
    class: String,
    processed_attribute: String,
    max_width_px: u32,
    image_max_width_px: u32,
}

impl TooltipTemplate {
    pub fn new(config: &AnnotatorConfig) -> Self {
        Self {
            class: config.tooltip_class.clone(),
            processed_attribute: config.processed_attribute.clone(),
            max_width_px: config.tooltip_max_width_px,
            image_max_width_px: config.image_max_width_px,
        }
    }

    pub fn spec<'a>(&'a self, id: TooltipId, definition: &'a Definition) -> TooltipSpec<'a> {
        TooltipSpec {
            id,
            text: &definition.excerpt,
            image_url: definition.image_url.as_deref(),
            class: &self.class,
            processed_attribute: &self.processed_attribute,
            max_width_px: self.max_width_px,
            image_max_width_px: self.image_max_width_px,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveTooltip<N> {
    pub id: TooltipId,
    pub link: LinkId,
    pub node: N,
}

#[derive(Debug)]
pub struct TooltipController<N> {
    template: TooltipTemplate,
    hide_delay_ms: u32,
    active: Option<ActiveTooltip<N>>,
    hovered_link: Option<LinkId>,
    tooltip_hovered: bool,
    pending_removal: Option<TimerId>,
    next_id: u32,
}

impl<N: Clone + PartialEq + std::fmt::Debug> TooltipController<N> {
    pub fn new(config: &AnnotatorConfig) -> Self {
        Self {
            template: TooltipTemplate::new(config),
            hide_delay_ms: config.hide_delay_ms,
            active: None,
            hovered_link: None,
            tooltip_hovered: false,
            pending_removal: None,
            next_id: 0,
        }
    }

    pub fn active(&self) -> Option<&ActiveTooltip<N>> {
        self.active.as_ref()
    }

    pub fn is_showing(&self, link: LinkId) -> bool {
        self.active.as_ref().is_some_and(|a| a.link == link)
    }

    pub fn pending_removal(&self) -> Option<TimerId> {
        self.pending_removal
    }

    /// Pointer entered a link. A tooltip belonging to another link is
    /// removed right away.
    pub fn link_entered<D, H>(&mut self, dom: &mut D, host: &mut H, link: LinkId)
    where
        D: Dom<Node = N>,
        H: Host,
    {
        self.hovered_link = Some(link);
        self.cancel_removal(host);
        if self.active.as_ref().is_some_and(|a| a.link != link) {
            self.remove_active(dom, host);
        }
    }

    pub fn link_left<H: Host>(&mut self, host: &mut H, link: LinkId) {
        if self.hovered_link == Some(link) {
            self.hovered_link = None;
            self.schedule_removal(host);
        }
    }

    pub fn tooltip_entered<H: Host>(&mut self, host: &mut H, id: TooltipId) {
        if self.active.as_ref().is_some_and(|a| a.id == id) {
            self.tooltip_hovered = true;
            self.cancel_removal(host);
        }
    }

    pub fn tooltip_left<H: Host>(&mut self, host: &mut H, id: TooltipId) {
        if self.active.as_ref().is_some_and(|a| a.id == id) {
            self.tooltip_hovered = false;
            self.schedule_removal(host);
        }
    }

    /// Whether the pointer is on `link` right now
    pub fn is_hovering(&self, link: LinkId) -> bool {
        self.hovered_link == Some(link)
    }

    /// Replace any active tooltip with one for `link`
    pub fn show<D, H>(
        &mut self,
        dom: &mut D,
        host: &mut H,
        anchor: &N,
        link: LinkId,
        definition: &Definition,
    ) -> Result<TooltipId, DomError>
    where
        D: Dom<Node = N>,
        H: Host,
    {
        self.remove_active(dom, host);
        self.next_id += 1;
        let id = TooltipId(self.next_id);
        let node = dom.show_tooltip(anchor, &self.template.spec(id, definition))?;
        self.active = Some(ActiveTooltip { id, link, node });
        Ok(id)
    }

    /// Returns `true` when `id` was the pending-removal timer
    pub fn on_timer<D, H>(&mut self, dom: &mut D, host: &mut H, id: TimerId) -> bool
    where
        D: Dom<Node = N>,
        H: Host,
    {
        if self.pending_removal != Some(id) {
            return false;
        }
        self.pending_removal = None;

        let link_hovered = match (&self.active, self.hovered_link) {
            (Some(active), Some(hovered)) => active.link == hovered,
            _ => false,
        };
        if !self.tooltip_hovered && !link_hovered {
            self.remove_active(dom, host);
        }
        true
    }

    pub fn on_scroll<D, H>(&mut self, dom: &mut D, host: &mut H)
    where
        D: Dom<Node = N>,
        H: Host,
    {
        if self.active.is_some() {
            debug!("[TooltipController] scroll, removing tooltip");
        }
        self.remove_active(dom, host);
    }

    pub fn dismiss<D, H>(&mut self, dom: &mut D, host: &mut H)
    where
        D: Dom<Node = N>,
        H: Host,
    {
        self.remove_active(dom, host);
        self.hovered_link = None;
    }

    fn schedule_removal<H: Host>(&mut self, host: &mut H) {
        if self.active.is_none() {
            return;
        }
        self.cancel_removal(host);
        self.pending_removal = Some(host.set_timeout(self.hide_delay_ms));
    }

    fn cancel_removal<H: Host>(&mut self, host: &mut H) {
        if let Some(pending) = self.pending_removal.take() {
            host.clear_timeout(pending);
        }
    }

    fn remove_active<D, H>(&mut self, dom: &mut D, host: &mut H)
    where
        D: Dom<Node = N>,
        H: Host,
    {
        self.cancel_removal(host);
        self.tooltip_hovered = false;
        if let Some(active) = self.active.take() {
            dom.remove(&active.node);
        }
    }
}
