//! BrowserDom: [`Dom`] over the live page via web-sys
//!
//! Byte offsets from the engine are converted to the UTF-16 offsets the DOM
//! uses. Links are built with one `Range.surroundContents` call each; their
//! hover listeners are released once the page drops the link. Tooltip listeners are dropped
//! together with the tooltip.

use std::collections::HashMap;
use std::ops::Range;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, Node, Window};

use crate::dom::{Dom, LinkId, LinkSpec, NodeKind, TooltipSpec, LINK_ID_ATTRIBUTE, TOOLTIP_ID_ATTRIBUTE};
use crate::error::DomError;
use crate::page::{HoverTarget, PageEvent};
use crate::wasm::EventSink;

const UNRENDERED_TAGS: &[&str] = &["SCRIPT", "STYLE", "NOSCRIPT", "TEMPLATE", "HEAD"];

type Listener = Closure<dyn FnMut(Event)>;

fn host_error(e: JsValue) -> DomError {
    DomError::Host(format!("{:?}", e))
}

fn utf16_offset(text: &str, byte_offset: usize) -> u32 {
    text[..byte_offset].encode_utf16().count() as u32
}

pub struct BrowserDom {
    window: Window,
    document: Document,
    sink: EventSink,
    link_listeners: HashMap<LinkId, [Listener; 2]>,
    tooltip_listeners: Vec<(Node, [Listener; 2])>,
}

impl BrowserDom {
    pub fn new(window: Window, document: Document, sink: EventSink) -> Self {
        Self {
            window,
            document,
            sink,
            link_listeners: HashMap::new(),
            tooltip_listeners: Vec::new(),
        }
    }

    /// Enter/leave listeners forwarding hover changes for `target`
    fn hover_listeners(&self, element: &Element, target: HoverTarget) -> Result<[Listener; 2], DomError> {
        let enter_sink = self.sink.clone();
        let enter: Listener = Closure::new(move |_: Event| enter_sink(PageEvent::PointerEnter(target)));
        let leave_sink = self.sink.clone();
        let leave: Listener = Closure::new(move |_: Event| leave_sink(PageEvent::PointerLeave(target)));

        element
            .add_event_listener_with_callback("mouseenter", enter.as_ref().unchecked_ref())
            .map_err(host_error)?;
        element
            .add_event_listener_with_callback("mouseleave", leave.as_ref().unchecked_ref())
            .map_err(host_error)?;
        Ok([enter, leave])
    }

    fn is_displayed(&self, element: &Element) -> bool {
        if UNRENDERED_TAGS.contains(&element.tag_name().to_ascii_uppercase().as_str()) {
            return false;
        }
        match self.window.get_computed_style(element) {
            Ok(Some(style)) => style.get_property_value("display").map_or(true, |d| d != "none"),
            _ => true,
        }
    }
}

impl Dom for BrowserDom {
    type Node = Node;

    fn body(&self) -> Option<Node> {
        self.document.body().map(|b| b.unchecked_into())
    }

    fn kind(&self, node: &Node) -> NodeKind {
        match node.node_type() {
            Node::TEXT_NODE => NodeKind::Text,
            Node::ELEMENT_NODE => NodeKind::Element,
            _ => NodeKind::Other,
        }
    }

    fn first_child(&self, node: &Node) -> Option<Node> {
        node.first_child()
    }

    fn next_sibling(&self, node: &Node) -> Option<Node> {
        node.next_sibling()
    }

    fn parent(&self, node: &Node) -> Option<Node> {
        node.parent_node()
    }

    fn text(&self, node: &Node) -> Option<String> {
        if node.node_type() == Node::TEXT_NODE {
            node.text_content()
        } else {
            None
        }
    }

    fn is_connected(&self, node: &Node) -> bool {
        node.is_connected()
    }

    fn is_rendered(&self, element: &Node) -> bool {
        let Some(el) = element.dyn_ref::<Element>() else {
            return false;
        };
        if !el.is_connected() || !self.is_displayed(el) {
            return false;
        }
        // No layout boxes: this element or an ancestor is display:none
        el.get_client_rects().length() > 0
    }

    fn has_attribute(&self, element: &Node, name: &str) -> bool {
        element
            .dyn_ref::<Element>()
            .map_or(false, |el| el.has_attribute(name))
    }

    fn wrap_text(&mut self, node: &Node, range: Range<usize>, link: &LinkSpec<'_>) -> Result<Node, DomError> {
        let text = self.text(node).ok_or(DomError::NotText)?;
        let valid = range.start < range.end
            && range.end <= text.len()
            && text.is_char_boundary(range.start)
            && text.is_char_boundary(range.end);
        if !valid {
            return Err(DomError::InvalidRange {
                start: range.start,
                end: range.end,
                len: text.len(),
            });
        }

        let anchor = self.document.create_element("a").map_err(host_error)?;
        anchor.set_class_name(link.class);
        for (name, value) in [
            ("href", link.href.as_str()),
            ("target", "_blank"),
            ("rel", "noopener noreferrer"),
            (link.processed_attribute, "true"),
        ] {
            anchor.set_attribute(name, value).map_err(host_error)?;
        }
        anchor
            .set_attribute(LINK_ID_ATTRIBUTE, &link.id.to_string())
            .map_err(host_error)?;

        let dom_range = self.document.create_range().map_err(host_error)?;
        dom_range
            .set_start(node, utf16_offset(&text, range.start))
            .map_err(host_error)?;
        dom_range
            .set_end(node, utf16_offset(&text, range.end))
            .map_err(host_error)?;
        dom_range.surround_contents(&anchor).map_err(host_error)?;

        let listeners = self.hover_listeners(&anchor, HoverTarget::Link(link.id))?;
        self.link_listeners.insert(link.id, listeners);
        Ok(anchor.unchecked_into())
    }

    fn show_tooltip(&mut self, anchor: &Node, tooltip: &TooltipSpec<'_>) -> Result<Node, DomError> {
        let body = self.document.body().ok_or(DomError::NoBody)?;
        let anchor = anchor
            .dyn_ref::<Element>()
            .ok_or_else(|| DomError::Host("tooltip anchor is not an element".to_string()))?;

        let div = self.document.create_element("div").map_err(host_error)?;
        div.set_class_name(tooltip.class);
        div.set_attribute(tooltip.processed_attribute, "true").map_err(host_error)?;
        div.set_attribute(TOOLTIP_ID_ATTRIBUTE, &tooltip.id.to_string())
            .map_err(host_error)?;
        div.set_text_content(Some(tooltip.text));

        if let Some(src) = tooltip.image_url {
            let img = self.document.create_element("img").map_err(host_error)?;
            img.set_attribute("src", src).map_err(host_error)?;
            img.set_attribute(
                "style",
                &format!("max-width: {}px; display: block", tooltip.image_max_width_px),
            )
            .map_err(host_error)?;
            div.append_child(&img).map_err(host_error)?;
        }

        body.append_child(&div).map_err(host_error)?;

        let rect = anchor.get_bounding_client_rect();
        let scroll_x = self.window.scroll_x().unwrap_or(0.0);
        let scroll_y = self.window.scroll_y().unwrap_or(0.0);
        div.set_attribute(
            "style",
            &format!(
                "position: absolute; top: {}px; left: {}px; max-width: {}px; z-index: 1000",
                rect.bottom() + scroll_y,
                rect.left() + scroll_x,
                tooltip.max_width_px
            ),
        )
        .map_err(host_error)?;

        let listeners = self.hover_listeners(&div, HoverTarget::Tooltip(tooltip.id))?;
        let node: Node = div.unchecked_into();
        self.tooltip_listeners.push((node.clone(), listeners));
        Ok(node)
    }

    fn remove(&mut self, node: &Node) {
        if let Some(el) = node.dyn_ref::<Element>() {
            el.remove();
        } else if let Some(parent) = node.parent_node() {
            let _ = parent.remove_child(node);
        }
        self.tooltip_listeners.retain(|(n, _)| n != node);
    }

    fn release_link(&mut self, id: LinkId) {
        self.link_listeners.remove(&id);
    }
}
