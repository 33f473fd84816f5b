//! MemoryDom: arena-backed document for tests and headless runs
//!
//! Models just enough of the DOM for the engine: elements with attributes
//! and a `display:none` flag, text nodes, parent/child links. Elements such
//! as `<script>` and `<style>` are never rendered.

use std::ops::Range;

use crate::dom::{Dom, LinkSpec, NodeKind, TooltipSpec, LINK_ID_ATTRIBUTE, TOOLTIP_ID_ATTRIBUTE};
use crate::error::DomError;

const UNRENDERED_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeData {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        hidden: bool,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Slot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct MemoryDom {
    nodes: Vec<Slot>,
    body: NodeId,
    mutations: usize,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// Empty document containing only `<body>`
    pub fn new() -> Self {
        let body = Slot {
            data: NodeData::Element {
                tag: "body".to_string(),
                attributes: Vec::new(),
                hidden: false,
            },
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![body],
            body: NodeId(0),
            mutations: 0,
        }
    }

    /// Document with one `<p>` per entry; returns the paragraph text nodes
    pub fn with_paragraphs(paragraphs: &[&str]) -> (Self, Vec<NodeId>) {
        let mut dom = Self::new();
        let body = dom.body_id();
        let texts = paragraphs
            .iter()
            .map(|text| {
                let p = dom.append_element(body, "p");
                dom.append_text(p, text)
            })
            .collect();
        (dom, texts)
    }

    pub fn body_id(&self) -> NodeId {
        self.body
    }

    fn push(&mut self, data: NodeData, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Slot { data, parent, children: Vec::new() });
        id
    }

    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = self.push(
            NodeData::Element {
                tag: tag.to_ascii_lowercase(),
                attributes: Vec::new(),
                hidden: false,
            },
            Some(parent),
        );
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = self.push(NodeData::Text(text.to_string()), Some(parent));
        self.nodes[parent.0].children.push(id);
        id
    }

    fn insert_after(&mut self, anchor: NodeId, node: NodeId) {
        let Some(parent) = self.nodes[anchor.0].parent else {
            return;
        };
        let siblings = &mut self.nodes[parent.0].children;
        let index = siblings.iter().position(|&c| c == anchor).map_or(siblings.len(), |i| i + 1);
        siblings.insert(index, node);
        self.nodes[node.0].parent = Some(parent);
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let NodeData::Element { attributes, .. } = &mut self.nodes[node.0].data {
            match attributes.iter_mut().find(|(n, _)| n == name) {
                Some(entry) => entry.1 = value.to_string(),
                None => attributes.push((name.to_string(), value.to_string())),
            }
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[node.0].data {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str()),
            NodeData::Text(_) => None,
        }
    }

    /// Toggle `display:none`
    pub fn set_hidden(&mut self, node: NodeId, value: bool) {
        if let NodeData::Element { hidden, .. } = &mut self.nodes[node.0].data {
            *hidden = value;
        }
    }

    /// Replace a text node's content (a page-side edit)
    pub fn set_text(&mut self, node: NodeId, value: &str) {
        if let NodeData::Text(text) = &mut self.nodes[node.0].data {
            *text = value.to_string();
        }
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node.0].data {
            NodeData::Element { tag, .. } => Some(tag),
            NodeData::Text(_) => None,
        }
    }

    pub fn children_of(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// Detach a subtree the way a page script would
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
    }

    /// Pre-order descendants of `node`, including itself
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.nodes[current.0].children.iter().rev().copied());
        }
        out
    }

    /// Concatenated text of a subtree
    pub fn text_content(&self, node: NodeId) -> String {
        self.descendants(node)
            .into_iter()
            .filter_map(|n| match &self.nodes[n.0].data {
                NodeData::Text(t) => Some(t.as_str()),
                NodeData::Element { .. } => None,
            })
            .collect()
    }

    /// Attached elements carrying `attribute`, in document order
    pub fn elements_with_attribute(&self, attribute: &str) -> Vec<NodeId> {
        self.descendants(self.body)
            .into_iter()
            .filter(|&n| self.attribute(n, attribute).is_some())
            .collect()
    }

    /// Highlighted links currently in the document
    pub fn links(&self) -> Vec<NodeId> {
        self.elements_with_attribute(LINK_ID_ATTRIBUTE)
    }

    /// Tooltips currently in the document
    pub fn tooltips(&self) -> Vec<NodeId> {
        self.elements_with_attribute(TOOLTIP_ID_ATTRIBUTE)
    }

    /// Number of mutations made through the [`Dom`] trait
    pub fn mutation_count(&self) -> usize {
        self.mutations
    }
}

impl Dom for MemoryDom {
    type Node = NodeId;

    fn body(&self) -> Option<NodeId> {
        Some(self.body)
    }

    fn kind(&self, node: &NodeId) -> NodeKind {
        match self.nodes.get(node.0).map(|s| &s.data) {
            Some(NodeData::Element { .. }) => NodeKind::Element,
            Some(NodeData::Text(_)) => NodeKind::Text,
            None => NodeKind::Other,
        }
    }

    fn first_child(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes[node.0].children.first().copied()
    }

    fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
        let parent = self.nodes[node.0].parent?;
        let siblings = &self.nodes[parent.0].children;
        let index = siblings.iter().position(|c| c == node)?;
        siblings.get(index + 1).copied()
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    fn text(&self, node: &NodeId) -> Option<String> {
        match &self.nodes[node.0].data {
            NodeData::Text(t) => Some(t.clone()),
            NodeData::Element { .. } => None,
        }
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        let mut current = Some(*node);
        while let Some(n) = current {
            if n == self.body {
                return true;
            }
            current = self.nodes[n.0].parent;
        }
        false
    }

    fn is_rendered(&self, element: &NodeId) -> bool {
        let mut current = Some(*element);
        while let Some(node) = current {
            if let NodeData::Element { tag, hidden, .. } = &self.nodes[node.0].data {
                if *hidden || UNRENDERED_TAGS.contains(&tag.as_str()) {
                    return false;
                }
            }
            if node == self.body {
                return true;
            }
            current = self.nodes[node.0].parent;
        }
        // Detached subtree
        false
    }

    fn has_attribute(&self, element: &NodeId, name: &str) -> bool {
        self.attribute(*element, name).is_some()
    }

    fn wrap_text(&mut self, node: &NodeId, range: Range<usize>, link: &LinkSpec<'_>) -> Result<NodeId, DomError> {
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
        if self.nodes[node.0].parent.is_none() {
            return Err(DomError::Host("text node has no parent".to_string()));
        }

        self.set_text(*node, &text[..range.start]);

        let anchor = self.push(
            NodeData::Element {
                tag: "a".to_string(),
                attributes: Vec::new(),
                hidden: false,
            },
            None,
        );
        self.set_attribute(anchor, "class", link.class);
        self.set_attribute(anchor, "href", &link.href);
        self.set_attribute(anchor, "target", "_blank");
        self.set_attribute(anchor, "rel", "noopener noreferrer");
        self.set_attribute(anchor, link.processed_attribute, "true");
        self.set_attribute(anchor, LINK_ID_ATTRIBUTE, &link.id.to_string());
        self.append_text(anchor, &text[range.start..range.end]);
        self.insert_after(*node, anchor);

        if range.end < text.len() {
            let rest = self.push(NodeData::Text(text[range.end..].to_string()), None);
            self.insert_after(anchor, rest);
        }

        self.mutations += 1;
        Ok(anchor)
    }

    fn show_tooltip(&mut self, _anchor: &NodeId, tooltip: &TooltipSpec<'_>) -> Result<NodeId, DomError> {
        let body = self.body;
        let div = self.append_element(body, "div");
        self.set_attribute(div, "class", tooltip.class);
        self.set_attribute(div, tooltip.processed_attribute, "true");
        self.set_attribute(div, TOOLTIP_ID_ATTRIBUTE, &tooltip.id.to_string());
        self.set_attribute(
            div,
            "style",
            &format!("position: absolute; max-width: {}px", tooltip.max_width_px),
        );
        self.append_text(div, tooltip.text);

        if let Some(src) = tooltip.image_url {
            let img = self.append_element(div, "img");
            self.set_attribute(img, "src", src);
            self.set_attribute(
                img,
                "style",
                &format!("max-width: {}px; display: block", tooltip.image_max_width_px),
            );
        }

        self.mutations += 1;
        Ok(div)
    }

    fn remove(&mut self, node: &NodeId) {
        self.detach(*node);
        self.mutations += 1;
    }
}

// =============================================================================
// Tests
// =============================================================================
