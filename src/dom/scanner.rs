//! TextScanner: finds the text nodes worth highlighting
//!
//! A node qualifies when its text is not blank and its parent element is
//! rendered and does not carry the processed marker. Links and tooltips we
//! create carry the marker, so their text is never scanned again.

use crate::dom::{Dom, NodeKind};

#[derive(Debug, Clone)]
pub struct TextScanner {
    processed_attribute: String,
}

impl TextScanner {
    pub fn new(processed_attribute: impl Into<String>) -> Self {
        Self {
            processed_attribute: processed_attribute.into(),
        }
    }

    /// Pre-order walk over the qualifying text nodes under `root`
    pub fn scan<'a, D: Dom>(&'a self, dom: &'a D, root: &D::Node) -> TextNodes<'a, D> {
        TextNodes {
            dom,
            scanner: self,
            stack: children(dom, root).into_iter().rev().collect(),
        }
    }

    /// Whether `node` qualifies right now
    pub fn accepts<D: Dom>(&self, dom: &D, node: &D::Node) -> bool {
        if dom.kind(node) != NodeKind::Text {
            return false;
        }
        let blank = dom.text(node).map_or(true, |t| t.trim().is_empty());
        if blank {
            return false;
        }
        match dom.parent(node) {
            Some(parent) => {
                dom.is_rendered(&parent) && !dom.has_attribute(&parent, &self.processed_attribute)
            }
            None => false,
        }
    }
}

fn children<D: Dom>(dom: &D, node: &D::Node) -> Vec<D::Node> {
    let mut out = Vec::new();
    let mut next = dom.first_child(node);
    while let Some(child) = next {
        next = dom.next_sibling(&child);
        out.push(child);
    }
    out
}

/// Iterator returned by [`TextScanner::scan`]
pub struct TextNodes<'a, D: Dom> {
    dom: &'a D,
    scanner: &'a TextScanner,
    stack: Vec<D::Node>,
}

impl<D: Dom> Iterator for TextNodes<'_, D> {
    type Item = D::Node;

    fn next(&mut self) -> Option<D::Node> {
        while let Some(node) = self.stack.pop() {
            match self.dom.kind(&node) {
                NodeKind::Text => {
                    if self.scanner.accepts(self.dom, &node) {
                        return Some(node);
                    }
                }
                NodeKind::Element => {
                    self.stack.extend(children(self.dom, &node).into_iter().rev());
                }
                NodeKind::Other => {}
            }
        }
        None
    }
}

// =============================================================================
// Tests
// =============================================================================
