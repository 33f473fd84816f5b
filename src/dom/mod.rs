//! Document abstraction
//!
//! The engine reads and mutates the page only through [`Dom`]. The browser
//! build implements it over `web-sys`; [`memory::MemoryDom`] is an arena
//! implementation for tests and headless use.
//!
//! All text offsets are byte offsets into the node's current text. Browser
//! implementations translate them to UTF-16 offsets at the boundary.

pub mod memory;
pub mod scanner;

pub use memory::*;
pub use scanner::*;

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::DomError;

/// Attribute carrying a link's [`LinkId`]
pub const LINK_ID_ATTRIBUTE: &str = "data-medlens-link";
/// Attribute carrying a tooltip's [`TooltipId`]
pub const TOOLTIP_ID_ATTRIBUTE: &str = "data-medlens-tooltip";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TooltipId(pub u32);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TooltipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    Other,
}

/// Everything needed to build one highlighted link
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSpec<'a> {
    pub id: LinkId,
    pub href: String,
    pub class: &'a str,
    pub processed_attribute: &'a str,
}

/// Everything needed to build and place one tooltip
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipSpec<'a> {
    pub id: TooltipId,
    pub text: &'a str,
    pub image_url: Option<&'a str>,
    pub class: &'a str,
    pub processed_attribute: &'a str,
    pub max_width_px: u32,
    pub image_max_width_px: u32,
}

/// Live document access
pub trait Dom {
    /// Handle to a node owned by the document
    type Node: Clone + PartialEq + fmt::Debug;

    fn body(&self) -> Option<Self::Node>;
    fn kind(&self, node: &Self::Node) -> NodeKind;
    fn first_child(&self, node: &Self::Node) -> Option<Self::Node>;
    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Text content of a text node, `None` for anything else
    fn text(&self, node: &Self::Node) -> Option<String>;

    /// Whether `node` is still attached under the document body
    fn is_connected(&self, node: &Self::Node) -> bool;

    /// Whether an element is currently displayed
    fn is_rendered(&self, element: &Self::Node) -> bool;
    fn has_attribute(&self, element: &Self::Node, name: &str) -> bool;

    /// Wrap `range` of a text node in a new link element, in one step.
    /// Afterwards the original node holds the text before the range, the
    /// link follows it, and a new text node holds the rest. Returns the link.
    fn wrap_text(
        &mut self,
        node: &Self::Node,
        range: Range<usize>,
        link: &LinkSpec<'_>,
    ) -> Result<Self::Node, DomError>;

    /// Create a tooltip positioned under `anchor`. Returns the tooltip element.
    fn show_tooltip(
        &mut self,
        anchor: &Self::Node,
        tooltip: &TooltipSpec<'_>,
    ) -> Result<Self::Node, DomError>;

    fn remove(&mut self, node: &Self::Node);

    /// The page dropped this link; release anything held for it
    fn release_link(&mut self, _id: LinkId) {}
}
