//! Host services the page controller needs from its environment
//!
//! Timers, animation frames and the mutation observer are requested here and
//! delivered back to [`PageAnnotator::handle`](crate::page::PageAnnotator::handle)
//! as [`PageEvent`]s.

use serde::{Deserialize, Serialize};

use crate::dom::{LinkId, TooltipId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(pub u32);

pub trait Host {
    /// Schedule a one-shot [`PageEvent::Timer`]
    fn set_timeout(&mut self, delay_ms: u32) -> TimerId;
    fn clear_timeout(&mut self, id: TimerId);

    /// A timer fired and was delivered
    fn timer_elapsed(&mut self, _id: TimerId) {}

    /// Schedule one [`PageEvent::Frame`] before the next repaint
    fn request_frame(&mut self);

    /// Start delivering [`PageEvent::Mutations`] for the whole body
    /// (child list, subtree)
    fn observe(&mut self);
    fn disconnect(&mut self);
}

/// Element under the pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoverTarget {
    Link(LinkId),
    Tooltip(TooltipId),
}

/// Everything the environment can tell the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    Timer(TimerId),
    Frame,
    /// Number of relevant mutation records in one observer callback
    Mutations(usize),
    PointerEnter(HoverTarget),
    PointerLeave(HoverTarget),
    Scroll,
}
