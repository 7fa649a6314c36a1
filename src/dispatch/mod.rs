//! Click dispatch
//!
//! Clicks on elements carrying an action tag are turned into background
//! requests. This module decides whether a click is ours and what request
//! it stands for; the runtime issues it.

mod action;

pub use action::{
    classify, click_offset, describe, resolve_target, ActionDescriptor, ActionKind, ActionTag,
    WITH_CONTINUATION,
};

use crate::dom::NodeId;

/// A click as seen by the capturing listener
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickEvent {
    /// Innermost element under the pointer
    pub target: NodeId,
    pub client_x: f64,
    pub client_y: f64,
}

impl ClickEvent {
    /// Click on `target` at the viewport origin
    pub fn new(target: NodeId) -> Self {
        Self {
            target,
            client_x: 0.0,
            client_y: 0.0,
        }
    }

    /// Set the viewport coordinates
    pub fn at(mut self, client_x: f64, client_y: f64) -> Self {
        self.client_x = client_x;
        self.client_y = client_y;
        self
    }
}

/// What the host should do with the event after dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    /// Not handled; let the browser navigate or submit
    Default,
    /// Handled; default navigation/submission must not happen
    Prevented,
}

impl EventDisposition {
    pub fn is_prevented(&self) -> bool {
        matches!(self, Self::Prevented)
    }
}
