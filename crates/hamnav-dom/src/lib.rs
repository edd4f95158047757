#![forbid(unsafe_code)]

//! Minimal host-document model for the hamnav overlay controller.
//!
//! This crate supplies exactly the substrate the overlay controller touches:
//! an element tree with ids, attributes, classes, and focus tracking, plus
//! canonical input events and computed transition durations. There is no
//! layout engine and no renderer; the point is a deterministic, inspectable
//! stand-in for the live document the controller would otherwise own nothing
//! of.

pub mod event;
pub mod style;
pub mod tree;

pub use event::{Event, EventOutcome, KeyCode, KeyEvent, Modifiers, PointerEvent};
pub use style::parse_transition_duration;
pub use tree::{Document, HIDDEN_ATTR, NodeId};
