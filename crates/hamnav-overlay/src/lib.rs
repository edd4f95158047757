#![forbid(unsafe_code)]

//! Accessible overlay disclosure controller.
//!
//! One [`OverlayController`] wires every trigger/panel pair it discovers in a
//! host [`Document`](hamnav_dom::Document) and owns their open/closed state
//! machines: focus capture and restore, Tab trapping inside the open panel,
//! Escape and click dismissal, and show/hide sequencing against each panel's
//! computed transition duration.
//!
//! Everything is single-threaded and event-driven. The host feeds input via
//! [`OverlayController::handle_event`] and drives deferred work by advancing
//! the controller's virtual clock with [`OverlayController::advance`].

pub mod config;
pub mod controller;
pub mod focus;
pub mod schedule;

pub use config::{FallbackPolicy, OverlayConfig};
pub use controller::{InstanceId, OverlayController, OverlayState};
pub use focus::{TabDisposition, focusable_set, is_focusable, tab_disposition};
pub use schedule::Scheduler;

#[cfg(feature = "config-file")]
pub use config::ConfigError;
