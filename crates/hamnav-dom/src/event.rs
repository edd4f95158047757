#![forbid(unsafe_code)]

//! Canonical input/event types.
//!
//! This module defines the standard event types the overlay controller
//! receives from the host. All events derive `Clone`, `PartialEq`, and `Eq`
//! for use in tests and pattern matching.
//!
//! # Design Notes
//!
//! - Pointer events carry the *target element*, not coordinates: the
//!   controller's dismissal contracts are all about which subtree a click
//!   landed in, never about geometry.
//! - Events carry no mutable "default prevented" flag. Handlers return an
//!   [`EventOutcome`]; `Handled` tells the host to suppress the native
//!   default action.
//! - `Modifiers` use bitflags for easy combination.

use bitflags::bitflags;

use crate::tree::NodeId;

/// Canonical input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A keyboard event, dispatched at document level.
    Key(KeyEvent),

    /// A pointer activation (click) on a specific element.
    Pointer(PointerEvent),
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// Create a new key event with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Check if Shift modifier is held.
    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }
}

/// Key codes for keyboard events.
///
/// Only the keys the overlay controller reacts to are distinguished; anything
/// else arrives as `Char` and falls through to native handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A regular character key.
    Char(char),

    /// Enter/Return key.
    Enter,

    /// Escape key.
    Escape,

    /// Tab key (direction comes from the Shift modifier).
    Tab,
}

bitflags! {
    /// Modifier keys that can be held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// A pointer activation on a specific element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    /// The innermost element the activation landed on.
    pub target: NodeId,
}

impl PointerEvent {
    /// Create a new pointer event.
    #[must_use]
    pub const fn new(target: NodeId) -> Self {
        Self { target }
    }
}

/// What a handler did with an event.
///
/// `Handled` means the host must suppress the native default action (the
/// moral equivalent of `preventDefault`); `Ignored` leaves native behavior
/// alone, even when side effects were scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventOutcome {
    /// The event was consumed; suppress the native default.
    Handled,

    /// The event was not consumed; native behavior proceeds.
    #[default]
    Ignored,
}

impl EventOutcome {
    /// Check whether the event was consumed.
    #[must_use]
    pub const fn is_handled(self) -> bool {
        matches!(self, Self::Handled)
    }
}
