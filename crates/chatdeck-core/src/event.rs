#![forbid(unsafe_code)]

//! Canonical input event types.
//!
//! Hosts translate their native input (browser events, terminal events,
//! test scripts) into these values and hand them to widgets. All events
//! derive `Clone`, `PartialEq`, and `Eq` for use in tests and matching.
//!
//! # Design Notes
//!
//! - Mouse coordinates are viewport pixels, origin top-left
//! - `KeyEventKind` defaults to `Press` when the host cannot distinguish
//! - `Modifiers` use bitflags for easy combination

use bitflags::bitflags;

use crate::geometry::Point;

/// Canonical input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A keyboard event.
    Key(KeyEvent),

    /// A mouse event.
    Mouse(MouseEvent),

    /// The viewport was resized.
    Resize {
        /// New viewport width.
        width: u16,
        /// New viewport height.
        height: u16,
    },
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// The type of key event (press, repeat, or release).
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a new key event with default modifiers and Press kind.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Create a key event with a specific kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether this is a press or repeat (i.e. not a release).
    #[must_use]
    pub const fn is_press(&self) -> bool {
        !matches!(self.kind, KeyEventKind::Release)
    }

    /// Check if Shift modifier is held.
    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }
}

/// Key codes for keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A regular character key.
    Char(char),
    /// Enter/Return key.
    Enter,
    /// Escape key.
    Escape,
    /// Backspace key.
    Backspace,
    /// Delete key.
    Delete,
    /// Left arrow key.
    Left,
    /// Right arrow key.
    Right,
    /// Home key.
    Home,
    /// End key.
    End,
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default when not distinguishable).
    #[default]
    Press,

    /// Key is being held (repeat event).
    Repeat,

    /// Key was released.
    Release,
}

bitflags! {
    /// Modifier keys that can be held during an input event.
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

/// A mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    /// The type of mouse event.
    pub kind: MouseEventKind,

    /// X coordinate in viewport pixels.
    pub x: u16,

    /// Y coordinate in viewport pixels.
    pub y: u16,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
}

impl MouseEvent {
    /// Create a new mouse event.
    #[must_use]
    pub const fn new(kind: MouseEventKind, x: u16, y: u16) -> Self {
        Self {
            kind,
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    /// Shorthand for a left-button click (button released) at `(x, y)`.
    #[must_use]
    pub const fn click(x: u16, y: u16) -> Self {
        Self::new(MouseEventKind::Up(MouseButton::Left), x, y)
    }

    /// Get the position as a point.
    #[must_use]
    pub const fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Whether this event completes a left click.
    #[must_use]
    pub const fn is_left_click(&self) -> bool {
        matches!(self.kind, MouseEventKind::Up(MouseButton::Left))
    }
}

/// The type of mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    /// Mouse button pressed down.
    Down(MouseButton),

    /// Mouse button released.
    Up(MouseButton),
}

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button.
    Left,

    /// Right mouse button.
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_event_defaults() {
        let key = KeyEvent::new(KeyCode::Escape);
        assert_eq!(key.modifiers, Modifiers::NONE);
        assert_eq!(key.kind, KeyEventKind::Press);
        assert!(key.is_press());
    }

    #[test]
    fn release_is_not_press() {
        let key = KeyEvent::new(KeyCode::Enter).with_kind(KeyEventKind::Release);
        assert!(!key.is_press());
    }

    #[test]
    fn shift_modifier_detected() {
        let key = KeyEvent::new(KeyCode::Enter).with_modifiers(Modifiers::SHIFT | Modifiers::CTRL);
        assert!(key.shift());
    }

    #[test]
    fn click_helper_is_left_release() {
        let click = MouseEvent::click(4, 9);
        assert!(click.is_left_click());
        assert_eq!(click.position(), Point::new(4, 9));
        assert!(!MouseEvent::new(MouseEventKind::Down(MouseButton::Left), 0, 0).is_left_click());
        assert!(!MouseEvent::new(MouseEventKind::Up(MouseButton::Right), 0, 0).is_left_click());
    }
}
