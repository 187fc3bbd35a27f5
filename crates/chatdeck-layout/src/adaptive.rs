#![forbid(unsafe_code)]

//! Responsive sidebar.
//!
//! [`AdaptiveLayout`] owns a [`LayoutPosition`] that changes from two
//! sources:
//!
//! - **Automatic**: viewport resizes mapped through [`ViewportBreakpoints`].
//!   Only applied while the layout is connected and no manual override is
//!   active.
//! - **Manual**: [`AdaptiveLayout::update_width`] or an affix click. Sets a
//!   sticky override that suppresses automatic changes until
//!   [`AdaptiveLayout::reset_manual_override`].
//!
//! The current position lives in a shared [`LayoutContext`]. Buttons keep a
//! `Weak` handle to it and derive their presentation on demand, so a state
//! change resynchronises every contained button without walking a tree.
//!
//! # Example
//!
//! ```
//! use chatdeck_layout::{AdaptiveLayout, AdaptiveLayoutConfig, LayoutPosition};
//!
//! let mut nav = AdaptiveLayout::new(AdaptiveLayoutConfig::default());
//! nav.connect(500);
//! assert_eq!(nav.position(), LayoutPosition::Collapsed);
//!
//! nav.update_width(LayoutPosition::Expanded);
//! nav.handle_resize(500);
//! assert_eq!(nav.position(), LayoutPosition::Expanded);
//! ```

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use chatdeck_core::attributes::Attributes;
use chatdeck_core::event::Event;
use chatdeck_core::notify::{Notifier, SubscriptionId};

use crate::button::{AdaptiveButton, ButtonConfig, ButtonId};
use crate::{LayoutPosition, ViewportBreakpoints};

// ─── Shared context ─────────────────────────────────────────────────────

/// Position cell shared between a layout and the buttons inside it.
#[derive(Debug, Default)]
pub struct LayoutContext {
    position: Cell<LayoutPosition>,
}

impl LayoutContext {
    #[must_use]
    pub fn new(position: LayoutPosition) -> Self {
        Self {
            position: Cell::new(position),
        }
    }

    #[must_use]
    pub fn position(&self) -> LayoutPosition {
        self.position.get()
    }

    fn set(&self, position: LayoutPosition) {
        self.position.set(position);
    }
}

/// Emitted on every position change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutChange {
    pub position: LayoutPosition,
    pub previous: LayoutPosition,
    /// `true` when driven by a viewport resize.
    pub automatic: bool,
}

// ─── Configuration ──────────────────────────────────────────────────────

/// Attribute configuration of the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptiveLayoutConfig {
    /// Initial position.
    pub position: LayoutPosition,
    /// Width transition duration.
    pub transition: Duration,
    /// Extra style classes on the container.
    pub styles: String,
    /// Accent class for affix buttons.
    pub accent: String,
    /// Text color class for labels.
    pub text_color: String,
    pub breakpoints: ViewportBreakpoints,
}

impl Default for AdaptiveLayoutConfig {
    fn default() -> Self {
        Self {
            position: LayoutPosition::Expanded,
            transition: Duration::from_millis(300),
            styles: String::new(),
            accent: "bg-chat-orange".to_string(),
            text_color: "text-gray-700".to_string(),
            breakpoints: ViewportBreakpoints::DEFAULT,
        }
    }
}

impl AdaptiveLayoutConfig {
    #[must_use]
    pub fn position(mut self, position: LayoutPosition) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn transition(mut self, transition: Duration) -> Self {
        self.transition = transition;
        self
    }

    #[must_use]
    pub fn breakpoints(mut self, breakpoints: ViewportBreakpoints) -> Self {
        self.breakpoints = breakpoints;
        self
    }

    /// Build from markup-style attributes (`position`, `transition` in ms,
    /// `styles`, `accent`, `text-color`).
    #[must_use]
    pub fn from_attributes(attrs: &Attributes) -> Self {
        let defaults = Self::default();
        let position = attrs
            .get("position")
            .map_or(defaults.position, LayoutPosition::from_attribute);
        let transition_ms = attrs.parse_or("transition", 300u64);
        Self {
            position,
            transition: Duration::from_millis(transition_ms),
            styles: attrs.get_or("styles", "").to_string(),
            accent: attrs.get_or("accent", &defaults.accent).to_string(),
            text_color: attrs
                .get_or("text-color", &defaults.text_color)
                .to_string(),
            breakpoints: defaults.breakpoints,
        }
    }
}

// ─── Presentation ───────────────────────────────────────────────────────

/// The generated expand/collapse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affix {
    Expand,
    Collapse,
}

/// Which affix buttons are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AffixVisibility {
    pub expand: bool,
    pub collapse: bool,
}

impl AffixVisibility {
    #[must_use]
    pub const fn for_position(position: LayoutPosition) -> Self {
        match position {
            LayoutPosition::Collapsed => Self {
                expand: true,
                collapse: false,
            },
            LayoutPosition::Medium => Self {
                expand: true,
                collapse: true,
            },
            LayoutPosition::Expanded => Self {
                expand: false,
                collapse: true,
            },
        }
    }
}

/// A grouped child section of the sidebar (e.g. the history list).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub hidden: bool,
}

/// Container-level presentation for the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutPresentation {
    pub position: LayoutPosition,
    pub width_px: u16,
    pub aria_expanded: bool,
    pub labels_visible: bool,
    pub icons_enlarged: bool,
    pub sections_hidden: bool,
    pub affixes: AffixVisibility,
}

impl LayoutPresentation {
    #[must_use]
    pub const fn for_position(position: LayoutPosition) -> Self {
        let collapsed = matches!(position, LayoutPosition::Collapsed);
        Self {
            position,
            width_px: position.width_px(),
            aria_expanded: !collapsed,
            labels_visible: !collapsed,
            icons_enlarged: collapsed,
            sections_hidden: collapsed,
            affixes: AffixVisibility::for_position(position),
        }
    }
}

// ─── Layout ─────────────────────────────────────────────────────────────

/// Three-state responsive sidebar.
#[derive(Debug)]
pub struct AdaptiveLayout {
    config: AdaptiveLayoutConfig,
    context: Rc<LayoutContext>,
    manual_override: bool,
    observing: bool,
    viewport_width: Option<u16>,
    buttons: Vec<AdaptiveButton>,
    sections: Vec<Section>,
    listeners: Notifier<LayoutChange>,
}

impl AdaptiveLayout {
    /// Create a disconnected layout at the configured position.
    #[must_use]
    pub fn new(config: AdaptiveLayoutConfig) -> Self {
        let context = Rc::new(LayoutContext::new(config.position));
        Self {
            config,
            context,
            manual_override: false,
            observing: false,
            viewport_width: None,
            buttons: Vec::new(),
            sections: Vec::new(),
            listeners: Notifier::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdaptiveLayoutConfig {
        &self.config
    }

    #[must_use]
    pub fn breakpoints(&self) -> ViewportBreakpoints {
        self.config.breakpoints
    }

    /// Shared handle for buttons created outside the layout.
    #[must_use]
    pub fn context(&self) -> &Rc<LayoutContext> {
        &self.context
    }

    #[must_use]
    pub fn position(&self) -> LayoutPosition {
        self.context.position()
    }

    #[must_use]
    pub fn presentation(&self) -> LayoutPresentation {
        LayoutPresentation::for_position(self.position())
    }

    #[must_use]
    pub fn is_manual_override(&self) -> bool {
        self.manual_override
    }

    /// Whether viewport observation is active.
    #[must_use]
    pub fn is_observing(&self) -> bool {
        self.observing
    }

    #[must_use]
    pub fn viewport_width(&self) -> Option<u16> {
        self.viewport_width
    }

    // ── lifecycle ──

    /// Start observing the viewport and apply the automatic state for
    /// `viewport_width`.
    pub fn connect(&mut self, viewport_width: u16) -> Option<LayoutChange> {
        self.observing = true;
        chatdeck_core::debug!(viewport_width, "adaptive layout connected");
        self.handle_resize(viewport_width)
    }

    /// Stop observing. Later resizes are ignored and listeners dropped.
    pub fn disconnect(&mut self) {
        self.observing = false;
        self.listeners.clear();
        chatdeck_core::debug!("adaptive layout disconnected");
    }

    // ── automatic ──

    /// Feed a host event. Only `Event::Resize` matters here.
    pub fn handle_event(&mut self, event: &Event) -> Option<LayoutChange> {
        match *event {
            Event::Resize { width, .. } => self.handle_resize(width),
            _ => None,
        }
    }

    /// Apply the automatic state for a viewport width.
    ///
    /// Returns `None` when disconnected, overridden, or already in the
    /// target state.
    pub fn handle_resize(&mut self, viewport_width: u16) -> Option<LayoutChange> {
        if !self.observing {
            return None;
        }
        self.viewport_width = Some(viewport_width);
        if self.manual_override {
            return None;
        }
        let target = self.config.breakpoints.classify_width(viewport_width);
        if target == self.position() {
            return None;
        }
        Some(self.apply(target, true))
    }

    // ── manual ──

    /// Set the position by hand and pin it.
    pub fn update_width(&mut self, position: LayoutPosition) -> LayoutChange {
        self.manual_override = true;
        self.apply(position, false)
    }

    /// Step one state in the affix direction. Pins the result.
    pub fn click_affix(&mut self, affix: Affix) -> LayoutChange {
        let current = self.position();
        let target = match affix {
            Affix::Expand => current.wider(),
            Affix::Collapse => current.narrower(),
        };
        self.update_width(target)
    }

    /// Clear the manual override and re-apply the automatic state for the
    /// last seen viewport width.
    pub fn reset_manual_override(&mut self) -> Option<LayoutChange> {
        self.manual_override = false;
        let width = self.viewport_width?;
        self.handle_resize(width)
    }

    fn apply(&mut self, position: LayoutPosition, automatic: bool) -> LayoutChange {
        let previous = self.context.position();
        self.context.set(position);
        let hidden = matches!(position, LayoutPosition::Collapsed);
        for section in &mut self.sections {
            section.hidden = hidden;
        }
        let change = LayoutChange {
            position,
            previous,
            automatic,
        };
        chatdeck_core::debug!(
            position = %position,
            previous = %previous,
            automatic,
            "layout position changed"
        );
        self.listeners.emit(&change);
        change
    }

    // ── children ──

    /// Add a button that follows this layout.
    pub fn add_button(&mut self, config: ButtonConfig) -> ButtonId {
        let id = ButtonId(self.buttons.len());
        self.buttons
            .push(AdaptiveButton::attached(config, &self.context));
        id
    }

    #[must_use]
    pub fn button(&self, id: ButtonId) -> Option<&AdaptiveButton> {
        self.buttons.get(id.0)
    }

    pub fn button_mut(&mut self, id: ButtonId) -> Option<&mut AdaptiveButton> {
        self.buttons.get_mut(id.0)
    }

    #[must_use]
    pub fn buttons(&self) -> &[AdaptiveButton] {
        &self.buttons
    }

    /// Add a grouped section; it is hidden whenever the layout is collapsed.
    pub fn add_section(&mut self, name: impl Into<String>) -> usize {
        self.sections.push(Section {
            name: name.into(),
            hidden: matches!(self.position(), LayoutPosition::Collapsed),
        });
        self.sections.len() - 1
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    // ── notifications ──

    pub fn subscribe(&mut self, listener: impl FnMut(&LayoutChange) + 'static) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }
}
