#![forbid(unsafe_code)]

//! Popup stacking registry.
//!
//! A [`PopupRegistry`] owns every popup in the application and the stack of
//! currently open ones. The top of the stack is the most recently opened
//! popup and sits on the highest layer.
//!
//! # Lifecycle
//!
//! ```text
//!   Closed ──open──▶ Opening ──tick(reveal)──▶ Open
//!     ▲                 │                        │
//!     │               close                    close
//!     │                 ▼                        │
//!     └──tick(close)── Closing ◀─────────────────┘
//! ```
//!
//! `open` on an already open popup updates its content and position in
//! place. `close` removes the popup from the stack immediately; the
//! `Closed` notification fires once the close animation deadline passes.
//!
//! # Invariants
//!
//! - The stack never holds the same identifier twice.
//! - A popup's z-index is `50 + 10 × (stack length before it was pushed)`.
//! - Escape only ever closes the top of the stack.
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use chatdeck_widgets::{OpenOptions, PopupConfig, PopupRegistry};
//!
//! let mut popups = PopupRegistry::default();
//! let settings = popups.register(PopupConfig::with_id("settings"));
//! let now = Instant::now();
//! popups.open(&settings, OpenOptions::new().title("Settings"), now).unwrap();
//! assert_eq!(popups.z_index(&settings), Some(50));
//!
//! popups.tick_at(now + Duration::from_millis(10));
//! assert!(popups.get(&settings).unwrap().is_revealed());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use chatdeck_core::attributes::Attributes;
use chatdeck_core::event::{Event, KeyCode, KeyEvent, MouseEvent};
use chatdeck_core::geometry::{Point, Rect, Size};
use chatdeck_core::notify::{Notifier, SubscriptionId};

/// Layer of the first popup opened on an empty stack.
pub const BASE_Z_INDEX: u16 = 50;

/// Layer increment per stack level.
pub const Z_INDEX_STEP: u16 = 10;

// ─── Identity ───────────────────────────────────────────────────────────

/// Popup identifier, unique within a registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PopupId(String);

impl PopupId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh `popup-xxxxxxxxx` identifier.
    #[must_use]
    pub fn generate() -> Self {
        let raw = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("popup-{}", &raw[..9]))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PopupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PopupId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ─── Configuration ──────────────────────────────────────────────────────

/// Display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopupMode {
    /// Centered over a dimmed, clickable backdrop.
    #[default]
    Center,
    /// Anchored at a viewport point; transparent, inert backdrop.
    Contextual,
}

impl PopupMode {
    /// Parse an attribute value; anything but `contextual` is `Center`.
    #[must_use]
    pub fn from_attribute(value: &str) -> Self {
        if value.trim() == "contextual" {
            PopupMode::Contextual
        } else {
            PopupMode::Center
        }
    }
}

/// Animation delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupTimings {
    /// Delay between opening and the visible sub-state.
    pub reveal: Duration,
    /// Close animation length.
    pub close: Duration,
}

impl Default for PopupTimings {
    fn default() -> Self {
        Self {
            reveal: Duration::from_millis(10),
            close: Duration::from_millis(300),
        }
    }
}

/// Per-instance configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupConfig {
    /// Identifier; generated when `None`.
    pub id: Option<PopupId>,
    pub mode: PopupMode,
    /// Whether a backdrop click closes a `Center` popup.
    pub close_on_outside_click: bool,
    pub has_header: bool,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            id: None,
            mode: PopupMode::Center,
            close_on_outside_click: true,
            has_header: true,
        }
    }
}

impl PopupConfig {
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(PopupId::new(id)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn mode(mut self, mode: PopupMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn close_on_outside_click(mut self, on: bool) -> Self {
        self.close_on_outside_click = on;
        self
    }

    #[must_use]
    pub fn has_header(mut self, on: bool) -> Self {
        self.has_header = on;
        self
    }

    /// Build from `id`, `mode`, `close-on-outside-click`, `has-header`.
    #[must_use]
    pub fn from_attributes(attrs: &Attributes) -> Self {
        Self {
            id: attrs.get("id").map(PopupId::new),
            mode: attrs
                .get("mode")
                .map_or(PopupMode::Center, PopupMode::from_attribute),
            close_on_outside_click: attrs.flag_default_on("close-on-outside-click"),
            has_header: attrs.flag_default_on("has-header"),
        }
    }
}

/// Options for a single `open` call. Unset fields keep the popup's
/// current values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenOptions {
    pub title: Option<String>,
    pub content: Option<String>,
    pub mode: Option<PopupMode>,
    /// Anchor point for `Contextual` mode.
    pub position: Option<Point>,
    /// Declared parent when nested.
    pub parent: Option<PopupId>,
}

impl OpenOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: PopupMode) -> Self {
        self.mode = Some(mode);
        self
    }

    #[must_use]
    pub fn position(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    #[must_use]
    pub fn parent(mut self, parent: PopupId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Fill unset fields from `base`.
    #[must_use]
    pub fn or(self, base: &OpenOptions) -> Self {
        Self {
            title: self.title.or_else(|| base.title.clone()),
            content: self.content.or_else(|| base.content.clone()),
            mode: self.mode.or(base.mode),
            position: self.position.or(base.position),
            parent: self.parent.or_else(|| base.parent.clone()),
        }
    }
}

// ─── Events & errors ────────────────────────────────────────────────────

/// Observable popup notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupEvent {
    Opened {
        id: PopupId,
        parent: Option<PopupId>,
    },
    Closed {
        id: PopupId,
        parent: Option<PopupId>,
    },
}

impl PopupEvent {
    #[must_use]
    pub fn id(&self) -> &PopupId {
        match self {
            PopupEvent::Opened { id, .. } | PopupEvent::Closed { id, .. } => id,
        }
    }
}

/// Lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopupPhase {
    #[default]
    Closed,
    Opening,
    Open,
    Closing,
}

impl PopupPhase {
    /// `Opening` or `Open`.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, PopupPhase::Opening | PopupPhase::Open)
    }
}

/// Errors from registry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupError {
    /// No popup registered under this identifier.
    UnknownPopup(PopupId),
    /// Operation not allowed from the popup's current phase.
    InvalidTransition { from: PopupPhase, op: &'static str },
}

impl fmt::Display for PopupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPopup(id) => write!(f, "unknown popup: {id}"),
            Self::InvalidTransition { from, op } => {
                write!(f, "cannot {op} a popup in phase {from:?}")
            }
        }
    }
}

impl std::error::Error for PopupError {}

// ─── Popup ──────────────────────────────────────────────────────────────

/// One registered popup.
#[derive(Debug, Clone)]
pub struct Popup {
    id: PopupId,
    config: PopupConfig,
    mode: PopupMode,
    title: String,
    content: String,
    anchor: Option<Point>,
    parent: Option<PopupId>,
    phase: PopupPhase,
    revealed: bool,
    z_index: Option<u16>,
    measured: Size,
    frame: Rect,
    deadline: Option<Instant>,
}

impl Popup {
    fn new(id: PopupId, config: PopupConfig) -> Self {
        Self {
            id,
            mode: config.mode,
            config,
            title: String::new(),
            content: String::new(),
            anchor: None,
            parent: None,
            phase: PopupPhase::Closed,
            revealed: false,
            z_index: None,
            measured: Size::ZERO,
            frame: Rect::default(),
            deadline: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &PopupId {
        &self.id
    }

    #[must_use]
    pub fn config(&self) -> &PopupConfig {
        &self.config
    }

    #[must_use]
    pub fn mode(&self) -> PopupMode {
        self.mode
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn parent(&self) -> Option<&PopupId> {
        self.parent.as_ref()
    }

    #[must_use]
    pub fn phase(&self) -> PopupPhase {
        self.phase
    }

    /// Shown at all (any phase but `Closed`).
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.phase != PopupPhase::Closed
    }

    /// In the fully visible visual sub-state.
    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Backdrop layer while open.
    #[must_use]
    pub fn z_index(&self) -> Option<u16> {
        self.z_index
    }

    /// Container layer (one above the backdrop).
    #[must_use]
    pub fn container_z_index(&self) -> Option<u16> {
        self.z_index.map(|z| z + 1)
    }

    /// Whether the backdrop is dimmed and clickable.
    #[must_use]
    pub fn has_interactive_backdrop(&self) -> bool {
        self.mode == PopupMode::Center
    }

    /// Placed container rectangle in viewport coordinates.
    #[must_use]
    pub fn frame(&self) -> Rect {
        self.frame
    }

    fn place(&mut self, viewport: Size) {
        let viewport_rect = Rect::at(Point::default(), viewport);
        self.frame = match (self.mode, self.anchor) {
            (PopupMode::Contextual, Some(anchor)) => {
                Rect::at(anchor, self.measured).clamp_within(viewport)
            }
            _ => viewport_rect.centered(self.measured),
        };
    }

    fn apply(&mut self, options: OpenOptions) {
        if let Some(title) = options.title {
            self.title = title;
        }
        if let Some(content) = options.content {
            self.content = content;
        }
        if let Some(mode) = options.mode {
            self.mode = mode;
        }
        if options.position.is_some() {
            self.anchor = options.position;
        }
        if options.parent.is_some() {
            self.parent = options.parent;
        }
    }
}

// ─── Registry ───────────────────────────────────────────────────────────

/// Owner of all popups and the active stack.
#[derive(Debug, Default)]
pub struct PopupRegistry {
    popups: HashMap<PopupId, Popup>,
    stack: Vec<PopupId>,
    viewport: Size,
    timings: PopupTimings,
    listeners: Notifier<PopupEvent>,
}

impl PopupRegistry {
    #[must_use]
    pub fn new(viewport: Size) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_timings(mut self, timings: PopupTimings) -> Self {
        self.timings = timings;
        self
    }

    // ── registration ──

    /// Register a popup and return its identifier.
    ///
    /// Registering an identifier that already exists tears the old
    /// instance down first.
    pub fn register(&mut self, config: PopupConfig) -> PopupId {
        let id = config.id.clone().unwrap_or_else(PopupId::generate);
        if self.popups.contains_key(&id) {
            chatdeck_core::warn!(popup = %id, "replacing registered popup");
            self.unregister(&id);
        }
        self.popups.insert(id.clone(), Popup::new(id.clone(), config));
        id
    }

    /// Tear a popup down regardless of its phase. Returns `false` if it was
    /// not registered.
    pub fn unregister(&mut self, id: &PopupId) -> bool {
        self.stack.retain(|open| open != id);
        self.popups.remove(id).is_some()
    }

    #[must_use]
    pub fn contains(&self, id: &PopupId) -> bool {
        self.popups.contains_key(id)
    }

    #[must_use]
    pub fn get(&self, id: &PopupId) -> Option<&Popup> {
        self.popups.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.popups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.popups.is_empty()
    }

    /// Open identifiers, bottom to top.
    #[must_use]
    pub fn stack(&self) -> &[PopupId] {
        &self.stack
    }

    #[must_use]
    pub fn top(&self) -> Option<&PopupId> {
        self.stack.last()
    }

    #[must_use]
    pub fn z_index(&self, id: &PopupId) -> Option<u16> {
        self.popups.get(id).and_then(Popup::z_index)
    }

    #[must_use]
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Update the viewport and re-place every visible popup.
    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
        for popup in self.popups.values_mut().filter(|p| p.is_visible()) {
            popup.place(viewport);
        }
    }

    // ── transitions ──

    /// Open (or refresh) a popup.
    pub fn open(
        &mut self,
        id: &PopupId,
        options: OpenOptions,
        now: Instant,
    ) -> Result<(), PopupError> {
        let depth = self.stack.len();
        let viewport = self.viewport;
        let reveal = self.timings.reveal;
        let popup = self
            .popups
            .get_mut(id)
            .ok_or_else(|| PopupError::UnknownPopup(id.clone()))?;

        match popup.phase {
            PopupPhase::Closing => Err(PopupError::InvalidTransition {
                from: PopupPhase::Closing,
                op: "open",
            }),
            PopupPhase::Opening | PopupPhase::Open => {
                popup.apply(options);
                popup.place(viewport);
                Ok(())
            }
            PopupPhase::Closed => {
                popup.apply(options);
                popup.place(viewport);
                let z = BASE_Z_INDEX.saturating_add(Z_INDEX_STEP.saturating_mul(depth as u16));
                popup.z_index = Some(z);
                popup.phase = PopupPhase::Opening;
                popup.revealed = false;
                popup.deadline = Some(now + reveal);
                let event = PopupEvent::Opened {
                    id: id.clone(),
                    parent: popup.parent.clone(),
                };
                self.stack.push(id.clone());
                chatdeck_core::debug!(popup = %id, z_index = z, depth, "popup opened");
                self.listeners.emit(&event);
                Ok(())
            }
        }
    }

    /// Start closing a popup and drop it from the stack.
    pub fn close(&mut self, id: &PopupId, now: Instant) -> Result<(), PopupError> {
        let close = self.timings.close;
        let popup = self
            .popups
            .get_mut(id)
            .ok_or_else(|| PopupError::UnknownPopup(id.clone()))?;
        if !popup.phase.is_open() {
            return Err(PopupError::InvalidTransition {
                from: popup.phase,
                op: "close",
            });
        }
        popup.phase = PopupPhase::Closing;
        popup.revealed = false;
        popup.deadline = Some(now + close);
        self.stack.retain(|open| open != id);
        chatdeck_core::debug!(popup = %id, "popup closing");
        Ok(())
    }

    /// Open if closed, close if open.
    pub fn toggle(&mut self, id: &PopupId, now: Instant) -> Result<(), PopupError> {
        let open = self
            .popups
            .get(id)
            .ok_or_else(|| PopupError::UnknownPopup(id.clone()))?
            .phase
            .is_open();
        if open {
            self.close(id, now)
        } else {
            self.open(id, OpenOptions::default(), now)
        }
    }

    /// Open by raw identifier string.
    pub fn open_by_id(
        &mut self,
        id: &str,
        options: OpenOptions,
        now: Instant,
    ) -> Result<(), PopupError> {
        self.open(&PopupId::new(id), options, now)
    }

    /// Close by raw identifier string.
    pub fn close_by_id(&mut self, id: &str, now: Instant) -> Result<(), PopupError> {
        self.close(&PopupId::new(id), now)
    }

    /// Close every open popup, last opened first. Returns the closing order.
    pub fn close_all(&mut self, now: Instant) -> Vec<PopupId> {
        let order: Vec<PopupId> = self.stack.iter().rev().cloned().collect();
        for id in &order {
            if let Err(err) = self.close(id, now) {
                chatdeck_core::warn!(popup = %id, error = %err, "close_all skipped popup");
            }
        }
        order
    }

    /// Advance animation deadlines. Returns the notifications fired.
    pub fn tick_at(&mut self, now: Instant) -> Vec<PopupEvent> {
        let mut due: Vec<(Instant, PopupId)> = self
            .popups
            .values()
            .filter_map(|p| p.deadline.filter(|d| *d <= now).map(|d| (d, p.id.clone())))
            .collect();
        due.sort();

        let mut fired = Vec::new();
        for (_, id) in due {
            let Some(popup) = self.popups.get_mut(&id) else {
                continue;
            };
            popup.deadline = None;
            match popup.phase {
                PopupPhase::Opening => {
                    popup.phase = PopupPhase::Open;
                    popup.revealed = true;
                }
                PopupPhase::Closing => {
                    popup.phase = PopupPhase::Closed;
                    popup.z_index = None;
                    fired.push(PopupEvent::Closed {
                        id: id.clone(),
                        parent: popup.parent.clone(),
                    });
                    chatdeck_core::debug!(popup = %id, "popup closed");
                }
                PopupPhase::Open | PopupPhase::Closed => {}
            }
        }
        for event in &fired {
            self.listeners.emit(event);
        }
        fired
    }

    /// Earliest pending animation deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.popups.values().filter_map(|p| p.deadline).min()
    }

    // ── content ──

    pub fn set_title(&mut self, id: &PopupId, title: impl Into<String>) -> Result<(), PopupError> {
        self.popup_mut(id)?.title = title.into();
        Ok(())
    }

    pub fn set_content(
        &mut self,
        id: &PopupId,
        content: impl Into<String>,
    ) -> Result<(), PopupError> {
        self.popup_mut(id)?.content = content.into();
        Ok(())
    }

    pub fn set_mode(&mut self, id: &PopupId, mode: PopupMode) -> Result<(), PopupError> {
        let viewport = self.viewport;
        let popup = self.popup_mut(id)?;
        popup.mode = mode;
        popup.place(viewport);
        Ok(())
    }

    /// Record the rendered size of a popup and re-anchor it inside the
    /// viewport.
    pub fn report_measured_size(&mut self, id: &PopupId, size: Size) -> Result<Rect, PopupError> {
        let viewport = self.viewport;
        let popup = self.popup_mut(id)?;
        popup.measured = size;
        popup.place(viewport);
        Ok(popup.frame)
    }

    fn popup_mut(&mut self, id: &PopupId) -> Result<&mut Popup, PopupError> {
        self.popups
            .get_mut(id)
            .ok_or_else(|| PopupError::UnknownPopup(id.clone()))
    }

    // ── input ──

    /// Route a host event. Returns `true` when a popup consumed it.
    pub fn handle_event(&mut self, event: &Event, now: Instant) -> bool {
        match event {
            Event::Key(key) => self.handle_key(key, now),
            Event::Mouse(mouse) => self.handle_mouse(mouse, now),
            Event::Resize { width, height } => {
                self.set_viewport(Size::new(*width, *height));
                false
            }
        }
    }

    /// Escape closes the top popup only.
    pub fn handle_key(&mut self, key: &KeyEvent, now: Instant) -> bool {
        if !key.is_press() || key.code != KeyCode::Escape {
            return false;
        }
        let Some(top) = self.stack.last().cloned() else {
            return false;
        };
        self.close(&top, now).is_ok()
    }

    /// Hit-test a click against the stack, top down.
    ///
    /// A click inside a popup's container is consumed. A click on a
    /// `Center` backdrop is consumed and closes that popup when outside
    /// clicks are enabled. `Contextual` backdrops let the click through.
    pub fn handle_mouse(&mut self, mouse: &MouseEvent, now: Instant) -> bool {
        if !mouse.is_left_click() {
            return false;
        }
        let point = mouse.position();
        let mut backdrop_hit = None;
        for id in self.stack.iter().rev() {
            let Some(popup) = self.popups.get(id) else {
                continue;
            };
            if popup.frame.contains(point) {
                return true;
            }
            if popup.has_interactive_backdrop() {
                backdrop_hit = Some((id.clone(), popup.config.close_on_outside_click));
                break;
            }
        }
        match backdrop_hit {
            Some((id, true)) => {
                if let Err(err) = self.close(&id, now) {
                    chatdeck_core::warn!(popup = %id, error = %err, "backdrop close failed");
                }
                true
            }
            Some((_, false)) => true,
            None => false,
        }
    }

    /// Topmost open popup whose container contains `point`.
    #[must_use]
    pub fn hit_test(&self, point: Point) -> Option<&PopupId> {
        self.stack
            .iter()
            .rev()
            .find(|id| self.popups.get(*id).is_some_and(|p| p.frame.contains(point)))
    }

    // ── notifications ──

    pub fn subscribe(&mut self, listener: impl FnMut(&PopupEvent) + 'static) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }
}
