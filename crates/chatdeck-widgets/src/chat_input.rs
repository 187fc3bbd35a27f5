#![forbid(unsafe_code)]

//! Chat input box.
//!
//! Multi-line text entry with send and stop affixes. The widget owns the
//! local submission state only; the actual round trip to the gateway is
//! driven by the host:
//!
//! 1. [`ChatInput::begin_send`] (or Enter) validates the text, switches to
//!    [`InputPhase::Sending`], and hands back the message to submit.
//! 2. The host runs the session workflow.
//! 3. [`ChatInput::complete_send`] returns the widget to idle and restores
//!    the submitted text according to the [`RestorePolicy`].
//!
//! [`ChatInput::stop_processing`] resets to idle and emits
//! [`ChatInputEvent::ProcessingStopped`] so the host can cancel the call.

use chatdeck_core::attributes::Attributes;
use chatdeck_core::event::{Event, KeyCode, KeyEvent, Modifiers};
use chatdeck_core::notify::{Notifier, SubscriptionId};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Columns assumed before the host reports a width.
const DEFAULT_COLUMNS: u16 = 80;

/// When submitted text is put back into the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestorePolicy {
    /// After every completed or stopped send.
    Always,
    /// Only when the send failed or was stopped.
    #[default]
    OnFailure,
    /// Never; the field stays empty.
    Never,
}

impl RestorePolicy {
    /// Parse `always` / `on-failure` / `never`; anything else is the default.
    #[must_use]
    pub fn from_attribute(value: &str) -> Self {
        match value.trim() {
            "always" => RestorePolicy::Always,
            "never" => RestorePolicy::Never,
            _ => RestorePolicy::OnFailure,
        }
    }

    const fn restores(self, succeeded: bool) -> bool {
        match self {
            RestorePolicy::Always => true,
            RestorePolicy::OnFailure => !succeeded,
            RestorePolicy::Never => false,
        }
    }
}

/// Attribute configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatInputConfig {
    pub placeholder: String,
    /// Heading shown while no session is active.
    pub initial_message: String,
    /// Rows the field grows to before it scrolls.
    pub max_rows: u16,
    pub restore_policy: RestorePolicy,
}

impl Default for ChatInputConfig {
    fn default() -> Self {
        Self {
            placeholder: "Ask what you want".to_string(),
            initial_message: "How can we help you?".to_string(),
            max_rows: 8,
            restore_policy: RestorePolicy::default(),
        }
    }
}

impl ChatInputConfig {
    #[must_use]
    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = text.into();
        self
    }

    #[must_use]
    pub fn initial_message(mut self, text: impl Into<String>) -> Self {
        self.initial_message = text.into();
        self
    }

    #[must_use]
    pub fn max_rows(mut self, rows: u16) -> Self {
        self.max_rows = rows.max(1);
        self
    }

    #[must_use]
    pub fn restore_policy(mut self, policy: RestorePolicy) -> Self {
        self.restore_policy = policy;
        self
    }

    /// Build from `placeholder`, `initial-message`, `max-rows`, `restore`.
    #[must_use]
    pub fn from_attributes(attrs: &Attributes) -> Self {
        let defaults = Self::default();
        Self {
            placeholder: attrs.get_or("placeholder", &defaults.placeholder).to_string(),
            initial_message: attrs
                .get_or("initial-message", &defaults.initial_message)
                .to_string(),
            max_rows: attrs.parse_or("max-rows", defaults.max_rows).max(1),
            restore_policy: attrs
                .get("restore")
                .map_or(defaults.restore_policy, RestorePolicy::from_attribute),
        }
    }
}

/// Submission state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputPhase {
    #[default]
    Idle,
    Sending,
}

/// Events the input emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInputEvent {
    /// A message was accepted for sending.
    Submitted(String),
    /// The user pressed stop while a send was in flight.
    ProcessingStopped,
}

/// The chat input widget.
#[derive(Debug, Default)]
pub struct ChatInput {
    config: ChatInputConfig,
    value: String,
    /// Cursor position as a grapheme index.
    cursor: usize,
    phase: InputPhase,
    last_submitted: Option<String>,
    columns: u16,
    has_active_session: bool,
    listeners: Notifier<ChatInputEvent>,
}

impl ChatInput {
    #[must_use]
    pub fn new(config: ChatInputConfig) -> Self {
        Self {
            config,
            columns: DEFAULT_COLUMNS,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn config(&self) -> &ChatInputConfig {
        &self.config
    }

    // ── text ──

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the text and move the cursor to its end.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.grapheme_count();
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn placeholder(&self) -> &str {
        &self.config.placeholder
    }

    pub fn set_placeholder(&mut self, text: impl Into<String>) {
        self.config.placeholder = text.into();
    }

    /// Clear text and submission state.
    pub fn reset(&mut self) {
        self.value.clear();
        self.cursor = 0;
        self.phase = InputPhase::Idle;
        self.last_submitted = None;
    }

    // ── presentation ──

    #[must_use]
    pub fn phase(&self) -> InputPhase {
        self.phase
    }

    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.phase == InputPhase::Sending
    }

    /// The send affix shows only for non-blank text while idle.
    #[must_use]
    pub fn send_visible(&self) -> bool {
        !self.is_processing() && !self.value.trim().is_empty()
    }

    #[must_use]
    pub fn stop_visible(&self) -> bool {
        self.is_processing()
    }

    #[must_use]
    pub fn input_enabled(&self) -> bool {
        !self.is_processing()
    }

    pub fn set_has_active_session(&mut self, active: bool) {
        self.has_active_session = active;
    }

    /// Heading text, shown only while no session is active.
    #[must_use]
    pub fn heading(&self) -> Option<&str> {
        (!self.has_active_session).then_some(self.config.initial_message.as_str())
    }

    /// Report the text area width in columns.
    pub fn set_columns(&mut self, columns: u16) {
        self.columns = columns.max(1);
    }

    /// Wrapped row count of the current text.
    #[must_use]
    pub fn content_rows(&self) -> usize {
        let columns = usize::from(self.columns.max(1));
        self.value
            .split('\n')
            .map(|line| line.width().div_ceil(columns).max(1))
            .sum()
    }

    /// Visible rows: grows with the content up to `max_rows`.
    #[must_use]
    pub fn rows(&self) -> u16 {
        let max = usize::from(self.config.max_rows.max(1));
        // Bounded by max_rows, which is a u16.
        self.content_rows().min(max) as u16
    }

    /// Whether content exceeds `max_rows` and the field scrolls.
    #[must_use]
    pub fn is_scrolling(&self) -> bool {
        self.content_rows() > usize::from(self.config.max_rows.max(1))
    }

    // ── submission ──

    /// Accept the current text for sending.
    ///
    /// Returns `None` (and changes nothing) when the trimmed text is empty
    /// or a send is already in flight.
    pub fn begin_send(&mut self) -> Option<String> {
        if self.is_processing() {
            return None;
        }
        let message = self.value.trim();
        if message.is_empty() {
            return None;
        }
        let message = message.to_string();
        self.phase = InputPhase::Sending;
        self.last_submitted = Some(message.clone());
        self.value.clear();
        self.cursor = 0;
        chatdeck_core::debug!(len = message.len(), "chat input submitted");
        self.listeners
            .emit(&ChatInputEvent::Submitted(message.clone()));
        Some(message)
    }

    /// Finish an in-flight send. No-op while idle.
    pub fn complete_send(&mut self, succeeded: bool) {
        if !self.is_processing() {
            return;
        }
        self.finish(succeeded);
    }

    /// Reset local state after the user pressed stop. Returns `false` when
    /// nothing was in flight.
    pub fn stop_processing(&mut self) -> bool {
        if !self.is_processing() {
            return false;
        }
        self.finish(false);
        chatdeck_core::debug!("chat input processing stopped");
        self.listeners.emit(&ChatInputEvent::ProcessingStopped);
        true
    }

    fn finish(&mut self, succeeded: bool) {
        self.phase = InputPhase::Idle;
        let restore = self.config.restore_policy.restores(succeeded);
        if let Some(last) = self.last_submitted.take()
            && restore
        {
            self.set_value(last);
        }
    }

    // ── input ──

    /// Route a host event. Returns the event emitted, if any.
    pub fn handle_event(&mut self, event: &Event) -> Option<ChatInputEvent> {
        if let Event::Key(key) = event
            && key.is_press()
        {
            return self.handle_key(key);
        }
        None
    }

    fn handle_key(&mut self, key: &KeyEvent) -> Option<ChatInputEvent> {
        if self.is_processing() {
            return None;
        }
        let ctrl = key.modifiers.contains(Modifiers::CTRL);
        match key.code {
            KeyCode::Enter if key.shift() => {
                self.insert_char('\n');
                None
            }
            KeyCode::Enter => self.begin_send().map(ChatInputEvent::Submitted),
            KeyCode::Char(c) if !ctrl => {
                self.insert_char(c);
                None
            }
            KeyCode::Backspace => {
                self.delete_char_back();
                None
            }
            KeyCode::Delete => {
                self.delete_char_forward();
                None
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                None
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(self.grapheme_count());
                None
            }
            KeyCode::Home => {
                self.cursor = 0;
                None
            }
            KeyCode::End => {
                self.cursor = self.grapheme_count();
                None
            }
            _ => None,
        }
    }

    fn insert_char(&mut self, c: char) {
        let offset = self.grapheme_byte_offset(self.cursor);
        self.value.insert(offset, c);
        // A combining mark joins the grapheme before it.
        let end = offset + c.len_utf8();
        self.cursor = self.value[..end].graphemes(true).count();
    }

    fn delete_char_back(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let start = self.grapheme_byte_offset(self.cursor - 1);
        let end = self.grapheme_byte_offset(self.cursor);
        self.value.replace_range(start..end, "");
        self.cursor -= 1;
    }

    fn delete_char_forward(&mut self) {
        if self.cursor >= self.grapheme_count() {
            return;
        }
        let start = self.grapheme_byte_offset(self.cursor);
        let end = self.grapheme_byte_offset(self.cursor + 1);
        self.value.replace_range(start..end, "");
    }

    fn grapheme_count(&self) -> usize {
        self.value.graphemes(true).count()
    }

    fn grapheme_byte_offset(&self, index: usize) -> usize {
        self.value
            .grapheme_indices(true)
            .nth(index)
            .map_or(self.value.len(), |(offset, _)| offset)
    }

    // ── notifications ──

    pub fn subscribe(&mut self, listener: impl FnMut(&ChatInputEvent) + 'static) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }
}
