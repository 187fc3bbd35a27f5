#![forbid(unsafe_code)]

//! Transcript view: message bubbles with a typing reveal for new
//! assistant responses.
//!
//! Stored messages render complete. A fresh assistant response first shows
//! a typing indicator, then reveals one grapheme per tick interval. Timers
//! are deadline based: the host calls [`TranscriptView::tick_at`] from its
//! event loop and re-reads the bubbles.

use std::time::{Duration, Instant};

use chatdeck_core::chat::{ChatMessage, Role};
use unicode_segmentation::UnicodeSegmentation;

/// Horizontal placement of a bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Assistant messages.
    Left,
    /// User messages.
    Right,
}

impl Alignment {
    #[must_use]
    pub const fn for_role(role: Role) -> Self {
        match role {
            Role::User => Alignment::Right,
            Role::Assistant => Alignment::Left,
        }
    }
}

/// Reveal timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingTimings {
    /// How long the typing indicator shows before text appears.
    pub indicator: Duration,
    /// Delay per revealed grapheme.
    pub per_grapheme: Duration,
}

impl Default for TypingTimings {
    fn default() -> Self {
        Self {
            indicator: Duration::from_millis(800),
            per_grapheme: Duration::from_millis(20),
        }
    }
}

impl TypingTimings {
    /// No animation at all.
    #[must_use]
    pub const fn instant() -> Self {
        Self {
            indicator: Duration::ZERO,
            per_grapheme: Duration::ZERO,
        }
    }
}

/// One rendered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    role: Role,
    text: String,
    total: usize,
    revealed: usize,
    typing: bool,
    reveal_started: Option<Instant>,
}

impl Bubble {
    fn complete(role: Role, text: String) -> Self {
        let total = text.graphemes(true).count();
        Self {
            role,
            text,
            total,
            revealed: total,
            typing: false,
            reveal_started: None,
        }
    }

    fn animated(text: String, now: Instant) -> Self {
        let total = text.graphemes(true).count();
        Self {
            role: Role::Assistant,
            text,
            total,
            revealed: 0,
            typing: true,
            reveal_started: Some(now),
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn alignment(&self) -> Alignment {
        Alignment::for_role(self.role)
    }

    /// Full message text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text revealed so far.
    #[must_use]
    pub fn visible_text(&self) -> &str {
        let end = self
            .text
            .grapheme_indices(true)
            .nth(self.revealed)
            .map_or(self.text.len(), |(offset, _)| offset);
        &self.text[..end]
    }

    /// Showing the typing indicator instead of text.
    #[must_use]
    pub fn is_typing(&self) -> bool {
        self.typing
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.reveal_started.is_none()
    }

    /// When the next visible change is due while revealing.
    fn next_deadline(&self, timings: TypingTimings) -> Option<Instant> {
        let started = self.reveal_started?;
        if self.typing || timings.per_grapheme.is_zero() {
            return started.checked_add(timings.indicator);
        }
        let step = u32::try_from(self.revealed + 1).unwrap_or(u32::MAX);
        let offset = timings
            .per_grapheme
            .checked_mul(step)
            .and_then(|d| d.checked_add(timings.indicator))?;
        started.checked_add(offset)
    }

    fn advance(&mut self, now: Instant, timings: TypingTimings) -> bool {
        let Some(started) = self.reveal_started else {
            return false;
        };
        let elapsed = now.saturating_duration_since(started);
        if elapsed < timings.indicator {
            return false;
        }
        let after = elapsed - timings.indicator;
        let shown = if timings.per_grapheme.is_zero() {
            self.total
        } else {
            let steps = after.as_nanos() / timings.per_grapheme.as_nanos();
            usize::try_from(steps).unwrap_or(usize::MAX).min(self.total)
        };
        let before = (self.typing, self.revealed, self.reveal_started);
        self.typing = false;
        self.revealed = shown;
        if shown >= self.total {
            self.revealed = self.total;
            self.reveal_started = None;
        }
        before != (self.typing, self.revealed, self.reveal_started)
    }
}

/// Ordered list of bubbles for the active session.
#[derive(Debug, Clone, Default)]
pub struct TranscriptView {
    bubbles: Vec<Bubble>,
    timings: TypingTimings,
}

impl TranscriptView {
    #[must_use]
    pub fn new(timings: TypingTimings) -> Self {
        Self {
            bubbles: Vec::new(),
            timings,
        }
    }

    #[must_use]
    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }

    pub fn clear(&mut self) {
        self.bubbles.clear();
    }

    /// Replace the transcript with stored messages, all complete. Any
    /// in-flight reveal is dropped.
    pub fn render_thread(&mut self, messages: &[ChatMessage]) {
        self.bubbles = messages
            .iter()
            .map(|m| Bubble::complete(m.role, m.text()))
            .collect();
    }

    /// Append a stored message without animation.
    pub fn push_message(&mut self, message: &ChatMessage) {
        self.bubbles.push(Bubble::complete(message.role, message.text()));
    }

    /// Append a just-sent user message.
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.bubbles.push(Bubble::complete(Role::User, text.into()));
    }

    /// Append a fresh assistant response with the typing reveal.
    pub fn push_response(&mut self, message: &ChatMessage, now: Instant) {
        self.bubbles.push(Bubble::animated(message.text(), now));
    }

    /// Whether any bubble is still animating.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.bubbles.iter().any(|b| !b.is_complete())
    }

    /// Earliest instant at which [`tick_at`](Self::tick_at) changes a bubble.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.bubbles
            .iter()
            .filter_map(|b| b.next_deadline(self.timings))
            .min()
    }

    /// Advance reveals. Returns `true` when anything visible changed.
    pub fn tick_at(&mut self, now: Instant) -> bool {
        let timings = self.timings;
        let mut changed = false;
        for bubble in &mut self.bubbles {
            changed |= bubble.advance(now, timings);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(text: &str, at: i64) -> ChatMessage {
        ChatMessage::user(format!("u{at}"), text, at)
    }

    fn assistant(text: &str, at: i64) -> ChatMessage {
        ChatMessage::assistant(format!("a{at}"), text, at)
    }

    #[test]
    fn stored_messages_render_complete_and_aligned() {
        let mut view = TranscriptView::default();
        view.render_thread(&[user("hi", 1), assistant("hello", 2)]);
        assert_eq!(view.len(), 2);
        assert_eq!(view.bubbles()[0].alignment(), Alignment::Right);
        assert_eq!(view.bubbles()[1].alignment(), Alignment::Left);
        assert_eq!(view.bubbles()[1].visible_text(), "hello");
        assert!(!view.is_animating());
    }

    #[test]
    fn response_types_then_reveals() {
        let start = Instant::now();
        let mut view = TranscriptView::default();
        view.push_response(&assistant("abc", 1), start);
        let bubble = &view.bubbles()[0];
        assert!(bubble.is_typing());
        assert_eq!(bubble.visible_text(), "");

        assert!(!view.tick_at(start + Duration::from_millis(799)));
        assert!(view.bubbles()[0].is_typing());

        view.tick_at(start + Duration::from_millis(840));
        assert_eq!(view.bubbles()[0].visible_text(), "ab");
        assert!(!view.bubbles()[0].is_typing());

        assert!(view.tick_at(start + Duration::from_millis(860)));
        assert_eq!(view.bubbles()[0].visible_text(), "abc");
        assert!(!view.is_animating());
        assert!(!view.tick_at(start + Duration::from_secs(5)));
    }

    #[test]
    fn next_deadline_follows_reveal_steps() {
        let start = Instant::now();
        let mut view = TranscriptView::default();
        view.render_thread(&[user("hi", 1)]);
        assert_eq!(view.next_deadline(), None);

        view.push_response(&assistant("ab", 2), start);
        assert_eq!(view.next_deadline(), Some(start + Duration::from_millis(800)));

        view.tick_at(start + Duration::from_millis(800));
        assert_eq!(view.next_deadline(), Some(start + Duration::from_millis(820)));

        view.tick_at(start + Duration::from_millis(820));
        assert_eq!(view.next_deadline(), Some(start + Duration::from_millis(840)));

        view.tick_at(start + Duration::from_millis(840));
        assert_eq!(view.next_deadline(), None);
    }

    #[test]
    fn rerender_drops_reveal() {
        let start = Instant::now();
        let mut view = TranscriptView::default();
        view.push_response(&assistant("pending", 1), start);
        view.render_thread(&[user("fresh", 1)]);
        assert!(!view.is_animating());
        assert_eq!(view.bubbles()[0].visible_text(), "fresh");
    }

    #[test]
    fn instant_timings_skip_animation() {
        let start = Instant::now();
        let mut view = TranscriptView::new(TypingTimings::instant());
        view.push_response(&assistant("done", 1), start);
        view.tick_at(start);
        assert_eq!(view.bubbles()[0].visible_text(), "done");
    }

    #[test]
    fn reveal_counts_graphemes() {
        let start = Instant::now();
        let mut view = TranscriptView::default();
        view.push_response(&assistant("e\u{301}x", 1), start);
        view.tick_at(start + Duration::from_millis(820));
        assert_eq!(view.bubbles()[0].visible_text(), "e\u{301}");
    }
}
