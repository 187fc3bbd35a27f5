#![forbid(unsafe_code)]

//! Saved-chat list for the sidebar.

use std::rc::{Rc, Weak};

use chatdeck_core::chat::{SessionSummary, truncate_label};
use chatdeck_layout::{AdaptiveButton, ButtonConfig, LayoutContext};

/// Labels longer than this many graphemes are cut and suffixed with `...`.
pub const HISTORY_LABEL_MAX: usize = 25;

/// Shown when there are no sessions.
pub const EMPTY_HISTORY_TEXT: &str = "No saved chats";

const HISTORY_ICON: &str = "fa-regular fa-comments";
const HISTORY_STYLES: &str = "px-6 py-3 text-lg rounded-xl";

/// One row in the panel.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub summary: SessionSummary,
    pub button: AdaptiveButton,
    pub selected: bool,
}

impl HistoryEntry {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.summary.id
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.button.config().name
    }
}

/// Session list, newest first, with at most one selected entry.
#[derive(Debug, Clone, Default)]
pub struct HistoryPanel {
    entries: Vec<HistoryEntry>,
    layout: Option<Weak<LayoutContext>>,
}

impl HistoryPanel {
    /// A panel whose buttons follow `layout`, or size themselves when
    /// `None`.
    #[must_use]
    pub fn new(layout: Option<&Rc<LayoutContext>>) -> Self {
        Self {
            entries: Vec::new(),
            layout: layout.map(Rc::downgrade),
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Placeholder text when the list is empty.
    #[must_use]
    pub fn placeholder(&self) -> Option<&'static str> {
        self.is_empty().then_some(EMPTY_HISTORY_TEXT)
    }

    /// Rebuild from the session index. The current selection survives if
    /// its session is still listed.
    pub fn set_sessions(&mut self, mut sessions: Vec<SessionSummary>) {
        let selected = self.selected().map(str::to_string);
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.entries = sessions
            .into_iter()
            .map(|summary| self.entry_for(summary))
            .collect();
        if let Some(id) = selected {
            self.select(&id);
        }
    }

    /// Insert a newly created session at the top.
    pub fn push_session(&mut self, summary: SessionSummary) {
        if self.entries.iter().any(|e| e.summary.id == summary.id) {
            return;
        }
        let entry = self.entry_for(summary);
        let at = self
            .entries
            .iter()
            .position(|e| e.summary.created_at <= entry.summary.created_at)
            .unwrap_or(self.entries.len());
        self.entries.insert(at, entry);
    }

    /// Mark exactly the entry with `id` selected. Returns `false` when no
    /// entry matches; the previous selection is kept in that case.
    pub fn select(&mut self, id: &str) -> bool {
        if !self.entries.iter().any(|e| e.summary.id == id) {
            return false;
        }
        for entry in &mut self.entries {
            entry.selected = entry.summary.id == id;
        }
        true
    }

    pub fn clear_selection(&mut self) {
        for entry in &mut self.entries {
            entry.selected = false;
        }
    }

    /// Click on the entry at `index`; returns the session id to switch to.
    pub fn click(&mut self, index: usize) -> Option<String> {
        let id = self.entries.get(index)?.summary.id.clone();
        self.select(&id);
        Some(id)
    }

    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.entries.iter().find(|e| e.selected).map(HistoryEntry::id)
    }

    fn entry_for(&self, summary: SessionSummary) -> HistoryEntry {
        let config = ButtonConfig::new(truncate_label(&summary.display_name, HISTORY_LABEL_MAX))
            .icon(HISTORY_ICON)
            .styles(HISTORY_STYLES)
            .icon_and_text(true);
        let button = match self.layout.as_ref().and_then(Weak::upgrade) {
            Some(ctx) => AdaptiveButton::attached(config, &ctx),
            None => AdaptiveButton::new(config),
        };
        HistoryEntry {
            summary,
            button,
            selected: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatdeck_layout::LayoutPosition;
    use chrono::{TimeZone, Utc};

    fn summary(id: &str, name: &str, secs: i64) -> SessionSummary {
        SessionSummary {
            id: id.to_string(),
            display_name: name.to_string(),
            created_at: Utc.timestamp_opt(secs, 0).single().expect("valid timestamp"),
        }
    }

    #[test]
    fn empty_panel_shows_placeholder() {
        let panel = HistoryPanel::default();
        assert_eq!(panel.placeholder(), Some("No saved chats"));
    }

    #[test]
    fn sessions_sorted_newest_first_with_truncated_labels() {
        let mut panel = HistoryPanel::default();
        panel.set_sessions(vec![
            summary("old", "first", 10),
            summary("new", "abcdefghijklmnopqrstuvwxyz0123", 30),
            summary("mid", "middle", 20),
        ]);
        let ids: Vec<_> = panel.entries().iter().map(HistoryEntry::id).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
        assert_eq!(panel.entries()[0].label(), "abcdefghijklmnopqrstuvwxy...");
        assert_eq!(panel.entries()[1].label(), "middle");
        assert!(panel.entries()[0].button.config().icon_and_text);
        assert_eq!(panel.placeholder(), None);
    }

    #[test]
    fn click_selects_exactly_one() {
        let mut panel = HistoryPanel::default();
        panel.set_sessions(vec![summary("a", "A", 1), summary("b", "B", 2)]);
        assert_eq!(panel.click(1), Some("a".to_string()));
        assert_eq!(panel.click(0), Some("b".to_string()));
        assert_eq!(panel.entries().iter().filter(|e| e.selected).count(), 1);
        assert_eq!(panel.selected(), Some("b"));
        assert_eq!(panel.click(9), None);
        assert!(!panel.select("missing"));
        assert_eq!(panel.selected(), Some("b"));
        panel.clear_selection();
        assert_eq!(panel.selected(), None);
    }

    #[test]
    fn selection_survives_refresh() {
        let mut panel = HistoryPanel::default();
        panel.set_sessions(vec![summary("a", "A", 1)]);
        panel.select("a");
        panel.set_sessions(vec![summary("a", "A", 1), summary("b", "B", 2)]);
        assert_eq!(panel.selected(), Some("a"));
    }

    #[test]
    fn push_session_keeps_order_and_ignores_duplicates() {
        let mut panel = HistoryPanel::default();
        panel.set_sessions(vec![summary("a", "A", 1)]);
        panel.push_session(summary("b", "B", 5));
        panel.push_session(summary("b", "B", 5));
        let ids: Vec<_> = panel.entries().iter().map(HistoryEntry::id).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn buttons_follow_layout() {
        let ctx = Rc::new(LayoutContext::new(LayoutPosition::Collapsed));
        let mut panel = HistoryPanel::new(Some(&ctx));
        panel.set_sessions(vec![summary("a", "A chat", 1)]);
        let p = panel.entries()[0].button.presentation();
        assert!(!p.text_visible);
        assert!(p.icon_visible);
    }
}
