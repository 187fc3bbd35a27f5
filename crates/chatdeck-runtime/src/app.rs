//! Application shell: owns every widget and routes events between them.
//!
//! `ChatApp` holds `Rc` layout state and is meant for a single-threaded
//! host loop. Its async methods are awaited in place, never spawned; a
//! [`StopHandle`] is the only piece that crosses into other tasks.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chatdeck_core::event::Event;
use chatdeck_core::geometry::Size;
use chatdeck_layout::{AdaptiveLayout, AdaptiveLayoutConfig, ButtonId};
use chatdeck_widgets::{
    ChatInput, ChatInputConfig, ChatInputEvent, HistoryPanel, PopupEvent, PopupRegistry,
    TranscriptView, TypingTimings,
};
use tokio_util::sync::CancellationToken;

use crate::gateway::ChatGateway;
use crate::kv_store::KeyValueStore;
use crate::theme::{Theme, ThemePreference};
use crate::transcript_store::ChatTranscriptStore;
use crate::workflow::{ChatWorkflow, Exchange};

/// Name of the sidebar section holding the history panel.
pub const HISTORY_SECTION: &str = "history";

/// Startup options.
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub viewport: Size,
    pub prefers_dark: bool,
    pub layout: AdaptiveLayoutConfig,
    pub input: ChatInputConfig,
    pub typing: TypingTimings,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            viewport: Size::new(1280, 800),
            prefers_dark: false,
            layout: AdaptiveLayoutConfig::default(),
            input: ChatInputConfig::default(),
            typing: TypingTimings::default(),
        }
    }
}

/// What [`ChatApp::handle_event`] did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Ignored,
    Consumed,
    /// The input accepted a message; pass it to [`ChatApp::send`].
    Submit(String),
}

/// Cancels the submission currently in flight.
///
/// Cloneable and `Send`, so a host can stop a send while `ChatApp` is
/// borrowed by it.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    current: Arc<Mutex<CancellationToken>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.lock().cancel();
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.lock().is_cancelled()
    }

    fn arm(&self) -> CancellationToken {
        let mut current = self.lock();
        *current = CancellationToken::new();
        current.clone()
    }

    fn lock(&self) -> MutexGuard<'_, CancellationToken> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct ChatApp {
    popups: PopupRegistry,
    navbar: AdaptiveLayout,
    history: HistoryPanel,
    input: ChatInput,
    transcript: TranscriptView,
    theme: ThemePreference,
    theme_button: ButtonId,
    workflow: ChatWorkflow,
    stop: StopHandle,
}

impl std::fmt::Debug for ChatApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatApp")
            .field("popups", &self.popups.len())
            .field("layout", &self.navbar.position())
            .field("input", &self.input.phase())
            .field("bubbles", &self.transcript.len())
            .field("theme", &self.theme.theme())
            .finish_non_exhaustive()
    }
}

impl ChatApp {
    pub fn new(
        gateway: Arc<dyn ChatGateway>,
        store: Arc<dyn KeyValueStore>,
        options: AppOptions,
    ) -> Self {
        let theme = ThemePreference::resolve(Arc::clone(&store), options.prefers_dark);
        let transcripts = ChatTranscriptStore::new(store);

        let mut navbar = AdaptiveLayout::new(options.layout);
        navbar.add_section(HISTORY_SECTION);
        let theme_button = navbar.add_button(theme.toggle_button());
        navbar.connect(options.viewport.width);

        let mut history = HistoryPanel::new(Some(navbar.context()));
        history.set_sessions(transcripts.list_sessions());

        let mut app = Self {
            popups: PopupRegistry::new(options.viewport),
            navbar,
            history,
            input: ChatInput::new(options.input),
            transcript: TranscriptView::new(options.typing),
            theme,
            theme_button,
            workflow: ChatWorkflow::new(gateway, transcripts),
            stop: StopHandle::default(),
        };
        if let Some(id) = app.workflow.store().active_session() {
            app.history.select(&id);
        }
        app.render_active();
        tracing::info!(
            sessions = app.history.entries().len(),
            layout = %app.navbar.position(),
            "chat app ready"
        );
        app
    }

    // ── accessors ──

    #[must_use]
    pub fn popups(&self) -> &PopupRegistry {
        &self.popups
    }

    pub fn popups_mut(&mut self) -> &mut PopupRegistry {
        &mut self.popups
    }

    #[must_use]
    pub fn navbar(&self) -> &AdaptiveLayout {
        &self.navbar
    }

    pub fn navbar_mut(&mut self) -> &mut AdaptiveLayout {
        &mut self.navbar
    }

    #[must_use]
    pub fn history(&self) -> &HistoryPanel {
        &self.history
    }

    #[must_use]
    pub fn input(&self) -> &ChatInput {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut ChatInput {
        &mut self.input
    }

    #[must_use]
    pub fn transcript(&self) -> &TranscriptView {
        &self.transcript
    }

    #[must_use]
    pub fn store(&self) -> &ChatTranscriptStore {
        self.workflow.store()
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        self.theme.theme()
    }

    #[must_use]
    pub fn theme_button(&self) -> ButtonId {
        self.theme_button
    }

    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    // ── events ──

    /// Route a host event.
    ///
    /// Popups see keys and clicks first; a consumed event goes no further.
    /// Resizes reach both the popup viewport and the sidebar.
    pub fn handle_event(&mut self, event: &Event, now: Instant) -> Dispatch {
        match event {
            Event::Resize { .. } => {
                self.popups.handle_event(event, now);
                self.navbar.handle_event(event);
                Dispatch::Consumed
            }
            _ if self.popups.handle_event(event, now) => Dispatch::Consumed,
            Event::Key(_) => match self.input.handle_event(event) {
                Some(ChatInputEvent::Submitted(text)) => Dispatch::Submit(text),
                Some(ChatInputEvent::ProcessingStopped) => Dispatch::Consumed,
                None => Dispatch::Ignored,
            },
            Event::Mouse(_) => Dispatch::Ignored,
        }
    }

    /// Advance popup and typing timers.
    pub fn tick_at(&mut self, now: Instant) -> Vec<PopupEvent> {
        self.transcript.tick_at(now);
        self.popups.tick_at(now)
    }

    /// Earliest pending popup transition or reply reveal step.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.popups.next_deadline(), self.transcript.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // ── chat ──

    /// Submit whatever is in the input. Blank input does nothing.
    pub async fn submit(&mut self) -> Option<Exchange> {
        let text = self.input.begin_send()?;
        self.send(text).await
    }

    /// Run a message accepted by the input through the workflow.
    ///
    /// Failures are logged and reset the input; cancellation resets it as
    /// a stop. Either way the transcript is re-rendered from storage.
    pub async fn send(&mut self, text: String) -> Option<Exchange> {
        self.transcript.push_user(text.clone());
        let token = self.stop.arm();
        match self.workflow.submit(&text, &token).await {
            Ok(exchange) => {
                self.input.complete_send(true);
                let now = Instant::now();
                for reply in exchange.replies() {
                    self.transcript.push_response(reply, now);
                }
                if let Some(summary) = &exchange.created {
                    self.history.push_session(summary.clone());
                }
                self.history.select(&exchange.session_id);
                self.input.set_has_active_session(true);
                Some(exchange)
            }
            Err(err) if err.is_cancelled() => {
                tracing::info!("submission cancelled");
                self.input.stop_processing();
                self.render_active();
                None
            }
            Err(err) => {
                tracing::error!(error = %err, "submission failed");
                self.input.complete_send(false);
                self.render_active();
                None
            }
        }
    }

    /// Stop button: cancel the in-flight call and reset the input.
    pub fn stop(&mut self) -> bool {
        self.stop.stop();
        self.input.stop_processing()
    }

    /// Make a saved session active and show it.
    pub fn switch_session(&mut self, id: &str) -> bool {
        match self.workflow.store().switch_to(id) {
            Ok(true) => {
                self.history.select(id);
                self.render_active();
                true
            }
            Ok(false) => false,
            Err(err) => {
                tracing::error!(session = %id, error = %err, "could not switch session");
                false
            }
        }
    }

    /// Click on the history entry at `index`.
    pub fn click_history(&mut self, index: usize) -> bool {
        match self.history.entries().get(index) {
            Some(entry) => {
                let id = entry.id().to_string();
                self.switch_session(&id)
            }
            None => false,
        }
    }

    /// Forget the active session; the next message starts a new one.
    pub fn new_chat(&mut self) {
        if let Err(err) = self.workflow.store().clear_active() {
            tracing::error!(error = %err, "could not clear active session");
        }
        self.history.clear_selection();
        self.input.reset();
        self.render_active();
    }

    pub fn rename_session(&mut self, id: &str, name: &str) -> bool {
        match self.workflow.store().rename_session(id, name) {
            Ok(renamed) => {
                if renamed {
                    self.history.set_sessions(self.workflow.store().list_sessions());
                }
                renamed
            }
            Err(err) => {
                tracing::error!(session = %id, error = %err, "could not rename session");
                false
            }
        }
    }

    pub fn delete_session(&mut self, id: &str) -> bool {
        match self.workflow.store().delete_session(id) {
            Ok(deleted) => {
                if deleted {
                    self.history.set_sessions(self.workflow.store().list_sessions());
                    self.render_active();
                }
                deleted
            }
            Err(err) => {
                tracing::error!(session = %id, error = %err, "could not delete session");
                false
            }
        }
    }

    // ── theme ──

    /// Flip the theme and relabel its sidebar button.
    pub fn toggle_theme(&mut self) -> Theme {
        if let Err(err) = self.theme.toggle() {
            tracing::error!(error = %err, "could not save theme");
            return self.theme.theme();
        }
        let config = self.theme.toggle_button();
        if let Some(button) = self.navbar.button_mut(self.theme_button) {
            button.set_attribute("name", &config.name);
            button.set_attribute("icon-class", &config.icon_class);
        }
        self.theme.theme()
    }

    fn render_active(&mut self) {
        match self.workflow.store().active_session() {
            Some(id) => {
                let messages = self.workflow.store().messages(&id);
                self.transcript.render_thread(&messages);
                self.input.set_has_active_session(true);
            }
            None => {
                self.transcript.clear();
                self.input.set_has_active_session(false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{CreatedSession, GatewayError, SendReceipt};
    use crate::kv_store::MemoryStore;
    use async_trait::async_trait;
    use chatdeck_core::chat::ChatMessage;
    use chatdeck_core::event::{KeyCode, KeyEvent};
    use chatdeck_layout::LayoutPosition;

    struct Unreachable;

    #[async_trait]
    impl ChatGateway for Unreachable {
        async fn create_session(&self, _: &str) -> Result<CreatedSession, GatewayError> {
            Err(GatewayError::Transport("offline".into()))
        }
        async fn send_message(&self, _: &str, _: &str, _: &str) -> Result<SendReceipt, GatewayError> {
            Err(GatewayError::Transport("offline".into()))
        }
        async fn list_messages(&self, _: &str) -> Result<Vec<ChatMessage>, GatewayError> {
            Err(GatewayError::Transport("offline".into()))
        }
        async fn create_history_entry(&self, _: &str, _: &str) -> Result<(), GatewayError> {
            Err(GatewayError::Transport("offline".into()))
        }
    }

    fn app(width: u16) -> ChatApp {
        ChatApp::new(
            Arc::new(Unreachable),
            Arc::new(MemoryStore::new()),
            AppOptions {
                viewport: Size::new(width, 600),
                ..AppOptions::default()
            },
        )
    }

    #[test]
    fn starts_empty_with_heading() {
        let app = app(1280);
        assert!(app.transcript().is_empty());
        assert_eq!(app.input().heading(), Some("How can we help you?"));
        assert_eq!(app.history().placeholder(), Some("No saved chats"));
        assert_eq!(app.navbar().position(), LayoutPosition::Expanded);
    }

    #[test]
    fn resize_reaches_navbar() {
        let mut app = app(1280);
        let now = Instant::now();
        let dispatch = app.handle_event(&Event::Resize { width: 500, height: 600 }, now);
        assert_eq!(dispatch, Dispatch::Consumed);
        assert_eq!(app.navbar().position(), LayoutPosition::Collapsed);
        assert_eq!(app.popups().viewport(), Size::new(500, 600));
    }

    #[test]
    fn enter_on_typed_text_requests_submit() {
        let mut app = app(1280);
        let now = Instant::now();
        for c in "hi".chars() {
            app.handle_event(&Event::Key(KeyEvent::new(KeyCode::Char(c))), now);
        }
        let dispatch = app.handle_event(&Event::Key(KeyEvent::new(KeyCode::Enter)), now);
        assert_eq!(dispatch, Dispatch::Submit("hi".into()));
        assert!(app.input().is_processing());
    }

    #[test]
    fn theme_toggle_relabels_button() {
        let mut app = app(1280);
        assert_eq!(app.toggle_theme(), Theme::Dark);
        let button = app.navbar().button(app.theme_button()).unwrap();
        assert_eq!(button.config().name, "Light mode");
    }

    #[tokio::test]
    async fn failed_send_restores_text_and_drops_bubble() {
        let mut app = app(1280);
        app.input_mut().set_value("hello");
        assert!(app.submit().await.is_none());
        assert!(!app.input().is_processing());
        assert_eq!(app.input().value(), "hello");
        assert!(app.transcript().is_empty());
    }
}
