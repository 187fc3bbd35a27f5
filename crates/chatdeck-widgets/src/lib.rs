#![forbid(unsafe_code)]

//! Chat widgets: popups, the chat input, the transcript view, and the
//! history panel.
//!
//! Every widget is a headless state machine. Hosts feed it
//! [`Event`](chatdeck_core::event::Event)s, advance its timers with a
//! `tick_at(Instant)` call from their event loop, and read back typed
//! presentation state.

pub mod chat_input;
pub mod history;
pub mod popup;
pub mod popup_trigger;
pub mod transcript;

pub use chat_input::{ChatInput, ChatInputConfig, ChatInputEvent, InputPhase, RestorePolicy};
pub use history::{HistoryEntry, HistoryPanel};
pub use popup::{
    OpenOptions, Popup, PopupConfig, PopupError, PopupEvent, PopupId, PopupMode, PopupPhase,
    PopupRegistry, PopupTimings,
};
pub use popup_trigger::PopupTrigger;
pub use transcript::{Alignment, Bubble, TranscriptView, TypingTimings};
