#![forbid(unsafe_code)]

//! chatdeck runtime
//!
//! Ties the widget crates to persistence and the hosted chat API.
//!
//! # Key Components
//!
//! - [`KeyValueStore`] - string-keyed JSON storage, in memory or on disk
//! - [`ChatTranscriptStore`] - sessions, their messages, and the active id
//! - [`ChatGateway`] - the remote chat API seam, with [`HttpChatGateway`]
//! - [`ChatWorkflow`] - create-or-append submission with cancellation
//! - [`ChatApp`] - owns the widgets and routes host events
//!
//! # Flow
//! The input accepts a message, [`ChatApp::send`] hands it to the workflow,
//! the workflow calls the gateway and writes results to the transcript
//! store, and the transcript view renders from the store.

pub mod app;
pub mod config;
pub mod gateway;
pub mod kv_store;
pub mod logging;
pub mod theme;
pub mod transcript_store;
pub mod workflow;

pub use app::{AppOptions, ChatApp, Dispatch, StopHandle};
pub use config::{ConfigError, GatewayConfig};
pub use gateway::{ChatGateway, CreatedSession, GatewayError, HttpChatGateway, SendReceipt};
pub use kv_store::{FileStore, KeyValueStore, MemoryStore, StorageError, StorageResult};
pub use theme::{Theme, ThemePreference};
pub use transcript_store::ChatTranscriptStore;
pub use workflow::{ChatWorkflow, Exchange, WorkflowError};
