#![forbid(unsafe_code)]

//! Core: geometry, input events, notifications, and the chat data model.

pub mod attributes;
pub mod chat;
pub mod event;
pub mod geometry;
pub mod logging;
pub mod notify;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, error, info, trace, warn};
