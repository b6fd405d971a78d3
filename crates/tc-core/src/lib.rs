//! # tc-core
//!
//! Core crate for the tickcast price relay, providing:
//!
//! - **Configuration** (`config`) - feed settings with built-in defaults
//! - **Error types** (`error`) - domain-specific `TcError` via thiserror
//! - **Shared memory** (`shm`) - the 32-byte price slot consumers read
//! - **Named pipe** (`pipe`) - FIFO wake-up notifier
//! - **WebSocket** (`ws`) - one-shot stream sessions and the reconnect supervisor
//! - **Logging** (`logging`) - tracing-based console/file logging

pub mod config;
pub mod error;
pub mod logging;
pub mod pipe;
pub mod shm;
pub mod ws;

pub use error::TcError;
