//! Typed error definitions for the tickcast relay.
//!
//! [`TcError`] covers resource setup and publish failures. Session-level
//! failures live in [`crate::ws::SessionError`] since the supervisor treats
//! them differently (retry, never fatal).

use thiserror::Error;

/// Domain-specific errors for the tickcast relay.
#[derive(Debug, Error)]
pub enum TcError {
    /// Configuration parsing or validation error.
    #[error("config error: {0}")]
    Config(String),

    /// Shared memory creation, mapping, or access error.
    #[error("shm error: {0}")]
    Shm(String),

    /// Named pipe creation, open, or write error.
    #[error("pipe error: {0}")]
    Pipe(String),
}
