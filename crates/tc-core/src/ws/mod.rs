//! Upstream WebSocket stream: one-shot sessions and the reconnect loop around them.

pub mod reconnect;
pub mod session;

pub use reconnect::{Backoff, ReconnectSupervisor};
pub use session::{SessionError, StreamSession};
