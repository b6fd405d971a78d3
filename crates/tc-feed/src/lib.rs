//! # tc-feed
//!
//! The trade price pipeline.
//!
//! ## Architecture
//!
//! Each text frame from the upstream session goes through:
//!
//! 1. [`decoder`] - extract the trade price, silently dropping anything else
//! 2. [`tracker`] - compare against the checkpoint and classify the tick
//! 3. [`output`] - publish to shared memory, then signal the pipe
//!
//! [`pipeline::PricePipeline`] wires the three together and hands itself to
//! the reconnect supervisor.

pub mod decoder;
pub mod output;
pub mod pipeline;
pub mod tracker;

pub use pipeline::PricePipeline;
pub use tracker::{Classification, ThresholdTracker, Tick};
