//! Checkpoint tracking and tick classification.
//!
//! The first tick rounds to the nearest `step` and becomes the checkpoint.
//! After that, a move of at least `step` in either direction raises an alert
//! and moves the checkpoint to the (unrounded) alert price.
//!
//! Every tick is delivered to the sink whatever its classification; the
//! classification only decides what gets logged.

use tracing::warn;

use crate::output::TickSink;

/// How a tick relates to the checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// First tick: the checkpoint was just set.
    Established,
    /// Price rose by at least one step.
    Up,
    /// Price fell by at least one step.
    Down,
    /// Within one step of the checkpoint.
    Routine,
}

/// Result of processing one price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub price: f64,
    /// `price - checkpoint` before this tick; zero for `Established`.
    pub delta: f64,
    /// Checkpoint after this tick.
    pub checkpoint: f64,
    pub classification: Classification,
}

/// Holds the checkpoint across the whole process lifetime, including reconnects.
#[derive(Debug, Clone)]
pub struct ThresholdTracker {
    step: f64,
    checkpoint: Option<f64>,
}

impl ThresholdTracker {
    pub fn new(step: f64) -> Self {
        Self { step, checkpoint: None }
    }

    pub fn checkpoint(&self) -> Option<f64> {
        self.checkpoint
    }

    /// Deliver `price` to `sink`, then classify it against the checkpoint.
    ///
    /// Delivery failures are logged and do not affect classification.
    pub fn process<S: TickSink>(&mut self, price: f64, sink: &mut S) -> Tick {
        let Some(checkpoint) = self.checkpoint else {
            let checkpoint = round_to_step(price, self.step);
            self.checkpoint = Some(checkpoint);
            deliver(sink, price);
            return Tick { price, delta: 0.0, checkpoint, classification: Classification::Established };
        };

        let delta = price - checkpoint;
        deliver(sink, price);

        let classification = if delta >= self.step {
            Classification::Up
        } else if delta <= -self.step {
            Classification::Down
        } else {
            Classification::Routine
        };

        if classification != Classification::Routine {
            self.checkpoint = Some(price);
        }

        Tick { price, delta, checkpoint: self.checkpoint.unwrap_or(checkpoint), classification }
    }
}

fn deliver<S: TickSink>(sink: &mut S, price: f64) {
    if let Err(e) = sink.deliver(price) {
        warn!("publish {price:.2} failed: {e}");
    }
}

/// Round half-up to the nearest multiple of `step`.
pub fn round_to_step(price: f64, step: f64) -> f64 {
    (price / step + 0.5).floor() * step
}
