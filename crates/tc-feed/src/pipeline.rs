//! Decoder → tracker → outputs, driven by the reconnect supervisor.

use tc_core::config::FeedConfig;
use tc_core::ws::ReconnectSupervisor;
use tracing::info;

use crate::decoder;
use crate::output::TickSink;
use crate::tracker::{Classification, ThresholdTracker, Tick};

/// Per-process price pipeline. Outlives every session, so the checkpoint
/// survives reconnects.
pub struct PricePipeline<S: TickSink> {
    tracker: ThresholdTracker,
    sink: S,
}

impl<S: TickSink> PricePipeline<S> {
    pub fn new(step: f64, sink: S) -> Self {
        Self { tracker: ThresholdTracker::new(step), sink }
    }

    pub fn tracker(&self) -> &ThresholdTracker {
        &self.tracker
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Handle one raw upstream frame. Frames without a usable price are
    /// skipped without touching the checkpoint or the outputs.
    pub fn on_message(&mut self, text: &str) -> Option<Tick> {
        let price = decoder::decode(text)?;
        let tick = self.tracker.process(price, &mut self.sink);
        log_tick(&tick);
        Some(tick)
    }

    /// Run the supervisor forever, feeding every frame through this pipeline.
    ///
    /// Delivery happens inline on the receive loop, so a consumer that stops
    /// draining the FIFO stalls this future (and anything selecting on it)
    /// until the pipe write returns.
    pub async fn run(&mut self, config: &FeedConfig) {
        let mut supervisor = ReconnectSupervisor::new(config);
        supervisor
            .run(|text| {
                self.on_message(text);
            })
            .await;
    }
}

fn log_tick(tick: &Tick) {
    match tick.classification {
        Classification::Established => info!("Starting price checkpoint: {:.2}", tick.price),
        Classification::Up => info!("[ALERT] up to {}", tick.price as i64),
        Classification::Down => info!("[ALERT] down to {}", tick.price as i64),
        Classification::Routine => info!("tick {:.2} Δ {:.2}", tick.price, tick.delta),
    }
}
