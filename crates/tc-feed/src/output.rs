//! Tick outputs: the shared memory slot followed by the pipe wake-up.

use tc_core::TcError;
use tc_core::pipe::PipeNotifier;
use tc_core::shm::ShmPricePublisher;

/// Destination for every valid tick.
pub trait TickSink {
    /// Make `price` visible to the consumer and wake it up.
    fn deliver(&mut self, price: f64) -> Result<(), TcError>;
}

/// The production sink: shared memory publish, then one pipe signal.
///
/// Both resources belong to the composition root; this only borrows them.
pub struct PriceOutputs<'a> {
    pub shm: &'a mut ShmPricePublisher,
    pub pipe: &'a mut PipeNotifier,
}

impl TickSink for PriceOutputs<'_> {
    fn deliver(&mut self, price: f64) -> Result<(), TcError> {
        self.shm.publish(price);
        self.pipe.signal()
    }
}
