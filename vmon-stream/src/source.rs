use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use vmon_core::{MonitorError, MonitorResult, Sample};

/// A device that streams vector samples at a configurable rate.
pub trait StreamSource: Send {
    /// Starts emitting at `rate_hz`. Any previous subscription must already
    /// have been cancelled by the caller.
    fn subscribe(&mut self, rate_hz: f64) -> MonitorResult<Subscription>;

    fn unsubscribe(&mut self);

    fn current_rate(&self) -> Option<f64>;
}

/// Live binding to a source at one rate.
///
/// Dropping it cancels the producer and waits for it to stop.
pub struct Subscription {
    rate_hz: f64,
    receiver: Receiver<Sample>,
    cancel: Arc<AtomicBool>,
    producer: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(
        rate_hz: f64,
        receiver: Receiver<Sample>,
        cancel: Arc<AtomicBool>,
        producer: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            rate_hz,
            receiver,
            cancel,
            producer,
        }
    }

    pub fn rate_hz(&self) -> f64 {
        self.rate_hz
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    /// `Ok(None)` when nothing is pending, `SourceDisconnected` once the
    /// producer side is gone and fully drained.
    pub fn try_recv(&self) -> MonitorResult<Option<Sample>> {
        match self.receiver.try_recv() {
            Ok(sample) => Ok(Some(sample)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(MonitorError::SourceDisconnected),
        }
    }

    pub fn cancel(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.cancel.store(true, Ordering::Release);
        while self.receiver.try_recv().is_ok() {}
        if let Some(handle) = self.producer.take() {
            if handle.join().is_err() {
                log::warn!("stream producer panicked while shutting down");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("rate_hz", &self.rate_hz)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
