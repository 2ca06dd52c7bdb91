use crate::source::{StreamSource, Subscription};
use vmon_core::{config::validate_positive, MonitorError, MonitorResult, Sample, SharedBuffer};

/// Upper bound on samples moved per `pump` so a backlog cannot starve the ticks.
pub const DEFAULT_MAX_BATCH: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IngestStatus {
    Idle,
    Streaming { rate_hz: f64 },
    Disconnected,
}

/// Moves samples from the source subscription into the published buffer.
pub struct StreamIngest {
    source: Box<dyn StreamSource>,
    subscription: Option<Subscription>,
    status: IngestStatus,
    total_samples: u64,
    max_batch: usize,
}

impl StreamIngest {
    pub fn start(source: Box<dyn StreamSource>, initial_rate: f64) -> MonitorResult<Self> {
        let mut ingest = Self {
            source,
            subscription: None,
            status: IngestStatus::Idle,
            total_samples: 0,
            max_batch: DEFAULT_MAX_BATCH,
        };
        ingest.subscribe(initial_rate)?;
        Ok(ingest)
    }

    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch.max(1);
        self
    }

    pub fn status(&self) -> IngestStatus {
        self.status
    }

    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    pub fn current_rate(&self) -> Option<f64> {
        self.source.current_rate()
    }

    /// Resubscribes at `new_rate`. The old subscription is fully cancelled
    /// before the new one opens; buffers are left alone.
    pub fn change_rate(&mut self, new_rate: f64) -> MonitorResult<()> {
        let new_rate = validate_positive("sample_rate_hz", new_rate)?;
        self.subscribe(new_rate)
    }

    pub fn reconnect(&mut self, rate_hz: f64) -> MonitorResult<()> {
        log::info!("reconnecting to device stream at {rate_hz} Hz");
        self.subscribe(rate_hz)
    }

    /// Drains pending samples into whichever buffer `buffer` currently publishes.
    ///
    /// Returns `SourceDisconnected` once, on the pump that notices the
    /// disconnect; ingestion then stays halted until `reconnect`.
    pub fn pump(&mut self, buffer: &SharedBuffer) -> MonitorResult<usize> {
        let Some(subscription) = self.subscription.as_ref() else {
            return Ok(0);
        };
        let mut batch: Vec<Sample> = Vec::new();
        let mut disconnected = false;
        while batch.len() < self.max_batch {
            match subscription.try_recv() {
                Ok(Some(sample)) => batch.push(Sample::sanitized(sample.0)),
                Ok(None) => break,
                Err(_) => {
                    disconnected = true;
                    break;
                }
            }
        }
        let count = buffer.extend(batch);
        self.total_samples += count as u64;

        if disconnected {
            self.halt();
            log::warn!(
                "device stream disconnected after {} samples; keeping last window",
                self.total_samples
            );
            return Err(MonitorError::SourceDisconnected);
        }
        Ok(count)
    }

    pub fn stop(&mut self) {
        self.cancel_current();
        self.status = IngestStatus::Idle;
    }

    fn subscribe(&mut self, rate_hz: f64) -> MonitorResult<()> {
        self.cancel_current();
        match self.source.subscribe(rate_hz) {
            Ok(subscription) => {
                self.status = IngestStatus::Streaming {
                    rate_hz: subscription.rate_hz(),
                };
                self.subscription = Some(subscription);
                Ok(())
            }
            Err(err) => {
                self.status = IngestStatus::Disconnected;
                Err(err)
            }
        }
    }

    fn halt(&mut self) {
        self.cancel_current();
        self.status = IngestStatus::Disconnected;
    }

    fn cancel_current(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
        self.source.unsubscribe();
    }
}

impl Drop for StreamIngest {
    fn drop(&mut self) {
        self.cancel_current();
    }
}
