use std::sync::Arc;
use vmon_core::{MonitorConfig, MonitorResult, SharedBuffer};
use vmon_stream::{IngestStatus, StreamIngest};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reconfigured {
    pub config: MonitorConfig,
    /// True when the window was emptied rather than resized.
    pub history_reset: bool,
}

/// Owns the config and the ingest, and applies the two operator changes
/// (window length, sample rate) so the shared buffer is always consistent.
pub struct ReconfigurationController {
    config: MonitorConfig,
    buffer: Arc<SharedBuffer>,
    ingest: StreamIngest,
}

impl ReconfigurationController {
    pub fn new(config: MonitorConfig, buffer: Arc<SharedBuffer>, ingest: StreamIngest) -> Self {
        if buffer.capacity() != config.capacity() {
            buffer.resize(config.capacity());
        }
        Self {
            config,
            buffer,
            ingest,
        }
    }

    pub fn config(&self) -> MonitorConfig {
        self.config
    }

    pub fn buffer(&self) -> &Arc<SharedBuffer> {
        &self.buffer
    }

    pub fn ingest(&self) -> &StreamIngest {
        &self.ingest
    }

    pub fn ingest_status(&self) -> IngestStatus {
        self.ingest.status()
    }

    pub fn pump(&mut self) -> MonitorResult<usize> {
        self.ingest.pump(&self.buffer)
    }

    /// Keeps the rate, resizes the window to `seconds` worth of samples.
    ///
    /// The most recent history survives; readers pick up the new buffer on
    /// their next snapshot.
    pub fn change_window_duration(&mut self, seconds: f64) -> MonitorResult<Reconfigured> {
        let config = self.config.with_window_duration(seconds)?;
        self.buffer.resize(config.capacity());
        self.config = config;
        log::info!(
            "window set to {} s ({} samples)",
            config.window_duration_s,
            config.capacity()
        );
        Ok(Reconfigured {
            config,
            history_reset: false,
        })
    }

    /// Resubscribes at `rate_hz` and starts a fresh window.
    ///
    /// History is discarded rather than resampled: old samples were taken at
    /// the old rate. The old subscription is cancelled before the new one
    /// opens. If the source refuses the new rate the previous config is kept
    /// and ingestion stays halted until a reconnect.
    pub fn change_rate(&mut self, rate_hz: f64) -> MonitorResult<Reconfigured> {
        let config = self.config.with_sample_rate(rate_hz)?;
        self.ingest.change_rate(config.sample_rate_hz)?;
        self.buffer.reset(config.capacity());
        self.config = config;
        log::info!(
            "sample rate set to {} Hz, window reset to {} samples",
            config.sample_rate_hz,
            config.capacity()
        );
        Ok(Reconfigured {
            config,
            history_reset: true,
        })
    }

    pub fn reconnect(&mut self) -> MonitorResult<()> {
        self.ingest.reconnect(self.config.sample_rate_hz)
    }

    pub fn stop(&mut self) {
        self.ingest.stop();
    }
}
