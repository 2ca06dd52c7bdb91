use crate::message::{reply_channel, MonitorMessage, MonitorState};
use crate::runtime::{spawn_runtime, MonitorRuntime};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use vmon_core::{
    config::validate_positive, MonitorConfig, MonitorError, MonitorResult, MonitorSettings,
    RenderSurface, SharedBuffer, Snapshot,
};
use vmon_stream::StreamSource;

/// How long an operator command waits before it is cancelled.
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

/// Operator-side handle to a monitor running on its own thread.
pub struct MonitorService {
    monitor_tx: Sender<MonitorMessage>,
    state_rx: Receiver<MonitorState>,
    buffer: Arc<SharedBuffer>,
    handle: Option<JoinHandle<()>>,
    last_state: Option<MonitorState>,
}

impl MonitorService {
    pub fn new(
        settings: &MonitorSettings,
        source: Box<dyn StreamSource>,
        plot_surface: Box<dyn RenderSurface>,
        noise_surface: Box<dyn RenderSurface>,
    ) -> MonitorResult<Self> {
        let runtime = MonitorRuntime::new(settings, source, plot_surface, noise_surface)?;
        Self::from_runtime(runtime)
    }

    pub fn from_runtime(runtime: MonitorRuntime) -> MonitorResult<Self> {
        let spawned = spawn_runtime(runtime)?;
        Ok(Self {
            monitor_tx: spawned.monitor_tx,
            state_rx: spawned.state_rx,
            buffer: spawned.buffer,
            handle: Some(spawned.handle),
            last_state: None,
        })
    }

    /// Rejected locally when not positive, so a bad value never reaches the loop.
    pub fn set_window_duration(&self, seconds: f64) -> MonitorResult<MonitorConfig> {
        validate_positive("window_duration_s", seconds)?;
        let (reply, pending) = reply_channel();
        self.send(MonitorMessage::SetWindowDuration(seconds, reply))?;
        pending.wait(REPLY_TIMEOUT)
    }

    pub fn set_sample_rate(&self, rate_hz: f64) -> MonitorResult<MonitorConfig> {
        validate_positive("sample_rate_hz", rate_hz)?;
        let (reply, pending) = reply_channel();
        self.send(MonitorMessage::SetSampleRate(rate_hz, reply))?;
        pending.wait(REPLY_TIMEOUT)
    }

    pub fn reconnect(&self) -> MonitorResult<()> {
        let (reply, pending) = reply_channel();
        self.send(MonitorMessage::Reconnect(reply))?;
        pending.wait(REPLY_TIMEOUT)
    }

    /// Latest state the runtime published, draining anything older.
    pub fn poll_state(&mut self) -> Option<&MonitorState> {
        while let Ok(state) = self.state_rx.try_recv() {
            self.last_state = Some(state);
        }
        self.last_state.as_ref()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.buffer.snapshot()
    }

    pub fn buffer(&self) -> &Arc<SharedBuffer> {
        &self.buffer
    }

    pub fn run_for_duration(&mut self, duration: Duration) -> MonitorResult<()> {
        let start = Instant::now();
        while start.elapsed() < duration {
            self.poll_state();
            if self.handle.as_ref().is_some_and(|h| h.is_finished()) {
                return Err(MonitorError::Runtime("runtime thread exited".to_string()));
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        Ok(())
    }

    /// Stops the runtime and waits for it; the subscription is cancelled first.
    pub fn shutdown(&mut self) -> MonitorResult<()> {
        let _ = self.monitor_tx.send(MonitorMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| MonitorError::Runtime("runtime thread panicked".to_string()))?;
        }
        self.poll_state();
        Ok(())
    }

    fn send(&self, message: MonitorMessage) -> MonitorResult<()> {
        self.monitor_tx
            .send(message)
            .map_err(|_| MonitorError::Runtime("runtime is not running".to_string()))
    }
}

impl Drop for MonitorService {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}
