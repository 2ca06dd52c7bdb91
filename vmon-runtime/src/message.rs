use crate::noise::NoiseReport;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;
use vmon_core::{MonitorConfig, MonitorError, MonitorResult, Sample};
use vmon_stream::IngestStatus;

/// Operator commands sent to the runtime thread. Each carries a reply channel.
#[derive(Debug)]
pub enum MonitorMessage {
    SetWindowDuration(f64, Reply<MonitorConfig>),
    SetSampleRate(f64, Reply<MonitorConfig>),
    Reconnect(Reply<()>),
    Shutdown,
}

/// Runtime end of a command's reply.
///
/// Exactly one side claims the command: the runtime before applying it, or
/// the caller when it gives up waiting. An unclaimed command is never applied
/// after its caller was told it failed.
pub struct Reply<T> {
    tx: Sender<MonitorResult<T>>,
    claimed: Arc<AtomicBool>,
}

/// Caller end of a command's reply.
pub struct PendingReply<T> {
    rx: Receiver<MonitorResult<T>>,
    claimed: Arc<AtomicBool>,
}

pub fn reply_channel<T>() -> (Reply<T>, PendingReply<T>) {
    let (tx, rx) = mpsc::channel();
    let claimed = Arc::new(AtomicBool::new(false));
    (
        Reply {
            tx,
            claimed: claimed.clone(),
        },
        PendingReply { rx, claimed },
    )
}

fn claim(flag: &AtomicBool) -> bool {
    flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
}

impl<T> Reply<T> {
    /// False when the caller already gave up; the command must then be dropped.
    pub fn claim(&self) -> bool {
        claim(&self.claimed)
    }

    pub fn send(self, result: MonitorResult<T>) {
        let _ = self.tx.send(result);
    }
}

impl<T> std::fmt::Debug for Reply<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reply")
            .field("claimed", &self.claimed.load(Ordering::Acquire))
            .finish()
    }
}

impl<T> PendingReply<T> {
    /// Waits up to `timeout`. On timeout the command is cancelled unless the
    /// runtime has already started it, in which case its answer is awaited.
    pub fn wait(self, timeout: Duration) -> MonitorResult<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Disconnected) => Err(stopped()),
            Err(RecvTimeoutError::Timeout) => {
                if claim(&self.claimed) {
                    return Err(MonitorError::Runtime(
                        "runtime did not answer; command cancelled".to_string(),
                    ));
                }
                self.rx.recv().map_err(|_| stopped())?
            }
        }
    }
}

fn stopped() -> MonitorError {
    MonitorError::Runtime("runtime stopped before answering".to_string())
}

/// What the runtime reports back to the operator layer.
#[derive(Debug, Clone)]
pub struct MonitorState {
    pub config: MonitorConfig,
    pub ingest: IngestStatus,
    pub total_samples: u64,
    pub buffered: usize,
    pub latest: Option<Sample>,
    pub render_ticks: u64,
    pub skipped_frames: u64,
    pub analysis_runs: u64,
    pub skipped_analyses: u64,
    pub noise: Option<NoiseReport>,
    pub last_error: Option<String>,
}
