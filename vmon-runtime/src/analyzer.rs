use crate::cadence::Cadence;
use crate::noise::{noise_report, NoiseReport};
use crate::rt_thread::RuntimeThread;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use vmon_core::{
    DisplayMetadata, MonitorError, MonitorResult, MonitorSettings, RenderSurface, SharedBuffer,
    Snapshot,
};

pub type AnalysisFn = Arc<dyn Fn(&Snapshot, f64) -> NoiseReport + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisDispatch {
    Started,
    /// The previous analysis has not finished; this tick is dropped.
    SkippedInFlight,
    /// The worker is gone; nothing was dispatched.
    Unavailable,
}

struct AnalysisJob {
    snapshot: Snapshot,
    sample_rate_hz: f64,
}

type AnalysisResult = Result<NoiseReport, String>;

struct AnalysisWorker {
    jobs: Option<SyncSender<AnalysisJob>>,
    results: Receiver<AnalysisResult>,
    handle: Option<JoinHandle<()>>,
}

impl AnalysisWorker {
    fn spawn(analysis: AnalysisFn) -> MonitorResult<Self> {
        let (jobs_tx, jobs_rx) = mpsc::sync_channel::<AnalysisJob>(1);
        let (results_tx, results_rx) = mpsc::channel::<AnalysisResult>();
        let handle = RuntimeThread::spawn("vmon-analysis", move || {
            for job in jobs_rx {
                let result = catch_unwind(AssertUnwindSafe(|| {
                    analysis(&job.snapshot, job.sample_rate_hz)
                }))
                .map_err(|_| "analysis panicked".to_string());
                if results_tx.send(result).is_err() {
                    break;
                }
            }
        })
        .map_err(MonitorError::Runtime)?;
        Ok(Self {
            jobs: Some(jobs_tx),
            results: results_rx,
            handle: Some(handle),
        })
    }

    fn submit(&self, job: AnalysisJob) -> Result<(), TrySendError<AnalysisJob>> {
        match self.jobs.as_ref() {
            Some(jobs) => jobs.try_send(job),
            None => Err(TrySendError::Disconnected(job)),
        }
    }

    fn try_result(&self) -> Option<AnalysisResult> {
        match self.results.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err("analysis worker exited".to_string())),
        }
    }

    fn wait_result(&self, timeout: Duration) -> Option<AnalysisResult> {
        match self.results.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err("analysis worker exited".to_string())),
        }
    }
}

impl Drop for AnalysisWorker {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Derives noise statistics from the window on a slow cadence.
///
/// At most one analysis is in flight; ticks that find one running are
/// skipped, so the worker never runs concurrently with itself and the
/// scheduling thread never waits on it.
pub struct NoiseAnalyzer {
    cadence: Cadence,
    worker: AnalysisWorker,
    surface: Box<dyn RenderSurface>,
    readout_labels: Vec<String>,
    unit: String,
    in_flight: bool,
    dispatched: u64,
    skipped: u64,
    completed: u64,
    failed: u64,
    last_report: Option<NoiseReport>,
}

impl NoiseAnalyzer {
    pub fn new(
        settings: &MonitorSettings,
        surface: Box<dyn RenderSurface>,
        start: Instant,
    ) -> MonitorResult<Self> {
        Self::with_analysis(settings, surface, start, Arc::new(noise_report))
    }

    /// Uses `analysis` in place of the spectral noise report.
    pub fn with_analysis(
        settings: &MonitorSettings,
        surface: Box<dyn RenderSurface>,
        start: Instant,
        analysis: AnalysisFn,
    ) -> MonitorResult<Self> {
        Ok(Self {
            cadence: Cadence::new(Duration::from_millis(settings.analysis_interval_ms), start),
            worker: AnalysisWorker::spawn(analysis)?,
            surface,
            readout_labels: settings.readout_labels.clone(),
            unit: settings.unit.clone(),
            in_flight: false,
            dispatched: 0,
            skipped: 0,
            completed: 0,
            failed: 0,
            last_report: None,
        })
    }

    pub fn cadence(&self) -> &Cadence {
        &self.cadence
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }

    pub fn last_report(&self) -> Option<&NoiseReport> {
        self.last_report.as_ref()
    }

    pub fn poll(
        &mut self,
        now: Instant,
        buffer: &SharedBuffer,
        sample_rate_hz: f64,
    ) -> Option<AnalysisDispatch> {
        if !self.cadence.is_due(now) {
            return None;
        }
        self.cadence.mark_fired(now);
        Some(self.tick(buffer, sample_rate_hz))
    }

    /// Snapshots the buffer and hands it to the worker unless one is running.
    pub fn tick(&mut self, buffer: &SharedBuffer, sample_rate_hz: f64) -> AnalysisDispatch {
        if self.in_flight {
            self.skipped += 1;
            log::debug!("analysis tick skipped, previous run still in flight");
            return AnalysisDispatch::SkippedInFlight;
        }
        let job = AnalysisJob {
            snapshot: buffer.snapshot(),
            sample_rate_hz,
        };
        match self.worker.submit(job) {
            Ok(()) => {
                self.in_flight = true;
                self.dispatched += 1;
                AnalysisDispatch::Started
            }
            Err(TrySendError::Full(_)) => {
                self.skipped += 1;
                AnalysisDispatch::SkippedInFlight
            }
            Err(TrySendError::Disconnected(_)) => {
                self.failed += 1;
                log::warn!("analysis worker unavailable");
                AnalysisDispatch::Unavailable
            }
        }
    }

    /// Picks up a finished analysis, if any, and pushes it to the surface.
    pub fn collect(&mut self) -> Option<NoiseReport> {
        if !self.in_flight {
            return None;
        }
        let result = self.worker.try_result()?;
        self.finish(result)
    }

    /// Like `collect`, but waits up to `timeout` for the running analysis.
    pub fn collect_blocking(&mut self, timeout: Duration) -> Option<NoiseReport> {
        if !self.in_flight {
            return None;
        }
        let result = self.worker.wait_result(timeout)?;
        self.finish(result)
    }

    fn finish(&mut self, result: AnalysisResult) -> Option<NoiseReport> {
        self.in_flight = false;
        let report = match result {
            Ok(report) => report,
            Err(err) => {
                self.failed += 1;
                log::warn!("analysis failed: {err}");
                return None;
            }
        };
        self.completed += 1;
        if let Err(err) = self.push_report(&report) {
            log::warn!("analysis display skipped: {err}");
        }
        self.last_report = Some(report.clone());
        Some(report)
    }

    fn push_report(&mut self, report: &NoiseReport) -> MonitorResult<()> {
        let metadata = DisplayMetadata {
            title: format!(
                "Noise over {} samples @ {} Hz",
                report.samples, report.sample_rate_hz
            ),
            x_label: match report.frequencies.get(1) {
                Some(bin_hz) => format!("Frequency bin ({bin_hz:.3} Hz each)"),
                None => "Frequency bin".to_string(),
            },
            axis_labels: self
                .readout_labels
                .iter()
                .map(|label| format!("{label} ASD ({}/\u{221a}Hz)", self.unit))
                .collect(),
            readout: self
                .readout_labels
                .iter()
                .zip(&report.channels)
                .map(|(label, noise)| (format!("{label} floor"), noise.noise_floor))
                .collect(),
        };
        let surface = &mut self.surface;
        catch_unwind(AssertUnwindSafe(|| {
            surface.set_metadata(&metadata);
            for (channel, noise) in report.channels.iter().enumerate() {
                surface.set_series(channel, &noise.asd);
            }
            surface.request_redraw();
        }))
        .map_err(|_| MonitorError::InvalidFrame("analysis surface panicked".to_string()))
    }
}
