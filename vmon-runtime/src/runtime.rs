use crate::analyzer::{AnalysisDispatch, NoiseAnalyzer};
use crate::controller::{ReconfigurationController, Reconfigured};
use crate::message::{MonitorMessage, MonitorState};
use crate::noise::NoiseReport;
use crate::render::{RenderOutcome, RenderScheduler};
use crate::rt_thread::{RuntimeThread, TickClock};
use std::ops::ControlFlow;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use vmon_core::{
    MonitorConfig, MonitorError, MonitorResult, MonitorSettings, RenderSurface, SharedBuffer,
};
use vmon_stream::{StreamIngest, StreamSource};

/// Longest the loop sleeps between ingest pumps and message checks.
pub const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Default)]
pub struct StepReport {
    pub ingested: usize,
    pub rendered: Option<RenderOutcome>,
    pub analysis: Option<AnalysisDispatch>,
    pub report: Option<NoiseReport>,
}

/// Ingest, render and analysis wired around one shared buffer.
///
/// Everything runs on the thread that calls `step`; only the source producer
/// and the analysis worker live on their own threads.
pub struct MonitorRuntime {
    controller: ReconfigurationController,
    render: RenderScheduler,
    analyzer: NoiseAnalyzer,
    last_error: Option<String>,
}

impl MonitorRuntime {
    pub fn new(
        settings: &MonitorSettings,
        source: Box<dyn StreamSource>,
        plot_surface: Box<dyn RenderSurface>,
        noise_surface: Box<dyn RenderSurface>,
    ) -> MonitorResult<Self> {
        let start = Instant::now();
        let analyzer = NoiseAnalyzer::new(settings, noise_surface, start)?;
        Self::with_analyzer(settings, source, plot_surface, analyzer, start)
    }

    pub fn with_analyzer(
        settings: &MonitorSettings,
        source: Box<dyn StreamSource>,
        plot_surface: Box<dyn RenderSurface>,
        analyzer: NoiseAnalyzer,
        start: Instant,
    ) -> MonitorResult<Self> {
        let config = settings.config()?;
        let buffer = Arc::new(SharedBuffer::new(config.capacity()));
        let ingest = StreamIngest::start(source, config.sample_rate_hz)?;
        log::info!(
            "monitor started: {} s window @ {} Hz ({} samples)",
            config.window_duration_s,
            config.sample_rate_hz,
            config.capacity()
        );
        Ok(Self {
            controller: ReconfigurationController::new(config, buffer, ingest),
            render: RenderScheduler::new(settings, &config, plot_surface, start),
            analyzer,
            last_error: None,
        })
    }

    pub fn buffer(&self) -> Arc<SharedBuffer> {
        self.controller.buffer().clone()
    }

    pub fn config(&self) -> MonitorConfig {
        self.controller.config()
    }

    pub fn controller(&self) -> &ReconfigurationController {
        &self.controller
    }

    pub fn render(&self) -> &RenderScheduler {
        &self.render
    }

    pub fn analyzer(&self) -> &NoiseAnalyzer {
        &self.analyzer
    }

    pub fn analyzer_mut(&mut self) -> &mut NoiseAnalyzer {
        &mut self.analyzer
    }

    pub fn set_window_duration(&mut self, seconds: f64) -> MonitorResult<MonitorConfig> {
        let result = self.controller.change_window_duration(seconds);
        self.apply(result)
    }

    pub fn set_sample_rate(&mut self, rate_hz: f64) -> MonitorResult<MonitorConfig> {
        let result = self.controller.change_rate(rate_hz);
        self.apply(result)
    }

    pub fn reconnect(&mut self) -> MonitorResult<()> {
        let result = self.controller.reconnect();
        match &result {
            Ok(()) => self.last_error = None,
            Err(err) => self.record_error(err),
        }
        result
    }

    fn apply(&mut self, result: MonitorResult<Reconfigured>) -> MonitorResult<MonitorConfig> {
        match result {
            Ok(reconfigured) => {
                self.render.refresh_metadata(&reconfigured.config);
                Ok(reconfigured.config)
            }
            Err(err) => {
                self.record_error(&err);
                Err(err)
            }
        }
    }

    fn record_error(&mut self, err: &MonitorError) {
        if err.is_recoverable() {
            log::warn!("{err}");
        } else {
            log::error!("{err}");
        }
        self.last_error = Some(err.to_string());
    }

    /// Handles one operator command. `Break` means shut down. Commands whose
    /// caller already gave up are dropped unapplied.
    pub fn handle_message(&mut self, message: MonitorMessage) -> ControlFlow<()> {
        match message {
            MonitorMessage::SetWindowDuration(seconds, reply) => {
                if reply.claim() {
                    reply.send(self.set_window_duration(seconds));
                } else {
                    log::warn!("window change to {seconds} s abandoned by caller, skipped");
                }
            }
            MonitorMessage::SetSampleRate(rate_hz, reply) => {
                if reply.claim() {
                    reply.send(self.set_sample_rate(rate_hz));
                } else {
                    log::warn!("rate change to {rate_hz} Hz abandoned by caller, skipped");
                }
            }
            MonitorMessage::Reconnect(reply) => {
                if reply.claim() {
                    reply.send(self.reconnect());
                } else {
                    log::warn!("reconnect abandoned by caller, skipped");
                }
            }
            MonitorMessage::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// One pass: pump ingest, fire whichever ticks are due, collect analyses.
    pub fn step(&mut self, now: Instant) -> StepReport {
        let mut report = StepReport::default();
        match self.controller.pump() {
            Ok(count) => report.ingested = count,
            Err(err) => self.record_error(&err),
        }

        let buffer = self.controller.buffer().clone();
        report.rendered = self.render.poll(now, &buffer);
        let rate_hz = self.controller.config().sample_rate_hz;
        report.analysis = self.analyzer.poll(now, &buffer, rate_hz);
        report.report = self.analyzer.collect();
        report
    }

    pub fn next_deadline(&self, now: Instant) -> Instant {
        let render_due = self.render.cadence().next_due();
        let analysis_due = self.analyzer.cadence().next_due();
        render_due.min(analysis_due).min(now + POLL_INTERVAL)
    }

    pub fn state(&self) -> MonitorState {
        let buffer = self.controller.buffer();
        MonitorState {
            config: self.controller.config(),
            ingest: self.controller.ingest_status(),
            total_samples: self.controller.ingest().total_samples(),
            buffered: buffer.len(),
            latest: buffer.latest(),
            render_ticks: self.render.ticks(),
            skipped_frames: self.render.skipped(),
            analysis_runs: self.analyzer.completed(),
            skipped_analyses: self.analyzer.skipped(),
            noise: self.analyzer.last_report().cloned(),
            last_error: self.last_error.clone(),
        }
    }

    /// Cancels the subscription. The analysis worker is joined on drop.
    pub fn shutdown(&mut self) {
        self.controller.stop();
        log::info!("monitor stopped");
    }
}

fn run_runtime_loop(
    mut runtime: MonitorRuntime,
    monitor_rx: Receiver<MonitorMessage>,
    state_tx: Sender<MonitorState>,
) {
    loop {
        let mut publish = false;
        loop {
            match monitor_rx.try_recv() {
                Ok(message) => {
                    if runtime.handle_message(message).is_break() {
                        runtime.shutdown();
                        return;
                    }
                    publish = true;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    runtime.shutdown();
                    return;
                }
            }
        }

        let step = runtime.step(Instant::now());
        if step.rendered.is_some() || step.report.is_some() {
            publish = true;
        }
        if publish && state_tx.send(runtime.state()).is_err() {
            log::debug!("state receiver dropped");
        }

        TickClock::sleep_until(runtime.next_deadline(Instant::now()));
    }
}

pub(crate) struct SpawnedRuntime {
    pub(crate) monitor_tx: Sender<MonitorMessage>,
    pub(crate) state_rx: Receiver<MonitorState>,
    pub(crate) buffer: Arc<SharedBuffer>,
    pub(crate) handle: JoinHandle<()>,
}

pub(crate) fn spawn_runtime(runtime: MonitorRuntime) -> MonitorResult<SpawnedRuntime> {
    let (monitor_tx, monitor_rx) = mpsc::channel::<MonitorMessage>();
    let (state_tx, state_rx) = mpsc::channel::<MonitorState>();
    let buffer = runtime.buffer();
    let handle = RuntimeThread::spawn("vmon-runtime", move || {
        run_runtime_loop(runtime, monitor_rx, state_tx)
    })
    .map_err(MonitorError::Runtime)?;
    Ok(SpawnedRuntime {
        monitor_tx,
        state_rx,
        buffer,
        handle,
    })
}
