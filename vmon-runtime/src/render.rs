use crate::cadence::Cadence;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};
use vmon_core::{
    readout, DisplayMetadata, MonitorConfig, MonitorError, MonitorResult, MonitorSettings,
    PlotFrame, RenderSurface, SharedBuffer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// A frame was pushed; `changed` is false when it matched the previous one.
    Rendered { samples: usize, changed: bool },
    /// The tick failed and the previous display was left in place.
    Skipped,
}

/// Pushes the current window to the plot surface on a fixed cadence.
pub struct RenderScheduler {
    cadence: Cadence,
    surface: Box<dyn RenderSurface>,
    axis_labels: Vec<String>,
    readout_labels: Vec<String>,
    metadata: DisplayMetadata,
    last_pushed_metadata: Option<DisplayMetadata>,
    last_frame: Option<PlotFrame>,
    ticks: u64,
    skipped: u64,
}

impl RenderScheduler {
    pub fn new(
        settings: &MonitorSettings,
        config: &MonitorConfig,
        surface: Box<dyn RenderSurface>,
        start: Instant,
    ) -> Self {
        let mut scheduler = Self {
            cadence: Cadence::new(Duration::from_millis(settings.render_interval_ms), start),
            surface,
            axis_labels: settings.axis_labels.clone(),
            readout_labels: settings.readout_labels.clone(),
            metadata: DisplayMetadata::default(),
            last_pushed_metadata: None,
            last_frame: None,
            ticks: 0,
            skipped: 0,
        };
        scheduler.refresh_metadata(config);
        scheduler
    }

    pub fn cadence(&self) -> &Cadence {
        &self.cadence
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn last_frame(&self) -> Option<&PlotFrame> {
        self.last_frame.as_ref()
    }

    /// Rebuilds axis labels for a new rate or window length.
    pub fn refresh_metadata(&mut self, config: &MonitorConfig) {
        self.metadata.title = format!(
            "{:.1} s window @ {} Hz ({} samples)",
            config.window_duration_s,
            config.sample_rate_hz,
            config.capacity()
        );
        self.metadata.x_label = format!("Sample (1/{} s)", config.sample_rate_hz);
        self.metadata.axis_labels = self.axis_labels.clone();
    }

    pub fn poll(&mut self, now: Instant, buffer: &SharedBuffer) -> Option<RenderOutcome> {
        if !self.cadence.is_due(now) {
            return None;
        }
        self.cadence.mark_fired(now);
        Some(self.tick(buffer))
    }

    /// Snapshots the buffer and pushes one series per component.
    ///
    /// Never waits for data and never propagates a failure: a bad frame or a
    /// panicking surface skips the tick.
    pub fn tick(&mut self, buffer: &SharedBuffer) -> RenderOutcome {
        self.ticks += 1;
        let snapshot = buffer.snapshot();
        self.metadata.readout = readout(&self.readout_labels, snapshot.latest());

        match self.push_frame(PlotFrame::from_snapshot(&snapshot)) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.skipped += 1;
                log::warn!("render tick {} skipped: {err}", self.ticks);
                RenderOutcome::Skipped
            }
        }
    }

    fn push_frame(&mut self, frame: MonitorResult<PlotFrame>) -> MonitorResult<RenderOutcome> {
        let frame = frame?;
        let metadata = if self.last_pushed_metadata.as_ref() != Some(&self.metadata) {
            Some(self.metadata.clone())
        } else {
            None
        };
        let surface = &mut self.surface;
        catch_unwind(AssertUnwindSafe(|| {
            if let Some(metadata) = metadata.as_ref() {
                surface.set_metadata(metadata);
            }
            for (channel, values) in frame.series.iter().enumerate() {
                surface.set_series(channel, values);
            }
            surface.request_redraw();
        }))
        .map_err(|_| MonitorError::InvalidFrame("render surface panicked".to_string()))?;

        if metadata.is_some() {
            self.last_pushed_metadata = metadata;
        }
        let changed = self.last_frame.as_ref() != Some(&frame);
        let samples = frame.len();
        self.last_frame = Some(frame);
        Ok(RenderOutcome::Rendered { samples, changed })
    }
}
