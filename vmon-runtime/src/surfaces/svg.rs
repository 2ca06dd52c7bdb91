use super::palette_color;
use plotters::backend::SVGBackend;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use vmon_core::{DisplayMetadata, MonitorError, MonitorResult, PlotFrame, RenderSurface};

/// Writes the pushed series to an SVG file, one stacked chart per channel.
///
/// Only every `every`-th redraw touches the disk.
pub struct SvgSurface {
    path: PathBuf,
    size: (u32, u32),
    every: u64,
    redraws: u64,
    written: u64,
    frame: PlotFrame,
    metadata: DisplayMetadata,
}

impl SvgSurface {
    pub fn new(path: impl Into<PathBuf>, every: u64) -> Self {
        Self {
            path: path.into(),
            size: (1290, 800),
            every: every.max(1),
            redraws: 0,
            written: 0,
            frame: PlotFrame {
                series: Vec::new(),
                generation: 0,
            },
            metadata: DisplayMetadata::default(),
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width.max(200), height.max(200));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Draws the current series. Falls back to an unlabelled chart when text
    /// cannot be laid out (no usable system font).
    pub fn write(&self) -> MonitorResult<()> {
        if self.frame.series.is_empty() {
            return Err(MonitorError::InvalidFrame("no series to draw".to_string()));
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.draw(true).or_else(|err| {
            log::debug!("{}: {err}; redrawing without labels", self.path.display());
            self.draw(false)
        })
    }

    fn draw(&self, labels: bool) -> MonitorResult<()> {
        let root = SVGBackend::new(&self.path, self.size).into_drawing_area();
        root.fill(&WHITE).map_err(draw_error)?;
        let root = if labels && !self.metadata.title.is_empty() {
            root.titled(&self.metadata.title, ("sans-serif", 20))
                .map_err(draw_error)?
        } else {
            root
        };

        let areas = root.split_evenly((self.frame.series.len(), 1));
        for (channel, (area, values)) in areas.iter().zip(&self.frame.series).enumerate() {
            let (min_y, max_y) = self.frame.bounds(channel);
            let max_x = (values.len().max(2) - 1) as f64;
            let (r, g, b) = palette_color(channel);
            let color = RGBColor(r, g, b);

            let mut builder = ChartBuilder::on(area);
            builder.margin(10);
            if labels {
                builder
                    .set_label_area_size(LabelAreaPosition::Left, 70)
                    .set_label_area_size(LabelAreaPosition::Bottom, 35);
            }
            let mut chart = builder
                .build_cartesian_2d(0.0..max_x, min_y..max_y)
                .map_err(draw_error)?;

            let y_label = self
                .metadata
                .axis_labels
                .get(channel)
                .cloned()
                .unwrap_or_else(|| format!("ch{channel}"));
            let mut mesh = chart.configure_mesh();
            if labels {
                mesh.x_desc(self.metadata.x_label.as_str())
                    .y_desc(y_label.as_str())
                    .label_style(("sans-serif", 12));
            } else {
                mesh.x_labels(0).y_labels(0);
            }
            mesh.draw().map_err(draw_error)?;

            chart
                .draw_series(LineSeries::new(
                    values.iter().enumerate().map(|(i, v)| (i as f64, *v)),
                    color.stroke_width(1),
                ))
                .map_err(draw_error)?;
        }
        root.present().map_err(draw_error)?;
        Ok(())
    }
}

fn draw_error<E: std::fmt::Display>(err: E) -> MonitorError {
    MonitorError::Runtime(format!("svg render failed: {err}"))
}

impl RenderSurface for SvgSurface {
    fn set_series(&mut self, channel: usize, values: &[f64]) {
        if self.frame.series.len() <= channel {
            self.frame.series.resize(channel + 1, Vec::new());
        }
        self.frame.series[channel].clear();
        self.frame.series[channel].extend_from_slice(values);
    }

    fn request_redraw(&mut self) {
        self.redraws += 1;
        if self.redraws % self.every != 0 {
            return;
        }
        match self.write() {
            Ok(()) => self.written += 1,
            Err(err) => log::warn!("{}: {err}", self.path.display()),
        }
    }

    fn set_metadata(&mut self, metadata: &DisplayMetadata) {
        self.metadata = metadata.clone();
    }
}
