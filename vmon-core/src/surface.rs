use crate::sample::CHANNELS;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayMetadata {
    pub title: String,
    pub x_label: String,
    pub axis_labels: Vec<String>,
    /// `(label, value)` pairs for the latest sample, already rounded.
    pub readout: Vec<(String, f64)>,
}

/// A drawable the core pushes series data into.
///
/// How and when pixels reach the screen is the implementor's concern.
pub trait RenderSurface: Send {
    fn set_series(&mut self, channel: usize, values: &[f64]);

    fn request_redraw(&mut self);

    fn set_metadata(&mut self, _metadata: &DisplayMetadata) {}
}

impl<S: RenderSurface + ?Sized> RenderSurface for Box<S> {
    fn set_series(&mut self, channel: usize, values: &[f64]) {
        (**self).set_series(channel, values);
    }

    fn request_redraw(&mut self) {
        (**self).request_redraw();
    }

    fn set_metadata(&mut self, metadata: &DisplayMetadata) {
        (**self).set_metadata(metadata);
    }
}

/// Keeps whatever was pushed last; useful for headless runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    pub series: Vec<Vec<f64>>,
    pub metadata: Option<DisplayMetadata>,
    pub redraws: u64,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self {
            series: vec![Vec::new(); CHANNELS],
            metadata: None,
            redraws: 0,
        }
    }
}

impl RenderSurface for MemorySurface {
    fn set_series(&mut self, channel: usize, values: &[f64]) {
        if self.series.len() <= channel {
            self.series.resize(channel + 1, Vec::new());
        }
        self.series[channel].clear();
        self.series[channel].extend_from_slice(values);
    }

    fn request_redraw(&mut self) {
        self.redraws += 1;
    }

    fn set_metadata(&mut self, metadata: &DisplayMetadata) {
        self.metadata = Some(metadata.clone());
    }
}
