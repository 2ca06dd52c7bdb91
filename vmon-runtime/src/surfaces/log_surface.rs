use vmon_core::{DisplayMetadata, RenderSurface};

/// Headless surface that logs a one-line summary every `every` redraws.
pub struct LogSurface {
    name: String,
    every: u64,
    redraws: u64,
    lengths: Vec<usize>,
    last_values: Vec<Option<f64>>,
    metadata: DisplayMetadata,
}

impl LogSurface {
    pub fn new(name: impl Into<String>, every: u64) -> Self {
        Self {
            name: name.into(),
            every: every.max(1),
            redraws: 0,
            lengths: Vec::new(),
            last_values: Vec::new(),
            metadata: DisplayMetadata::default(),
        }
    }

    pub fn redraws(&self) -> u64 {
        self.redraws
    }

    fn summary(&self) -> String {
        if !self.metadata.readout.is_empty() {
            return self
                .metadata
                .readout
                .iter()
                .map(|(label, value)| format!("{label}={value:.2}"))
                .collect::<Vec<_>>()
                .join(" ");
        }
        self.last_values
            .iter()
            .enumerate()
            .map(|(idx, value)| match value {
                Some(value) => format!("ch{idx}={value:.2}"),
                None => format!("ch{idx}=-"),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl RenderSurface for LogSurface {
    fn set_series(&mut self, channel: usize, values: &[f64]) {
        if self.lengths.len() <= channel {
            self.lengths.resize(channel + 1, 0);
            self.last_values.resize(channel + 1, None);
        }
        self.lengths[channel] = values.len();
        self.last_values[channel] = values.last().copied();
    }

    fn request_redraw(&mut self) {
        self.redraws += 1;
        if self.redraws % self.every != 0 {
            return;
        }
        log::info!(
            "[{}] {} | {} points | {}",
            self.name,
            self.metadata.title,
            self.lengths.first().copied().unwrap_or(0),
            self.summary()
        );
    }

    fn set_metadata(&mut self, metadata: &DisplayMetadata) {
        self.metadata = metadata.clone();
    }
}
