use crate::config::MonitorConfig;
use crate::error::MonitorResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_SAMPLE_RATE_HZ: f64 = 100.0;
pub const DEFAULT_WINDOW_SAMPLES: usize = 500;
pub const DEFAULT_RENDER_INTERVAL_MS: u64 = 100;
pub const DEFAULT_ANALYSIS_INTERVAL_MS: u64 = 2000;
pub const MIN_TICK_INTERVAL_MS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSettings {
    pub window_duration_s: f64,
    pub sample_rate_hz: f64,
    #[serde(default = "default_render_interval_ms")]
    pub render_interval_ms: u64,
    #[serde(default = "default_analysis_interval_ms")]
    pub analysis_interval_ms: u64,
    #[serde(default = "default_axis_labels")]
    pub axis_labels: Vec<String>,
    #[serde(default = "default_readout_labels")]
    pub readout_labels: Vec<String>,
    #[serde(default = "default_unit")]
    pub unit: String,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            window_duration_s: DEFAULT_WINDOW_SAMPLES as f64 / DEFAULT_SAMPLE_RATE_HZ,
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            render_interval_ms: DEFAULT_RENDER_INTERVAL_MS,
            analysis_interval_ms: DEFAULT_ANALYSIS_INTERVAL_MS,
            axis_labels: default_axis_labels(),
            readout_labels: default_readout_labels(),
            unit: default_unit(),
        }
    }
}

fn default_render_interval_ms() -> u64 {
    DEFAULT_RENDER_INTERVAL_MS
}

fn default_analysis_interval_ms() -> u64 {
    DEFAULT_ANALYSIS_INTERVAL_MS
}

fn default_axis_labels() -> Vec<String> {
    vec![
        "Field X (nT)".to_string(),
        "Field Y (nT)".to_string(),
        "Field Z (nT)".to_string(),
    ]
}

fn default_readout_labels() -> Vec<String> {
    vec!["BX".to_string(), "BY".to_string(), "BZ".to_string()]
}

fn default_unit() -> String {
    "nT".to_string()
}

impl MonitorSettings {
    pub fn config(&self) -> MonitorResult<MonitorConfig> {
        MonitorConfig::new(self.window_duration_s, self.sample_rate_hz)
    }

    pub fn load_from_file(path: &Path) -> MonitorResult<Self> {
        let data = std::fs::read(path)?;
        let settings: MonitorSettings = serde_json::from_slice(&data)?;
        log::debug!("loaded monitor settings from {}", path.display());
        settings.normalized()
    }

    pub fn save_to_file(&self, path: &Path) -> MonitorResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Validates the config and fills in anything a hand-edited file got wrong.
    pub fn normalized(mut self) -> MonitorResult<Self> {
        self.config()?;
        if self.render_interval_ms < MIN_TICK_INTERVAL_MS
            || self.analysis_interval_ms < MIN_TICK_INTERVAL_MS
        {
            log::warn!("tick intervals below {MIN_TICK_INTERVAL_MS} ms are clamped");
        }
        self.render_interval_ms = self.render_interval_ms.max(MIN_TICK_INTERVAL_MS);
        self.analysis_interval_ms = self.analysis_interval_ms.max(MIN_TICK_INTERVAL_MS);
        normalize_labels(&mut self.axis_labels, default_axis_labels());
        normalize_labels(&mut self.readout_labels, default_readout_labels());
        if self.unit.trim().is_empty() {
            self.unit = default_unit();
        }
        Ok(self)
    }
}

fn normalize_labels(labels: &mut Vec<String>, defaults: Vec<String>) {
    let count = defaults.len();
    for (idx, fallback) in defaults.into_iter().enumerate() {
        match labels.get_mut(idx) {
            Some(label) if label.trim().is_empty() => *label = fallback,
            Some(_) => {}
            None => labels.push(fallback),
        }
    }
    labels.truncate(count);
}

impl From<MonitorConfig> for MonitorSettings {
    fn from(config: MonitorConfig) -> Self {
        Self {
            window_duration_s: config.window_duration_s,
            sample_rate_hz: config.sample_rate_hz,
            ..Self::default()
        }
    }
}
