use crate::error::{MonitorError, MonitorResult};
use serde::{Deserialize, Serialize};

/// Largest window, in samples, a config may ask for.
pub const MAX_CAPACITY: usize = 10_000_000;

/// Window length and device rate; the buffer capacity is derived from both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub window_duration_s: f64,
    pub sample_rate_hz: f64,
}

impl MonitorConfig {
    pub fn new(window_duration_s: f64, sample_rate_hz: f64) -> MonitorResult<Self> {
        Self {
            window_duration_s: validate_positive("window_duration_s", window_duration_s)?,
            sample_rate_hz: validate_positive("sample_rate_hz", sample_rate_hz)?,
        }
        .bounded("window_duration_s", window_duration_s)
    }

    /// `round(window_duration_s * sample_rate_hz)`.
    pub fn capacity(&self) -> usize {
        self.raw_capacity().clamp(1.0, MAX_CAPACITY as f64) as usize
    }

    pub fn with_window_duration(&self, window_duration_s: f64) -> MonitorResult<Self> {
        Self {
            window_duration_s: validate_positive("window_duration_s", window_duration_s)?,
            sample_rate_hz: self.sample_rate_hz,
        }
        .bounded("window_duration_s", window_duration_s)
    }

    pub fn with_sample_rate(&self, sample_rate_hz: f64) -> MonitorResult<Self> {
        Self {
            window_duration_s: self.window_duration_s,
            sample_rate_hz: validate_positive("sample_rate_hz", sample_rate_hz)?,
        }
        .bounded("sample_rate_hz", sample_rate_hz)
    }

    /// Rejects capacities that round to zero or exceed [`MAX_CAPACITY`],
    /// blaming `field`.
    fn bounded(self, field: &'static str, value: f64) -> MonitorResult<Self> {
        let raw = self.raw_capacity();
        if raw < 1.0 || raw > MAX_CAPACITY as f64 {
            return Err(MonitorError::InvalidConfig { field, value });
        }
        Ok(self)
    }

    fn raw_capacity(&self) -> f64 {
        (self.window_duration_s * self.sample_rate_hz).round()
    }
}

pub fn validate_positive(field: &'static str, value: f64) -> MonitorResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(MonitorError::InvalidConfig { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_rounds_product() {
        let config = MonitorConfig::new(2.5, 3.0).unwrap();
        assert_eq!(config.capacity(), 8);
        let config = MonitorConfig::new(5.0, 100.0).unwrap();
        assert_eq!(config.capacity(), 500);
    }

    #[test]
    fn rejects_non_positive_and_non_finite() {
        assert!(MonitorConfig::new(0.0, 10.0).is_err());
        assert!(MonitorConfig::new(1.0, -1.0).is_err());
        assert!(MonitorConfig::new(f64::NAN, 10.0).is_err());
        assert!(MonitorConfig::new(1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn rejects_window_that_rounds_to_empty() {
        let err = MonitorConfig::new(0.01, 10.0).unwrap_err();
        assert!(matches!(
            err,
            MonitorError::InvalidConfig {
                field: "window_duration_s",
                ..
            }
        ));
    }

    #[test]
    fn with_sample_rate_reports_rate_field() {
        let config = MonitorConfig::new(5.0, 100.0).unwrap();
        let err = config.with_sample_rate(-1.0).unwrap_err();
        assert!(matches!(
            err,
            MonitorError::InvalidConfig {
                field: "sample_rate_hz",
                ..
            }
        ));
        assert_eq!(config.sample_rate_hz, 100.0);
    }

    #[test]
    fn rate_that_empties_the_window_blames_the_rate() {
        let config = MonitorConfig::new(0.1, 100.0).unwrap();
        let err = config.with_sample_rate(2.0).unwrap_err();
        assert!(matches!(
            err,
            MonitorError::InvalidConfig {
                field: "sample_rate_hz",
                value,
            } if value == 2.0
        ));
    }

    #[test]
    fn oversized_windows_are_rejected() {
        let config = MonitorConfig::new(5.0, 100.0).unwrap();
        for window in [1e18, 1e7, f64::MAX] {
            let err = config.with_window_duration(window).unwrap_err();
            assert!(matches!(
                err,
                MonitorError::InvalidConfig {
                    field: "window_duration_s",
                    ..
                }
            ));
        }
        assert!(matches!(
            config.with_sample_rate(1e9),
            Err(MonitorError::InvalidConfig {
                field: "sample_rate_hz",
                ..
            })
        ));
        let largest = MonitorConfig::new(MAX_CAPACITY as f64, 1.0).unwrap();
        assert_eq!(largest.capacity(), MAX_CAPACITY);
    }
}
