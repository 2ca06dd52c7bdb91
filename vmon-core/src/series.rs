use crate::buffer::Snapshot;
use crate::error::{MonitorError, MonitorResult};
use crate::sample::{Sample, CHANNELS};

/// Per-channel plot data derived from one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotFrame {
    pub series: Vec<Vec<f64>>,
    pub generation: u64,
}

impl PlotFrame {
    pub fn from_snapshot(snapshot: &Snapshot) -> MonitorResult<Self> {
        let mut series: Vec<Vec<f64>> = (0..CHANNELS)
            .map(|_| Vec::with_capacity(snapshot.len()))
            .collect();
        for (idx, sample) in snapshot.samples().iter().enumerate() {
            for (channel, value) in sample.0.iter().copied().enumerate() {
                if !value.is_finite() {
                    return Err(MonitorError::InvalidFrame(format!(
                        "non-finite value at sample {idx}, channel {channel}"
                    )));
                }
                series[channel].push(value);
            }
        }
        Ok(Self {
            series,
            generation: snapshot.generation(),
        })
    }

    pub fn len(&self) -> usize {
        self.series.first().map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(min_y, max_y)` for one channel, padded by 5%; `(-1, 1)` when empty.
    pub fn bounds(&self, channel: usize) -> (f64, f64) {
        let values = match self.series.get(channel) {
            Some(values) => values,
            None => return (-1.0, 1.0),
        };
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for value in values {
            min_y = min_y.min(*value);
            max_y = max_y.max(*value);
        }
        if min_y.is_infinite() || max_y.is_infinite() {
            return (-1.0, 1.0);
        }
        if min_y == max_y {
            (min_y - 1.0, max_y + 1.0)
        } else {
            let pad = (max_y - min_y) * 0.05;
            (min_y - pad, max_y + pad)
        }
    }
}

/// Latest values paired with their labels, rounded to two decimals.
pub fn readout(labels: &[String], latest: Option<Sample>) -> Vec<(String, f64)> {
    let Some(sample) = latest else {
        return Vec::new();
    };
    labels
        .iter()
        .zip(sample.0.iter())
        .map(|(label, value)| (label.clone(), round2(*value)))
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
