use serde::{Deserialize, Serialize};

pub const CHANNELS: usize = 3;

/// One vector reading (X, Y, Z). Arrival order is the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sample(pub [f64; CHANNELS]);

impl Sample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self([x, y, z])
    }

    /// Builds a sample with non-finite components replaced by zero.
    pub fn sanitized(components: [f64; CHANNELS]) -> Self {
        Self(components.map(sanitize_signal))
    }

    pub fn component(&self, channel: usize) -> Option<f64> {
        self.0.get(channel).copied()
    }

    pub fn components(&self) -> &[f64; CHANNELS] {
        &self.0
    }
}

impl From<[f64; CHANNELS]> for Sample {
    fn from(components: [f64; CHANNELS]) -> Self {
        Self(components)
    }
}

#[inline]
pub fn sanitize_signal(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
