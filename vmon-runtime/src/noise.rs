//! Noise statistics over one window of samples.
//!
//! Each channel gets its mean, standard deviation, peak-to-peak spread and a
//! one-sided amplitude spectral density (ASD). The ASD uses a Hann window over
//! the mean-removed series:
//!
//! `PSD[k] = c * |FFT(w * (x - mean))[k]|^2 / (fs * sum(w^2))`, with `c = 2`
//! except at DC and Nyquist, and `ASD = sqrt(PSD)` in units/sqrt(Hz).
//!
//! The noise floor is the median ASD over the non-DC bins.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::f64::consts::TAU;
use vmon_core::{Snapshot, CHANNELS};

/// Fewer samples than this yield statistics but no spectrum.
pub const MIN_SPECTRUM_SAMPLES: usize = 4;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelNoise {
    pub mean: f64,
    pub std_dev: f64,
    pub peak_to_peak: f64,
    pub noise_floor: f64,
    pub asd: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoiseReport {
    /// Generation of the buffer the snapshot came from.
    pub generation: u64,
    pub sample_rate_hz: f64,
    pub samples: usize,
    /// Bin centre frequencies shared by every channel's `asd`.
    pub frequencies: Vec<f64>,
    pub channels: Vec<ChannelNoise>,
}

pub fn noise_report(snapshot: &Snapshot, sample_rate_hz: f64) -> NoiseReport {
    let n = snapshot.len();
    let mut planner = FftPlanner::<f64>::new();
    let window = hann(n);
    let frequencies = if n >= MIN_SPECTRUM_SAMPLES && sample_rate_hz > 0.0 {
        (0..=n / 2)
            .map(|k| k as f64 * sample_rate_hz / n as f64)
            .collect()
    } else {
        Vec::new()
    };

    let channels = (0..CHANNELS)
        .map(|channel| {
            let values = snapshot.channel(channel);
            let mut stats = channel_stats(&values);
            if !frequencies.is_empty() {
                stats.asd = amplitude_spectral_density(
                    &values,
                    stats.mean,
                    &window,
                    sample_rate_hz,
                    &mut planner,
                );
                stats.noise_floor = median(&stats.asd[1..]);
            }
            stats
        })
        .collect();

    NoiseReport {
        generation: snapshot.generation(),
        sample_rate_hz,
        samples: n,
        frequencies,
        channels,
    }
}

fn channel_stats(values: &[f64]) -> ChannelNoise {
    if values.is_empty() {
        return ChannelNoise::default();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    ChannelNoise {
        mean,
        std_dev: variance.sqrt(),
        peak_to_peak: max - min,
        noise_floor: 0.0,
        asd: Vec::new(),
    }
}

fn hann(n: usize) -> Vec<f64> {
    if n < 2 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|i| 0.5 - 0.5 * (TAU * i as f64 / n as f64).cos())
        .collect()
}

fn amplitude_spectral_density(
    values: &[f64],
    mean: f64,
    window: &[f64],
    sample_rate_hz: f64,
    planner: &mut FftPlanner<f64>,
) -> Vec<f64> {
    let n = values.len();
    let fft = planner.plan_fft_forward(n);
    let mut buffer: Vec<Complex<f64>> = values
        .iter()
        .zip(window)
        .map(|(v, w)| Complex::new((v - mean) * w, 0.0))
        .collect();
    fft.process(&mut buffer);

    let window_power: f64 = window.iter().map(|w| w * w).sum();
    let scale = 1.0 / (sample_rate_hz * window_power.max(f64::EPSILON));
    let nyquist = n / 2;
    (0..=nyquist)
        .map(|k| {
            let one_sided = if k == 0 || (n % 2 == 0 && k == nyquist) {
                1.0
            } else {
                2.0
            };
            (one_sided * buffer[k].norm_sqr() * scale).sqrt()
        })
        .collect()
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmon_core::{Sample, SharedBuffer};

    fn snapshot_of(values: impl IntoIterator<Item = [f64; 3]>, capacity: usize) -> Snapshot {
        let shared = SharedBuffer::new(capacity);
        shared.extend(values.into_iter().map(Sample::from));
        shared.snapshot()
    }

    #[test]
    fn stats_of_constant_signal() {
        let snapshot = snapshot_of((0..64).map(|_| [5.0, -2.0, 0.0]), 64);
        let report = noise_report(&snapshot, 100.0);
        assert_eq!(report.samples, 64);
        assert_eq!(report.frequencies.len(), 33);
        let x = &report.channels[0];
        assert_eq!(x.mean, 5.0);
        assert_eq!(x.std_dev, 0.0);
        assert_eq!(x.peak_to_peak, 0.0);
        assert!(x.asd.iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn tone_peaks_at_its_frequency() {
        let rate = 128.0;
        let n = 256;
        let tone_hz = 8.0;
        let snapshot = snapshot_of(
            (0..n).map(|i| {
                let t = i as f64 / rate;
                [(TAU * tone_hz * t).sin(), 0.0, 0.0]
            }),
            n,
        );
        let report = noise_report(&snapshot, rate);
        let asd = &report.channels[0].asd;
        let peak = asd
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| k)
            .unwrap();
        assert_eq!(report.frequencies[peak], tone_hz);
        assert!((report.channels[0].peak_to_peak - 2.0).abs() < 1e-6);
        assert!(report.channels[0].noise_floor < asd[peak]);
    }

    #[test]
    fn short_window_has_stats_but_no_spectrum() {
        let snapshot = snapshot_of([[1.0, 1.0, 1.0], [3.0, 3.0, 3.0]], 8);
        let report = noise_report(&snapshot, 10.0);
        assert!(report.frequencies.is_empty());
        assert_eq!(report.channels[2].mean, 2.0);
        assert_eq!(report.channels[2].std_dev, 1.0);
        assert!(report.channels[2].asd.is_empty());
    }

    #[test]
    fn empty_snapshot_is_all_zero() {
        let snapshot = SharedBuffer::new(8).snapshot();
        let report = noise_report(&snapshot, 10.0);
        assert_eq!(report.samples, 0);
        assert_eq!(report.channels.len(), CHANNELS);
        assert_eq!(report.channels[0], ChannelNoise::default());
    }

    #[test]
    fn median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }
}
