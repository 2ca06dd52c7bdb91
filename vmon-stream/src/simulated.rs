use crate::source::{StreamSource, Subscription};
use rand::Rng;
use std::f64::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use vmon_core::{config::validate_positive, MonitorError, MonitorResult, Sample};

const MAX_PRODUCER_SLEEP: Duration = Duration::from_millis(10);
/// Samples the device holds for a slow reader; beyond this they are dropped.
const QUEUE_DEPTH: usize = 16_384;
/// Samples emitted between two checks of the cancel flag.
const MAX_BURST: u64 = 1_024;

/// Shape of the synthetic field: a constant offset, a slow sine and white noise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldModel {
    pub offset: [f64; 3],
    pub amplitude: [f64; 3],
    pub frequency_hz: f64,
    pub noise: f64,
}

impl Default for FieldModel {
    fn default() -> Self {
        Self {
            offset: [21_500.0, -4_200.0, 43_800.0],
            amplitude: [12.0, 8.0, 5.0],
            frequency_hz: 1.0,
            noise: 0.5,
        }
    }
}

impl FieldModel {
    fn sample_at(&self, t: f64, rng: &mut impl Rng) -> Sample {
        let phase = TAU * self.frequency_hz * t;
        let mut components = [0.0; 3];
        for (axis, value) in components.iter_mut().enumerate() {
            let noise = if self.noise > 0.0 {
                rng.gen_range(-self.noise..self.noise)
            } else {
                0.0
            };
            *value = self.offset[axis]
                + self.amplitude[axis] * (phase + axis as f64 * TAU / 3.0).sin()
                + noise;
        }
        Sample::sanitized(components)
    }
}

/// In-process stand-in for a vector magnetometer.
///
/// Samples are produced on a background thread, paced against wall-clock time.
pub struct SimulatedSource {
    model: FieldModel,
    disconnect_after: Option<u64>,
    active: Option<(f64, Arc<AtomicBool>)>,
}

impl SimulatedSource {
    pub fn new(model: FieldModel) -> Self {
        Self {
            model,
            disconnect_after: None,
            active: None,
        }
    }

    /// Ends every subscription after `samples` samples, as if the device went away.
    pub fn with_disconnect_after(mut self, samples: u64) -> Self {
        self.disconnect_after = Some(samples);
        self
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new(FieldModel::default())
    }
}

impl StreamSource for SimulatedSource {
    fn subscribe(&mut self, rate_hz: f64) -> MonitorResult<Subscription> {
        let rate_hz = validate_positive("sample_rate_hz", rate_hz)?;
        self.unsubscribe();

        let (tx, rx) = mpsc::sync_channel(QUEUE_DEPTH);
        let cancel = Arc::new(AtomicBool::new(false));
        let producer = {
            let cancel = cancel.clone();
            let model = self.model;
            let limit = self.disconnect_after;
            thread::Builder::new()
                .name("vmon-sim-source".to_string())
                .spawn(move || produce(model, rate_hz, limit, tx, cancel))
                .map_err(|e| MonitorError::Runtime(format!("failed to spawn source: {e}")))?
        };
        log::debug!("simulated source streaming at {rate_hz} Hz");
        self.active = Some((rate_hz, cancel.clone()));
        Ok(Subscription::new(rate_hz, rx, cancel, Some(producer)))
    }

    fn unsubscribe(&mut self) {
        if let Some((_, cancel)) = self.active.take() {
            cancel.store(true, Ordering::Release);
        }
    }

    fn current_rate(&self) -> Option<f64> {
        self.active
            .as_ref()
            .filter(|(_, cancel)| !cancel.load(Ordering::Acquire))
            .map(|(rate, _)| *rate)
    }
}

fn produce(
    model: FieldModel,
    rate_hz: f64,
    limit: Option<u64>,
    tx: SyncSender<Sample>,
    cancel: Arc<AtomicBool>,
) {
    let mut rng = rand::thread_rng();
    let period = Duration::from_secs_f64(1.0 / rate_hz);
    let start = Instant::now();
    let mut emitted: u64 = 0;
    let mut sent: u64 = 0;
    let mut overruns: u64 = 0;

    while !cancel.load(Ordering::Acquire) {
        let due = (start.elapsed().as_secs_f64() * rate_hz).floor() as u64;
        let lag = due.saturating_sub(emitted);
        if lag > QUEUE_DEPTH as u64 {
            let skipped = lag - QUEUE_DEPTH as u64;
            emitted += skipped;
            overruns += skipped;
        }

        let burst_end = due.min(emitted + MAX_BURST);
        while emitted < burst_end {
            if limit.is_some_and(|limit| sent >= limit) {
                return;
            }
            let t = emitted as f64 / rate_hz;
            match tx.try_send(model.sample_at(t, &mut rng)) {
                Ok(()) => sent += 1,
                Err(TrySendError::Full(_)) => overruns += 1,
                Err(TrySendError::Disconnected(_)) => return,
            }
            emitted += 1;
        }
        if emitted < due {
            continue;
        }
        thread::sleep(period.min(MAX_PRODUCER_SLEEP));
    }
    if overruns > 0 {
        log::debug!("simulated source dropped {overruns} samples the reader did not keep up with");
    }
}
