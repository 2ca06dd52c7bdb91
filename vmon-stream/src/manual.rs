use crate::source::{StreamSource, Subscription};
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use vmon_core::{config::validate_positive, MonitorResult, Sample};

type FeedSlot = Arc<Mutex<Option<Sender<Sample>>>>;

/// A source driven by hand through its [`ManualFeed`]. Nothing is produced
/// unless the feed pushes it, which makes timing-free runs reproducible.
pub struct ManualSource {
    slot: FeedSlot,
    rate_hz: Option<f64>,
    subscriptions: Arc<Mutex<Vec<f64>>>,
}

#[derive(Clone)]
pub struct ManualFeed {
    slot: FeedSlot,
    subscriptions: Arc<Mutex<Vec<f64>>>,
}

impl ManualSource {
    pub fn channel() -> (Self, ManualFeed) {
        let slot: FeedSlot = Arc::new(Mutex::new(None));
        let subscriptions = Arc::new(Mutex::new(Vec::new()));
        let feed = ManualFeed {
            slot: slot.clone(),
            subscriptions: subscriptions.clone(),
        };
        (
            Self {
                slot,
                rate_hz: None,
                subscriptions,
            },
            feed,
        )
    }
}

impl StreamSource for ManualSource {
    fn subscribe(&mut self, rate_hz: f64) -> MonitorResult<Subscription> {
        let rate_hz = validate_positive("sample_rate_hz", rate_hz)?;
        let (tx, rx) = mpsc::channel();
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(rate_hz);
        self.rate_hz = Some(rate_hz);
        Ok(Subscription::new(
            rate_hz,
            rx,
            Arc::new(AtomicBool::new(false)),
            None,
        ))
    }

    fn unsubscribe(&mut self) {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.rate_hz = None;
    }

    fn current_rate(&self) -> Option<f64> {
        self.rate_hz
    }
}

impl ManualFeed {
    /// Pushes one sample to the live subscription; false when there is none.
    pub fn push(&self, sample: Sample) -> bool {
        match self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(tx) => tx.send(sample).is_ok(),
            None => false,
        }
    }

    /// Drops the producer end, so the subscriber sees a disconnect.
    pub fn disconnect(&self) {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Rates of every subscription opened so far, oldest first.
    pub fn subscriptions(&self) -> Vec<f64> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
