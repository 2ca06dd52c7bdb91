use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// Below this, sleeping overshoots more than spinning costs.
const SPIN_THRESHOLD: Duration = Duration::from_micros(500);

pub(crate) struct TickClock;

impl TickClock {
    pub(crate) fn sleep_until(deadline: Instant) {
        let now = Instant::now();
        if deadline <= now {
            return;
        }
        let remaining = deadline - now;
        if remaining < SPIN_THRESHOLD {
            while Instant::now() < deadline {
                std::hint::spin_loop();
            }
        } else {
            thread::sleep(remaining);
        }
    }
}

pub(crate) struct RuntimeThread;

impl RuntimeThread {
    /// Spawns a named thread and returns once it is running `f`.
    pub(crate) fn spawn<F>(name: &str, f: F) -> Result<thread::JoinHandle<()>, String>
    where
        F: FnOnce() + Send + 'static,
    {
        let (started_tx, started_rx) = mpsc::sync_channel::<()>(1);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let _ = started_tx.send(());
                f();
            })
            .map_err(|e| format!("failed to spawn {name}: {e}"))?;

        if started_rx.recv().is_err() {
            let _ = handle.join();
            return Err(format!("{name} exited before starting"));
        }
        Ok(handle)
    }
}
