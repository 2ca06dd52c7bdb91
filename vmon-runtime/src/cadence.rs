use std::time::{Duration, Instant};

/// Fixed wall-clock period, independent of how fast data arrives.
#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    interval: Duration,
    next_due: Instant,
}

impl Cadence {
    /// First firing is due immediately.
    pub fn new(interval: Duration, start: Instant) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            next_due: start,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_due
    }

    /// Schedules the next firing. A loop that fell behind resumes from `now`
    /// instead of firing a burst of catch-up ticks.
    pub fn mark_fired(&mut self, now: Instant) {
        self.next_due += self.interval;
        if self.next_due <= now {
            self.next_due = now + self.interval;
        }
    }

    pub fn time_until(&self, now: Instant) -> Duration {
        self.next_due.saturating_duration_since(now)
    }
}

#[cfg(test)]
mod tests {
    use super::Cadence;
    use std::time::{Duration, Instant};

    #[test]
    fn fires_on_fixed_grid() {
        let start = Instant::now();
        let mut cadence = Cadence::new(Duration::from_millis(100), start);
        assert!(cadence.is_due(start));
        cadence.mark_fired(start);
        assert!(!cadence.is_due(start + Duration::from_millis(99)));
        assert!(cadence.is_due(start + Duration::from_millis(100)));
        cadence.mark_fired(start + Duration::from_millis(130));
        assert_eq!(cadence.next_due(), start + Duration::from_millis(200));
    }

    #[test]
    fn skips_missed_ticks_instead_of_bursting() {
        let start = Instant::now();
        let mut cadence = Cadence::new(Duration::from_millis(100), start);
        cadence.mark_fired(start);
        let late = start + Duration::from_millis(750);
        cadence.mark_fired(late);
        assert_eq!(cadence.next_due(), late + Duration::from_millis(100));
        assert_eq!(cadence.time_until(late), Duration::from_millis(100));
    }
}
