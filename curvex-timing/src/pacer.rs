use crate::timer::Timer;
use std::time::Duration;

/// Holds frames to a fixed interval by sleeping off whatever time is left.
///
/// A frame that overruns its slot restarts the schedule from the moment it
/// finished, so one slow frame never causes a burst of short ones.
#[derive(Debug, Clone)]
pub struct FramePacer {
    interval_ns: u64,
    next_ns: Option<u64>,
    missed: usize,
}

impl FramePacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval_ns: interval.as_nanos().min(u64::MAX as u128) as u64,
            next_ns: None,
            missed: 0,
        }
    }

    /// Pacer for a display refresh rate. `None` for rates that are not positive.
    pub fn from_hz(hz: f64) -> Option<Self> {
        (hz.is_finite() && hz > 0.0).then(|| Self::new(Duration::from_secs_f64(1.0 / hz)))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_nanos(self.interval_ns)
    }

    /// Frames that finished after their slot had already passed.
    pub fn missed(&self) -> usize {
        self.missed
    }

    /// Sleeps until the current frame's slot ends and returns how long it slept.
    pub fn wait<T: Timer<Timestamp = u64>>(&mut self, timer: &T) -> Duration {
        let now = timer.now();
        let Some(deadline) = self.next_ns else {
            self.next_ns = Some(now.saturating_add(self.interval_ns));
            return Duration::ZERO;
        };

        if now >= deadline {
            if now > deadline {
                self.missed += 1;
            }
            self.next_ns = Some(now.saturating_add(self.interval_ns));
            return Duration::ZERO;
        }

        let remaining = Duration::from_nanos(deadline - now);
        timer.sleep(remaining);
        self.next_ns = Some(deadline.saturating_add(self.interval_ns));
        remaining
    }
}
