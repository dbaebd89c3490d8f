use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic clock used for every wait and reaction-time measurement.
pub trait Timer: Clone + Send + Sync {
    type Timestamp: Copy + Clone + Send + Sync;
    fn now(&self) -> Self::Timestamp;
    fn elapsed(&self, ts: Self::Timestamp) -> Duration;
    fn sleep(&self, d: Duration);
    fn record_frame(&mut self, d: Duration);
    fn pacing_stats(&self) -> PacingStats;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PacingStats {
    pub frames: usize,
    pub average_frame_time_ns: f64,
    pub jitter_ns: f64,
    pub min_frame_time_ns: f64,
    pub max_frame_time_ns: f64,
    pub effective_fps: f64,
}

/// Bounded window of recent frame durations.
#[derive(Debug, Clone)]
pub struct FrameLog {
    samples: VecDeque<Duration>,
    capacity: usize,
}

impl FrameLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, d: Duration) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(d);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn stats(&self) -> PacingStats {
        if self.samples.is_empty() {
            return PacingStats::default();
        }
        let times: Vec<f64> = self.samples.iter().map(|d| d.as_nanos() as f64).collect();
        let count = times.len() as f64;
        let avg = times.iter().sum::<f64>() / count;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / count;
        let min = times.iter().copied().fold(f64::INFINITY, f64::min);
        let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        PacingStats {
            frames: times.len(),
            average_frame_time_ns: avg,
            jitter_ns: var.sqrt(),
            min_frame_time_ns: min,
            max_frame_time_ns: max,
            effective_fps: if avg > 0.0 { 1e9 / avg } else { 0.0 },
        }
    }
}

impl Default for FrameLog {
    fn default() -> Self {
        Self::with_capacity(1000)
    }
}

/// Wall clock backed by `Instant`, nanoseconds since construction.
#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    pub start: Instant,
    pub frames: FrameLog,
}

impl Timer for HighPrecisionTimer {
    type Timestamp = u64;
    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }
    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }
    fn sleep(&self, d: Duration) {
        self.high_precision_sleep(d)
    }
    fn record_frame(&mut self, d: Duration) {
        self.frames.record(d);
    }
    fn pacing_stats(&self) -> PacingStats {
        self.frames.stats()
    }
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            frames: FrameLog::default(),
        }
    }

    pub fn high_precision_sleep(&self, duration: Duration) {
        #[cfg(target_os = "linux")]
        self.linux_sleep(duration);
        #[cfg(not(target_os = "linux"))]
        std::thread::sleep(duration);
    }

    #[cfg(target_os = "linux")]
    fn linux_sleep(&self, duration: Duration) {
        use libc::{CLOCK_MONOTONIC, clock_nanosleep, timespec};

        let req = timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };

        unsafe {
            clock_nanosleep(CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut());
        }
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Clock that only moves when told to. Clones share the same clock.
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    now_ns: Arc<AtomicU64>,
    frames: FrameLog,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, d: Duration) {
        self.now_ns
            .fetch_add(d.as_nanos() as u64, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Timer for ManualTimer {
    type Timestamp = u64;
    fn now(&self) -> u64 {
        self.now_ns.load(Ordering::SeqCst)
    }
    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }
    /// Sleeping jumps the shared clock forward instead of blocking.
    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
    fn record_frame(&mut self, d: Duration) {
        self.frames.record(d);
    }
    fn pacing_stats(&self) -> PacingStats {
        self.frames.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clones_share_the_clock() {
        let timer = ManualTimer::new();
        let observer = timer.clone();
        timer.advance_ms(250);
        assert_eq!(observer.now(), 250_000_000);
        observer.sleep(Duration::from_millis(50));
        assert_eq!(timer.now(), 300_000_000);
        assert_eq!(timer.elapsed(100_000_000), Duration::from_millis(200));
    }

    #[test]
    fn elapsed_saturates_for_future_stamps() {
        let timer = ManualTimer::new();
        assert_eq!(timer.elapsed(5), Duration::ZERO);
    }

    #[test]
    fn frame_log_is_bounded() {
        let mut log = FrameLog::with_capacity(3);
        for ms in [10, 20, 30, 40] {
            log.record(Duration::from_millis(ms));
        }
        let stats = log.stats();
        assert_eq!(stats.frames, 3);
        assert_eq!(stats.min_frame_time_ns, 20_000_000.0);
        assert_eq!(stats.max_frame_time_ns, 40_000_000.0);
        assert!((stats.average_frame_time_ns - 30_000_000.0).abs() < 1.0);
    }

    #[test]
    fn empty_log_reports_zeroes() {
        assert_eq!(FrameLog::default().stats(), PacingStats::default());
    }
}
