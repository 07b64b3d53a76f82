//! Clock sources, the clock-memory table and cycle-time bookkeeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Time source driving timers, clock memory, cycle measurement and padding.
pub trait Clock: Send {
    /// Monotonic time since an arbitrary, fixed origin.
    fn now(&self) -> Duration;

    /// Blocks for `duration`.
    fn sleep(&mut self, duration: Duration);
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Starts a clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Deterministic clock advanced explicitly by the host.
///
/// Clones share one time base, so a test can keep a handle while the CPU
/// owns another. `sleep` advances the shared time instead of blocking.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock reading zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves time forward.
    #[allow(clippy::cast_possible_truncation)]
    pub fn advance(&self, duration: Duration) {
        self.nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Sets the absolute reading.
    #[allow(clippy::cast_possible_truncation)]
    pub fn set(&self, now: Duration) {
        self.nanos.store(now.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }

    fn sleep(&mut self, duration: Duration) {
        self.advance(duration);
    }
}

/// Clock-memory periods in milliseconds, bit 0 first.
pub const CLOCK_MEMORY_PERIODS_MS: [u64; 8] = [100, 200, 400, 500, 800, 1000, 1600, 2000];

/// Clock-memory byte at `now`: bit n is high during the second half of
/// each period n.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn clock_memory_byte(now: Duration) -> u8 {
    let millis = now.as_millis() as u64;
    CLOCK_MEMORY_PERIODS_MS
        .iter()
        .enumerate()
        .fold(0u8, |byte, (bit, period)| {
            if millis % period >= period / 2 {
                byte | (1 << bit)
            } else {
                byte
            }
        })
}

/// Cycle duration statistics since the last startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CycleTimes {
    /// Completed OB1 cycles.
    pub count: u64,
    /// Last cycle duration.
    pub last: Duration,
    /// Shortest cycle.
    pub min: Duration,
    /// Longest cycle.
    pub max: Duration,
}

impl CycleTimes {
    /// Folds one measured cycle into the statistics.
    pub fn record(&mut self, elapsed: Duration) {
        self.min = if self.count == 0 {
            elapsed
        } else {
            self.min.min(elapsed)
        };
        self.max = self.max.max(elapsed);
        self.last = elapsed;
        self.count = self.count.saturating_add(1);
    }

    /// True before the first cycle completed.
    #[must_use]
    pub const fn is_first(&self) -> bool {
        self.count == 0
    }
}

/// Saturating conversion to the 16-bit millisecond fields of OB temp data.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn millis_u16(duration: Duration) -> u16 {
    duration.as_millis().min(u128::from(u16::MAX)) as u16
}
