use core::time::Duration;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::TimeSource;

/// The operating system wall clock.
///
/// Reads `SystemTime` on every call, so it follows NTP steps in both
/// directions. Generators guard against the backward case; use
/// [`MonotonicClock`] to avoid it entirely.
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> Duration {
        // a clock set before 1970 reads as the epoch itself
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }
}

/// A wall clock that never runs backwards.
///
/// The wall-clock offset is sampled once at construction; every later
/// reading adds the time elapsed on `Instant`, which the OS guarantees to be
/// monotonic. External adjustments to the system clock after construction
/// are ignored, so long-lived processes drift with the hardware timer rather
/// than with NTP.
///
/// Clones share the same anchor and therefore agree with each other.
///
/// # Example
///
/// ```
/// use siq::{MonotonicClock, TimeSource};
///
/// let clock = MonotonicClock::new();
/// let a = clock.now();
/// let b = clock.now();
/// assert!(b >= a);
/// ```
#[derive(Copy, Clone, Debug)]
pub struct MonotonicClock {
    anchor_wall: Duration,
    anchor: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::anchored_at(SystemClock.now())
    }

    /// Anchors the clock so that "now" reads as `wall`.
    pub fn anchored_at(wall: Duration) -> Self {
        Self {
            anchor_wall: wall,
            anchor: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    fn now(&self) -> Duration {
        self.anchor_wall.saturating_add(self.anchor.elapsed())
    }
}
