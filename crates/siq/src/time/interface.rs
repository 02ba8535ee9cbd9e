use core::time::Duration;
use std::sync::Arc;

/// Twitter epoch: Thursday, November 4, 2010 1:42:54.657 UTC
pub const TWITTER_EPOCH: Duration = Duration::from_millis(1_288_834_974_657);

/// Discord epoch: Thursday, January 1, 2015 00:00:00 UTC
pub const DISCORD_EPOCH: Duration = Duration::from_millis(1_420_070_400_000);

/// Instagram epoch: Saturday, January 1, 2011 00:00:00 UTC
pub const INSTAGRAM_EPOCH: Duration = Duration::from_millis(1_293_840_000_000);

/// Mastodon uses standard UNIX epoch: Thursday, January 1, 1970 00:00:00 UTC
pub const MASTODON_EPOCH: Duration = Duration::from_millis(0);

/// A source of the current instant, as an offset from the Unix epoch.
///
/// Generators read the clock once per poll and derive their own tick from
/// it: SIQ generators in 1/65536 s units, Snowflake generators in
/// milliseconds since their configured epoch. Swap in a mock to drive
/// exhaustion and regression deterministically.
///
/// # Example
///
/// ```
/// use core::time::Duration;
/// use siq::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn now(&self) -> Duration {
///         Duration::from_secs(1_577_833_200)
///     }
/// }
///
/// assert_eq!(FixedTime.now().as_secs(), 1_577_833_200);
/// ```
pub trait TimeSource {
    /// Time elapsed since 1970-01-01 00:00:00 UTC.
    fn now(&self) -> Duration;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn now(&self) -> Duration {
        (**self).now()
    }
}
