#[cfg(feature = "tracing")]
use tracing::instrument;

use super::{cold_clock_behind, cold_exhausted, current_millis};
use crate::{
    IdGenStatus, Result, SnowflakeConfig, SnowflakeGenerator, SnowflakeId, SnowflakeSettings,
    SystemClock, TimeSource,
    generator::{
        allocator::{Allocation, SerialAllocator},
        mutex::{Mutex, lock},
    },
};

const SERIAL_BITS: u32 = 12;

/// A lock-based Snowflake generator suitable for multi-threaded
/// environments.
///
/// Serial state sits behind a [`Mutex`] and follows the same allocation
/// rules as [`SiqGenerator`](crate::SiqGenerator), with milliseconds since
/// the configured epoch as the tick.
///
/// ## Recommended When
/// - Fair access across threads is important
/// - Your target doesn't support 64-bit atomics
///
/// ## See Also
/// - [`AtomicSnowflakeGenerator`](crate::AtomicSnowflakeGenerator)
pub struct LockSnowflakeGenerator<T = SystemClock>
where
    T: TimeSource,
{
    settings: SnowflakeSettings,
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<Mutex<SerialAllocator>>,
    #[cfg(not(feature = "cache-padded"))]
    state: Mutex<SerialAllocator>,
    time: T,
}

impl LockSnowflakeGenerator<SystemClock> {
    /// # Errors
    ///
    /// Returns [`Error::Configuration`](crate::Error::Configuration) if
    /// `config` does not validate against the current time.
    pub fn new(config: &SnowflakeConfig) -> Result<Self> {
        Self::with_time(config, SystemClock)
    }
}

impl<T> LockSnowflakeGenerator<T>
where
    T: TimeSource,
{
    /// # Errors
    ///
    /// Returns [`Error::Configuration`](crate::Error::Configuration) if
    /// `config` does not validate against `time`.
    pub fn with_time(config: &SnowflakeConfig, time: T) -> Result<Self> {
        let settings = config.validate(time.now())?;
        Ok(Self::from_settings(settings, time))
    }

    pub fn from_settings(settings: SnowflakeSettings, time: T) -> Self {
        Self::with_state(settings, SerialAllocator::new(), time)
    }

    fn with_state(settings: SnowflakeSettings, allocator: SerialAllocator, time: T) -> Self {
        Self {
            settings,
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(Mutex::new(allocator)),
            #[cfg(not(feature = "cache-padded"))]
            state: Mutex::new(allocator),
            time,
        }
    }

    /// Continues after `last`, an id issued earlier with the same worker
    /// and shard.
    #[must_use]
    pub fn resume_after(self, last: SnowflakeId) -> Self {
        let allocator = SerialAllocator::resume(last.timestamp(), last.serial());
        Self::with_state(self.settings, allocator, self.time)
    }

    /// Attempts to generate the next id.
    ///
    /// Returns [`IdGenStatus::Pending`] if the serial space of the current
    /// millisecond is used up or the clock is behind.
    ///
    /// # Example
    /// ```
    /// use siq::{IdGenStatus, LockSnowflakeGenerator, SnowflakeConfig, TWITTER_EPOCH};
    ///
    /// let generator = LockSnowflakeGenerator::new(&SnowflakeConfig::new(TWITTER_EPOCH)).unwrap();
    ///
    /// let id = loop {
    ///     match generator.try_poll_id() {
    ///         Ok(IdGenStatus::Ready { id }) => break id,
    ///         Ok(IdGenStatus::Pending { yield_for, .. }) => std::thread::sleep(yield_for),
    ///         Err(e) => panic!("generator error: {e}"),
    ///     }
    /// };
    /// assert_eq!(id.serial(), 0);
    /// ```
    ///
    /// # Errors
    ///
    /// See [`SnowflakeGenerator::try_poll_id`].
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll_id(&self) -> Result<IdGenStatus<SnowflakeId>> {
        let (now, allocation) = {
            let mut state = lock(&self.state)?;
            let now = current_millis(&self.time, self.settings.epoch)?;
            (now, state.allocate(now, 0, 0, SERIAL_BITS))
        };

        match allocation {
            Allocation::Issued { serial } => Ok(IdGenStatus::Ready {
                id: SnowflakeId::from_masked(now, self.settings.worker, self.settings.shard, serial),
            }),
            Allocation::Exhausted { tick } => Ok(cold_exhausted(tick)),
            Allocation::Behind { last } => cold_clock_behind(&self.settings, now, last),
        }
    }
}

impl<T> SnowflakeGenerator for LockSnowflakeGenerator<T>
where
    T: TimeSource,
{
    fn settings(&self) -> &SnowflakeSettings {
        &self.settings
    }

    fn try_poll_id(&self) -> Result<IdGenStatus<SnowflakeId>> {
        self.try_poll_id()
    }
}
