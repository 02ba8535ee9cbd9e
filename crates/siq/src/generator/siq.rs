use core::time::Duration;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    DomainHash, Error, GeneratorConfig, GeneratorSettings, IdGenStatus, Qualifier,
    QualifierProfile, RegressionPolicy, Result, Siq, SiqFields, SiqType, Stall, SystemClock,
    TimeSource, Timestamp,
    generator::{
        allocator::{Allocation, SerialAllocator},
        mutex::{Mutex, lock},
        wait::blocking_next_id,
    },
    id::WORD_BITS,
};

#[cfg(feature = "cache-padded")]
type State = crossbeam_utils::CachePadded<Mutex<SerialAllocator>>;
#[cfg(not(feature = "cache-padded"))]
type State = Mutex<SerialAllocator>;

fn new_state(allocator: SerialAllocator) -> State {
    #[cfg(feature = "cache-padded")]
    {
        crossbeam_utils::CachePadded::new(Mutex::new(allocator))
    }
    #[cfg(not(feature = "cache-padded"))]
    {
        Mutex::new(allocator)
    }
}

/// A thread-safe SIQ generator.
///
/// Shard, domain hash and qualifier profile are fixed at construction; the
/// serial state sits behind a [`Mutex`] so that concurrent callers never
/// observe the same `(tick, word)` pair. Share it across threads by
/// reference or inside an `Arc`.
///
/// Ticks are 1/65536 s, so one generator issues up to 8192 content ids (or
/// 2048 account ids) every ~15 µs before it has to wait for the clock.
///
/// ## See Also
/// - [`LockSnowflakeGenerator`](crate::LockSnowflakeGenerator)
pub struct SiqGenerator<T = SystemClock>
where
    T: TimeSource,
{
    settings: GeneratorSettings,
    state: State,
    time: T,
}

impl SiqGenerator<SystemClock> {
    /// Creates a generator reading the system wall clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `config` does not validate.
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        Self::with_time(config, SystemClock)
    }
}

impl<T> SiqGenerator<T>
where
    T: TimeSource,
{
    /// Creates a generator driven by `time`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `config` does not validate; no
    /// generator is created in that case.
    pub fn with_time(config: GeneratorConfig, time: T) -> Result<Self> {
        Ok(Self::from_settings(config.validate()?, time))
    }

    pub fn from_settings(settings: GeneratorSettings, time: T) -> Self {
        Self {
            settings,
            state: new_state(SerialAllocator::new()),
            time,
        }
    }

    /// Continues after `last`, an id issued earlier by this shard (for
    /// example the newest id found in storage after a restart).
    ///
    /// Until the clock passes `last`'s tick the generator reports a
    /// regression instead of issuing ids that could sort before it.
    #[must_use]
    pub fn resume_after(mut self, last: Siq) -> Self {
        self.state = new_state(SerialAllocator::resume(last.tick(), last.word()));
        self
    }

    pub const fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    pub const fn shard(&self) -> u8 {
        self.settings.shard
    }

    pub const fn domain_hash(&self) -> DomainHash {
        self.settings.domain
    }

    pub const fn profile(&self) -> QualifierProfile {
        self.settings.profile
    }

    /// Attempts to generate an id of category `ty` without blocking.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRegression`] under [`RegressionPolicy::FailFast`]
    /// - [`Error::FieldOverflow`] if the clock reads past year 36812
    /// - [`Error::LockPoisoned`] if the std mutex is poisoned
    pub fn try_poll_id(&self, ty: SiqType) -> Result<IdGenStatus<Siq>> {
        self.try_poll_with(self.settings.profile.qualifier(ty))
    }

    /// Attempts to generate an id carrying a caller-supplied qualifier.
    ///
    /// The qualifier is stored verbatim; decoding it back to a category is
    /// the caller's business. It must be one the generator's profile can
    /// split back off the low word (see [`QualifierProfile::fits`]).
    ///
    /// # Errors
    ///
    /// - [`Error::QualifierMismatch`] if the profile would decode a
    ///   different qualifier width
    /// - anything [`Self::try_poll_id`] returns
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll_with(&self, qualifier: Qualifier) -> Result<IdGenStatus<Siq>> {
        if !self.settings.profile.fits(qualifier) {
            return Err(Error::QualifierMismatch {
                value: qualifier.value(),
                bits: qualifier.bits(),
                profile: self.settings.profile,
            });
        }

        // the clock read stays inside the critical section
        let (timestamp, allocation) = {
            let mut state = lock(&self.state)?;
            let timestamp = Timestamp::from_duration(self.time.now())?;
            let allocation = state.allocate(
                timestamp.to_ticks(),
                u16::from(qualifier.value()),
                qualifier.bits(),
                WORD_BITS,
            );
            (timestamp, allocation)
        };
        let now = timestamp.to_ticks();

        match allocation {
            Allocation::Issued { serial } => {
                let id = SiqFields {
                    timestamp,
                    shard: self.settings.shard,
                    domain: self.settings.domain,
                    serial,
                    qualifier,
                }
                .pack()?;
                Ok(IdGenStatus::Ready { id })
            }
            Allocation::Exhausted { tick } => Ok(Self::cold_exhausted(tick)),
            Allocation::Behind { last } => self.cold_clock_behind(now, last),
        }
    }

    /// Generates an id of category `ty`, waiting out exhaustion and clock
    /// regression up to the configured `max_wait`.
    ///
    /// # Errors
    ///
    /// - [`Error::SerialExhausted`] / [`Error::ClockRegression`] once the
    ///   wait budget is spent
    /// - anything [`Self::try_poll_id`] returns
    pub fn next_id(&self, ty: SiqType) -> Result<Siq> {
        self.next_id_with(self.settings.profile.qualifier(ty))
    }

    /// Blocking counterpart of [`Self::try_poll_with`].
    ///
    /// # Errors
    ///
    /// See [`Self::next_id`].
    pub fn next_id_with(&self, qualifier: Qualifier) -> Result<Siq> {
        blocking_next_id(|| self.try_poll_with(qualifier), self.settings.max_wait)
    }

    /// Generates `n` ids of category `ty` in increasing order.
    ///
    /// # Errors
    ///
    /// See [`Self::next_id`]. Ids generated before the failure are dropped.
    pub fn next_ids(&self, ty: SiqType, n: usize) -> Result<Vec<Siq>> {
        let qualifier = self.settings.profile.qualifier(ty);
        (0..n).map(|_| self.next_id_with(qualifier)).collect()
    }

    /// Current clock reading in ticks.
    pub(crate) fn current_tick(&self) -> Result<u64> {
        Ok(Timestamp::from_duration(self.time.now())?.to_ticks())
    }

    /// Splits an id into its fields under this generator's profile.
    pub const fn decode(&self, id: Siq) -> SiqFields {
        id.unpack(self.settings.profile)
    }

    #[cold]
    #[inline(never)]
    fn cold_exhausted(tick: u64) -> IdGenStatus<Siq> {
        IdGenStatus::Pending {
            yield_for: Timestamp::ticks_to_duration(1),
            stall: Stall::SerialExhausted { tick },
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(&self, now: u64, last: u64) -> Result<IdGenStatus<Siq>> {
        match self.settings.on_regression {
            RegressionPolicy::FailFast => {
                #[cfg(feature = "tracing")]
                tracing::warn!(now, last, "clock moved backwards, failing fast");
                Err(Error::ClockRegression { now, last })
            }
            RegressionPolicy::Block => Ok(IdGenStatus::Pending {
                yield_for: Timestamp::ticks_to_duration(last - now).max(Duration::from_nanos(1)),
                stall: Stall::ClockBehind { now, last },
            }),
        }
    }
}
