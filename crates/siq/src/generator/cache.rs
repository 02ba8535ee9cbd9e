use core::time::Duration;
use std::collections::VecDeque;

use crate::{Result, Siq, SiqGenerator, SiqType, SystemClock, TimeSource, Timestamp};

/// Hands out ids of a single category from batches minted ahead of time.
///
/// Each refill takes `size` ids from the generator in one go. A batch whose
/// newest id is more than `max_age` old is thrown away instead of served, so
/// a cached id never lags the clock by much more than that.
///
/// Ids from one cache are strictly increasing. They are not ordered against
/// ids other callers take from the same generator while a batch is open.
///
/// ```
/// use std::time::Duration;
///
/// use siq::{GeneratorConfig, SiqCache, SiqGenerator, SiqType};
///
/// let generator = SiqGenerator::new(GeneratorConfig::new("example.com")).unwrap();
/// let mut cache = SiqCache::new(&generator, SiqType::Message)
///     .with_size(16)
///     .with_max_age(Duration::from_secs(60));
///
/// let a = cache.next_id().unwrap();
/// let b = cache.next_id().unwrap();
/// assert!(a < b);
/// assert_eq!(cache.len(), 14);
/// ```
pub struct SiqCache<'g, T = SystemClock>
where
    T: TimeSource,
{
    generator: &'g SiqGenerator<T>,
    ty: SiqType,
    size: usize,
    max_age: u64,
    cache: VecDeque<Siq>,
}

impl<'g, T> SiqCache<'g, T>
where
    T: TimeSource,
{
    pub const DEFAULT_SIZE: usize = 64;
    /// 1024 ticks, about 15.6 ms.
    pub const DEFAULT_MAX_AGE: u64 = 1024;

    pub fn new(generator: &'g SiqGenerator<T>, ty: SiqType) -> Self {
        Self {
            generator,
            ty,
            size: Self::DEFAULT_SIZE,
            max_age: Self::DEFAULT_MAX_AGE,
            cache: VecDeque::new(),
        }
    }

    /// Batch size; zero is treated as one.
    #[must_use]
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size.max(1);
        self
    }

    /// Longest a batch may sit before it is discarded, rounded down to whole
    /// ticks.
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        let ticks = max_age.as_nanos() * u128::from(Timestamp::UNITS_PER_SECOND) / 1_000_000_000;
        self.max_age = u64::try_from(ticks).unwrap_or(u64::MAX);
        self
    }

    pub const fn siq_type(&self) -> SiqType {
        self.ty
    }

    /// Ids left in the current batch.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Drops the current batch; the next call mints a fresh one.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Takes the next cached id, minting a new batch when the current one
    /// is empty or stale.
    ///
    /// # Errors
    ///
    /// Anything [`SiqGenerator::next_ids`] returns. A failed refill leaves
    /// the cache empty.
    pub fn next_id(&mut self) -> Result<Siq> {
        if let Some(newest) = self.cache.back() {
            let now = self.generator.current_tick()?;
            if newest.tick().saturating_add(self.max_age) < now {
                #[cfg(feature = "tracing")]
                tracing::trace!(
                    dropped = self.cache.len(),
                    ty = %self.ty,
                    "discarding stale id batch"
                );
                self.cache.clear();
            }
        }

        loop {
            if let Some(id) = self.cache.pop_front() {
                return Ok(id);
            }
            self.cache.extend(self.generator.next_ids(self.ty, self.size)?);
        }
    }
}
