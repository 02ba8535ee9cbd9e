use crate::{IdGenStatus, Result, SnowflakeId, SnowflakeSettings, generator::wait::blocking_next_id};

/// A minimal interface for generating Snowflake ids.
pub trait SnowflakeGenerator {
    /// Validated settings the generator was built from.
    fn settings(&self) -> &SnowflakeSettings;

    /// Attempts to generate the next id without blocking.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRegression`](crate::Error::ClockRegression) under
    ///   [`RegressionPolicy::FailFast`](crate::RegressionPolicy::FailFast)
    /// - [`Error::FieldOverflow`](crate::Error::FieldOverflow) once the
    ///   42-bit timestamp runs out
    /// - [`Error::LockPoisoned`](crate::Error::LockPoisoned) for a poisoned
    ///   std mutex
    fn try_poll_id(&self) -> Result<IdGenStatus<SnowflakeId>>;

    /// Generates the next id, waiting out exhaustion and clock regression up
    /// to the configured `max_wait`.
    ///
    /// # Errors
    ///
    /// [`Error::SerialExhausted`](crate::Error::SerialExhausted) or
    /// [`Error::ClockRegression`](crate::Error::ClockRegression) once the
    /// wait budget is spent, plus anything [`Self::try_poll_id`] returns.
    fn next_id(&self) -> Result<SnowflakeId> {
        blocking_next_id(|| self.try_poll_id(), self.settings().max_wait)
    }
}
