use core::time::Duration;

use crate::Error;

/// Why a poll could not produce an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stall {
    /// Every serial of `tick` has been issued; the clock must advance.
    SerialExhausted {
        /// The exhausted tick.
        tick: u64,
    },
    /// The clock reads `now`, earlier than the `last` tick already issued.
    ClockBehind { now: u64, last: u64 },
}

impl From<Stall> for Error {
    fn from(stall: Stall) -> Self {
        match stall {
            Stall::SerialExhausted { tick } => Self::SerialExhausted { tick },
            Stall::ClockBehind { now, last } => Self::ClockRegression { now, last },
        }
    }
}

/// Represents the result of polling a generator for a new id.
///
/// - [`IdGenStatus::Ready`] indicates a new id was generated.
/// - [`IdGenStatus::Pending`] means the generator cannot issue an id before
///   the clock moves on, and says how long to back off and why.
///
/// This allows non-blocking generation loops and clean backoff strategies.
///
/// # Example
///
/// ```
/// use core::time::Duration;
/// use siq::{GeneratorConfig, IdGenStatus, SiqGenerator, SiqType, TimeSource};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn now(&self) -> Duration {
///         Duration::from_secs(1_577_833_200)
///     }
/// }
///
/// let generator = SiqGenerator::with_time(GeneratorConfig::default(), FixedTime).unwrap();
/// match generator.try_poll_id(SiqType::Content).unwrap() {
///     IdGenStatus::Ready { id } => println!("id: {id}"),
///     IdGenStatus::Pending { yield_for, stall } => {
///         println!("back off for {yield_for:?}: {stall:?}")
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenStatus<ID> {
    /// A unique id was generated and is ready to use.
    Ready {
        /// The generated id.
        id: ID,
    },
    /// No id could be generated at the current clock reading.
    Pending {
        /// How long to wait before polling again.
        yield_for: Duration,
        /// What is holding the generator back.
        stall: Stall,
    },
}

impl<ID> IdGenStatus<ID> {
    /// Returns the id if one was generated.
    pub fn ready(self) -> Option<ID> {
        match self {
            Self::Ready { id } => Some(id),
            Self::Pending { .. } => None,
        }
    }

    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}
