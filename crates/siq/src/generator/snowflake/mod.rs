mod atomic;
mod interface;
mod lock;

pub use atomic::*;
pub use interface::*;
pub use lock::*;

use core::time::Duration;

use crate::{Error, IdGenStatus, RegressionPolicy, Result, SnowflakeId, SnowflakeSettings, Stall, TimeSource};

/// Milliseconds elapsed on `time` since `epoch`, checked against the 42-bit
/// timestamp field. A clock reading before the epoch counts as 0.
fn current_millis(time: &impl TimeSource, epoch: Duration) -> Result<u64> {
    let millis = time.now().saturating_sub(epoch).as_millis();
    match u64::try_from(millis) {
        Ok(millis) if millis <= SnowflakeId::TIMESTAMP_MASK => Ok(millis),
        _ => Err(Error::FieldOverflow {
            field: "timestamp",
            value: millis,
            bits: 42,
        }),
    }
}

#[cold]
#[inline(never)]
fn cold_exhausted(tick: u64) -> IdGenStatus<SnowflakeId> {
    IdGenStatus::Pending {
        yield_for: Duration::from_millis(1),
        stall: Stall::SerialExhausted { tick },
    }
}

#[cold]
#[inline(never)]
fn cold_clock_behind(
    settings: &SnowflakeSettings,
    now: u64,
    last: u64,
) -> Result<IdGenStatus<SnowflakeId>> {
    match settings.on_regression {
        RegressionPolicy::FailFast => {
            #[cfg(feature = "tracing")]
            tracing::warn!(now, last, "clock moved backwards, failing fast");
            Err(Error::ClockRegression { now, last })
        }
        RegressionPolicy::Block => Ok(IdGenStatus::Pending {
            yield_for: Duration::from_millis(last - now),
            stall: Stall::ClockBehind { now, last },
        }),
    }
}
