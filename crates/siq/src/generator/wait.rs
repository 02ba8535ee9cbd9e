use core::time::Duration;
use std::time::Instant;

use crate::{IdGenStatus, Result};

/// Blocks the current thread for `dur` by sleeping, yielding, or spinning,
/// whichever fits the time left.
pub(crate) fn block_for(dur: Duration) {
    let start = Instant::now();

    loop {
        let Some(left) = dur.checked_sub(start.elapsed()) else {
            break;
        };

        if left > Duration::from_micros(500) {
            std::thread::sleep(left);
        } else if left > Duration::from_micros(1) {
            std::thread::yield_now();
        } else {
            core::hint::spin_loop();
        }
    }
}

/// Polls until an id is ready.
///
/// Each [`IdGenStatus::Pending`] blocks for its `yield_for` and polls again.
/// With a `max_wait` budget the loop gives up once the budget is spent and
/// turns the last stall into [`Error::SerialExhausted`] or
/// [`Error::ClockRegression`]; without one it retries until the clock moves.
///
/// [`Error::SerialExhausted`]: crate::Error::SerialExhausted
/// [`Error::ClockRegression`]: crate::Error::ClockRegression
pub(crate) fn blocking_next_id<ID>(
    mut poll: impl FnMut() -> Result<IdGenStatus<ID>>,
    max_wait: Option<Duration>,
) -> Result<ID> {
    let start = Instant::now();
    #[cfg(feature = "tracing")]
    let (mut warned, mut noted) = (false, false);

    loop {
        let (yield_for, stall) = match poll()? {
            IdGenStatus::Ready { id } => return Ok(id),
            IdGenStatus::Pending { yield_for, stall } => (yield_for, stall),
        };

        // once per call, not once per poll
        #[cfg(feature = "tracing")]
        match stall {
            crate::Stall::ClockBehind { now, last } if !warned => {
                tracing::warn!(now, last, "clock moved backwards, waiting for it to catch up");
                warned = true;
            }
            crate::Stall::SerialExhausted { tick } if !noted => {
                tracing::debug!(tick, "serial space exhausted, waiting for the next tick");
                noted = true;
            }
            _ => {}
        }

        let wait = match max_wait {
            None => yield_for,
            Some(budget) => {
                let Some(left) = budget.checked_sub(start.elapsed()).filter(|d| !d.is_zero())
                else {
                    return Err(stall.into());
                };
                yield_for.min(left)
            }
        };
        block_for(wait);
    }
}
