use core::{fmt, time::Duration};

use crate::{Error, Result};

/// A SIQ timestamp: whole Unix seconds plus a 16-bit binary fraction.
///
/// The fraction counts 1/65536 of a second (about 15.26 µs), so 1024 units
/// are roughly, not exactly, 15.6 ms and 65536 units are exactly one second.
/// Conversions use one rounding rule throughout:
///
/// - wall clock → fraction rounds **down** ([`Timestamp::from_duration`]),
/// - fraction → wall clock returns the **first** nanosecond inside the unit
///   ([`Timestamp::to_duration`], rounded up), so converting back lands in
///   the same unit and round-trips exactly,
/// - fraction → milliseconds rounds **down** ([`Timestamp::subsec_millis`]).
///
/// Ordering is `(seconds, fraction)`, which matches the order of
/// [`Timestamp::to_ticks`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    seconds: u64,
    fraction: u16,
}

impl Timestamp {
    /// Width of the seconds field.
    pub const SECONDS_BITS: u32 = 40;
    /// Width of the fraction field.
    pub const FRACTION_BITS: u32 = 16;
    /// Largest representable second (year 36812).
    pub const MAX_SECONDS: u64 = (1 << Self::SECONDS_BITS) - 1;
    /// Fraction units per second.
    pub const UNITS_PER_SECOND: u64 = 1 << Self::FRACTION_BITS;

    const NANOS_PER_SECOND: u64 = 1_000_000_000;

    /// The Unix epoch.
    pub const ZERO: Self = Self {
        seconds: 0,
        fraction: 0,
    };

    /// Builds a timestamp from its two fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldOverflow`] if `seconds` needs more than 40 bits.
    pub const fn new(seconds: u64, fraction: u16) -> Result<Self> {
        if seconds > Self::MAX_SECONDS {
            return Err(Error::FieldOverflow {
                field: "seconds",
                value: seconds as u128,
                bits: Self::SECONDS_BITS,
            });
        }
        Ok(Self { seconds, fraction })
    }

    /// Callers guarantee `seconds` fits 40 bits.
    pub(crate) const fn from_masked(seconds: u64, fraction: u16) -> Self {
        Self {
            seconds: seconds & Self::MAX_SECONDS,
            fraction,
        }
    }

    /// Converts an offset from the Unix epoch, rounding the fraction down.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldOverflow`] past the 40-bit seconds range.
    pub const fn from_duration(since_unix: Duration) -> Result<Self> {
        let nanos = since_unix.subsec_nanos() as u64;
        let fraction = (nanos * Self::UNITS_PER_SECOND / Self::NANOS_PER_SECOND) as u16;
        Self::new(since_unix.as_secs(), fraction)
    }

    /// The earliest instant that falls inside this timestamp's unit.
    pub const fn to_duration(self) -> Duration {
        let nanos = (self.fraction as u64 * Self::NANOS_PER_SECOND).div_ceil(Self::UNITS_PER_SECOND);
        Duration::new(self.seconds, nanos as u32)
    }

    /// Converts whole milliseconds since the Unix epoch, rounding down.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldOverflow`] past the 40-bit seconds range.
    pub const fn from_unix_millis(millis: u64) -> Result<Self> {
        let fraction = (millis % 1000) * Self::UNITS_PER_SECOND / 1000;
        Self::new(millis / 1000, fraction as u16)
    }

    /// Milliseconds since the Unix epoch, rounding down.
    pub const fn as_unix_millis(self) -> u64 {
        self.seconds * 1000 + self.subsec_millis() as u64
    }

    /// Packs both fields into one 56-bit tick counter.
    pub const fn to_ticks(self) -> u64 {
        (self.seconds << Self::FRACTION_BITS) | self.fraction as u64
    }

    /// Inverse of [`Timestamp::to_ticks`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldOverflow`] if `ticks` is wider than 56 bits.
    pub const fn from_ticks(ticks: u64) -> Result<Self> {
        Self::new(
            ticks >> Self::FRACTION_BITS,
            (ticks & (Self::UNITS_PER_SECOND - 1)) as u16,
        )
    }

    /// Converts a span of ticks into wall-clock time, rounded up so that
    /// waiting for it always reaches the target tick.
    pub const fn ticks_to_duration(ticks: u64) -> Duration {
        let secs = ticks >> Self::FRACTION_BITS;
        let units = ticks & (Self::UNITS_PER_SECOND - 1);
        let nanos = (units * Self::NANOS_PER_SECOND).div_ceil(Self::UNITS_PER_SECOND);
        Duration::new(secs, nanos as u32)
    }

    pub const fn seconds(self) -> u64 {
        self.seconds
    }

    pub const fn fraction(self) -> u16 {
        self.fraction
    }

    /// The fraction expressed in whole milliseconds (0..=999).
    pub const fn subsec_millis(self) -> u32 {
        ((self.fraction as u64 * 1000) >> Self::FRACTION_BITS) as u32
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}+{}/65536)", self.seconds, self.fraction)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.seconds, self.subsec_millis())
    }
}
