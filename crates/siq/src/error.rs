use core::time::Duration;

use crate::QualifierProfile;

/// A result type defaulting to the crate [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors that `siq` can produce.
///
/// Transient conditions (an exhausted serial space, a clock that is briefly
/// behind) are not errors on the polling path; they come back as
/// [`IdGenStatus::Pending`](crate::IdGenStatus::Pending). They only turn into
/// [`Error::SerialExhausted`] or [`Error::ClockRegression`] when a blocking
/// call runs out of its wait budget, or when the generator is configured to
/// fail fast on regression.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A field value does not fit its bit width.
    #[error("field `{field}` value {value} does not fit in {bits} bits")]
    FieldOverflow {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: u128,
        /// Width of the field in bits.
        bits: u32,
    },

    /// A raw qualifier width outside `1..=6`.
    #[error("qualifier width {bits} is outside 1..=6")]
    QualifierWidth {
        /// The rejected width.
        bits: u32,
    },

    /// A qualifier whose width differs from the one its profile decodes
    /// from its bits, so it would not unpack to itself.
    #[error("qualifier {value:#b} ({bits} bits) does not decode under the {profile:?} profile")]
    QualifierMismatch {
        value: u8,
        bits: u32,
        profile: QualifierProfile,
    },

    /// Every serial of the current tick has been issued and the clock did
    /// not advance within the caller's wait budget.
    #[error("serial space exhausted for tick {tick}")]
    SerialExhausted {
        /// The tick whose serials ran out.
        tick: u64,
    },

    /// The clock reports a tick earlier than the last one issued.
    #[error("clock moved backwards: tick {now} is behind last issued tick {last}")]
    ClockRegression {
        /// Tick reported by the clock.
        now: u64,
        /// Last tick issued by the generator.
        last: u64,
    },

    /// Generator configuration was rejected.
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    /// Fixed-width or text input could not be decoded.
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// The generator lock was poisoned by a panicking thread.
    ///
    /// Never produced with the `parking-lot` feature, whose mutex does not
    /// poison.
    #[error("generator lock poisoned")]
    LockPoisoned,
}

/// Reasons a generator configuration is rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// Shard id does not fit the profile's shard field.
    #[error("shard id {shard} exceeds maximum {max}")]
    ShardOutOfRange { shard: u16, max: u16 },

    /// Snowflake worker id does not fit 5 bits.
    #[error("worker id {worker} exceeds maximum {max}")]
    WorkerOutOfRange { worker: u16, max: u16 },

    /// Pre-hashed domain value wider than 32 bits.
    #[error("domain hash {hash:#x} does not fit in 32 bits")]
    DomainHashOutOfRange { hash: u64 },

    /// The configured epoch lies after the current clock reading.
    #[error("epoch {epoch:?} is later than the current time {now:?}")]
    EpochInFuture { epoch: Duration, now: Duration },

    /// A textual setting (environment variable, parsed string) is malformed.
    #[error("invalid value {value:?} for `{key}`")]
    InvalidValue { key: &'static str, value: String },
}

/// Reasons fixed-width or text input fails to decode.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// Input length is not one the format accepts.
    #[error("invalid length {found}, expected {expected}")]
    InvalidLength {
        /// Human readable description of the accepted lengths.
        expected: &'static str,
        found: usize,
    },

    /// A character outside the encoding's alphabet.
    #[error("invalid character {:?} at index {index}", *byte as char)]
    InvalidAscii { byte: u8, index: usize },

    /// The decoded value sets bits outside the identifier's layout.
    #[error("decoded value sets reserved bits")]
    Overflow,

    /// A numeric text form could not be parsed.
    #[error("invalid digits in numeric form")]
    InvalidDigit,
}

#[cfg(not(feature = "parking-lot"))]
impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::LockPoisoned
    }
}
