use core::{fmt, str::FromStr, time::Duration};

use crate::{
    DecodeError, DomainHash, Error, Id, QualifierProfile, Result, Siq, SiqFields, SiqType,
    Timestamp,
};

/// A 64-bit Snowflake id.
///
/// - 42 bits timestamp (ms since a custom epoch)
/// - 5 bits worker id
/// - 5 bits shard id
/// - 12 bits serial
///
/// ```text
///  Bit Index:  63             22 21        17 16       12 11           0
///              +----------------+------------+-----------+-------------+
///  Field:      | timestamp (42) | worker (5) | shard (5) | serial (12) |
///              +----------------+------------+-----------+-------------+
///              |<----- MSB ----------- 64 bits ----------- LSB ------->|
/// ```
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnowflakeId {
    id: u64,
}

impl SnowflakeId {
    /// Bitmask for the 42-bit timestamp field.
    pub const TIMESTAMP_MASK: u64 = (1 << 42) - 1;
    /// Bitmask for the 5-bit worker field.
    pub const WORKER_MASK: u64 = (1 << 5) - 1;
    /// Bitmask for the 5-bit shard field.
    pub const SHARD_MASK: u64 = (1 << 5) - 1;
    /// Bitmask for the 12-bit serial field.
    pub const SERIAL_MASK: u64 = (1 << 12) - 1;

    pub const TIMESTAMP_SHIFT: u32 = 22;
    pub const WORKER_SHIFT: u32 = 17;
    pub const SHARD_SHIFT: u32 = 12;

    /// Builds an id from its components.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldOverflow`] naming the first field that does not
    /// fit its width.
    pub const fn from_components(timestamp: u64, worker: u8, shard: u8, serial: u16) -> Result<Self> {
        let checks: [(&'static str, u64, u64, u32); 4] = [
            ("timestamp", timestamp, Self::TIMESTAMP_MASK, 42),
            ("worker", worker as u64, Self::WORKER_MASK, 5),
            ("shard", shard as u64, Self::SHARD_MASK, 5),
            ("serial", serial as u64, Self::SERIAL_MASK, 12),
        ];
        let mut i = 0;
        while i < checks.len() {
            let (field, value, mask, bits) = checks[i];
            if value > mask {
                return Err(Error::FieldOverflow {
                    field,
                    value: value as u128,
                    bits,
                });
            }
            i += 1;
        }
        Ok(Self::from_masked(timestamp, worker, shard, serial))
    }

    pub(crate) const fn from_masked(timestamp: u64, worker: u8, shard: u8, serial: u16) -> Self {
        Self {
            id: ((timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT)
                | ((worker as u64 & Self::WORKER_MASK) << Self::WORKER_SHIFT)
                | ((shard as u64 & Self::SHARD_MASK) << Self::SHARD_SHIFT)
                | (serial as u64 & Self::SERIAL_MASK),
        }
    }

    pub const fn from_raw(id: u64) -> Self {
        Self { id }
    }

    pub const fn to_raw(self) -> u64 {
        self.id
    }

    /// Milliseconds since the generator's epoch.
    pub const fn timestamp(self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    pub const fn worker(self) -> u8 {
        ((self.id >> Self::WORKER_SHIFT) & Self::WORKER_MASK) as u8
    }

    pub const fn shard(self) -> u8 {
        ((self.id >> Self::SHARD_SHIFT) & Self::SHARD_MASK) as u8
    }

    pub const fn serial(self) -> u16 {
        (self.id & Self::SERIAL_MASK) as u16
    }

    /// Wall-clock instant of the id given the epoch it was minted against.
    pub const fn unix_time(self, epoch: Duration) -> Duration {
        Duration::from_millis(self.timestamp()).saturating_add(epoch)
    }

    pub const fn to_bytes(self) -> [u8; 8] {
        self.id.to_be_bytes()
    }

    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidLength`] unless `bytes` is 8 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let buf: [u8; 8] = bytes.try_into().map_err(|_| DecodeError::InvalidLength {
            expected: "8 bytes",
            found: bytes.len(),
        })?;
        Ok(Self::from_raw(u64::from_be_bytes(buf)))
    }

    /// Converts the snowflake into a compact-profile SIQ of category `ty`.
    ///
    /// The 8 bits above the serial (shard plus the low 3 worker bits) become
    /// the SIQ shard. The 2 upper worker bits, and any serial bits that do
    /// not fit next to `ty`'s qualifier, are folded into the low end of the
    /// fraction so that distinct snowflakes from one millisecond stay
    /// distinct. No existence check is made; callers own that.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldOverflow`] if the resulting time does not fit
    /// the SIQ seconds field.
    pub fn to_siq(self, epoch: Duration, domain: DomainHash, ty: SiqType) -> Result<Siq> {
        const SERIAL_BITS: u32 = 12;

        let unix_millis = u64::try_from(self.unix_time(epoch).as_millis()).map_err(|_| {
            Error::FieldOverflow {
                field: "timestamp",
                value: self.unix_time(epoch).as_millis(),
                bits: 64,
            }
        })?;
        let mut ticks = (u128::from(unix_millis) * u128::from(Timestamp::UNITS_PER_SECOND) / 1000) as u64;

        let shard = ((self.id >> Self::SHARD_SHIFT) & 0xFF) as u8;
        let mut carry = (self.id >> 20) & 0b11;
        let mut serial = u64::from(self.serial());

        let qualifier = QualifierProfile::Compact.qualifier(ty);
        let serial_bits = qualifier.serial_bits();
        if serial_bits < SERIAL_BITS {
            carry = (carry << (SERIAL_BITS - serial_bits)) + (serial >> serial_bits);
            serial &= (1 << serial_bits) - 1;
        }
        ticks += carry;

        SiqFields {
            timestamp: Timestamp::from_ticks(ticks)?,
            shard,
            domain,
            serial: serial as u16,
            qualifier,
        }
        .pack()
    }
}

impl Id for SnowflakeId {
    type Ty = u64;

    fn to_raw(&self) -> Self::Ty {
        self.id
    }

    fn from_raw(raw: Self::Ty) -> Self {
        Self { id: raw }
    }

    /// Every bit pattern is a valid snowflake.
    fn is_valid(&self) -> bool {
        true
    }
}

impl From<SnowflakeId> for u64 {
    fn from(id: SnowflakeId) -> Self {
        id.id
    }
}

impl From<u64> for SnowflakeId {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl FromStr for SnowflakeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.parse::<u64>()
            .map(Self::from_raw)
            .map_err(|_| DecodeError::InvalidDigit.into())
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}

impl fmt::LowerHex for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.id, f)
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeId")
            .field("raw", &format_args!("{:#018x}", self.id))
            .field("timestamp", &self.timestamp())
            .field("worker", &self.worker())
            .field("shard", &self.shard())
            .field("serial", &self.serial())
            .finish()
    }
}
