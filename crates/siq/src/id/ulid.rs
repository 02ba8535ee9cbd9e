use core::{fmt, str::FromStr};

use crate::{
    DecodeError, DomainHash, Error, Id, QualifierProfile, Result, Siq, SiqFields, SiqType,
    Timestamp,
};

/// A 128-bit ULID, kept only so existing ids can be carried over to SIQ.
///
/// ```text
///  Bit Index:  127            80 79           0
///              +----------------+-------------+
///  Field:      | timestamp (48) | random (80) |
///              +----------------+-------------+
///              |<-- MSB -- 128 bits -- LSB -->|
/// ```
///
/// No generator is provided; ULIDs are decoded, never minted.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Ulid {
    id: u128,
}

impl Ulid {
    pub const TIMESTAMP_BITS: u32 = 48;
    pub const RANDOM_BITS: u32 = 80;

    pub const TIMESTAMP_SHIFT: u32 = Self::RANDOM_BITS;
    pub const RANDOM_MASK: u128 = (1 << Self::RANDOM_BITS) - 1;

    /// Random bits `[74, 80)`, added to the converted timestamp as ticks.
    const CARRY_SHIFT: u32 = 74;
    /// Random bits `[66, 74)`, kept as the shard.
    const SHARD_SHIFT: u32 = 66;
    /// Random bits `[50, 66)`, kept as the low word minus its qualifier.
    const WORD_SHIFT: u32 = 50;

    pub const fn from_raw(raw: u128) -> Self {
        Self { id: raw }
    }

    pub const fn to_raw(self) -> u128 {
        self.id
    }

    pub const fn from_components(timestamp: u64, random: u128) -> Self {
        Self {
            id: ((timestamp as u128) << Self::TIMESTAMP_SHIFT) | (random & Self::RANDOM_MASK),
        }
    }

    /// Milliseconds since the Unix epoch.
    pub const fn timestamp(self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) as u64
    }

    pub const fn random(self) -> u128 {
        self.id & Self::RANDOM_MASK
    }

    /// Converts to a SIQ of category `ty` under `domain`.
    ///
    /// Only 24 to 27 of the 80 random bits survive: 6 are added to the
    /// timestamp as sub-millisecond ticks, 8 become the shard, and the top
    /// 10 to 13 bits of the next 16 become the serial. The rest is dropped,
    /// so distinct ULIDs sharing those bits collide. The result is packed
    /// under [`QualifierProfile::Compact`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldOverflow`] if the converted timestamp leaves
    /// the SIQ range, which no 48-bit millisecond timestamp does.
    pub fn to_siq(self, domain: DomainHash, ty: SiqType) -> Result<Siq> {
        let carry = ((self.id >> Self::CARRY_SHIFT) & 0x3F) as u64;
        let ticks = (u128::from(self.timestamp()) * u128::from(Timestamp::UNITS_PER_SECOND) / 1000)
            as u64
            + carry;

        let qualifier = QualifierProfile::Compact.qualifier(ty);
        let word = ((self.id >> Self::WORD_SHIFT) & 0xFFFF) as u16;

        SiqFields {
            timestamp: Timestamp::from_ticks(ticks)?,
            shard: ((self.id >> Self::SHARD_SHIFT) & 0xFF) as u8,
            domain,
            serial: word >> qualifier.bits(),
            qualifier,
        }
        .pack()
    }
}

impl Id for Ulid {
    type Ty = u128;

    fn to_raw(&self) -> Self::Ty {
        self.id
    }

    fn from_raw(raw: Self::Ty) -> Self {
        Self { id: raw }
    }

    /// Every bit pattern is a valid ULID.
    fn is_valid(&self) -> bool {
        true
    }
}

impl From<Ulid> for u128 {
    fn from(id: Ulid) -> Self {
        id.id
    }
}

impl From<u128> for Ulid {
    fn from(raw: u128) -> Self {
        Self::from_raw(raw)
    }
}

impl FromStr for Ulid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.parse::<u128>()
            .map(Self::from_raw)
            .map_err(|_| DecodeError::InvalidDigit.into())
    }
}

impl fmt::Display for Ulid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}

impl fmt::Debug for Ulid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ulid")
            .field("raw", &format_args!("{:#034x}", self.id))
            .field("timestamp", &self.timestamp())
            .field("random", &format_args!("{:#x}", self.random()))
            .finish()
    }
}
