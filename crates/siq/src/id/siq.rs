use core::{fmt, str::FromStr};

use crate::{
    DecodeError, DomainHash, Error, Id, Qualifier, QualifierProfile, Result, SiqType, Timestamp,
};

/// A 112-bit sortable identifier.
///
/// ```text
///  Bit Index:  127    112 111         72 71          56 55      48 47           16 15       0
///              +---------+-------------+--------------+----------+---------------+----------+
///  Field:      | pad(16) | seconds(40) | fraction(16) | shard(8) | domain (32)   | word(16) |
///              +---------+-------------+--------------+----------+---------------+----------+
///              |<----------------------- MSB ------ 128 bits ------ LSB ------------------->|
/// ```
///
/// `word` is `serial << qualifier_bits | qualifier`; how it splits depends on
/// the [`QualifierProfile`] the id was minted with. The padding bits are
/// always zero, so the big-endian 16-byte form sorts like the integer.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Siq {
    id: u128,
}

impl Siq {
    /// Number of meaningful bits.
    pub const BITS: u32 = 112;
    /// Largest valid raw value.
    pub const MAX: u128 = (1 << Self::BITS) - 1;

    pub const SECONDS_SHIFT: u32 = 72;
    pub const FRACTION_SHIFT: u32 = 56;
    pub const SHARD_SHIFT: u32 = 48;
    pub const DOMAIN_SHIFT: u32 = 16;

    pub const SECONDS_MASK: u128 = (1 << Timestamp::SECONDS_BITS) - 1;
    pub const FRACTION_MASK: u128 = 0xFFFF;
    pub const SHARD_MASK: u128 = 0xFF;
    pub const DOMAIN_MASK: u128 = 0xFFFF_FFFF;
    pub const WORD_MASK: u128 = 0xFFFF;

    /// Wraps a raw value without checking the padding bits.
    pub const fn from_raw(id: u128) -> Self {
        Self { id }
    }

    pub const fn to_raw(self) -> u128 {
        self.id
    }

    /// Returns `true` if the 16 padding bits are clear.
    pub const fn is_valid(self) -> bool {
        self.id <= Self::MAX
    }

    /// Clears the padding bits.
    #[must_use]
    pub const fn into_valid(self) -> Self {
        Self {
            id: self.id & Self::MAX,
        }
    }

    pub const fn seconds(self) -> u64 {
        ((self.id >> Self::SECONDS_SHIFT) & Self::SECONDS_MASK) as u64
    }

    pub const fn fraction(self) -> u16 {
        ((self.id >> Self::FRACTION_SHIFT) & Self::FRACTION_MASK) as u16
    }

    pub const fn timestamp(self) -> Timestamp {
        Timestamp::from_masked(self.seconds(), self.fraction())
    }

    /// Seconds and fraction as one 56-bit tick.
    pub const fn tick(self) -> u64 {
        ((self.id >> Self::FRACTION_SHIFT) & ((1 << 56) - 1)) as u64
    }

    pub const fn shard(self) -> u8 {
        ((self.id >> Self::SHARD_SHIFT) & Self::SHARD_MASK) as u8
    }

    pub const fn domain_hash(self) -> DomainHash {
        DomainHash::from_u32(((self.id >> Self::DOMAIN_SHIFT) & Self::DOMAIN_MASK) as u32)
    }

    /// The low 16 bits: serial and qualifier together.
    pub const fn word(self) -> u16 {
        (self.id & Self::WORD_MASK) as u16
    }

    pub const fn qualifier(self, profile: QualifierProfile) -> Qualifier {
        profile.qualifier_of(self.word())
    }

    pub const fn serial(self, profile: QualifierProfile) -> u16 {
        self.word() >> profile.qualifier_bits(self.word())
    }

    pub const fn siq_type(self, profile: QualifierProfile) -> Option<SiqType> {
        profile.siq_type(self.qualifier(profile))
    }

    /// Whether the id names a leaf entity. The leaf bit is the lowest bit
    /// under every profile.
    pub const fn is_leaf(self) -> bool {
        self.id & 1 == 1
    }

    /// Splits the id into its fields.
    pub const fn unpack(self, profile: QualifierProfile) -> SiqFields {
        SiqFields {
            timestamp: self.timestamp(),
            shard: self.shard(),
            domain: self.domain_hash(),
            serial: self.serial(profile),
            qualifier: self.qualifier(profile),
        }
    }

    /// The 16-byte big-endian storage form.
    pub const fn to_bytes(self) -> [u8; 16] {
        self.id.to_be_bytes()
    }

    /// Decodes the 16-byte storage form, or the bare 14-byte form without
    /// the padding.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::InvalidLength`] for any other length
    /// - [`DecodeError::Overflow`] if a 16-byte input sets padding bits
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut buf = [0_u8; 16];
        match bytes.len() {
            16 => buf.copy_from_slice(bytes),
            14 => buf[2..].copy_from_slice(bytes),
            found => {
                return Err(DecodeError::InvalidLength {
                    expected: "14 or 16 bytes",
                    found,
                }
                .into());
            }
        }
        let id = Self::from_raw(u128::from_be_bytes(buf));
        if !id.is_valid() {
            return Err(DecodeError::Overflow.into());
        }
        Ok(id)
    }
}

impl Id for Siq {
    type Ty = u128;

    fn to_raw(&self) -> Self::Ty {
        self.id
    }

    fn from_raw(raw: Self::Ty) -> Self {
        Self { id: raw }
    }

    fn is_valid(&self) -> bool {
        Self::is_valid(*self)
    }
}

impl From<Siq> for u128 {
    fn from(siq: Siq) -> Self {
        siq.id
    }
}

impl TryFrom<u128> for Siq {
    type Error = Error;

    fn try_from(raw: u128) -> Result<Self> {
        let id = Self::from_raw(raw);
        if id.is_valid() {
            Ok(id)
        } else {
            Err(DecodeError::Overflow.into())
        }
    }
}

impl fmt::Display for Siq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}

impl fmt::LowerHex for Siq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.id, f)
    }
}

impl fmt::UpperHex for Siq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.id, f)
    }
}

impl fmt::Octal for Siq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Octal::fmt(&self.id, f)
    }
}

impl fmt::Debug for Siq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Siq")
            .field("raw", &format_args!("{:#030x}", self.id))
            .field("timestamp", &self.timestamp())
            .field("shard", &self.shard())
            .field("domain", &self.domain_hash())
            .field("word", &format_args!("{:#06x}", self.word()))
            .finish()
    }
}

/// Parses the decimal form.
impl FromStr for Siq {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.parse::<u128>().map_err(|_| DecodeError::InvalidDigit)?;
        Self::try_from(raw)
    }
}

/// The unpacked fields of a [`Siq`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SiqFields {
    pub timestamp: Timestamp,
    pub shard: u8,
    pub domain: DomainHash,
    pub serial: u16,
    pub qualifier: Qualifier,
}

impl SiqFields {
    /// Packs the fields into a [`Siq`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldOverflow`] if `serial` does not fit next to the
    /// qualifier. Seconds, shard and domain are already bounded by their
    /// types.
    pub const fn pack(&self) -> Result<Siq> {
        if self.serial > self.qualifier.max_serial() {
            return Err(Error::FieldOverflow {
                field: "serial",
                value: self.serial as u128,
                bits: self.qualifier.serial_bits(),
            });
        }
        let word = ((self.serial as u128) << self.qualifier.bits()) | self.qualifier.value() as u128;
        Ok(Siq::from_raw(
            ((self.timestamp.seconds() as u128) << Siq::SECONDS_SHIFT)
                | ((self.timestamp.fraction() as u128) << Siq::FRACTION_SHIFT)
                | ((self.shard as u128) << Siq::SHARD_SHIFT)
                | ((self.domain.get() as u128) << Siq::DOMAIN_SHIFT)
                | word,
        ))
    }

    /// Like [`Self::pack`], but first checks that the qualifier decodes to
    /// itself under `profile`, so `unpack(profile)` returns these fields.
    ///
    /// # Errors
    ///
    /// - [`Error::QualifierMismatch`] if `profile` reads a different width
    ///   from the qualifier bits
    /// - anything [`Self::pack`] returns
    pub const fn pack_for(&self, profile: QualifierProfile) -> Result<Siq> {
        if !profile.fits(self.qualifier) {
            return Err(Error::QualifierMismatch {
                value: self.qualifier.value(),
                bits: self.qualifier.bits(),
                profile,
            });
        }
        self.pack()
    }

    /// Category of the qualifier under `profile`.
    pub const fn siq_type(&self, profile: QualifierProfile) -> Option<SiqType> {
        profile.siq_type(self.qualifier)
    }
}
