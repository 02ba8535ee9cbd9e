use core::{fmt, str::FromStr};

use super::{
    crockford,
    rfc4648::{BASE32, BASE64},
};
use crate::{ConfigError, DecodeError, Error, Id, Result, Siq, SnowflakeId};

/// Text forms of an id, selected by a short code.
///
/// | code | form | [`Siq`] example |
/// |---|---|---|
/// | `b` | base64url, unpadded | `AABeC9LwAAAAAAAAAAAH` |
/// | `c` | Crockford base32, leading zeros stripped | `5W2YJY000000000000007` |
/// | `0c` | `c` with one `0` prepended | `05W2YJY000000000000007` |
/// | `d` | decimal | `7451106619238957490390643507207` |
/// | `l` | RFC 4648 base32, lower case | `aaaf4c6s6aaaaaaaaaaaaaah` |
/// | `o` | octal | |
/// | `x` | hexadecimal, lower case | `5e0bd2f0000000000000000007` |
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SiqFormat {
    Base64,
    Crockford,
    ZeroCrockford,
    #[default]
    Decimal,
    Base32Lower,
    Octal,
    Hex,
}

impl SiqFormat {
    pub const ALL: [Self; 7] = [
        Self::Base64,
        Self::Crockford,
        Self::ZeroCrockford,
        Self::Decimal,
        Self::Base32Lower,
        Self::Octal,
        Self::Hex,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            Self::Base64 => "b",
            Self::Crockford => "c",
            Self::ZeroCrockford => "0c",
            Self::Decimal => "d",
            Self::Base32Lower => "l",
            Self::Octal => "o",
            Self::Hex => "x",
        }
    }
}

impl FromStr for SiqFormat {
    type Err = Error;

    /// The empty code selects decimal.
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Self::Decimal);
        }
        Self::ALL
            .into_iter()
            .find(|f| f.code() == s)
            .ok_or_else(|| {
                ConfigError::InvalidValue {
                    key: "format",
                    value: s.to_owned(),
                }
                .into()
            })
    }
}

impl fmt::Display for SiqFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Strips leading `zero` digits, keeping at least one.
fn strip_leading(encoded: &str, zero: char) -> &str {
    let stripped = encoded.trim_start_matches(zero);
    if stripped.is_empty() {
        &encoded[encoded.len() - 1..]
    } else {
        stripped
    }
}

/// Left-pads `encoded` with `zero` to `width` digits.
fn pad_leading(encoded: &str, zero: u8, width: usize, expected: &'static str) -> Result<String> {
    if encoded.is_empty() || encoded.len() > width {
        return Err(DecodeError::InvalidLength {
            expected,
            found: encoded.len(),
        }
        .into());
    }
    let mut padded = String::with_capacity(width);
    padded.extend(core::iter::repeat_n(zero as char, width - encoded.len()));
    padded.push_str(encoded);
    Ok(padded)
}

fn parse_radix(s: &str, radix: u32) -> Result<u128> {
    u128::from_str_radix(s, radix).map_err(|_| DecodeError::InvalidDigit.into())
}

/// The 16-byte storage form without its first, always-zero, byte.
const SIQ_TEXT_BYTES: usize = 15;
const SIQ_CROCKFORD_LEN: usize = 24;

const SNOWFLAKE_CROCKFORD_LEN: usize = 13;
/// Snowflake base32 widens the 8-byte value to 10 bytes.
const SNOWFLAKE_BASE32_BYTES: usize = 10;
/// Snowflake base64 widens the 8-byte value to 9 bytes.
const SNOWFLAKE_BASE64_BYTES: usize = 9;

impl Siq {
    fn text_bytes(self) -> [u8; SIQ_TEXT_BYTES] {
        let mut out = [0_u8; SIQ_TEXT_BYTES];
        out.copy_from_slice(&self.to_bytes()[1..]);
        out
    }

    fn from_text_bytes(bytes: &[u8; SIQ_TEXT_BYTES]) -> Result<Self> {
        let mut buf = [0_u8; 16];
        buf[1..].copy_from_slice(bytes);
        Self::try_from(u128::from_be_bytes(buf))
    }

    /// Crockford base32 with leading zeros stripped.
    ///
    /// ```
    /// use siq::Siq;
    ///
    /// let id = Siq::from_raw(7_451_106_619_238_957_490_390_643_507_207);
    /// assert_eq!(id.to_crockford(), "5W2YJY000000000000007");
    /// assert_eq!(Siq::from_crockford("5W2YJY000000000000007").unwrap(), id);
    /// ```
    pub fn to_crockford(self) -> String {
        let mut buf = [0_u8; SIQ_CROCKFORD_LEN];
        crockford::encode(self.to_raw(), &mut buf);
        let encoded: String = buf.iter().map(|&b| b as char).collect();
        strip_leading(&encoded, '0').to_owned()
    }

    /// Inverse of [`Siq::to_crockford`]; also accepts the zero-padded
    /// 24-digit form, lower case and the `O`/`I`/`L` aliases.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::InvalidLength`] unless 1 to 24 digits long
    /// - [`DecodeError::InvalidAscii`] for a character outside the alphabet
    /// - [`DecodeError::Overflow`] if the value is wider than 112 bits
    pub fn from_crockford(encoded: &str) -> Result<Self> {
        if encoded.is_empty() || encoded.len() > SIQ_CROCKFORD_LEN {
            return Err(DecodeError::InvalidLength {
                expected: "1 to 24 characters",
                found: encoded.len(),
            }
            .into());
        }
        Self::try_from(crockford::decode(encoded)?)
    }

    /// RFC 4648 base32 of the low 15 bytes, lower case, always 24 digits.
    pub fn to_base32_lower(self) -> String {
        BASE32.encode(&self.text_bytes())
    }

    /// Inverse of [`Siq::to_base32_lower`]; shorter input is treated as
    /// having its leading `a` digits stripped.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::InvalidLength`] unless 1 to 24 digits long
    /// - [`DecodeError::InvalidAscii`] for a character outside the alphabet
    /// - [`DecodeError::Overflow`] if the value is wider than 112 bits
    pub fn from_base32_lower(encoded: &str) -> Result<Self> {
        const EXPECTED: &str = "1 to 24 characters";
        let width = BASE32.encoded_len(SIQ_TEXT_BYTES);
        let padded = pad_leading(encoded, BASE32.zero(), width, EXPECTED)?;
        let mut bytes = [0_u8; SIQ_TEXT_BYTES];
        BASE32.decode_into(&padded, &mut bytes, EXPECTED)?;
        Self::from_text_bytes(&bytes)
    }

    /// Unpadded base64url of the low 15 bytes, always 20 digits.
    pub fn to_base64(self) -> String {
        BASE64.encode(&self.text_bytes())
    }

    /// # Errors
    ///
    /// - [`DecodeError::InvalidLength`] unless exactly 20 digits long
    /// - [`DecodeError::InvalidAscii`] for a character outside the alphabet
    /// - [`DecodeError::Overflow`] if the value is wider than 112 bits
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let mut bytes = [0_u8; SIQ_TEXT_BYTES];
        BASE64.decode_into(encoded, &mut bytes, "20 characters")?;
        Self::from_text_bytes(&bytes)
    }

    /// # Errors
    ///
    /// [`DecodeError::InvalidDigit`] or [`DecodeError::Overflow`].
    pub fn from_hex(encoded: &str) -> Result<Self> {
        Self::try_from(parse_radix(encoded, 16)?)
    }

    /// Renders the id in `format`.
    ///
    /// ```
    /// use siq::{Siq, SiqFormat};
    ///
    /// let id = Siq::from_raw(7_451_106_619_238_957_490_390_643_507_207);
    /// assert_eq!(id.format(SiqFormat::Hex), "5e0bd2f0000000000000000007");
    /// assert_eq!(id.format("b".parse().unwrap()), "AABeC9LwAAAAAAAAAAAH");
    /// ```
    pub fn format(self, format: SiqFormat) -> String {
        match format {
            SiqFormat::Base64 => self.to_base64(),
            SiqFormat::Crockford => self.to_crockford(),
            SiqFormat::ZeroCrockford => format!("0{}", self.to_crockford()),
            SiqFormat::Decimal => self.to_string(),
            SiqFormat::Base32Lower => self.to_base32_lower(),
            SiqFormat::Octal => format!("{self:o}"),
            SiqFormat::Hex => format!("{self:x}"),
        }
    }

    /// Parses text written in `format`.
    ///
    /// # Errors
    ///
    /// Any [`DecodeError`] the chosen form can produce.
    pub fn parse(encoded: &str, format: SiqFormat) -> Result<Self> {
        match format {
            SiqFormat::Base64 => Self::from_base64(encoded),
            SiqFormat::Crockford | SiqFormat::ZeroCrockford => Self::from_crockford(encoded),
            SiqFormat::Decimal => encoded.parse(),
            SiqFormat::Base32Lower => Self::from_base32_lower(encoded),
            SiqFormat::Octal => Self::try_from(parse_radix(encoded, 8)?),
            SiqFormat::Hex => Self::from_hex(encoded),
        }
    }
}

impl SnowflakeId {
    fn padded_bytes<const N: usize>(self) -> [u8; N] {
        let mut out = [0_u8; N];
        out[N - 8..].copy_from_slice(&self.to_bytes());
        out
    }

    fn from_padded_bytes(bytes: &[u8]) -> Result<Self> {
        let (pad, value) = bytes.split_at(bytes.len() - 8);
        if pad.iter().any(|&b| b != 0) {
            return Err(DecodeError::Overflow.into());
        }
        Self::from_bytes(value)
    }

    /// Fixed-width, 13-digit Crockford base32.
    ///
    /// ```
    /// use siq::SnowflakeId;
    ///
    /// let id = SnowflakeId::from_raw(2_424_242_424_242_424_242);
    /// assert_eq!(id.to_crockford(), "23953MG16DJDJ");
    /// ```
    pub fn to_crockford(self) -> String {
        let mut buf = [0_u8; SNOWFLAKE_CROCKFORD_LEN];
        crockford::encode(u128::from(self.to_raw()), &mut buf);
        buf.iter().map(|&b| b as char).collect()
    }

    /// Inverse of [`SnowflakeId::to_crockford`]; shorter input is treated as
    /// having its leading zeros stripped.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::InvalidLength`] unless 1 to 13 digits long
    /// - [`DecodeError::InvalidAscii`] for a character outside the alphabet
    /// - [`DecodeError::Overflow`] if the value is wider than 64 bits
    pub fn from_crockford(encoded: &str) -> Result<Self> {
        if encoded.is_empty() || encoded.len() > SNOWFLAKE_CROCKFORD_LEN {
            return Err(DecodeError::InvalidLength {
                expected: "1 to 13 characters",
                found: encoded.len(),
            }
            .into());
        }
        let raw =
            u64::try_from(crockford::decode(encoded)?).map_err(|_| DecodeError::Overflow)?;
        Ok(Self::from_raw(raw))
    }

    /// RFC 4648 base32, lower case, leading `a` digits stripped.
    pub fn to_base32_lower(self) -> String {
        let encoded = BASE32.encode(&self.padded_bytes::<SNOWFLAKE_BASE32_BYTES>());
        strip_leading(&encoded, 'a').to_owned()
    }

    /// # Errors
    ///
    /// - [`DecodeError::InvalidLength`] unless 1 to 16 digits long
    /// - [`DecodeError::InvalidAscii`] for a character outside the alphabet
    /// - [`DecodeError::Overflow`] if the value is wider than 64 bits
    pub fn from_base32_lower(encoded: &str) -> Result<Self> {
        const EXPECTED: &str = "1 to 16 characters";
        let width = BASE32.encoded_len(SNOWFLAKE_BASE32_BYTES);
        let padded = pad_leading(encoded, BASE32.zero(), width, EXPECTED)?;
        let mut bytes = [0_u8; SNOWFLAKE_BASE32_BYTES];
        BASE32.decode_into(&padded, &mut bytes, EXPECTED)?;
        Self::from_padded_bytes(&bytes)
    }

    /// Unpadded base64url of the value widened to 9 bytes, always 12 digits.
    pub fn to_base64(self) -> String {
        BASE64.encode(&self.padded_bytes::<SNOWFLAKE_BASE64_BYTES>())
    }

    /// # Errors
    ///
    /// - [`DecodeError::InvalidLength`] unless exactly 12 digits long
    /// - [`DecodeError::InvalidAscii`] for a character outside the alphabet
    /// - [`DecodeError::Overflow`] if the value is wider than 64 bits
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let mut bytes = [0_u8; SNOWFLAKE_BASE64_BYTES];
        BASE64.decode_into(encoded, &mut bytes, "12 characters")?;
        Self::from_padded_bytes(&bytes)
    }

    pub fn format(self, format: SiqFormat) -> String {
        match format {
            SiqFormat::Base64 => self.to_base64(),
            SiqFormat::Crockford => self.to_crockford(),
            SiqFormat::ZeroCrockford => format!("0{}", self.to_crockford()),
            SiqFormat::Decimal => self.to_string(),
            SiqFormat::Base32Lower => self.to_base32_lower(),
            SiqFormat::Octal => format!("{:o}", self.to_raw()),
            SiqFormat::Hex => format!("{self:x}"),
        }
    }

    /// # Errors
    ///
    /// Any [`DecodeError`] the chosen form can produce.
    pub fn parse(encoded: &str, format: SiqFormat) -> Result<Self> {
        let from_radix = |radix| {
            u64::from_str_radix(encoded, radix)
                .map(Self::from_raw)
                .map_err(|_| Error::from(DecodeError::InvalidDigit))
        };
        match format {
            SiqFormat::Base64 => Self::from_base64(encoded),
            SiqFormat::Crockford => Self::from_crockford(encoded),
            // the prepended zero makes 14 digits
            SiqFormat::ZeroCrockford => Self::from_crockford(encoded.strip_prefix('0').unwrap_or(encoded)),
            SiqFormat::Decimal => encoded.parse(),
            SiqFormat::Base32Lower => Self::from_base32_lower(encoded),
            SiqFormat::Octal => from_radix(8),
            SiqFormat::Hex => from_radix(16),
        }
    }
}

/// Ids with a Crockford base32 text form.
///
/// Lets code such as the serde adapters stay generic over [`Siq`] and
/// [`SnowflakeId`].
pub trait Base32Ext: Id {
    fn encode(&self) -> String;

    /// # Errors
    ///
    /// Any [`DecodeError`] the Crockford form can produce.
    fn decode(encoded: &str) -> Result<Self>;
}

impl Base32Ext for Siq {
    fn encode(&self) -> String {
        self.to_crockford()
    }

    fn decode(encoded: &str) -> Result<Self> {
        Self::from_crockford(encoded)
    }
}

impl Base32Ext for SnowflakeId {
    fn encode(&self) -> String {
        self.to_crockford()
    }

    fn decode(encoded: &str) -> Result<Self> {
        Self::from_crockford(encoded)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const KNOWN: u128 = 7_451_106_619_238_957_490_390_643_507_207;

    fn known() -> Siq {
        Siq::from_raw(KNOWN)
    }

    #[test]
    fn known_vector_in_every_form() {
        let id = known();
        assert_eq!(id.format(SiqFormat::Crockford), "5W2YJY000000000000007");
        assert_eq!(id.format(SiqFormat::ZeroCrockford), "05W2YJY000000000000007");
        assert_eq!(id.format(SiqFormat::Base32Lower), "aaaf4c6s6aaaaaaaaaaaaaah");
        assert_eq!(id.format(SiqFormat::Base64), "AABeC9LwAAAAAAAAAAAH");
        assert_eq!(id.format(SiqFormat::Decimal), KNOWN.to_string());
        assert_eq!(id.format(SiqFormat::Hex), "5e0bd2f0000000000000000007");
        assert_eq!(id.format(SiqFormat::Octal), format!("{KNOWN:o}"));

        for format in SiqFormat::ALL {
            assert_eq!(Siq::parse(&id.format(format), format).unwrap(), id, "{format}");
        }
    }

    #[test]
    fn leading_zero_values_round_trip() {
        for raw in [0_u128, 1, 7, 0x20, 1 << 60] {
            let id = Siq::from_raw(raw);
            for format in SiqFormat::ALL {
                let text = id.format(format);
                assert_eq!(Siq::parse(&text, format).unwrap(), id, "{format}: {text}");
            }
        }
        assert_eq!(Siq::from_raw(0).to_crockford(), "0");
        assert_eq!(Siq::from_raw(7).to_crockford(), "7");
        assert_eq!(Siq::from_raw(0).to_base32_lower(), "a".repeat(24));
    }

    #[test]
    fn crockford_accepts_padded_and_lowercase_input() {
        let id = known();
        assert_eq!(Siq::from_crockford("0005w2yjy000000000000007").unwrap(), id);
        assert_eq!(Siq::from_crockford("5w2yjyoooooooooooooo7").unwrap(), id);
    }

    #[test]
    fn rejects_malformed_text() {
        assert_eq!(
            Siq::from_crockford("").unwrap_err(),
            Error::Decode(DecodeError::InvalidLength {
                expected: "1 to 24 characters",
                found: 0,
            })
        );
        assert!(Siq::from_crockford(&"0".repeat(25)).is_err());
        // 24 digits can carry 120 bits; the top 8 are padding
        assert_eq!(
            Siq::from_crockford(&"Z".repeat(24)).unwrap_err(),
            Error::Decode(DecodeError::Overflow)
        );
        assert!(Siq::from_base64("AABeC9LwAAAAAAAAAAA").is_err());
        assert!(Siq::from_base64("AABeC9LwAAAAAAAAAA+H").is_err());
        assert_eq!(
            Siq::from_base64(&"_".repeat(20)).unwrap_err(),
            Error::Decode(DecodeError::Overflow)
        );
        assert!(Siq::from_hex("xyz").is_err());
        assert!("q".parse::<SiqFormat>().is_err());
    }

    #[test]
    fn format_codes_parse() {
        for format in SiqFormat::ALL {
            assert_eq!(format.code().parse::<SiqFormat>().unwrap(), format);
        }
        assert_eq!("".parse::<SiqFormat>().unwrap(), SiqFormat::Decimal);
    }

    #[test]
    fn snowflake_text_forms() {
        let id = SnowflakeId::from_raw(2_424_242_424_242_424_242);
        assert_eq!(id.to_crockford(), "23953MG16DJDJ");
        assert_eq!(id.to_base64().len(), 12);
        for format in SiqFormat::ALL {
            let text = id.format(format);
            assert_eq!(SnowflakeId::parse(&text, format).unwrap(), id, "{format}: {text}");
        }

        let zero = SnowflakeId::from_raw(0);
        assert_eq!(zero.to_crockford(), "0000000000000");
        assert_eq!(zero.to_base32_lower(), "a");
        assert_eq!(SnowflakeId::from_base32_lower("a").unwrap(), zero);
        assert_eq!(SnowflakeId::from_crockford("1").unwrap().to_raw(), 1);
        assert_eq!(
            SnowflakeId::from_crockford("ZZZZZZZZZZZZZ").unwrap_err(),
            Error::Decode(DecodeError::Overflow)
        );
    }

    proptest! {
        #[test]
        fn every_form_round_trips(raw in 0..=Siq::MAX) {
            let id = Siq::from_raw(raw);
            for format in SiqFormat::ALL {
                let text = id.format(format);
                prop_assert_eq!(Siq::parse(&text, format).unwrap(), id);
            }
        }

        #[test]
        fn snowflake_every_form_round_trips(raw in any::<u64>()) {
            let id = SnowflakeId::from_raw(raw);
            for format in SiqFormat::ALL {
                let text = id.format(format);
                prop_assert_eq!(SnowflakeId::parse(&text, format).unwrap(), id);
            }
        }
    }
}
