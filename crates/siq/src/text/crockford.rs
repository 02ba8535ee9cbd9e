use crate::{DecodeError, Result};

const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";
const NO_VALUE: u8 = 255;
pub(crate) const BITS_PER_CHAR: u32 = 5;

/// Lookup table for Crockford base32 decoding
const LOOKUP: [u8; 256] = {
    let mut lut = [NO_VALUE; 256];
    let mut i = 0_u8;
    // Main alphabet, allow lower-case
    while i < 32 {
        let c = ALPHABET[i as usize];
        lut[c as usize] = i;
        if c.is_ascii_uppercase() {
            lut[(c + 32) as usize] = i;
        }
        i += 1;
    }
    // Crockford-specific aliases
    lut[b'O' as usize] = 0;
    lut[b'o' as usize] = 0;
    lut[b'I' as usize] = 1;
    lut[b'i' as usize] = 1;
    lut[b'L' as usize] = 1;
    lut[b'l' as usize] = 1;
    lut
};

/// Writes `value` into `buf` as fixed-width Crockford base32, most
/// significant digit first. Bits above `5 * buf.len()` are dropped.
pub(crate) fn encode(value: u128, buf: &mut [u8]) {
    let mut acc = value;
    for slot in buf.iter_mut().rev() {
        *slot = ALPHABET[(acc & 0x1F) as usize];
        acc >>= BITS_PER_CHAR;
    }
}

/// Decodes Crockford base32 digits into an integer, accepting lower-case
/// input and the `O`/`I`/`L` aliases.
///
/// Callers bound the length; more than 25 digits cannot fit a `u128` and
/// fail with [`DecodeError::Overflow`].
pub(crate) fn decode(encoded: &str) -> Result<u128> {
    let mut acc = 0_u128;
    for (index, byte) in encoded.bytes().enumerate() {
        let val = LOOKUP[byte as usize];
        if val == NO_VALUE {
            return Err(DecodeError::InvalidAscii { byte, index }.into());
        }
        if acc >> (u128::BITS - BITS_PER_CHAR) != 0 {
            return Err(DecodeError::Overflow.into());
        }
        acc = (acc << BITS_PER_CHAR) | u128::from(val);
    }
    Ok(acc)
}
