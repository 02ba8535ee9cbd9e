//! Fixed-length RFC 4648 codecs without padding: base32 in lower case and
//! base64 with the URL-safe alphabet.

use crate::{DecodeError, Result};

const BASE32_LOWER: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";
const BASE64_URL: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
const NO_VALUE: u8 = 255;

const fn lookup<const N: usize>(alphabet: &[u8; N]) -> [u8; 256] {
    let mut lut = [NO_VALUE; 256];
    let mut i = 0;
    while i < N {
        lut[alphabet[i] as usize] = i as u8;
        i += 1;
    }
    lut
}

const BASE32_LOOKUP: [u8; 256] = lookup(BASE32_LOWER);
const BASE64_LOOKUP: [u8; 256] = lookup(BASE64_URL);

/// A digit alphabet of `2^bits` characters.
#[derive(Clone, Copy)]
pub(crate) struct Alphabet {
    chars: &'static [u8],
    lookup: &'static [u8; 256],
    bits: u32,
}

pub(crate) const BASE32: Alphabet = Alphabet {
    chars: BASE32_LOWER,
    lookup: &BASE32_LOOKUP,
    bits: 5,
};

pub(crate) const BASE64: Alphabet = Alphabet {
    chars: BASE64_URL,
    lookup: &BASE64_LOOKUP,
    bits: 6,
};

impl Alphabet {
    /// Number of digits for `bytes` input bytes; inputs are always a whole
    /// number of digits.
    pub(crate) const fn encoded_len(self, bytes: usize) -> usize {
        bytes * 8 / self.bits as usize
    }

    pub(crate) const fn zero(self) -> u8 {
        self.chars[0]
    }

    pub(crate) fn encode(self, input: &[u8]) -> String {
        debug_assert_eq!(input.len() * 8 % self.bits as usize, 0);
        let mask = (1_u32 << self.bits) - 1;
        let mut out = String::with_capacity(self.encoded_len(input.len()));
        let mut acc = 0_u32;
        let mut pending = 0;
        for &byte in input {
            acc = (acc << 8) | u32::from(byte);
            pending += 8;
            while pending >= self.bits {
                pending -= self.bits;
                out.push(self.chars[((acc >> pending) & mask) as usize] as char);
            }
        }
        out
    }

    /// Decodes exactly `out.len()` bytes.
    pub(crate) fn decode_into(self, encoded: &str, out: &mut [u8], expected: &'static str) -> Result<()> {
        if encoded.len() != self.encoded_len(out.len()) {
            return Err(DecodeError::InvalidLength {
                expected,
                found: encoded.len(),
            }
            .into());
        }
        let mut acc = 0_u32;
        let mut pending = 0;
        let mut written = 0;
        for (index, byte) in encoded.bytes().enumerate() {
            let val = self.lookup[byte as usize];
            if val == NO_VALUE {
                return Err(DecodeError::InvalidAscii { byte, index }.into());
            }
            acc = (acc << self.bits) | u32::from(val);
            pending += self.bits;
            if pending >= 8 {
                pending -= 8;
                out[written] = (acc >> pending) as u8;
                written += 1;
            }
        }
        Ok(())
    }
}
