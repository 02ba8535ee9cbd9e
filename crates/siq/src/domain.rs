use core::fmt;

use sha2::{Digest, Sha256};

use crate::{ConfigError, Result};

/// The 32-bit spatial-uniqueness tag of a domain.
///
/// Computed as the low 32 bits (last four digest bytes, big-endian) of the
/// SHA-256 of the domain name. Two domains collide with birthday-bound
/// probability over 2^32; nothing beyond the truncation is done about it.
///
/// The all-zero hash is reserved by convention for local and development
/// setups. [`DomainHash::of`] never returns it on purpose; callers that want
/// it use [`DomainHash::ZERO`] or resolve the domain through
/// [`GeneratorConfig`](crate::GeneratorConfig), which maps `""` and `"0"`
/// to zero.
///
/// ```
/// use siq::DomainHash;
///
/// assert_eq!(DomainHash::of("example.com").get(), 2_261_653_831);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DomainHash(u32);

impl DomainHash {
    /// Hash used for non-distributed deployments.
    pub const ZERO: Self = Self(0);

    /// Hashes a domain name.
    pub fn of(domain: &str) -> Self {
        let digest = Sha256::digest(domain.as_bytes());
        let mut tail = [0_u8; 4];
        tail.copy_from_slice(&digest[digest.len() - 4..]);
        Self(u32::from_be_bytes(tail))
    }

    /// Wraps an already computed 32-bit hash.
    pub const fn from_u32(hash: u32) -> Self {
        Self(hash)
    }

    /// Wraps a pre-hashed value coming from a wider source, such as a
    /// configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DomainHashOutOfRange`] if `hash` does not fit in
    /// 32 bits.
    pub fn try_from_u64(hash: u64) -> Result<Self> {
        u32::try_from(hash)
            .map(Self)
            .map_err(|_| ConfigError::DomainHashOutOfRange { hash }.into())
    }

    /// Replaces the most significant byte with a local (datacenter or
    /// machine) id, keeping the low 24 bits of the domain hash.
    #[must_use]
    pub const fn with_local_id(self, local_id: u8) -> Self {
        Self(((local_id as u32) << 24) | (self.0 & 0x00FF_FFFF))
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for DomainHash {
    fn from(hash: u32) -> Self {
        Self(hash)
    }
}

impl From<DomainHash> for u32 {
    fn from(hash: DomainHash) -> Self {
        hash.0
    }
}

impl fmt::Display for DomainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl fmt::Debug for DomainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DomainHash({:#010x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn hashes_known_domain() {
        assert_eq!(DomainHash::of("example.com").get(), 2_261_653_831);
    }

    #[test]
    fn hashing_is_deterministic() {
        assert_eq!(DomainHash::of("yusur.moe"), DomainHash::of("yusur.moe"));
        assert_ne!(DomainHash::of("yusur.moe"), DomainHash::of("yusur.moe."));
    }

    #[test]
    fn empty_domain_is_hashed_like_any_other() {
        // sha256("") ends in ...7852b855
        assert_eq!(DomainHash::of("").get(), 0x7852_b855);
    }

    #[test]
    fn local_id_replaces_top_byte() {
        let hash = DomainHash::of("example.com").with_local_id(7);
        assert_eq!(hash.get(), 130_947_399);
        assert_eq!(hash.get() >> 24, 7);

        assert_eq!(DomainHash::of("example.com").with_local_id(0).get() >> 24, 0);
    }

    #[test]
    fn rejects_wide_pre_hashed_values() {
        assert_eq!(
            DomainHash::try_from_u64(u64::from(u32::MAX)).unwrap().get(),
            u32::MAX
        );
        assert_eq!(
            DomainHash::try_from_u64(1 << 32).unwrap_err(),
            Error::Configuration(ConfigError::DomainHashOutOfRange { hash: 1 << 32 })
        );
    }

    #[test]
    fn displays_as_padded_hex() {
        assert_eq!(DomainHash::from_u32(0xab).to_string(), "000000ab");
    }
}
