//! Storage in 128-bit UUID columns.
//!
//! A [`Siq`] already fits a UUID's 16 bytes: its padding bits are the
//! UUID's top bits, so the conversion reinterprets the integer and keeps
//! the byte order (and thus the sort order) intact.

use uuid::Uuid;

use crate::{Error, Result, Siq};

impl From<Siq> for Uuid {
    fn from(id: Siq) -> Self {
        Self::from_u128(id.to_raw())
    }
}

impl TryFrom<Uuid> for Siq {
    type Error = Error;

    /// # Errors
    ///
    /// [`DecodeError::Overflow`](crate::DecodeError::Overflow) if the UUID
    /// sets any of the top 16 bits, which a `Siq` keeps zero.
    fn try_from(uuid: Uuid) -> Result<Self> {
        Self::try_from(uuid.as_u128())
    }
}
