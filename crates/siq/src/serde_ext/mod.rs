//! `#[serde(with = "...")]` adapters for [`Siq`](crate::Siq) and
//! [`SnowflakeId`](crate::SnowflakeId).
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use siq::{Siq, SnowflakeId, serde_ext::{as_crockford, as_native}};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Post {
//!     #[serde(with = "as_crockford")]
//!     id: Siq,
//!     #[serde(with = "as_native")]
//!     legacy_id: SnowflakeId,
//! }
//! ```

mod native;
#[cfg(feature = "base32")]
mod crockford;

#[cfg(feature = "base32")]
pub use crockford::*;
pub use native::*;
