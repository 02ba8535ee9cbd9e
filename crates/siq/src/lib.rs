//! # siq
//!
//! Sortable, self-describing identifiers for systems that mint ids on many
//! independent processes without talking to each other.
//!
//! A [`Siq`] is a 112-bit value stored in 16 bytes:
//!
//! ```text
//!  tttttttt tttttttt tttttttt tttttttt tttttttt uuuuuuuu uuuuuuuu
//!  ssssssss dddddddd dddddddd dddddddd dddddddd nnnnnnnn nnqqqqqq
//!
//!  t = seconds since 1970-01-01 00:00 UTC (40 bits)
//!  u = fraction of a second in 1/65536 units (16 bits)
//!  s = shard id (8 bits)
//!  d = domain hash (32 bits)
//!  n = serial within one tick
//!  q = qualifier (entity category, low bit = leaf)
//! ```
//!
//! The timestamp sits in the highest bits, so plain integer comparison of two
//! ids is creation order. Shard and domain hash keep ids from different
//! processes and deployments apart, and the qualifier makes every id say what
//! kind of entity it names.
//!
//! ```
//! use siq::{GeneratorConfig, SiqGenerator, SiqType};
//!
//! let generator = SiqGenerator::new(
//!     GeneratorConfig::new("example.com").with_shard(3),
//! )
//! .unwrap();
//!
//! let a = generator.next_id(SiqType::Content).unwrap();
//! let b = generator.next_id(SiqType::Account).unwrap();
//! assert!(a < b);
//! assert!(a.is_leaf());
//! assert!(!b.is_leaf());
//! assert_eq!(a.shard(), 3);
//! ```
//!
//! A 64-bit Snowflake profile ([`SnowflakeId`]) shares the same serial
//! allocation rules for callers that need the narrower format.

mod config;
mod domain;
mod error;
mod generator;
mod id;
#[cfg(feature = "serde")]
pub mod serde_ext;
#[cfg(feature = "base32")]
mod text;
mod time;
#[cfg(feature = "uuid")]
mod interop;

pub use crate::config::*;
pub use crate::domain::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
#[cfg(feature = "base32")]
pub use crate::text::*;
pub use crate::time::*;
