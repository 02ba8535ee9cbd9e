mod interface;
mod qualifier;
mod siq;
mod snowflake;
mod timestamp;
mod ulid;

pub use interface::*;
pub(crate) use qualifier::WORD_BITS;
pub use qualifier::{Qualifier, QualifierProfile, SiqType};
pub use siq::*;
pub use snowflake::*;
pub use timestamp::*;
pub use ulid::Ulid;
