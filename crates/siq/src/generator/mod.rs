mod allocator;
mod cache;
mod mutex;
mod siq;
mod snowflake;
mod status;
#[cfg(test)]
mod tests;
mod wait;

pub use cache::*;
pub use siq::*;
pub use snowflake::*;
pub use status::*;
