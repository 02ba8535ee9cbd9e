mod crockford;
mod format;
mod rfc4648;

pub use format::*;
