//! Port traits (interfaces) implemented by infrastructure adapters.

mod chain;
#[cfg(test)]
pub(crate) mod mock;
mod wallet;

pub use chain::*;
pub use wallet::*;
