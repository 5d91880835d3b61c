//! Options chain derivations: positioning, ATM implied volatility, skew,
//! max pain, unusual activity and term structure.
//!
//! Everything here is synchronous and works on snapshots already fetched by
//! the caller.

pub mod analytics;
pub mod models;


pub use analytics::*;
pub use models::*;
