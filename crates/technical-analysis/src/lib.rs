pub mod indicators;
pub mod levels;
pub mod momentum;

#[cfg(test)]
mod indicators_tests;

pub use indicators::*;
pub use levels::*;
pub use momentum::*;
