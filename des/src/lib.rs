//! Shared support for paced, wall-clock simulations
//!
//! - [`random`]: uniform sources and exponential interval sampling
//! - [`parallel`]: running independent scenarios across threads

pub mod parallel;
pub mod random;
