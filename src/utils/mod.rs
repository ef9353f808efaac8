//! # Utilities Module
//!
//! Grid coordinates and random stream helpers used across generation.

pub mod position;
pub mod rng;

pub use position::*;
pub use rng::*;
