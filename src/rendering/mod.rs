//! # Rendering Module
//!
//! Plain-text output of generated grids, one glyph per cell.

pub mod ascii;

pub use ascii::*;
