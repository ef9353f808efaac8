//! # Citygen
//!
//! Procedural city layouts and world maps built around a Wave Function Collapse solver.
//!
//! ## Architecture Overview
//!
//! The crate is organised around a small number of concepts:
//!
//! - **Tile Catalog**: the tile kinds, their weights, footprints and adjacency rules
//! - **Solver**: entropy-driven collapse with constraint propagation over an admissibility grid
//! - **Post-processing**: ordered rewrite passes that smooth water and reinforce clusters
//! - **World Generation**: noise-driven terrain, temperature bands and city sites
//! - **Rendering**: plain-text glyph output used by the command line tool
//!
//! Every generator owns its random stream. Two generators built from the same
//! options produce identical grids, and nothing is shared between instances, so
//! callers can run several generations on separate threads without locking.

pub mod generation;
pub mod rendering;
pub mod utils;

// Core module re-exports
pub use generation::*;
pub use rendering::*;
pub use utils::*;

/// Core error type for the citygen crate.
#[derive(thiserror::Error, Debug)]
pub enum CityGenError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Options or catalog are unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generated content failed validation
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Result type used throughout the citygen codebase.
pub type CityGenResult<T> = Result<T, CityGenError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Generation defaults.
pub mod config {
    /// Side length of a generated city layout in tiles
    pub const DEFAULT_CITY_SIZE: usize = 50;

    /// Share of selection weight given to built tile kinds
    pub const DEFAULT_URBAN_DENSITY: f64 = 0.45;

    /// Full solve attempts before a partial grid is returned
    pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

    /// Collapse steps allowed per attempt for the organic city preset
    pub const DEFAULT_ITERATION_BUDGET: usize = 30_000;

    /// Default world width in tiles
    pub const DEFAULT_WORLD_WIDTH: usize = 120;

    /// Default world height in tiles
    pub const DEFAULT_WORLD_HEIGHT: usize = 67;
}
