//! # Generation Module
//!
//! Procedural content generation for city layouts and world maps.
//!
//! City layouts come from a Wave Function Collapse solver: every cell starts out
//! admitting every tile kind, the most constrained cell is collapsed by a
//! weighted draw, and the consequences are propagated to its neighbours until
//! the grid is fully determined. A short post-processing pipeline then smooths
//! water and reinforces building clusters. World maps combine Perlin terrain,
//! fractal temperature bands and city sites whose seeds feed the city solver.

pub mod catalog;
pub mod city;
pub mod climate;
pub mod entropy;
pub mod grid;
pub mod postprocess;
pub mod settlements;
pub mod solver;
pub mod world;

pub use catalog::*;
pub use city::*;
pub use climate::*;
pub use entropy::*;
pub use grid::*;
pub use postprocess::*;
pub use settlements::*;
pub use solver::*;
pub use world::*;

use crate::config::{
    DEFAULT_CITY_SIZE, DEFAULT_ITERATION_BUDGET, DEFAULT_MAX_ATTEMPTS, DEFAULT_URBAN_DENSITY,
};
use crate::{CityGenError, CityGenResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options for one city layout generation.
///
/// Controls the grid size, the tile catalog, the random seed and how strongly
/// the solver favours built tile kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Grid width in cells
    pub width: usize,
    /// Grid height in cells
    pub height: usize,
    /// Tile kinds and adjacency rules
    #[serde(default)]
    pub catalog: TileCatalog,
    /// Random seed; zero picks one from the system clock
    #[serde(default)]
    pub seed: u64,
    /// Weight of built kinds in the cached entropy scores (0.0 to 1.0).
    ///
    /// Cell selection and the collapse draw use raw catalog weights, so this
    /// does not change the solved grid; it only shows in `Solver::entropy_at`.
    #[serde(default = "default_density")]
    pub density: f64,
    /// Full solve attempts before a partial grid is returned
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Collapse steps allowed per attempt; `None` means unbounded
    #[serde(default)]
    pub iteration_budget: Option<usize>,
}

fn default_density() -> f64 {
    DEFAULT_URBAN_DENSITY
}

fn default_max_attempts() -> usize {
    DEFAULT_MAX_ATTEMPTS
}

impl GenerationOptions {
    /// Creates options with default density and attempt count.
    ///
    /// # Examples
    ///
    /// ```
    /// use citygen::{GenerationOptions, TileCatalog};
    ///
    /// let options = GenerationOptions::new(20, 10, TileCatalog::organic_city()).with_seed(7);
    /// assert_eq!(options.seed, 7);
    /// assert_eq!(options.max_attempts, 3);
    /// assert!(options.validate().is_ok());
    /// ```
    pub fn new(width: usize, height: usize, catalog: TileCatalog) -> Self {
        Self {
            width,
            height,
            catalog,
            seed: 0,
            density: DEFAULT_URBAN_DENSITY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            iteration_budget: None,
        }
    }

    /// The organic city preset: 50x50 cells, density 0.45, 30 000 steps per attempt.
    pub fn organic_city(seed: u64) -> Self {
        Self {
            iteration_budget: Some(DEFAULT_ITERATION_BUDGET),
            ..Self::new(DEFAULT_CITY_SIZE, DEFAULT_CITY_SIZE, TileCatalog::organic_city())
        }
        .with_seed(seed)
    }

    /// Creates small layouts that solve quickly in tests.
    pub fn for_testing(seed: u64) -> Self {
        Self::new(12, 12, TileCatalog::organic_city()).with_seed(seed)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_iteration_budget(mut self, budget: Option<usize>) -> Self {
        self.iteration_budget = budget;
        self
    }

    /// Checks the options before a solver is built.
    pub fn validate(&self) -> CityGenResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CityGenError::InvalidConfig(format!(
                "grid dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !self.density.is_finite() || !(0.0..=1.0).contains(&self.density) {
            return Err(CityGenError::InvalidConfig(format!(
                "density must lie in [0, 1], got {}",
                self.density
            )));
        }
        if self.max_attempts == 0 {
            return Err(CityGenError::InvalidConfig(
                "at least one attempt is required".to_string(),
            ));
        }
        if self.iteration_budget == Some(0) {
            return Err(CityGenError::InvalidConfig(
                "iteration budget must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Serialises the options (catalog included) to pretty JSON.
    pub fn save_to_json(&self) -> CityGenResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates options from JSON. Missing fields take their defaults.
    pub fn load_from_json(json: &str) -> CityGenResult<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Reads options from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> CityGenResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::load_from_json(&json)
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::organic_city(42)
    }
}

/// Trait for procedural generators.
///
/// Generators own their configuration and seed, so `generate` can be called
/// repeatedly and yields the same content for the same configuration.
pub trait Generator<T> {
    /// Generates content.
    fn generate(&self) -> CityGenResult<T>;

    /// Validates that generated content meets requirements.
    fn validate(&self, content: &T) -> CityGenResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}
