//! # City Generation
//!
//! The caller-facing pipeline for one city: solve the layout, then run the
//! post-processing passes on the same random stream.

use crate::generation::{
    GenerationOptions, Generator, Settlement, SolveStats, Solver, SolverState, TileGrid,
};
use crate::{CityGenError, CityGenResult};
use log::info;
use serde::{Deserialize, Serialize};

/// Everything one city generation produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityLayout {
    /// Seed the solver actually used
    pub seed: u64,
    /// Solver output before post-processing
    pub raw: TileGrid,
    /// Final grid
    pub grid: TileGrid,
    pub stats: SolveStats,
    pub state: SolverState,
}

/// Generates city layouts from [`GenerationOptions`].
///
/// # Examples
///
/// ```
/// use citygen::{CityGenerator, GenerationOptions, Generator};
///
/// let generator = CityGenerator::new(GenerationOptions::for_testing(5));
/// let grid = generator.generate().unwrap();
/// assert_eq!((grid.width(), grid.height()), (12, 12));
/// assert!(generator.validate(&grid).is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct CityGenerator {
    options: GenerationOptions,
    post_process: bool,
}

impl CityGenerator {
    pub fn new(options: GenerationOptions) -> Self {
        Self {
            options,
            post_process: true,
        }
    }

    /// The 50x50 organic city preset.
    pub fn organic(seed: u64) -> Self {
        Self::new(GenerationOptions::organic_city(seed))
    }

    /// The organic preset seeded from a world settlement.
    pub fn for_settlement(settlement: &Settlement) -> Self {
        Self::organic(settlement.layout_seed())
    }

    /// Skips the post-processing passes; `generate` returns the raw solver grid.
    pub fn without_post_processing(mut self) -> Self {
        self.post_process = false;
        self
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Runs the solver and, unless disabled, the post-processor.
    pub fn generate_layout(&self) -> CityGenResult<CityLayout> {
        let mut solver = Solver::new(self.options.clone())?;
        let raw = solver.run();
        let grid = if self.post_process {
            solver.post_process(&raw)
        } else {
            raw.clone()
        };

        info!(
            "City layout {}x{} ready (seed {}, state {:?})",
            grid.width(),
            grid.height(),
            solver.seed(),
            solver.state()
        );

        Ok(CityLayout {
            seed: solver.seed(),
            raw,
            grid,
            stats: solver.stats().clone(),
            state: solver.state(),
        })
    }
}

impl Generator<TileGrid> for CityGenerator {
    fn generate(&self) -> CityGenResult<TileGrid> {
        Ok(self.generate_layout()?.grid)
    }

    fn validate(&self, grid: &TileGrid) -> CityGenResult<()> {
        if grid.width() != self.options.width || grid.height() != self.options.height {
            return Err(CityGenError::GenerationFailed(format!(
                "expected a {}x{} grid, got {}x{}",
                self.options.width,
                self.options.height,
                grid.width(),
                grid.height()
            )));
        }
        if let Some(&unknown) = grid
            .cells()
            .iter()
            .find(|&&kind| !self.options.catalog.contains(kind))
        {
            return Err(CityGenError::GenerationFailed(format!(
                "grid contains unknown kind {}",
                unknown
            )));
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "CityGenerator"
    }
}
