//! # Wave Function Collapse Solver
//!
//! Drives the collapse/propagate loop over an [`AdmissibilityGrid`].
//!
//! Each step picks the undetermined cell with the smallest raw weight sum
//! (ties broken uniformly at random), collapses it with a weighted draw over
//! the kinds it can still host, and propagates the consequences with an
//! explicit-stack flood fill. Contradictions never abort a run: a cell left
//! without candidates takes the catalog's default kind, and every such
//! fallback is counted in [`SolveStats`].

use crate::generation::{
    AdmissibilityGrid, EntropyEstimator, GenerationOptions, KindId, Placement, PostProcessor,
    TileGrid,
};
use crate::utils::{create_rng, resolve_seed};
use crate::{CityGenResult, Position};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Lifecycle of a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverState {
    /// Built or reset, not yet run
    Uninitialized,
    /// Inside `run`
    Running,
    /// Every cell collapsed
    Succeeded,
    /// All attempts ran out of iteration budget
    PartiallyCollapsed,
}

/// Counters describing the last call to [`Solver::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveStats {
    /// Attempts started
    pub attempts: usize,
    /// Cells collapsed by a weighted draw
    pub collapses: usize,
    /// Cells forced to the default kind because no kind could be placed
    pub contradictions: usize,
    /// Cells forced to the default kind because no cell had positive weight left
    pub exhausted_fallbacks: usize,
    /// Kinds removed by propagation
    pub removals: usize,
}

impl SolveStats {
    /// Total number of default-kind fallbacks.
    pub fn fallbacks(&self) -> usize {
        self.contradictions + self.exhausted_fallbacks
    }
}

/// Wave Function Collapse solver for a single grid.
///
/// A solver owns its grid and random stream; it is never shared between
/// generations.
///
/// # Examples
///
/// ```
/// use citygen::{GenerationOptions, Solver, SolverState};
///
/// let mut solver = Solver::new(GenerationOptions::for_testing(42)).unwrap();
/// let grid = solver.run();
/// assert_eq!(grid.width(), 12);
/// assert_eq!(solver.state(), SolverState::Succeeded);
/// ```
#[derive(Debug, Clone)]
pub struct Solver {
    options: GenerationOptions,
    seed: u64,
    grid: AdmissibilityGrid,
    estimator: EntropyEstimator,
    rng: StdRng,
    state: SolverState,
    stats: SolveStats,
    placements: Vec<Placement>,
}

impl Solver {
    /// Builds a solver, failing fast on invalid options.
    pub fn new(options: GenerationOptions) -> CityGenResult<Self> {
        options.validate()?;

        let seed = resolve_seed(options.seed);
        let estimator = EntropyEstimator::new(&options.catalog, options.density);
        let grid = AdmissibilityGrid::new(
            options.width,
            options.height,
            options.catalog.len(),
            estimator.initial_entropy(),
        );

        Ok(Self {
            options,
            seed,
            grid,
            estimator,
            rng: create_rng(seed),
            state: SolverState::Uninitialized,
            stats: SolveStats::default(),
            placements: Vec::new(),
        })
    }

    /// The seed actually in use (resolved from the clock when the options said zero).
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    pub fn stats(&self) -> &SolveStats {
        &self.stats
    }

    pub fn grid(&self) -> &AdmissibilityGrid {
        &self.grid
    }

    /// Placements made during the current attempt, in order.
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Cached, jittered entropy of a cell.
    pub fn entropy_at(&self, x: usize, y: usize) -> f64 {
        self.grid.entropy_at(x, y)
    }

    /// Clears the grid: every cell admits every kind again.
    ///
    /// The random stream is not rewound, so a later `run` continues it.
    pub fn reset(&mut self) {
        self.grid.reset(self.estimator.initial_entropy());
        self.placements.clear();
        self.state = SolverState::Uninitialized;
    }

    /// Solves the grid and returns the collapsed kinds.
    ///
    /// Makes up to `max_attempts` attempts, each from a clean grid. The first
    /// attempt that collapses every cell wins. If every attempt runs out of
    /// iteration budget, the last partial grid is returned with undetermined
    /// cells reported as the default kind.
    pub fn run(&mut self) -> TileGrid {
        let max_attempts = self.options.max_attempts.max(1);
        info!(
            "Starting generation of {}x{} grid with seed {}",
            self.options.width, self.options.height, self.seed
        );
        self.stats = SolveStats::default();

        for attempt in 1..=max_attempts {
            self.reset();
            self.state = SolverState::Running;
            self.stats.attempts = attempt;
            debug!("Attempt {}/{}", attempt, max_attempts);

            if self.solve_attempt() {
                self.state = SolverState::Succeeded;
                if self.stats.fallbacks() > 0 {
                    warn!(
                        "Generation fell back to the default kind {} times ({} contradictions)",
                        self.stats.fallbacks(),
                        self.stats.contradictions
                    );
                }
                info!(
                    "Generation completed after {} attempt(s), {} collapses",
                    attempt, self.stats.collapses
                );
                return self.result_grid();
            }

            debug!(
                "Attempt {} exhausted its iteration budget with {} cells undetermined",
                attempt,
                self.grid.undetermined_count()
            );
        }

        self.state = SolverState::PartiallyCollapsed;
        warn!(
            "Max attempts reached, returning partial result with {} undetermined cells",
            self.grid.undetermined_count()
        );
        self.result_grid()
    }

    /// Runs the post-processing pipeline for this solver's catalog, drawing
    /// from this solver's random stream.
    pub fn post_process(&mut self, grid: &TileGrid) -> TileGrid {
        PostProcessor::for_catalog(&self.options.catalog).process(grid, &mut self.rng)
    }

    /// One attempt. Returns whether every cell collapsed within budget.
    fn solve_attempt(&mut self) -> bool {
        let budget = self.options.iteration_budget.unwrap_or(usize::MAX);
        let mut steps = 0;

        while !self.grid.is_fully_collapsed() {
            if steps >= budget {
                return false;
            }
            steps += 1;

            match self.find_min_entropy_cell() {
                Some((x, y)) => {
                    if let Some(placement) = self.collapse_cell(x, y) {
                        for (cx, cy) in placement.cells() {
                            self.propagate(cx, cy);
                        }
                    }
                }
                None => {
                    if let Some((x, y)) = self.grid.first_undetermined() {
                        debug!("No cell with positive weight left, forcing ({}, {})", x, y);
                        self.stats.exhausted_fallbacks += 1;
                        self.force_default(x, y);
                    }
                }
            }
        }

        true
    }

    /// Finds the undetermined cell with the smallest raw weight sum.
    ///
    /// Cells whose admissible kinds weigh nothing are skipped. Among cells
    /// tied for the minimum one is chosen uniformly at random. Returns `None`
    /// when no undetermined cell has positive weight left.
    pub fn find_min_entropy_cell(&mut self) -> Option<(usize, usize)> {
        let mut min_entropy = f64::MAX;
        let mut candidates = Vec::new();

        for y in 0..self.grid.height() {
            for x in 0..self.grid.width() {
                if self.grid.is_collapsed(x, y) {
                    continue;
                }

                let current = self.estimator.raw_weight_sum(&self.grid, x, y);
                if current <= 0.0 {
                    continue;
                }

                if current < min_entropy {
                    min_entropy = current;
                    candidates.clear();
                    candidates.push((x, y));
                } else if current == min_entropy {
                    candidates.push((x, y));
                }
            }
        }

        if candidates.is_empty() {
            return None;
        }
        Some(candidates[self.rng.gen_range(0..candidates.len())])
    }

    /// Collapses (x, y) to one kind.
    ///
    /// Candidates are the kinds still admissible at (x, y) that have positive
    /// weight and whose footprint can be hosted there. The draw uses raw
    /// catalog weights. With no candidates the cell takes the default kind.
    /// Returns `None` only when (x, y) had already collapsed.
    pub fn collapse_cell(&mut self, x: usize, y: usize) -> Option<Placement> {
        if self.grid.is_collapsed(x, y) {
            return None;
        }

        let candidates = self.collapse_candidates(x, y);
        if candidates.is_empty() {
            debug!("Contradiction at ({}, {}), forcing default kind", x, y);
            self.stats.contradictions += 1;
            return self.force_default(x, y);
        }

        let weights: Vec<f64> = candidates.iter().map(|&kind| self.weight_of(kind)).collect();
        let total: f64 = weights.iter().sum();
        let draw = self.rng.gen::<f64>() * total;

        let mut chosen = candidates[0];
        let mut cumulative = 0.0;
        for (&kind, &weight) in candidates.iter().zip(&weights) {
            cumulative += weight;
            if draw <= cumulative {
                chosen = kind;
                break;
            }
        }

        let footprint = self.footprint_of(chosen);
        match self.grid.place(x, y, chosen, footprint) {
            Some(placement) => {
                self.stats.collapses += 1;
                self.placements.push(placement);
                Some(placement)
            }
            None => self.force_default(x, y),
        }
    }

    /// Narrows the neighbours of (x, y) until nothing changes.
    ///
    /// Flood fill over 4-neighbours with an explicit stack. A neighbour loses
    /// every kind that is compatible with none of the kinds left in the
    /// current cell; a neighbour that lost something is pushed so the change
    /// can cascade. Each cell is expanded at most once per call.
    pub fn propagate(&mut self, x: usize, y: usize) {
        let mut stack = vec![(x, y)];
        let mut visited = HashSet::new();

        while let Some((cx, cy)) = stack.pop() {
            if !visited.insert((cx, cy)) {
                continue;
            }

            for neighbor in Position::from_cell(cx, cy).cardinal_adjacent_positions() {
                let (nx, ny) = match self.grid.cell_at(neighbor) {
                    Some(cell) => cell,
                    None => continue,
                };
                if self.grid.is_collapsed(nx, ny) {
                    continue;
                }

                let mut changed = false;
                for kind in 0..self.grid.kind_count() {
                    if !self.grid.is_admissible(nx, ny, kind) {
                        continue;
                    }

                    let supported = self
                        .grid
                        .admissible_kinds(cx, cy)
                        .any(|current| self.options.catalog.compatible(current, kind));

                    if !supported {
                        self.grid.remove(nx, ny, kind);
                        self.stats.removals += 1;
                        let score = self.estimator.entropy(&self.grid, nx, ny, &mut self.rng);
                        self.grid.set_entropy(nx, ny, score);
                        changed = true;
                    }
                }

                if changed {
                    stack.push((nx, ny));
                }
            }
        }
    }

    fn collapse_candidates(&self, x: usize, y: usize) -> Vec<KindId> {
        self.grid
            .admissible_kinds(x, y)
            .filter(|&kind| {
                self.weight_of(kind) > 0.0 && self.grid.can_host(x, y, kind, self.footprint_of(kind))
            })
            .collect()
    }

    fn force_default(&mut self, x: usize, y: usize) -> Option<Placement> {
        let default_kind = self.options.catalog.default_kind();
        let placement = self.grid.place(x, y, default_kind, 1)?;
        self.placements.push(placement);
        Some(placement)
    }

    fn weight_of(&self, kind: KindId) -> f64 {
        self.options.catalog.kind(kind).map_or(0.0, |k| k.weight)
    }

    fn footprint_of(&self, kind: KindId) -> usize {
        self.options.catalog.kind(kind).map_or(1, |k| k.footprint)
    }

    fn result_grid(&self) -> TileGrid {
        self.grid.to_tile_grid(self.options.catalog.default_kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{kinds, AdjacencyRules, TileCatalog, TileCategory, TileKind};

    fn options_for(catalog: TileCatalog, width: usize, height: usize, seed: u64) -> GenerationOptions {
        GenerationOptions::new(width, height, catalog).with_seed(seed)
    }

    fn single_kind_catalog() -> TileCatalog {
        TileCatalog::new(vec![TileKind::new(0, "only", TileCategory::Open, 1.0)], 0).unwrap()
    }

    #[test]
    fn test_solver_creation() {
        let solver = Solver::new(GenerationOptions::for_testing(12345)).unwrap();
        assert_eq!(solver.seed(), 12345);
        assert_eq!(solver.state(), SolverState::Uninitialized);
        assert_eq!(solver.grid().undetermined_count(), 144);
        assert!((solver.entropy_at(0, 0) - 2.75).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_options_fail_fast() {
        let result = Solver::new(GenerationOptions::for_testing(1).with_size(0, 4));
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_seed_is_resolved() {
        let solver = Solver::new(GenerationOptions::for_testing(0)).unwrap();
        assert_ne!(solver.seed(), 0);
    }

    #[test]
    fn test_single_cell_single_kind() {
        let mut solver = Solver::new(options_for(single_kind_catalog(), 1, 1, 5)).unwrap();
        let grid = solver.run();
        assert_eq!(grid.to_rows(), vec![vec![0]]);
        assert_eq!(solver.state(), SolverState::Succeeded);
        assert_eq!(solver.stats().collapses, 1);
        assert_eq!(solver.stats().fallbacks(), 0);
    }

    #[test]
    fn test_oversized_footprint_never_chosen_on_tiny_grid() {
        let kinds = vec![
            TileKind::new(0, "yard", TileCategory::Open, 0.1),
            TileKind::new(1, "hall", TileCategory::Built, 100.0).with_footprint(2),
        ];
        let catalog = TileCatalog::new(kinds, 0).unwrap();
        for seed in 1..20 {
            let mut solver = Solver::new(options_for(catalog.clone(), 1, 1, seed)).unwrap();
            let grid = solver.run();
            assert_eq!(grid.get(0, 0), Some(0));
            assert_eq!(solver.state(), SolverState::Succeeded);
        }
    }

    #[test]
    fn test_run_is_deterministic() {
        let first = Solver::new(GenerationOptions::for_testing(42)).unwrap().run();
        let second = Solver::new(GenerationOptions::for_testing(42)).unwrap().run();
        assert_eq!(first, second);
    }

    #[test]
    fn test_run_collapses_every_cell() {
        let mut solver = Solver::new(GenerationOptions::for_testing(7)).unwrap();
        let grid = solver.run();
        assert!(solver.grid().is_fully_collapsed());
        assert_eq!(grid.width(), 12);
        assert_eq!(grid.height(), 12);
        for &kind in grid.cells() {
            assert!(solver.options().catalog.contains(kind));
        }
    }

    #[test]
    fn test_placements_cover_grid_exactly_once() {
        let mut solver = Solver::new(GenerationOptions::for_testing(3).with_density(0.9)).unwrap();
        let grid = solver.run();
        let mut covered = vec![0usize; grid.width() * grid.height()];
        for placement in solver.placements() {
            for (x, y) in placement.cells() {
                assert!(x < grid.width() && y < grid.height());
                assert_eq!(grid.get(x, y), Some(placement.kind));
                covered[y * grid.width() + x] += 1;
            }
        }
        assert!(covered.iter().all(|&count| count == 1));
    }

    #[test]
    fn test_no_water_next_to_buildings() {
        for seed in 1..6 {
            let mut solver = Solver::new(GenerationOptions::for_testing(seed)).unwrap();
            let grid = solver.run();
            for y in 0..grid.height() {
                for x in 0..grid.width() {
                    if grid.get(x, y) != Some(kinds::WATER) {
                        continue;
                    }
                    for pos in Position::from_cell(x, y).cardinal_adjacent_positions() {
                        let neighbor = grid.at(pos);
                        assert_ne!(neighbor, Some(kinds::SMALL_HOUSE));
                        assert_ne!(neighbor, Some(kinds::LARGE_BUILDING));
                    }
                }
            }
        }
    }

    #[test]
    fn test_zero_weight_kind_never_appears() {
        let kinds = vec![
            TileKind::new(0, "field", TileCategory::Open, 1.0),
            TileKind::new(1, "ghost", TileCategory::Open, 0.0),
            TileKind::new(2, "grove", TileCategory::Open, 0.5),
        ];
        let catalog = TileCatalog::new(kinds, 0).unwrap();
        for seed in 1..10 {
            let grid = Solver::new(options_for(catalog.clone(), 6, 6, seed)).unwrap().run();
            assert_eq!(grid.count(1), 0);
        }
    }

    #[test]
    fn test_propagate_removes_unsupported_kinds() {
        // Kinds 0 and 1 only tolerate themselves.
        let kinds = vec![
            TileKind::new(0, "red", TileCategory::Open, 1.0)
                .with_rules(AdjacencyRules::new().with(0, &[0])),
            TileKind::new(1, "blue", TileCategory::Open, 1.0)
                .with_rules(AdjacencyRules::new().with(1, &[1])),
        ];
        let catalog = TileCatalog::new(kinds, 0).unwrap();
        let mut solver = Solver::new(options_for(catalog, 3, 3, 1)).unwrap();

        solver.grid.place(1, 1, 1, 1).unwrap();
        solver.propagate(1, 1);

        for (x, y) in [(1, 0), (0, 1), (2, 1), (1, 2)] {
            assert_eq!(solver.grid().admissible_kinds(x, y).collect::<Vec<_>>(), vec![1]);
        }
        // Diagonal cells are reached through the cascade.
        assert_eq!(solver.grid().admissible_kinds(0, 0).collect::<Vec<_>>(), vec![1]);
        assert!(solver.stats().removals >= 8);
    }

    #[test]
    fn test_propagate_skips_collapsed_neighbours() {
        let kinds = vec![
            TileKind::new(0, "red", TileCategory::Open, 1.0)
                .with_rules(AdjacencyRules::new().with(0, &[0])),
            TileKind::new(1, "blue", TileCategory::Open, 1.0)
                .with_rules(AdjacencyRules::new().with(1, &[1])),
        ];
        let catalog = TileCatalog::new(kinds, 0).unwrap();
        let mut solver = Solver::new(options_for(catalog, 2, 1, 1)).unwrap();

        solver.grid.place(0, 0, 0, 1).unwrap();
        solver.grid.place(1, 0, 1, 1).unwrap();
        solver.propagate(0, 0);
        assert_eq!(solver.grid().collapsed_at(1, 0), Some(1));
        assert_eq!(solver.stats().removals, 0);
    }

    #[test]
    fn test_contradiction_forces_default_kind() {
        let mut solver = Solver::new(GenerationOptions::for_testing(1)).unwrap();
        for kind in 0..5 {
            solver.grid.remove(4, 4, kind);
        }
        let placement = solver.collapse_cell(4, 4).unwrap();
        assert_eq!(placement.kind, kinds::GRASS);
        assert_eq!(solver.stats().contradictions, 1);
        assert!(solver.collapse_cell(4, 4).is_none());
    }

    #[test]
    fn test_find_min_prefers_constrained_cells() {
        let mut solver = Solver::new(GenerationOptions::for_testing(1)).unwrap();
        solver.grid.remove(5, 6, kinds::GRASS);
        assert_eq!(solver.find_min_entropy_cell(), Some((5, 6)));
    }

    #[test]
    fn test_find_min_none_without_weight() {
        let mut solver = Solver::new(options_for(single_kind_catalog(), 2, 1, 1)).unwrap();
        solver.grid.remove(0, 0, 0);
        solver.grid.remove(1, 0, 0);
        assert_eq!(solver.find_min_entropy_cell(), None);
    }

    #[test]
    fn test_run_forces_default_when_nothing_is_compatible() {
        // Each kind lists only the other under its own key, so no pair is compatible.
        let kinds = vec![
            TileKind::new(0, "north", TileCategory::Open, 1.0)
                .with_rules(AdjacencyRules::new().with(0, &[1])),
            TileKind::new(1, "south", TileCategory::Open, 1.0)
                .with_rules(AdjacencyRules::new().with(1, &[0])),
        ];
        let catalog = TileCatalog::new(kinds, 0).unwrap();
        assert!(!catalog.compatible(0, 0));
        assert!(!catalog.compatible(0, 1));
        assert!(!catalog.compatible(1, 1));

        let mut solver = Solver::new(options_for(catalog, 6, 5, 3)).unwrap();
        let grid = solver.run();

        assert_eq!(solver.state(), SolverState::Succeeded);
        assert_eq!(solver.grid().undetermined_count(), 0);
        assert_eq!(solver.stats().collapses, 1);
        assert_eq!(solver.stats().contradictions, 0);
        assert_eq!(solver.stats().exhausted_fallbacks, 29);
        assert_eq!(grid, TileGrid::filled(6, 5, 0));
    }

    #[test]
    fn test_iteration_budget_yields_partial_grid() {
        let options = options_for(single_kind_catalog(), 3, 3, 8).with_iteration_budget(Some(1));
        let mut solver = Solver::new(options).unwrap();
        let grid = solver.run();
        assert_eq!(solver.state(), SolverState::PartiallyCollapsed);
        assert_eq!(solver.stats().attempts, 3);
        assert_eq!(solver.grid().undetermined_count(), 8);
        assert_eq!(grid, TileGrid::filled(3, 3, 0));
    }

    #[test]
    fn test_rerun_restarts_from_clean_grid() {
        let mut solver = Solver::new(GenerationOptions::for_testing(21)).unwrap();
        let first = solver.run();
        let second = solver.run();
        assert_eq!(solver.state(), SolverState::Succeeded);
        assert_eq!(second.width(), first.width());
        assert_eq!(solver.stats().attempts, 1);

        // A rerun continues the stream, so it matches a fresh solver's second run.
        let mut twin = Solver::new(GenerationOptions::for_testing(21)).unwrap();
        twin.run();
        assert_eq!(twin.run(), second);
    }

    #[test]
    fn test_reset_returns_to_uninitialized() {
        let mut solver = Solver::new(GenerationOptions::for_testing(2)).unwrap();
        solver.run();
        solver.reset();
        assert_eq!(solver.state(), SolverState::Uninitialized);
        assert_eq!(solver.grid().undetermined_count(), 144);
        assert!(solver.placements().is_empty());
    }
}
