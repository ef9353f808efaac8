//! # Entropy Estimation
//!
//! Scores how much choice is left at a cell. Two measures live here:
//!
//! - [`EntropyEstimator::entropy`] is the density-adjusted score cached in the
//!   grid. It accounts for footprint feasibility, cluster reinforcement and the
//!   minimum-distance penalty, and is jittered so equal cells do not tie.
//! - [`EntropyEstimator::raw_weight_sum`] sums plain catalog weights. The solver
//!   uses it to find the next cell to collapse.
//!
//! The two can disagree about which cells tie for the minimum; the solver
//! relies on the raw sum for selection and keeps the cached score up to date
//! for callers that inspect it.

use crate::generation::{AdmissibilityGrid, KindId, TileCatalog};
use rand::rngs::StdRng;
use rand::Rng;

/// Growth factor per footprint step for multi-cell kinds.
const FOOTPRINT_BONUS: f64 = 1.1;
/// Weight added per same-kind neighbour inside the cluster radius.
const CLUSTER_BONUS: f64 = 0.15;
/// Multiplier applied when a same-kind cell sits inside the minimum distance.
const CROWDING_PENALTY: f64 = 0.1;

/// Per-kind inputs to the entropy score.
#[derive(Debug, Clone, PartialEq)]
struct KindProfile {
    raw_weight: f64,
    adjusted_weight: f64,
    footprint: usize,
    cluster_size: Option<usize>,
    min_distance: Option<usize>,
}

/// Computes entropy scores for one catalog and density.
#[derive(Debug, Clone, PartialEq)]
pub struct EntropyEstimator {
    profiles: Vec<KindProfile>,
}

impl EntropyEstimator {
    /// Captures the catalog's weights, scaling built kinds by `density` and
    /// every other kind by `1 - density / 2`.
    pub fn new(catalog: &TileCatalog, density: f64) -> Self {
        let profiles = catalog
            .kinds()
            .iter()
            .map(|kind| {
                let factor = if kind.category.is_built() {
                    density
                } else {
                    1.0 - density * 0.5
                };
                KindProfile {
                    raw_weight: kind.weight,
                    adjusted_weight: kind.weight * factor,
                    footprint: kind.footprint,
                    cluster_size: kind.cluster_size,
                    min_distance: kind.min_distance,
                }
            })
            .collect();
        Self { profiles }
    }

    /// Density-adjusted weight of a kind.
    pub fn adjusted_weight(&self, kind: KindId) -> f64 {
        self.profiles.get(kind).map_or(0.0, |p| p.adjusted_weight)
    }

    /// Score of a fresh cell: the sum of all positive catalog weights.
    pub fn initial_entropy(&self) -> f64 {
        self.profiles
            .iter()
            .map(|p| p.raw_weight)
            .filter(|&weight| weight > 0.0)
            .sum()
    }

    /// Sum of catalog weights of the kinds still admissible at (x, y).
    pub fn raw_weight_sum(&self, grid: &AdmissibilityGrid, x: usize, y: usize) -> f64 {
        grid.admissible_kinds(x, y)
            .map(|kind| self.profiles[kind].raw_weight)
            .sum()
    }

    /// Adjusted entropy of (x, y), jittered by a factor in [0.9, 1.1).
    ///
    /// Collapsed cells score zero and consume no randomness.
    pub fn entropy(&self, grid: &AdmissibilityGrid, x: usize, y: usize, rng: &mut StdRng) -> f64 {
        if grid.is_collapsed(x, y) {
            return 0.0;
        }

        let mut total = 0.0;
        for kind in grid.admissible_kinds(x, y) {
            let profile = &self.profiles[kind];
            let mut weight = profile.adjusted_weight;

            if profile.footprint > 1 {
                if !grid.can_host(x, y, kind, profile.footprint) {
                    continue;
                }
                weight *= FOOTPRINT_BONUS.powi(profile.footprint as i32);
            }

            if let Some(radius) = profile.cluster_size.filter(|&r| r > 1) {
                let same = grid.count_collapsed_within(x, y, kind, radius);
                weight *= 1.0 + same as f64 * CLUSTER_BONUS;
            }

            if let Some(radius) = profile.min_distance.filter(|&r| r > 0) {
                if grid.count_collapsed_within(x, y, kind, radius) > 0 {
                    weight *= CROWDING_PENALTY;
                }
            }

            total += weight;
        }

        total * (0.9 + rng.gen::<f64>() * 0.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{kinds, TileCategory, TileKind};
    use crate::utils::create_rng;

    fn two_kind_catalog() -> TileCatalog {
        let kinds = vec![
            TileKind::new(0, "field", TileCategory::Open, 1.0),
            TileKind::new(1, "tower", TileCategory::Built, 2.0)
                .with_footprint(2)
                .with_cluster_size(2)
                .with_min_distance(1),
        ];
        TileCatalog::new(kinds, 0).unwrap()
    }

    #[test]
    fn test_density_scaling() {
        let catalog = TileCatalog::organic_city();
        let estimator = EntropyEstimator::new(&catalog, 0.5);
        assert!((estimator.adjusted_weight(kinds::SMALL_HOUSE) - 0.35).abs() < 1e-12);
        assert!((estimator.adjusted_weight(kinds::GRASS) - 0.9).abs() < 1e-12);
        assert_eq!(estimator.adjusted_weight(99), 0.0);
    }

    #[test]
    fn test_initial_entropy_sums_positive_weights() {
        let catalog = TileCatalog::organic_city();
        let estimator = EntropyEstimator::new(&catalog, 0.45);
        assert!((estimator.initial_entropy() - 2.75).abs() < 1e-12);
    }

    #[test]
    fn test_raw_weight_sum_tracks_admissibility() {
        let catalog = two_kind_catalog();
        let estimator = EntropyEstimator::new(&catalog, 1.0);
        let mut grid = AdmissibilityGrid::new(3, 3, 2, estimator.initial_entropy());
        assert_eq!(estimator.raw_weight_sum(&grid, 0, 0), 3.0);
        grid.remove(0, 0, 1);
        assert_eq!(estimator.raw_weight_sum(&grid, 0, 0), 1.0);
        grid.remove(0, 0, 0);
        assert_eq!(estimator.raw_weight_sum(&grid, 0, 0), 0.0);
    }

    #[test]
    fn test_collapsed_cell_has_zero_entropy() {
        let catalog = two_kind_catalog();
        let estimator = EntropyEstimator::new(&catalog, 1.0);
        let mut grid = AdmissibilityGrid::new(3, 3, 2, 0.0);
        grid.place(1, 1, 0, 1).unwrap();
        let mut rng = create_rng(1);
        assert_eq!(estimator.entropy(&grid, 1, 1, &mut rng), 0.0);
    }

    #[test]
    fn test_entropy_within_jitter_band() {
        let catalog = two_kind_catalog();
        let estimator = EntropyEstimator::new(&catalog, 1.0);
        let grid = AdmissibilityGrid::new(4, 4, 2, 0.0);
        let mut rng = create_rng(9);

        // field: 1.0 * 0.5, tower: 2.0 * 1.0 * 1.1^2
        let expected = 0.5 + 2.0 * 1.21;
        for _ in 0..50 {
            let score = estimator.entropy(&grid, 0, 0, &mut rng);
            assert!(score >= expected * 0.9 - 1e-9 && score <= expected * 1.1 + 1e-9);
        }
    }

    #[test]
    fn test_infeasible_footprint_is_skipped() {
        let catalog = two_kind_catalog();
        let estimator = EntropyEstimator::new(&catalog, 1.0);
        let grid = AdmissibilityGrid::new(4, 4, 2, 0.0);
        let mut rng = create_rng(3);

        // The bottom-right corner cannot anchor a 2x2 block.
        let score = estimator.entropy(&grid, 3, 3, &mut rng);
        assert!(score >= 0.5 * 0.9 - 1e-9 && score <= 0.5 * 1.1 + 1e-9);
    }

    #[test]
    fn test_crowding_penalty_applies() {
        let kinds = vec![
            TileKind::new(0, "field", TileCategory::Open, 1.0),
            TileKind::new(1, "hut", TileCategory::Built, 1.0).with_min_distance(1),
        ];
        let catalog = TileCatalog::new(kinds, 0).unwrap();
        let estimator = EntropyEstimator::new(&catalog, 1.0);
        let mut grid = AdmissibilityGrid::new(3, 3, 2, 0.0);
        grid.place(0, 0, 1, 1).unwrap();
        grid.remove(1, 1, 0);
        let mut rng = create_rng(5);

        let score = estimator.entropy(&grid, 1, 1, &mut rng);
        assert!(score >= 0.1 * 0.9 - 1e-9 && score <= 0.1 * 1.1 + 1e-9);
    }

    #[test]
    fn test_cluster_bonus_applies() {
        let kinds = vec![
            TileKind::new(0, "field", TileCategory::Open, 1.0),
            TileKind::new(1, "pond", TileCategory::Water, 1.0).with_cluster_size(2),
        ];
        let catalog = TileCatalog::new(kinds, 0).unwrap();
        let estimator = EntropyEstimator::new(&catalog, 0.0);
        let mut grid = AdmissibilityGrid::new(5, 5, 2, 0.0);
        grid.place(0, 0, 1, 1).unwrap();
        grid.place(4, 4, 1, 1).unwrap();
        grid.remove(2, 2, 0);
        let mut rng = create_rng(11);

        // Both ponds are within radius 2 of the centre.
        let expected = 1.0 + 2.0 * CLUSTER_BONUS;
        let score = estimator.entropy(&grid, 2, 2, &mut rng);
        assert!(score >= expected * 0.9 - 1e-9 && score <= expected * 1.1 + 1e-9);
    }
}
