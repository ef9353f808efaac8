//! # Post-processing
//!
//! Ordered rewrite passes run over a solved layout to make it look less
//! mechanical: isolated water is drained, building clusters grow or thin
//! out, and a little vacant ground is scattered over open land.
//!
//! Every pass copies its input and scans the copy row by row, so a cell sees
//! the rewrites made to earlier cells of the same pass. All random trials
//! are drawn from the caller's stream and only when the neighbourhood
//! condition in front of them holds.

use crate::generation::{KindId, TileCatalog, TileCategory, TileGrid};
use crate::utils::{Direction, Position};
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

/// Chance an isolated water cell drains to open ground.
const DRAIN_CHANCE: f64 = 0.7;
/// Chance open ground surrounded by water floods.
const FLOOD_CHANCE: f64 = 0.4;
/// Chance a clustered building spreads to a free side.
const SPREAD_CHANCE: f64 = 0.3;
/// Chance a lone building is cleared.
const CLEAR_CHANCE: f64 = 0.8;
/// Chance an open cell becomes vacant ground.
const SCATTER_CHANCE: f64 = 0.05;

/// Which catalog kinds each pass reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassRoles {
    /// Open ground, the catalog's default kind
    pub open: KindId,
    /// All water kinds
    pub water: Vec<KindId>,
    /// The kind flooded cells turn into
    pub primary_water: Option<KindId>,
    /// The kind scattered details turn into
    pub vacant: Option<KindId>,
    /// All built kinds
    pub buildings: Vec<KindId>,
}

impl PassRoles {
    /// Derives the roles from kind categories.
    pub fn from_catalog(catalog: &TileCatalog) -> Self {
        let water: Vec<KindId> = catalog.kinds_in(TileCategory::Water).collect();
        Self {
            open: catalog.default_kind(),
            primary_water: water.first().copied(),
            water,
            vacant: catalog.first_of(TileCategory::Vacant),
            buildings: catalog.kinds_in(TileCategory::Built).collect(),
        }
    }

    pub fn is_water(&self, kind: KindId) -> bool {
        self.water.contains(&kind)
    }

    pub fn is_building(&self, kind: KindId) -> bool {
        self.buildings.contains(&kind)
    }
}

/// A single grid rewrite.
pub trait RewritePass {
    /// Returns a rewritten copy of `grid`.
    fn apply(&self, grid: &TileGrid, roles: &PassRoles, rng: &mut StdRng) -> TileGrid;

    /// Name used in log output.
    fn pass_name(&self) -> &'static str;
}

fn is_interior(grid: &TileGrid, x: usize, y: usize) -> bool {
    x >= 1 && y >= 1 && x + 1 < grid.width() && y + 1 < grid.height()
}

/// Drains isolated water and floods open ground that water surrounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaterSmoothing;

impl RewritePass for WaterSmoothing {
    fn apply(&self, grid: &TileGrid, roles: &PassRoles, rng: &mut StdRng) -> TileGrid {
        let mut out = grid.clone();
        let Some(flood_kind) = roles.primary_water else {
            return out;
        };

        for y in 0..out.height() {
            for x in 0..out.width() {
                if !is_interior(&out, x, y) {
                    continue;
                }
                let Some(kind) = out.get(x, y) else {
                    continue;
                };
                let water_around = out.count_adjacent_where(x, y, |k| roles.is_water(k));

                if roles.is_water(kind) {
                    if water_around < 3 && rng.gen_bool(DRAIN_CHANCE) {
                        out.set(x, y, roles.open);
                    }
                } else if kind == roles.open && water_around >= 5 && rng.gen_bool(FLOOD_CHANCE) {
                    out.set(x, y, flood_kind);
                }
            }
        }
        out
    }

    fn pass_name(&self) -> &'static str {
        "WaterSmoothing"
    }
}

/// Grows buildings that already sit in a cluster and clears lone ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterReinforcement;

impl ClusterReinforcement {
    /// Spread order before shuffling.
    const SPREAD_ORDER: [Direction; 4] = [
        Direction::South,
        Direction::East,
        Direction::North,
        Direction::West,
    ];

    fn spread(grid: &mut TileGrid, x: usize, y: usize, kind: KindId, open: KindId, rng: &mut StdRng) {
        let mut directions = Self::SPREAD_ORDER;
        directions.shuffle(rng);

        let origin = Position::from_cell(x, y);
        for direction in directions {
            let target = origin + direction.to_delta();
            if grid.at(target) == Some(open) {
                if let Some((nx, ny)) = target.cell_in(grid.width(), grid.height()) {
                    grid.set(nx, ny, kind);
                }
                break;
            }
        }
    }
}

impl RewritePass for ClusterReinforcement {
    fn apply(&self, grid: &TileGrid, roles: &PassRoles, rng: &mut StdRng) -> TileGrid {
        let mut out = grid.clone();
        if roles.buildings.is_empty() {
            return out;
        }

        for y in 0..out.height() {
            for x in 0..out.width() {
                if !is_interior(&out, x, y) {
                    continue;
                }
                let Some(kind) = out.get(x, y).filter(|&k| roles.is_building(k)) else {
                    continue;
                };
                let same = out.count_adjacent(x, y, kind);

                if same >= 2 && rng.gen_bool(SPREAD_CHANCE) {
                    Self::spread(&mut out, x, y, kind, roles.open, rng);
                }
                if same == 0 && rng.gen_bool(CLEAR_CHANCE) {
                    out.set(x, y, roles.open);
                }
            }
        }
        out
    }

    fn pass_name(&self) -> &'static str {
        "ClusterReinforcement"
    }
}

/// Turns a small share of open ground into vacant lots.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetailScatter;

impl RewritePass for DetailScatter {
    fn apply(&self, grid: &TileGrid, roles: &PassRoles, rng: &mut StdRng) -> TileGrid {
        let mut out = grid.clone();
        let Some(vacant) = roles.vacant else {
            return out;
        };

        for y in 0..out.height() {
            for x in 0..out.width() {
                if out.get(x, y) == Some(roles.open) && rng.gen_bool(SCATTER_CHANCE) {
                    out.set(x, y, vacant);
                }
            }
        }
        out
    }

    fn pass_name(&self) -> &'static str {
        "DetailScatter"
    }
}

/// Runs rewrite passes in order over a solved grid.
///
/// # Examples
///
/// ```
/// use citygen::{create_rng, PostProcessor, TileCatalog, TileGrid};
///
/// let catalog = TileCatalog::organic_city();
/// let processor = PostProcessor::for_catalog(&catalog);
/// let grid = TileGrid::filled(8, 8, catalog.default_kind());
///
/// let processed = processor.process(&grid, &mut create_rng(3));
/// assert_eq!(processed.width(), 8);
/// assert_eq!(
///     processor.pass_names(),
///     vec!["WaterSmoothing", "ClusterReinforcement", "DetailScatter"]
/// );
/// ```
pub struct PostProcessor {
    roles: PassRoles,
    passes: Vec<Box<dyn RewritePass>>,
}

impl PostProcessor {
    /// The standard pipeline: water smoothing, cluster reinforcement, detail scatter.
    pub fn for_catalog(catalog: &TileCatalog) -> Self {
        Self {
            roles: PassRoles::from_catalog(catalog),
            passes: vec![
                Box::new(WaterSmoothing),
                Box::new(ClusterReinforcement),
                Box::new(DetailScatter),
            ],
        }
    }

    /// Replaces the pass list.
    pub fn with_passes(mut self, passes: Vec<Box<dyn RewritePass>>) -> Self {
        self.passes = passes;
        self
    }

    pub fn roles(&self) -> &PassRoles {
        &self.roles
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.pass_name()).collect()
    }

    /// Applies every pass in order and returns the final grid.
    pub fn process(&self, grid: &TileGrid, rng: &mut StdRng) -> TileGrid {
        let mut current = grid.clone();
        for pass in &self.passes {
            let next = pass.apply(&current, &self.roles, rng);
            let changed = current
                .cells()
                .iter()
                .zip(next.cells())
                .filter(|(before, after)| before != after)
                .count();
            debug!("{} rewrote {} cells", pass.pass_name(), changed);
            current = next;
        }
        current
    }
}

impl std::fmt::Debug for PostProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostProcessor")
            .field("roles", &self.roles)
            .field("passes", &self.pass_names())
            .finish()
    }
}
