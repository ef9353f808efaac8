//! # Generation Grids
//!
//! The solver's working state and the grid it hands back to callers.
//!
//! [`AdmissibilityGrid`] keeps, for every cell, which tile kinds are still
//! possible, which kind (if any) the cell collapsed to, and a cached entropy
//! score. [`TileGrid`] is the plain result: one kind id per cell.

use crate::generation::KindId;
use crate::Position;
use serde::{Deserialize, Serialize};

/// A placed tile: the anchor cell and the square block it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub x: usize,
    pub y: usize,
    pub kind: KindId,
    pub footprint: usize,
}

impl Placement {
    /// All cells covered by the placement, row-major from the anchor.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.footprint)
            .flat_map(move |dy| (0..self.footprint).map(move |dx| (self.x + dx, self.y + dy)))
    }
}

/// Per-cell admissible kinds, collapsed kinds and cached entropy.
#[derive(Debug, Clone)]
pub struct AdmissibilityGrid {
    width: usize,
    height: usize,
    kind_count: usize,
    /// `width * height * kind_count` flags, cell-major
    admissible: Vec<bool>,
    collapsed: Vec<Option<KindId>>,
    entropy: Vec<f64>,
}

impl AdmissibilityGrid {
    /// Creates a grid where every cell admits every kind.
    pub fn new(width: usize, height: usize, kind_count: usize, initial_entropy: f64) -> Self {
        let cells = width * height;
        Self {
            width,
            height,
            kind_count,
            admissible: vec![true; cells * kind_count],
            collapsed: vec![None; cells],
            entropy: vec![initial_entropy; cells],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn kind_count(&self) -> usize {
        self.kind_count
    }

    fn cell(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    fn flag(&self, x: usize, y: usize, kind: KindId) -> usize {
        self.cell(x, y) * self.kind_count + kind
    }

    /// Restores every cell to "anything goes".
    pub fn reset(&mut self, initial_entropy: f64) {
        self.admissible.fill(true);
        self.collapsed.fill(None);
        self.entropy.fill(initial_entropy);
    }

    /// Maps a signed position to cell indices when it is on the grid.
    pub fn cell_at(&self, pos: Position) -> Option<(usize, usize)> {
        pos.cell_in(self.width, self.height)
    }

    pub fn is_admissible(&self, x: usize, y: usize, kind: KindId) -> bool {
        kind < self.kind_count && self.admissible[self.flag(x, y, kind)]
    }

    /// Kinds still possible at (x, y), in catalog order.
    pub fn admissible_kinds(&self, x: usize, y: usize) -> impl Iterator<Item = KindId> + '_ {
        let start = self.flag(x, y, 0);
        self.admissible[start..start + self.kind_count]
            .iter()
            .enumerate()
            .filter_map(|(kind, &allowed)| allowed.then_some(kind))
    }

    /// Removes `kind` from the cell. Returns whether it was present.
    pub fn remove(&mut self, x: usize, y: usize, kind: KindId) -> bool {
        let index = self.flag(x, y, kind);
        std::mem::replace(&mut self.admissible[index], false)
    }

    pub fn collapsed_at(&self, x: usize, y: usize) -> Option<KindId> {
        self.collapsed[self.cell(x, y)]
    }

    pub fn is_collapsed(&self, x: usize, y: usize) -> bool {
        self.collapsed_at(x, y).is_some()
    }

    pub fn entropy_at(&self, x: usize, y: usize) -> f64 {
        self.entropy[self.cell(x, y)]
    }

    pub fn set_entropy(&mut self, x: usize, y: usize, value: f64) {
        let index = self.cell(x, y);
        self.entropy[index] = value;
    }

    /// Whether an `size` x `size` block anchored at (x, y) lies on the grid
    /// and covers only undetermined cells.
    pub fn footprint_fits(&self, x: usize, y: usize, size: usize) -> bool {
        if x + size > self.width || y + size > self.height {
            return false;
        }
        (y..y + size).all(|cy| (x..x + size).all(|cx| !self.is_collapsed(cx, cy)))
    }

    /// Whether `kind` with the given footprint can be placed at (x, y): the
    /// block fits and every covered cell still admits the kind.
    pub fn can_host(&self, x: usize, y: usize, kind: KindId, size: usize) -> bool {
        self.footprint_fits(x, y, size)
            && (y..y + size).all(|cy| (x..x + size).all(|cx| self.is_admissible(cx, cy, kind)))
    }

    /// Collapses the block anchored at (x, y) to `kind`.
    ///
    /// Succeeds only when every covered cell was undetermined; on failure the
    /// grid is left untouched.
    pub fn place(&mut self, x: usize, y: usize, kind: KindId, size: usize) -> Option<Placement> {
        if kind >= self.kind_count || !self.footprint_fits(x, y, size) {
            return None;
        }
        let placement = Placement {
            x,
            y,
            kind,
            footprint: size,
        };
        for (cx, cy) in placement.cells() {
            let cell = self.cell(cx, cy);
            self.collapsed[cell] = Some(kind);
            self.entropy[cell] = 0.0;
            let start = cell * self.kind_count;
            for (other, flag) in self.admissible[start..start + self.kind_count]
                .iter_mut()
                .enumerate()
            {
                *flag = other == kind;
            }
        }
        Some(placement)
    }

    pub fn is_fully_collapsed(&self) -> bool {
        self.collapsed.iter().all(Option::is_some)
    }

    /// Number of cells that have not collapsed yet.
    pub fn undetermined_count(&self) -> usize {
        self.collapsed.iter().filter(|cell| cell.is_none()).count()
    }

    /// The first undetermined cell in row-major order.
    pub fn first_undetermined(&self) -> Option<(usize, usize)> {
        self.collapsed
            .iter()
            .position(Option::is_none)
            .map(|index| (index % self.width, index / self.width))
    }

    /// Counts cells collapsed to `kind` within Chebyshev distance `radius` of
    /// (x, y), not counting (x, y) itself.
    pub fn count_collapsed_within(&self, x: usize, y: usize, kind: KindId, radius: usize) -> usize {
        let x0 = x.saturating_sub(radius);
        let y0 = y.saturating_sub(radius);
        let x1 = (x + radius).min(self.width - 1);
        let y1 = (y + radius).min(self.height - 1);

        let mut count = 0;
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                if (cx, cy) != (x, y) && self.collapsed_at(cx, cy) == Some(kind) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Snapshot of the collapsed kinds; undetermined cells report `fallback`.
    pub fn to_tile_grid(&self, fallback: KindId) -> TileGrid {
        TileGrid {
            width: self.width,
            height: self.height,
            cells: self
                .collapsed
                .iter()
                .map(|cell| cell.unwrap_or(fallback))
                .collect(),
        }
    }
}

/// A fully sized grid of kind ids, `height` rows of `width` cells.
///
/// # Examples
///
/// ```
/// use citygen::TileGrid;
///
/// let mut grid = TileGrid::filled(3, 2, 7);
/// grid.set(2, 1, 4);
/// assert_eq!(grid.get(2, 1), Some(4));
/// assert_eq!(grid.get(3, 0), None);
/// assert_eq!(grid.to_rows(), vec![vec![7, 7, 7], vec![7, 7, 4]]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileGrid {
    width: usize,
    height: usize,
    cells: Vec<KindId>,
}

impl TileGrid {
    /// Creates a grid with every cell set to `kind`.
    pub fn filled(width: usize, height: usize, kind: KindId) -> Self {
        Self {
            width,
            height,
            cells: vec![kind; width * height],
        }
    }

    /// Builds a grid from rows. Returns `None` for ragged input.
    pub fn from_rows(rows: &[Vec<KindId>]) -> Option<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return None;
        }
        Some(Self {
            width,
            height,
            cells: rows.concat(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> Option<KindId> {
        if x < self.width && y < self.height {
            Some(self.cells[y * self.width + x])
        } else {
            None
        }
    }

    /// Looks up a signed position; off-grid positions yield `None`.
    pub fn at(&self, pos: Position) -> Option<KindId> {
        pos.cell_in(self.width, self.height)
            .and_then(|(x, y)| self.get(x, y))
    }

    /// Overwrites a cell. Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, kind: KindId) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = kind;
        }
    }

    /// Row slices, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[KindId]> {
        self.cells.chunks(self.width.max(1))
    }

    pub fn to_rows(&self) -> Vec<Vec<KindId>> {
        self.rows().map(<[KindId]>::to_vec).collect()
    }

    pub fn cells(&self) -> &[KindId] {
        &self.cells
    }

    /// Number of cells holding `kind`.
    pub fn count(&self, kind: KindId) -> usize {
        self.cells.iter().filter(|&&cell| cell == kind).count()
    }

    /// Counts the 8 neighbours of (x, y) holding `kind`.
    pub fn count_adjacent(&self, x: usize, y: usize, kind: KindId) -> usize {
        Position::from_cell(x, y)
            .adjacent_positions()
            .into_iter()
            .filter(|&pos| self.at(pos) == Some(kind))
            .count()
    }

    /// Counts the 8 neighbours of (x, y) whose kind satisfies `pred`.
    pub fn count_adjacent_where(&self, x: usize, y: usize, pred: impl Fn(KindId) -> bool) -> usize {
        Position::from_cell(x, y)
            .adjacent_positions()
            .into_iter()
            .filter_map(|pos| self.at(pos))
            .filter(|&kind| pred(kind))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_admits_everything() {
        let grid = AdmissibilityGrid::new(4, 3, 5, 2.75);
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.admissible_kinds(3, 2).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
        assert_eq!(grid.entropy_at(1, 1), 2.75);
        assert_eq!(grid.undetermined_count(), 12);
        assert_eq!(grid.first_undetermined(), Some((0, 0)));
    }

    #[test]
    fn test_remove_reports_change() {
        let mut grid = AdmissibilityGrid::new(2, 2, 3, 1.0);
        assert!(grid.remove(1, 0, 2));
        assert!(!grid.remove(1, 0, 2));
        assert_eq!(grid.admissible_kinds(1, 0).collect::<Vec<_>>(), vec![0, 1]);
        assert!(grid.is_admissible(0, 0, 2));
    }

    #[test]
    fn test_place_single_cell() {
        let mut grid = AdmissibilityGrid::new(3, 3, 4, 1.0);
        let placement = grid.place(1, 1, 2, 1).unwrap();
        assert_eq!(placement.cells().collect::<Vec<_>>(), vec![(1, 1)]);
        assert_eq!(grid.collapsed_at(1, 1), Some(2));
        assert_eq!(grid.admissible_kinds(1, 1).collect::<Vec<_>>(), vec![2]);
        assert_eq!(grid.entropy_at(1, 1), 0.0);
        assert!(grid.place(1, 1, 3, 1).is_none());
    }

    #[test]
    fn test_place_footprint_covers_block() {
        let mut grid = AdmissibilityGrid::new(4, 4, 3, 1.0);
        assert!(grid.place(1, 1, 2, 2).is_some());
        for (x, y) in [(1, 1), (2, 1), (1, 2), (2, 2)] {
            assert_eq!(grid.collapsed_at(x, y), Some(2));
        }
        assert!(!grid.is_collapsed(3, 3));
        assert_eq!(grid.undetermined_count(), 12);
    }

    #[test]
    fn test_place_rejects_overlap_and_overflow() {
        let mut grid = AdmissibilityGrid::new(4, 4, 3, 1.0);
        grid.place(2, 2, 0, 1).unwrap();
        assert!(grid.place(1, 1, 1, 2).is_none());
        assert!(!grid.is_collapsed(1, 1));
        assert!(grid.place(3, 0, 1, 2).is_none());
        assert!(grid.place(0, 3, 1, 2).is_none());
    }

    #[test]
    fn test_can_host_requires_admissibility() {
        let mut grid = AdmissibilityGrid::new(4, 4, 3, 1.0);
        assert!(grid.can_host(0, 0, 1, 2));
        grid.remove(1, 1, 1);
        assert!(!grid.can_host(0, 0, 1, 2));
        assert!(grid.footprint_fits(0, 0, 2));
        assert!(grid.can_host(2, 2, 1, 2));
    }

    #[test]
    fn test_count_collapsed_within() {
        let mut grid = AdmissibilityGrid::new(7, 7, 2, 1.0);
        grid.place(3, 3, 1, 1).unwrap();
        grid.place(5, 3, 1, 1).unwrap();
        grid.place(0, 0, 1, 1).unwrap();

        assert_eq!(grid.count_collapsed_within(3, 3, 1, 1), 0);
        assert_eq!(grid.count_collapsed_within(3, 3, 1, 2), 1);
        assert_eq!(grid.count_collapsed_within(3, 3, 1, 3), 2);
        assert_eq!(grid.count_collapsed_within(4, 3, 1, 1), 2);
        assert_eq!(grid.count_collapsed_within(4, 3, 0, 6), 0);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut grid = AdmissibilityGrid::new(3, 3, 2, 1.0);
        grid.place(0, 0, 1, 1).unwrap();
        grid.remove(2, 2, 0);
        grid.reset(5.0);
        assert!(!grid.is_collapsed(0, 0));
        assert!(grid.is_admissible(2, 2, 0));
        assert_eq!(grid.entropy_at(0, 0), 5.0);
    }

    #[test]
    fn test_tile_grid_snapshot_uses_fallback() {
        let mut grid = AdmissibilityGrid::new(2, 2, 3, 1.0);
        grid.place(1, 0, 1, 1).unwrap();
        let tiles = grid.to_tile_grid(2);
        assert_eq!(tiles.to_rows(), vec![vec![2, 1], vec![2, 2]]);
    }

    #[test]
    fn test_tile_grid_neighbours() {
        let rows = vec![vec![1, 1, 0], vec![0, 1, 0], vec![1, 0, 0]];
        let grid = TileGrid::from_rows(&rows).unwrap();
        assert_eq!(grid.count_adjacent(1, 1, 1), 3);
        assert_eq!(grid.count_adjacent(0, 0, 1), 2);
        assert_eq!(grid.count_adjacent_where(1, 1, |kind| kind == 0), 5);
        assert_eq!(grid.count(1), 4);
        assert!(TileGrid::from_rows(&[vec![1, 2], vec![3]]).is_none());
    }
}
