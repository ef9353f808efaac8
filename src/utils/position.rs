//! # Grid Coordinates
//!
//! Signed cell coordinates and neighbourhood helpers shared by the solver,
//! the post-processing passes and the world map.

use serde::{Deserialize, Serialize};

/// Represents a cell coordinate on a generation grid.
///
/// Coordinates are signed so that neighbour offsets can step outside the grid;
/// callers check bounds before indexing.
///
/// # Examples
///
/// ```
/// use citygen::Position;
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.x, 10);
/// assert_eq!(pos.y, 5);
///
/// let ring = pos.adjacent_positions();
/// assert_eq!(ring.len(), 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Creates a position from unsigned grid indices.
    pub fn from_cell(x: usize, y: usize) -> Self {
        Self::new(x as i32, y as i32)
    }

    /// Returns the unsigned cell indices when the position lies inside a
    /// `width` x `height` grid.
    ///
    /// # Examples
    ///
    /// ```
    /// use citygen::Position;
    ///
    /// assert_eq!(Position::new(2, 3).cell_in(4, 4), Some((2, 3)));
    /// assert_eq!(Position::new(-1, 0).cell_in(4, 4), None);
    /// assert_eq!(Position::new(4, 0).cell_in(4, 4), None);
    /// ```
    pub fn cell_in(self, width: usize, height: usize) -> Option<(usize, usize)> {
        if self.x < 0 || self.y < 0 {
            return None;
        }
        let (x, y) = (self.x as usize, self.y as usize);
        if x < width && y < height {
            Some((x, y))
        } else {
            None
        }
    }

    /// Returns all 8 adjacent positions (including diagonals).
    pub fn adjacent_positions(self) -> Vec<Position> {
        vec![
            Position::new(self.x - 1, self.y - 1), // NW
            Position::new(self.x, self.y - 1),     // N
            Position::new(self.x + 1, self.y - 1), // NE
            Position::new(self.x - 1, self.y),     // W
            Position::new(self.x + 1, self.y),     // E
            Position::new(self.x - 1, self.y + 1), // SW
            Position::new(self.x, self.y + 1),     // S
            Position::new(self.x + 1, self.y + 1), // SE
        ]
    }

    /// Returns the 4 cardinal neighbours in propagation order (N, E, S, W).
    pub fn cardinal_adjacent_positions(self) -> [Position; 4] {
        Direction::CARDINAL.map(|dir| self + dir.to_delta())
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

/// Axis-aligned directions on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Clockwise from north. Constraint propagation visits neighbours in this order.
    pub const CARDINAL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Converts a direction to a position delta.
    ///
    /// # Examples
    ///
    /// ```
    /// use citygen::{Direction, Position};
    ///
    /// assert_eq!(Direction::North.to_delta(), Position::new(0, -1));
    /// ```
    pub fn to_delta(self) -> Position {
        match self {
            Direction::North => Position::new(0, -1),
            Direction::East => Position::new(1, 0),
            Direction::South => Position::new(0, 1),
            Direction::West => Position::new(-1, 0),
        }
    }
}
