//! # Settlements
//!
//! City sites scattered over a world map. Each site's population doubles as
//! the seed of its city layout.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Name fragments for generated cities.
const NAME_POOL: [&str; 15] = [
    "Novograd",
    "Riverside",
    "Sunhold",
    "Greenwood",
    "Seaward",
    "Oldtown",
    "Northmark",
    "Southmark",
    "Eastmere",
    "Westmere",
    "Midvale",
    "Harbor",
    "Highcrag",
    "Dalewick",
    "Lakemoor",
];

/// Elevations (exclusive) where cities may be founded.
pub const SETTLEMENT_ELEVATION: Range<f64> = 0.5..0.8;

/// A city on the world map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub name: String,
    pub x: usize,
    pub y: usize,
    /// Radius of the square the city covers on the world map (1 to 3)
    pub size: usize,
    pub population: u32,
}

impl Settlement {
    /// Seed of this city's layout.
    pub fn layout_seed(&self) -> u64 {
        u64::from(self.population)
    }

    /// Whether (x, y) lies in the square of radius `size` around the city.
    ///
    /// # Examples
    ///
    /// ```
    /// use citygen::Settlement;
    ///
    /// let city = Settlement { name: "Harbor".into(), x: 10, y: 10, size: 2, population: 12_000 };
    /// assert!(city.contains(8, 12));
    /// assert!(!city.contains(7, 10));
    /// ```
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x.abs_diff(self.x) <= self.size && y.abs_diff(self.y) <= self.size
    }
}

/// Draws a city name: one pool entry, or two joined by a hyphen.
pub fn generate_city_name(rng: &mut StdRng) -> String {
    let first = NAME_POOL[rng.gen_range(0..NAME_POOL.len())];
    let second = NAME_POOL[rng.gen_range(0..NAME_POOL.len())];
    if rng.gen::<f64>() > 0.3 {
        format!("{}-{}", first, second)
    } else {
        first.to_string()
    }
}

/// Tries `attempts` random sites at least `margin` cells from every edge and
/// founds a city on each whose elevation lies in [`SETTLEMENT_ELEVATION`].
///
/// `elevation` is row-major, `width * height` values. Maps too small for the
/// margin get no cities.
pub fn place_settlements(
    elevation: &[f64],
    width: usize,
    height: usize,
    attempts: usize,
    margin: usize,
    rng: &mut StdRng,
) -> Vec<Settlement> {
    let mut settlements = Vec::new();
    if width <= margin * 2 || height <= margin * 2 {
        return settlements;
    }

    for _ in 0..attempts {
        let x = rng.gen_range(margin..width - margin);
        let y = rng.gen_range(margin..height - margin);
        let value = elevation[y * width + x];

        if value > SETTLEMENT_ELEVATION.start && value < SETTLEMENT_ELEVATION.end {
            settlements.push(Settlement {
                name: generate_city_name(rng),
                x,
                y,
                size: rng.gen_range(1..=3),
                population: rng.gen_range(10_000..100_000),
            });
        }
    }

    settlements
}
