//! # World Generation
//!
//! Overworld maps: Perlin elevation banded into biomes, a temperature map,
//! and the city sites whose layouts the city generator builds on demand.

use crate::config::{DEFAULT_WORLD_HEIGHT, DEFAULT_WORLD_WIDTH};
use crate::generation::{place_settlements, Generator, Settlement, Temperature, TemperatureMap};
use crate::utils::{create_rng, resolve_seed};
use crate::{CityGenError, CityGenResult};
use log::info;
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

/// Terrain class of a world cell, by elevation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Biome {
    Ocean,
    Beach,
    Grassland,
    Mountain,
    Snow,
}

impl Biome {
    /// Maps an elevation in [0, 1] to its biome.
    pub fn from_elevation(elevation: f64) -> Self {
        match elevation {
            e if e < 0.4 => Biome::Ocean,
            e if e < 0.5 => Biome::Beach,
            e if e < 0.75 => Biome::Grassland,
            e if e < 0.95 => Biome::Mountain,
            _ => Biome::Snow,
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Biome::Ocean => '~',
            Biome::Beach => ',',
            Biome::Grassland => '.',
            Biome::Mountain => '^',
            Biome::Snow => '*',
        }
    }
}

/// Configuration for world map generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Random seed; zero picks one from the system clock
    pub seed: u64,
    pub width: usize,
    pub height: usize,
    /// Elevation noise frequency per cell
    pub terrain_frequency: f64,
    /// Temperature noise periods across each axis
    pub temperature_scale: f64,
    /// Random sites tried for cities
    pub city_attempts: usize,
    /// Minimum distance of a city site from the map edge
    pub city_margin: usize,
}

impl WorldConfig {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            width: DEFAULT_WORLD_WIDTH,
            height: DEFAULT_WORLD_HEIGHT,
            terrain_frequency: 0.05,
            temperature_scale: 6.0,
            city_attempts: 50,
            city_margin: 5,
        }
    }

    /// A small map for tests.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            width: 40,
            height: 24,
            ..Self::new(seed)
        }
    }

    pub fn validate(&self) -> CityGenResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CityGenError::InvalidConfig(format!(
                "world dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !self.terrain_frequency.is_finite() || self.terrain_frequency <= 0.0 {
            return Err(CityGenError::InvalidConfig(format!(
                "terrain frequency must be positive, got {}",
                self.terrain_frequency
            )));
        }
        if !self.temperature_scale.is_finite() || self.temperature_scale <= 0.0 {
            return Err(CityGenError::InvalidConfig(format!(
                "temperature scale must be positive, got {}",
                self.temperature_scale
            )));
        }
        Ok(())
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// A generated world map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldMap {
    /// Seed actually used
    pub seed: u64,
    width: usize,
    height: usize,
    elevation: Vec<f64>,
    biomes: Vec<Biome>,
    temperature: TemperatureMap,
    settlements: Vec<Settlement>,
    city_mask: Vec<bool>,
}

impl WorldMap {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Elevation in [0, 1] at (x, y).
    pub fn elevation_at(&self, x: usize, y: usize) -> Option<f64> {
        self.index(x, y).map(|i| self.elevation[i])
    }

    pub fn biome_at(&self, x: usize, y: usize) -> Option<Biome> {
        self.index(x, y).map(|i| self.biomes[i])
    }

    /// Temperature band at (x, y); off-map positions read as cool.
    pub fn temperature_at(&self, x: i32, y: i32) -> Temperature {
        self.temperature.get(x, y)
    }

    pub fn temperature(&self) -> &TemperatureMap {
        &self.temperature
    }

    pub fn settlements(&self) -> &[Settlement] {
        &self.settlements
    }

    /// Whether (x, y) is covered by any city.
    pub fn is_city(&self, x: usize, y: usize) -> bool {
        self.index(x, y).map_or(false, |i| self.city_mask[i])
    }

    /// The first city, in founding order, whose square covers (x, y).
    pub fn city_at(&self, x: usize, y: usize) -> Option<&Settlement> {
        self.settlements.iter().find(|city| city.contains(x, y))
    }
}

/// Builds [`WorldMap`]s from a [`WorldConfig`].
///
/// # Examples
///
/// ```
/// use citygen::{Generator, WorldConfig, WorldGenerator};
///
/// let world = WorldGenerator::new(WorldConfig::for_testing(8)).generate().unwrap();
/// assert_eq!(world.width(), 40);
/// assert!(world.biome_at(39, 23).is_some());
/// ```
#[derive(Debug, Clone)]
pub struct WorldGenerator {
    config: WorldConfig,
}

impl WorldGenerator {
    pub fn new(config: WorldConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    fn sample_elevation(&self, terrain: &Perlin) -> Vec<f64> {
        let WorldConfig {
            width,
            height,
            terrain_frequency,
            ..
        } = self.config;

        let mut elevation = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let n = terrain.get([x as f64 * terrain_frequency, y as f64 * terrain_frequency]);
                elevation.push(((n + 1.0) / 2.0).clamp(0.0, 1.0));
            }
        }
        elevation
    }
}

impl Generator<WorldMap> for WorldGenerator {
    fn generate(&self) -> CityGenResult<WorldMap> {
        self.config.validate()?;

        let seed = resolve_seed(self.config.seed);
        let (width, height) = (self.config.width, self.config.height);
        let terrain = Perlin::new(seed as u32);
        let elevation = self.sample_elevation(&terrain);
        let biomes = elevation.iter().map(|&e| Biome::from_elevation(e)).collect();

        let temperature = TemperatureMap::generate(
            (seed as u32).wrapping_add(1),
            width,
            height,
            self.config.temperature_scale,
        );

        let mut rng = create_rng(seed);
        let settlements = place_settlements(
            &elevation,
            width,
            height,
            self.config.city_attempts,
            self.config.city_margin,
            &mut rng,
        );

        let mut city_mask = vec![false; width * height];
        for city in &settlements {
            let y0 = city.y.saturating_sub(city.size);
            let x0 = city.x.saturating_sub(city.size);
            for y in y0..=(city.y + city.size).min(height - 1) {
                for x in x0..=(city.x + city.size).min(width - 1) {
                    city_mask[y * width + x] = true;
                }
            }
        }

        info!(
            "Generated {}x{} world with {} cities (seed {})",
            width,
            height,
            settlements.len(),
            seed
        );

        Ok(WorldMap {
            seed,
            width,
            height,
            elevation,
            biomes,
            temperature,
            settlements,
            city_mask,
        })
    }

    fn validate(&self, world: &WorldMap) -> CityGenResult<()> {
        if world.width != self.config.width || world.height != self.config.height {
            return Err(CityGenError::GenerationFailed(format!(
                "expected a {}x{} world, got {}x{}",
                self.config.width, self.config.height, world.width, world.height
            )));
        }
        if let Some(city) = world
            .settlements
            .iter()
            .find(|city| city.x >= world.width || city.y >= world.height)
        {
            return Err(CityGenError::GenerationFailed(format!(
                "city '{}' lies off the map at ({}, {})",
                city.name, city.x, city.y
            )));
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "WorldGenerator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_biome_bands() {
        assert_eq!(Biome::from_elevation(0.1), Biome::Ocean);
        assert_eq!(Biome::from_elevation(0.4), Biome::Beach);
        assert_eq!(Biome::from_elevation(0.6), Biome::Grassland);
        assert_eq!(Biome::from_elevation(0.9), Biome::Mountain);
        assert_eq!(Biome::from_elevation(0.95), Biome::Snow);
    }

    #[test]
    fn test_world_config_defaults() {
        let config = WorldConfig::default();
        assert_eq!(config.width, 120);
        assert_eq!(config.height, 67);
        assert_eq!(config.city_attempts, 50);
        assert!(config.validate().is_ok());

        let bad = WorldConfig {
            terrain_frequency: 0.0,
            ..WorldConfig::new(1)
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_world_is_deterministic() {
        let generator = WorldGenerator::new(WorldConfig::for_testing(1234));
        let a = generator.generate().unwrap();
        let b = generator.generate().unwrap();
        assert_eq!(a, b);
        assert!(generator.validate(&a).is_ok());
    }

    #[test]
    fn test_elevation_and_biomes_agree() {
        let world = WorldGenerator::new(WorldConfig::for_testing(77)).generate().unwrap();
        for y in 0..world.height() {
            for x in 0..world.width() {
                let elevation = world.elevation_at(x, y).unwrap();
                assert!((0.0..=1.0).contains(&elevation));
                assert_eq!(world.biome_at(x, y), Some(Biome::from_elevation(elevation)));
            }
        }
        assert_eq!(world.elevation_at(40, 0), None);
    }

    #[test]
    fn test_cities_sit_on_suitable_ground() {
        let world = WorldGenerator::new(WorldConfig::new(2024)).generate().unwrap();
        for city in world.settlements() {
            let elevation = world.elevation_at(city.x, city.y).unwrap();
            assert!(elevation > 0.5 && elevation < 0.8);
            assert!(world.is_city(city.x, city.y));
            assert!(world.city_at(city.x, city.y).is_some());
        }
    }

    #[test]
    fn test_city_at_matches_mask() {
        let world = WorldGenerator::new(WorldConfig::new(31)).generate().unwrap();
        for y in 0..world.height() {
            for x in 0..world.width() {
                assert_eq!(world.is_city(x, y), world.city_at(x, y).is_some());
            }
        }
    }

    #[test]
    fn test_temperature_at_reads_the_map() {
        let world = WorldGenerator::new(WorldConfig::for_testing(12)).generate().unwrap();
        for y in 0..world.height() as i32 {
            for x in 0..world.width() as i32 {
                assert_eq!(world.temperature_at(x, y), world.temperature().get(x, y));
            }
        }
        assert_eq!(world.temperature_at(-1, 0), Temperature::Cool);
        assert_eq!(world.temperature_at(0, world.height() as i32), Temperature::Cool);
    }

    #[test]
    fn test_invalid_world_config() {
        let generator = WorldGenerator::new(WorldConfig {
            width: 0,
            ..WorldConfig::new(1)
        });
        assert!(matches!(
            generator.generate(),
            Err(CityGenError::InvalidConfig(_))
        ));
    }
}
