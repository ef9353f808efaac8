//! # Climate
//!
//! Temperature bands for world maps, derived from fractal Perlin noise.

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

/// Temperature band of a world cell, coldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Temperature {
    Frozen,
    Cold,
    Cool,
    Warm,
    Hot,
}

impl Temperature {
    /// Maps a normalised noise value in [0, 1] to its band.
    ///
    /// # Examples
    ///
    /// ```
    /// use citygen::Temperature;
    ///
    /// assert_eq!(Temperature::from_normalized(0.05), Temperature::Frozen);
    /// assert_eq!(Temperature::from_normalized(0.5), Temperature::Warm);
    /// assert_eq!(Temperature::from_normalized(0.75), Temperature::Hot);
    /// ```
    pub fn from_normalized(value: f64) -> Self {
        match value {
            v if v < 0.1 => Temperature::Frozen,
            v if v < 0.25 => Temperature::Cold,
            v if v < 0.45 => Temperature::Cool,
            v if v < 0.75 => Temperature::Warm,
            _ => Temperature::Hot,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Temperature::Frozen => "frozen",
            Temperature::Cold => "cold",
            Temperature::Cool => "cool",
            Temperature::Warm => "warm",
            Temperature::Hot => "hot",
        }
    }
}

/// Per-cell temperature bands for a world map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureMap {
    width: usize,
    height: usize,
    cells: Vec<Temperature>,
}

impl TemperatureMap {
    /// Samples 5-octave fractal noise over the map and bands the values
    /// after min/max normalisation. `scale` is how many noise periods span
    /// each axis.
    pub fn generate(seed: u32, width: usize, height: usize, scale: f64) -> Self {
        let fbm = Fbm::<Perlin>::new(seed)
            .set_octaves(5)
            .set_lacunarity(2.0)
            .set_persistence(0.5);

        let mut samples = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let nx = x as f64 / width as f64 * scale;
                let ny = y as f64 / height as f64 * scale;
                samples.push(fbm.get([nx, ny]));
            }
        }

        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;

        let cells = samples
            .into_iter()
            .map(|value| {
                let normalized = if range > f64::EPSILON {
                    (value - min) / range
                } else {
                    0.5
                };
                Temperature::from_normalized(normalized)
            })
            .collect();

        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Band at (x, y); positions off the map read as [`Temperature::Cool`].
    pub fn get(&self, x: i32, y: i32) -> Temperature {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return Temperature::Cool;
        }
        self.cells[y as usize * self.width + x as usize]
    }

    /// Number of cells in `band`.
    pub fn count(&self, band: Temperature) -> usize {
        self.cells.iter().filter(|&&cell| cell == band).count()
    }
}
