//! # Random Streams
//!
//! Seed handling for the per-generator random number generators.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{SystemTime, UNIX_EPOCH};

/// Returns `seed` unchanged, or a clock-derived seed when `seed` is zero.
///
/// # Examples
///
/// ```
/// use citygen::resolve_seed;
///
/// assert_eq!(resolve_seed(42), 42);
/// assert_ne!(resolve_seed(0), 0);
/// ```
pub fn resolve_seed(seed: u64) -> u64 {
    if seed != 0 {
        return seed;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or(0);
    // Zero is reserved for "pick one for me".
    nanos.max(1)
}

/// Creates a seeded random number generator.
pub fn create_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = create_rng(7);
        let mut b = create_rng(7);
        let xs: Vec<f64> = (0..16).map(|_| a.gen()).collect();
        let ys: Vec<f64> = (0..16).map(|_| b.gen()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_explicit_seed_is_kept() {
        assert_eq!(resolve_seed(1), 1);
        assert_eq!(resolve_seed(u64::MAX), u64::MAX);
    }
}
