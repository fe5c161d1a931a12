//! Shared, seedable random number source.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Simulation RNG. Seeded from `SimConfig::seed` so runs are reproducible.
#[derive(Resource)]
pub struct SimRng(pub StdRng);

impl SimRng {
    pub fn from_seed(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl Default for SimRng {
    fn default() -> Self {
        Self::from_seed(0)
    }
}

/// Uniform sample between two bounds given in either order.
///
/// Equal bounds return that value instead of panicking like `gen_range`.
pub fn random_between(rng: &mut impl Rng, a: f32, b: f32) -> f32 {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    if high - low <= f32::EPSILON {
        return low;
    }
    rng.gen_range(low..=high)
}
