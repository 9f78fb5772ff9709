// per-particle random attributes, always from an explicit seed
use std::f32::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParticleAttributes {
    pub sizes: Vec<f32>,
    pub intensities: Vec<f32>,
    pub angles: Vec<f32>, // radians
    pub phases: Vec<f32>, // starting lifetime in [0, 1)
}

impl ParticleAttributes {
    /// Same seed, same attributes.
    pub fn seeded(count: usize, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut attrs = Self {
            sizes: Vec::with_capacity(count),
            intensities: Vec::with_capacity(count),
            angles: Vec::with_capacity(count),
            phases: Vec::with_capacity(count),
        };
        for _ in 0..count {
            attrs.sizes.push(rng.gen_range(0.0..1.0));
            attrs.intensities.push(rng.gen_range(0.0..1.0));
            attrs.angles.push(rng.gen_range(0.0..TAU));
            attrs.phases.push(rng.gen_range(0.0..1.0));
        }
        attrs
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}
