//! Level assignment for new graph nodes
//!
//! Classic HNSW exponential level sampling, independent of vector
//! content. The random source is an explicit, injectable splitmix64
//! generator (fixed seed + monotonic counter) rather than a hidden
//! global RNG, so identical insert sequences assign identical levels
//! and tests stay reproducible.

/// Deterministic level sampler
#[derive(Debug, Clone)]
pub struct LevelSampler {
    seed: u64,
    counter: u64,
}

impl LevelSampler {
    /// Create a sampler with the given seed
    pub fn new(seed: u64) -> Self {
        Self { seed, counter: 0 }
    }

    /// Draw a level from the exponential distribution with multiplier `ml`
    pub fn sample(&mut self, ml: f64) -> usize {
        self.counter += 1;
        let hash = splitmix64(self.seed.wrapping_add(self.counter));

        // Uniform in [0, 1), clamped away from 0 to keep ln finite
        let uniform = ((hash as f64) / (u64::MAX as f64)).max(1e-15);
        (-uniform.ln() * ml) as usize
    }

    /// Number of draws taken so far
    pub fn draws(&self) -> u64 {
        self.counter
    }
}

/// SplitMix64 hash step
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e3779b97f4a7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d049bb133111eb);
    x ^ (x >> 31)
}
