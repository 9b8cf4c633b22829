//! Deterministic random number generation
//!
//! Every sampling call in the simulation draws from a named ChaCha8 stream
//! derived from a single master seed.

use std::collections::HashMap;
use std::f64::consts::TAU;

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub struct RngManager {
    master: ChaCha8Rng,
    streams: HashMap<String, ChaCha8Rng>,
}

impl RngManager {
    pub fn new(seed: u64) -> Self {
        Self {
            master: ChaCha8Rng::seed_from_u64(seed),
            streams: HashMap::new(),
        }
    }

    pub fn stream(&mut self, name: &str) -> SystemRng<'_> {
        let master = &mut self.master;
        let entry = self.streams.entry(name.to_string()).or_insert_with(|| {
            let mut seed_bytes = [0u8; 8];
            master.fill_bytes(&mut seed_bytes);
            ChaCha8Rng::seed_from_u64(u64::from_le_bytes(seed_bytes))
        });
        SystemRng { inner: entry }
    }
}

pub struct SystemRng<'a> {
    inner: &'a mut ChaCha8Rng,
}

impl<'a> RngCore for SystemRng<'a> {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

/// Sampling helpers shared by the soil generator, the lifecycle and the
/// dispersal kernel.
pub trait RngExt {
    /// Uniform in `[min, max)`. Returns `min` when the range is empty.
    fn uniform(&mut self, min: f64, max: f64) -> f64;
    fn chance(&mut self, probability: f64) -> bool;
    fn gaussian(&mut self, mean: f64, std_dev: f64) -> f64;
    /// Pareto(shape, scale) by inverse CDF; always `>= scale`.
    fn pareto(&mut self, shape: f64, scale: f64) -> f64;
}

impl<R: Rng> RngExt for R {
    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        min + self.gen::<f64>() * (max - min)
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.gen::<f64>() < probability
    }

    fn gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        // Box-Muller; u1 in (0, 1] keeps ln finite.
        let u1 = 1.0 - self.gen::<f64>();
        let u2 = self.gen::<f64>();
        let z = (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos();
        mean + std_dev * z
    }

    fn pareto(&mut self, shape: f64, scale: f64) -> f64 {
        let u = 1.0 - self.gen::<f64>();
        scale / u.powf(1.0 / shape)
    }
}
