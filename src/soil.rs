//! Procedurally generated moisture and nutrient fields.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::SoilConfig;
use crate::rng::RngExt;

/// Per-tile moisture and nutrient scalars in `[0, 1]`, stored row-major.
/// Fixed for the lifetime of a run; `reset` replaces the whole field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilField {
    width: u32,
    height: u32,
    moisture: Vec<f64>,
    nutrients: Vec<f64>,
}

impl SoilField {
    /// Uniform field, mostly useful for tests.
    pub fn uniform(width: u32, height: u32, moisture: f64, nutrients: f64) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            moisture: vec![clamp01(moisture); len],
            nutrients: vec![clamp01(nutrients); len],
        }
    }

    pub fn generate<R: Rng>(width: u32, height: u32, config: &SoilConfig, rng: &mut R) -> Self {
        let mut field = Self::uniform(width, height, 0.0, 0.0);
        let h = height as f64;

        for y in 0..height {
            let row = y as f64 / h;
            let base_moisture = 1.0 - config.moisture_gradient * row;
            let base_nutrients = 1.0 - config.nutrient_gradient * (row - 0.5).abs() * 2.0;
            for x in 0..width {
                let idx = field.index(x, y);
                let noise = rng.uniform(-config.noise, config.noise);
                field.moisture[idx] = clamp01(base_moisture + noise);
                let noise = rng.uniform(-config.noise, config.noise);
                field.nutrients[idx] = clamp01(base_nutrients + noise);
            }
        }

        let streams = rng.gen_range(config.streams.min..=config.streams.max);
        for _ in 0..streams {
            field.carve_stream(config, rng);
        }
        field
    }

    /// Walks a stream from the top row downwards, depositing moisture and
    /// nutrients with linear falloff around each step.
    fn carve_stream<R: Rng>(&mut self, config: &SoilConfig, rng: &mut R) {
        let max_x = self.width as i64 - 1;
        let mut x = rng.gen_range(0..=max_x);
        let mut y: i64 = 0;
        let drift = config.stream_drift as i64;

        while y < self.height as i64 {
            let radius = rng.gen_range(config.stream_radius.min..=config.stream_radius.max) as i64;
            self.deposit(x, y, radius, config);
            x = (x + rng.gen_range(-drift..=drift)).clamp(0, max_x);
            y += rng.gen_range(config.stream_step.min..=config.stream_step.max) as i64;
        }
    }

    fn deposit(&mut self, cx: i64, cy: i64, radius: i64, config: &SoilConfig) {
        let r = radius as f64;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let (nx, ny) = (cx + dx, cy + dy);
                if nx < 0 || ny < 0 || nx >= self.width as i64 || ny >= self.height as i64 {
                    continue;
                }
                let distance = ((dx * dx + dy * dy) as f64).sqrt();
                if distance > r {
                    continue;
                }
                let intensity = 1.0 - distance / r;
                let idx = self.index(nx as u32, ny as u32);
                self.moisture[idx] =
                    clamp01(self.moisture[idx] + intensity * config.stream_moisture_boost);
                self.nutrients[idx] =
                    clamp01(self.nutrients[idx] + intensity * config.stream_nutrient_boost);
            }
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn moisture(&self, x: u32, y: u32) -> Option<f64> {
        self.checked_index(x, y).map(|idx| self.moisture[idx])
    }

    pub fn nutrients(&self, x: u32, y: u32) -> Option<f64> {
        self.checked_index(x, y).map(|idx| self.nutrients[idx])
    }

    fn checked_index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(self.index(x, y))
        } else {
            None
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn generate(seed: u64) -> SoilField {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        SoilField::generate(40, 30, &SoilConfig::default(), &mut rng)
    }

    #[test]
    fn test_values_are_clamped() {
        let soil = generate(11);
        for y in 0..30 {
            for x in 0..40 {
                let m = soil.moisture(x, y).unwrap();
                let n = soil.nutrients(x, y).unwrap();
                assert!((0.0..=1.0).contains(&m));
                assert!((0.0..=1.0).contains(&n));
            }
        }
    }

    #[test]
    fn test_same_seed_same_field() {
        assert_eq!(generate(5), generate(5));
        assert_ne!(generate(5), generate(6));
    }

    #[test]
    fn test_out_of_bounds_is_none() {
        let soil = generate(1);
        assert!(soil.moisture(40, 0).is_none());
        assert!(soil.nutrients(0, 30).is_none());
    }

    #[test]
    fn test_moisture_gradient_without_streams() {
        let config = SoilConfig {
            noise: 0.0,
            streams: crate::config::Range::new(0, 0),
            ..SoilConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let soil = SoilField::generate(10, 10, &config, &mut rng);
        assert_eq!(soil.moisture(3, 0), Some(1.0));
        assert!(soil.moisture(3, 9).unwrap() < soil.moisture(3, 0).unwrap());
        // Nutrients peak in the central band.
        assert!(soil.nutrients(3, 5).unwrap() > soil.nutrients(3, 0).unwrap());
        assert!(soil.nutrients(3, 5).unwrap() > soil.nutrients(3, 9).unwrap());
    }

    #[test]
    fn test_streams_only_add() {
        let base = SoilConfig {
            noise: 0.0,
            streams: crate::config::Range::new(0, 0),
            ..SoilConfig::default()
        };
        let wet = SoilConfig {
            noise: 0.0,
            streams: crate::config::Range::new(3, 3),
            ..SoilConfig::default()
        };
        let dry = SoilField::generate(20, 20, &base, &mut ChaCha8Rng::seed_from_u64(9));
        let streamed = SoilField::generate(20, 20, &wet, &mut ChaCha8Rng::seed_from_u64(9));
        let mut raised = 0;
        for y in 0..20 {
            for x in 0..20 {
                let before = dry.moisture(x, y).unwrap();
                let after = streamed.moisture(x, y).unwrap();
                assert!(after >= before);
                if after > before {
                    raised += 1;
                }
            }
        }
        assert!(raised > 0, "streams should moisten some tiles");
    }
}
