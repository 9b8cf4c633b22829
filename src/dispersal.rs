//! Seed dispersal kernels.
//!
//! The kernel only samples a continuous offset. Rounding, bounds checks and
//! the empty-target rule are applied by the caller against the grid.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::DispersalConfig;
use crate::rng::RngExt;
use crate::tile::SeedOrigin;
use crate::world::Season;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DispersalMode {
    Animal,
    Wind,
}

impl From<DispersalMode> for SeedOrigin {
    fn from(mode: DispersalMode) -> Self {
        match mode {
            DispersalMode::Animal => SeedOrigin::Animal,
            DispersalMode::Wind => SeedOrigin::Wind,
        }
    }
}

/// Wind as a unit direction plus strength. The zero vector means calm.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Wind {
    dx: f64,
    dy: f64,
    strength: f64,
}

impl Wind {
    pub const CALM: Wind = Wind {
        dx: 0.0,
        dy: 0.0,
        strength: 0.0,
    };

    /// Normalises `(dx, dy)`. Zero-length or non-finite input yields calm.
    pub fn new(dx: f64, dy: f64) -> Self {
        let strength = dx.hypot(dy);
        if !strength.is_finite() || strength <= f64::EPSILON {
            return Self::CALM;
        }
        Self {
            dx: dx / strength,
            dy: dy / strength,
            strength,
        }
    }

    pub fn direction(&self) -> (f64, f64) {
        (self.dx, self.dy)
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }

    pub fn is_calm(&self) -> bool {
        self.strength == 0.0
    }

    /// Heading in degrees; 0 for calm air.
    pub fn angle_degrees(&self) -> f64 {
        if self.is_calm() {
            0.0
        } else {
            self.dy.atan2(self.dx).to_degrees()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Offset {
    pub dx: f64,
    pub dy: f64,
}

impl Offset {
    pub fn from_polar(direction_degrees: f64, magnitude: f64) -> Self {
        let rad = direction_degrees.to_radians();
        Self {
            dx: magnitude * rad.cos(),
            dy: magnitude * rad.sin(),
        }
    }

    pub fn length(&self) -> f64 {
        self.dx.hypot(self.dy)
    }
}

#[derive(Debug, Clone)]
pub struct DispersalKernel {
    config: DispersalConfig,
    max_distance: f64,
}

impl DispersalKernel {
    /// `max_distance` caps animal hops; normally the grid diagonal.
    pub fn new(config: DispersalConfig, max_distance: f64) -> Self {
        Self {
            config,
            max_distance,
        }
    }

    pub fn choose_mode<R: Rng>(&self, rng: &mut R) -> DispersalMode {
        if rng.chance(self.config.animal_probability) {
            DispersalMode::Animal
        } else {
            DispersalMode::Wind
        }
    }

    pub fn sample<R: Rng>(
        &self,
        mode: DispersalMode,
        wind: Wind,
        season: Season,
        rng: &mut R,
    ) -> Offset {
        match mode {
            DispersalMode::Animal => self.sample_animal(season, rng),
            DispersalMode::Wind => self.sample_wind(wind, rng),
        }
    }

    /// Heavy-tailed hop with a migratory skew that flips each half-year.
    fn sample_animal<R: Rng>(&self, season: Season, rng: &mut R) -> Offset {
        let bias = match season {
            Season::FirstHalf => self.config.seasonal_bias_degrees,
            Season::SecondHalf => -self.config.seasonal_bias_degrees,
        };
        let direction = rng.uniform(0.0, 360.0) + bias;
        let magnitude = rng
            .pareto(self.config.pareto_shape, self.config.pareto_scale)
            .min(self.max_distance);
        Offset::from_polar(direction, magnitude)
    }

    fn sample_wind<R: Rng>(&self, wind: Wind, rng: &mut R) -> Offset {
        let direction = rng
            .gaussian(wind.angle_degrees(), self.config.wind_spread_degrees)
            .rem_euclid(360.0);
        let half_spread = self.config.wind_variability / 2.0;
        let jitter = rng.uniform(1.0 - half_spread, 1.0 + half_spread);
        let magnitude = (wind.strength()
            * self.config.wind_seed_factor
            * self.config.wind_base_multiplier
            * jitter)
            .max(self.config.wind_min_distance);
        Offset::from_polar(direction, magnitude)
    }
}
