//! Simulation context: the grid plus the handful of global scalars that
//! advance with it.

use serde::{Deserialize, Serialize};

use crate::dispersal::Wind;
use crate::grid::Grid;
use crate::soil::SoilField;

/// Half of the simulated year. Toggles every tick and steers the migratory
/// skew of animal dispersal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Season {
    #[default]
    FirstHalf,
    SecondHalf,
}

impl Season {
    pub fn toggled(self) -> Self {
        match self {
            Season::FirstHalf => Season::SecondHalf,
            Season::SecondHalf => Season::FirstHalf,
        }
    }

    /// `false` in the first half-year, `true` in the second.
    pub fn parity(self) -> bool {
        matches!(self, Season::SecondHalf)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Clock {
    pub tick: u64,
    pub current_year: f64,
    pub season: Season,
}

impl Clock {
    pub fn advance(&mut self, years_per_tick: f64) {
        self.tick += 1;
        self.current_year += years_per_tick;
        self.season = self.season.toggled();
    }
}

pub struct World {
    pub(crate) grid: Grid,
    pub(crate) clock: Clock,
    pub(crate) wind: Wind,
    pub(crate) death_count: u64,
}

impl World {
    pub fn new(soil: SoilField) -> Self {
        Self {
            grid: Grid::new(soil),
            clock: Clock::default(),
            wind: Wind::CALM,
            death_count: 0,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn wind(&self) -> Wind {
        self.wind
    }

    pub fn death_count(&self) -> u64 {
        self.death_count
    }

    /// Clears every tile and counter; wind is left untouched.
    pub fn reset(&mut self, soil: SoilField) {
        self.grid.reset(soil);
        self.clock = Clock::default();
        self.death_count = 0;
    }
}
