//! Per-tile state.
//!
//! A tile is exactly one of empty, seed or tree. Each variant carries only
//! the fields that are meaningful for it, so a tile can never hold a seed
//! timer and a tree age at the same time.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::Range;
use crate::rng::RngExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    Empty,
    Seed,
    Tree,
}

/// How a seed reached its tile. Trees keep the origin of the seed they grew from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeedOrigin {
    Planted,
    Animal,
    Wind,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeedState {
    pub timer: f64,
    pub origin: SeedOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MastCycle {
    pub years_since_mast: f64,
    pub next_interval: f64,
    pub is_mast_year: bool,
}

impl MastCycle {
    pub fn new<R: Rng>(interval: Range<f64>, rng: &mut R) -> Self {
        Self {
            years_since_mast: 0.0,
            next_interval: sample_interval(interval, rng),
            is_mast_year: false,
        }
    }

    /// Advances the cycle by `dt` years. Returns whether this is a mast year.
    pub fn advance<R: Rng>(&mut self, dt: f64, interval: Range<f64>, rng: &mut R) -> bool {
        self.years_since_mast += dt;
        if self.years_since_mast >= self.next_interval {
            self.is_mast_year = true;
            self.years_since_mast = 0.0;
            self.next_interval = sample_interval(interval, rng);
        } else {
            self.is_mast_year = false;
        }
        self.is_mast_year
    }

    pub fn years_until_next(&self) -> f64 {
        (self.next_interval - self.years_since_mast).max(0.0)
    }
}

fn sample_interval<R: Rng>(interval: Range<f64>, rng: &mut R) -> f64 {
    if interval.max > interval.min {
        rng.gen_range(interval.min..=interval.max)
    } else {
        interval.min
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeState {
    pub age: f64,
    pub mast: MastCycle,
    pub origin: SeedOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Tile {
    #[default]
    Empty,
    Seed(SeedState),
    Tree(TreeState),
}

impl Tile {
    pub fn seed(origin: SeedOrigin) -> Self {
        Tile::Seed(SeedState { timer: 0.0, origin })
    }

    /// A newborn tree with a fresh mast cycle.
    pub fn sapling<R: Rng>(origin: SeedOrigin, interval: Range<f64>, rng: &mut R) -> Self {
        Tile::Tree(TreeState {
            age: 0.0,
            mast: MastCycle::new(interval, rng),
            origin,
        })
    }

    pub fn kind(&self) -> TileKind {
        match self {
            Tile::Empty => TileKind::Empty,
            Tile::Seed(_) => TileKind::Seed,
            Tile::Tree(_) => TileKind::Tree,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Tile::Empty)
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, Tile::Tree(_))
    }

    pub fn tree_age(&self) -> Option<f64> {
        match self {
            Tile::Tree(tree) => Some(tree.age),
            _ => None,
        }
    }

    pub fn seed_timer(&self) -> Option<f64> {
        match self {
            Tile::Seed(seed) => Some(seed.timer),
            _ => None,
        }
    }

    pub fn origin(&self) -> Option<SeedOrigin> {
        match self {
            Tile::Empty => None,
            Tile::Seed(seed) => Some(seed.origin),
            Tile::Tree(tree) => Some(tree.origin),
        }
    }
}

/// Draws an integer uniformly from an inclusive range.
pub(crate) fn sample_count<R: Rng>(range: Range<u32>, rng: &mut R) -> u32 {
    rng.gen_range(range.min..=range.max)
}

/// Uniform draw used by the lifecycle for probability checks.
pub(crate) fn roll<R: Rng>(rng: &mut R) -> f64 {
    rng.uniform(0.0, 1.0)
}
