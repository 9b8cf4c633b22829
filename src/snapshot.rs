//! Read-only views handed to renderers and the headless runner.

use serde::{Deserialize, Serialize};

use crate::stats::ForestStats;
use crate::tile::{SeedOrigin, TileKind};
use crate::world::Season;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindSnapshot {
    pub dx: f64,
    pub dy: f64,
    pub strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub scenario: String,
    pub tick: u64,
    pub year: f64,
    pub season: Season,
    pub width: u32,
    pub height: u32,
    pub wind: WindSnapshot,
    pub stats: ForestStats,
}

/// Everything an inspector panel shows for one tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileReport {
    pub x: u32,
    pub y: u32,
    pub kind: TileKind,
    pub origin: Option<SeedOrigin>,
    pub moisture: f64,
    pub nutrients: f64,
    /// Per-tick growth draw threshold for a seed on this soil; zero when
    /// the soil is too wet.
    pub growth_chance: f64,
    pub tree: Option<TreeReport>,
    pub seed_age: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeReport {
    pub age: f64,
    pub mature: bool,
    pub mast_year: bool,
    pub years_until_mast: f64,
}
