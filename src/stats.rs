use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::tile::Tile;

/// Aggregate counts over the whole grid, recomputed after every tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ForestStats {
    pub tree_count: u64,
    pub tree_percentage: f64,
    pub seed_count: u64,
    pub mature_tree_count: u64,
    pub mast_tree_count: u64,
    pub mean_tree_age: f64,
    pub oldest_tree_age: f64,
    pub death_count: u64,
}

#[derive(Debug, Default)]
pub struct StatsAggregator {
    latest: ForestStats,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full scan of the grid. Caches and returns `(tree_count, tree_percentage)`.
    pub fn recompute(&mut self, grid: &Grid, germination_age: f64, death_count: u64) -> (u64, f64) {
        let mut stats = ForestStats {
            death_count,
            ..ForestStats::default()
        };
        let mut age_sum = 0.0;
        for tile in grid.tiles() {
            match tile {
                Tile::Empty => {}
                Tile::Seed(_) => stats.seed_count += 1,
                Tile::Tree(tree) => {
                    stats.tree_count += 1;
                    age_sum += tree.age;
                    stats.oldest_tree_age = stats.oldest_tree_age.max(tree.age);
                    if tree.age >= germination_age {
                        stats.mature_tree_count += 1;
                    }
                    if tree.mast.is_mast_year {
                        stats.mast_tree_count += 1;
                    }
                }
            }
        }
        stats.tree_percentage = coverage(stats.tree_count, grid.tile_count());
        if stats.tree_count > 0 {
            stats.mean_tree_age = age_sum / stats.tree_count as f64;
        }
        self.latest = stats;
        (stats.tree_count, stats.tree_percentage)
    }

    pub fn latest(&self) -> ForestStats {
        self.latest
    }
}

/// Percentage of `total` tiles holding a tree.
pub fn coverage(tree_count: u64, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    100.0 * tree_count as f64 / total as f64
}
