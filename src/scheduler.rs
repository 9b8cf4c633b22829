//! Step scheduler - advances the whole grid by one tick.
//!
//! Tiles are visited in a fresh random permutation each tick and mutated in
//! place. There is no double buffering: a seed dropped onto a tile that is
//! still to be visited this tick is seen by that visit.

use std::time::{Duration, Instant};

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::SimConfig;
use crate::dispersal::DispersalKernel;
use crate::lifecycle::{self, TickContext, Transition};
use crate::stats::StatsAggregator;
use crate::world::World;

/// Statistics for a single tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickStats {
    pub tick: u64,
    pub year: f64,
    pub duration: Duration,
    pub deaths: u64,
    pub germinations: u64,
    pub expired_seeds: u64,
    pub mast_trees: u64,
    pub seeds_released: u64,
    pub seeds_placed: u64,
}

impl TickStats {
    fn empty(tick: u64, year: f64) -> Self {
        Self {
            tick,
            year,
            duration: Duration::ZERO,
            deaths: 0,
            germinations: 0,
            expired_seeds: 0,
            mast_trees: 0,
            seeds_released: 0,
            seeds_placed: 0,
        }
    }

    /// Dispersal events lost to occupied or off-grid targets.
    pub fn seeds_dropped(&self) -> u64 {
        self.seeds_released - self.seeds_placed
    }

    fn record(&mut self, transition: Transition) {
        match transition {
            Transition::Idle | Transition::SeedWaiting { .. } => {}
            Transition::TreeDied { .. } => self.deaths += 1,
            Transition::TreeGrew {
                mast_year,
                seeds_released,
                seeds_placed,
            } => {
                if mast_year {
                    self.mast_trees += 1;
                }
                self.seeds_released += seeds_released as u64;
                self.seeds_placed += seeds_placed as u64;
            }
            Transition::Germinated => self.germinations += 1,
            Transition::SeedExpired => self.expired_seeds += 1,
        }
    }
}

pub struct StepScheduler {
    order: Vec<usize>,
    stats_history: Vec<TickStats>,
    max_stats_history: usize,
}

impl StepScheduler {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            stats_history: Vec::new(),
            max_stats_history: 100,
        }
    }

    /// Execute one tick: advance the clock, visit every tile in shuffled
    /// order, then refresh the aggregates.
    pub fn tick<R: Rng>(
        &mut self,
        world: &mut World,
        config: &SimConfig,
        kernel: &DispersalKernel,
        aggregator: &mut StatsAggregator,
        rng: &mut R,
    ) -> TickStats {
        let tick_start = Instant::now();
        let dt = config.clock.years_per_tick;
        world.clock.advance(dt);

        let ctx = TickContext {
            config,
            kernel,
            wind: world.wind,
            season: world.clock.season,
            dt,
        };

        self.order.clear();
        self.order.extend(0..world.grid.tile_count());
        self.order.shuffle(rng);

        let mut stats = TickStats::empty(world.clock.tick, world.clock.current_year);
        for &index in &self.order {
            let Some(pos) = world.grid.index_to_pos(index) else {
                continue;
            };
            let transition = lifecycle::advance(&mut world.grid, pos, &ctx, rng);
            stats.record(transition);
        }
        world.death_count += stats.deaths;

        let (trees, coverage) = aggregator.recompute(
            &world.grid,
            config.lifecycle.germination_age,
            world.death_count,
        );
        stats.duration = tick_start.elapsed();

        debug!(
            "tick {} (year {:.1}): {} trees ({:.2}%), {} deaths, {} germinations, {}/{} seeds placed",
            stats.tick,
            stats.year,
            trees,
            coverage,
            stats.deaths,
            stats.germinations,
            stats.seeds_placed,
            stats.seeds_released
        );

        self.stats_history.push(stats.clone());
        if self.stats_history.len() > self.max_stats_history {
            self.stats_history.remove(0);
        }

        stats
    }

    /// Get recent tick statistics
    pub fn recent_stats(&self) -> &[TickStats] {
        &self.stats_history
    }

    /// Get average tick time from recent history
    pub fn average_tick_time(&self) -> Option<Duration> {
        if self.stats_history.is_empty() {
            return None;
        }

        let total: Duration = self.stats_history.iter().map(|s| s.duration).sum();
        Some(total / self.stats_history.len() as u32)
    }

    pub fn clear_history(&mut self) {
        self.stats_history.clear();
    }
}

impl Default for StepScheduler {
    fn default() -> Self {
        Self::new()
    }
}
