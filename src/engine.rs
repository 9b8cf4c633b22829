//! The simulation handle.
//!
//! `Engine` owns the world, the scheduler and every random stream. Callers
//! drive it one `tick` at a time and may only mutate it between ticks via
//! `place_seed`, `set_wind_vector`, `reset` or `apply`.

use log::info;

use crate::command::{Command, CommandOutcome};
use crate::config::{ConfigError, SimConfig};
use crate::dispersal::{DispersalKernel, Wind};
use crate::grid::{Grid, TilePos};
use crate::lifecycle::growth_chance;
use crate::rng::RngManager;
use crate::scheduler::{StepScheduler, TickStats};
use crate::snapshot::{TileReport, TreeReport, WindSnapshot, WorldSnapshot};
use crate::soil::SoilField;
use crate::stats::{ForestStats, StatsAggregator};
use crate::tile::{SeedOrigin, Tile, TileKind};
use crate::world::{Season, World};

const SOIL_STREAM: &str = "soil";
const STEP_STREAM: &str = "step";

pub struct EngineBuilder {
    config: SimConfig,
    seed: u64,
    name: String,
}

impl EngineBuilder {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            seed: 0,
            name: "forest".to_string(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Validates the configuration, generates soil and returns an empty forest.
    pub fn build(self) -> Result<Engine, ConfigError> {
        self.config.validate()?;

        let mut rng = RngManager::new(self.seed);
        let soil = generate_soil(&self.config, &mut rng);
        let world = World::new(soil);
        let kernel = DispersalKernel::new(self.config.dispersal.clone(), world.grid().diagonal());
        let mut stats = StatsAggregator::new();
        stats.recompute(world.grid(), self.config.lifecycle.germination_age, 0);

        info!(
            "initialised '{}': {}x{} grid, seed {}",
            self.name, self.config.grid.width, self.config.grid.height, self.seed
        );

        Ok(Engine {
            config: self.config,
            name: self.name,
            seed: self.seed,
            kernel,
            world,
            scheduler: StepScheduler::new(),
            stats,
            rng,
        })
    }
}

fn generate_soil(config: &SimConfig, rng: &mut RngManager) -> SoilField {
    SoilField::generate(
        config.grid.width,
        config.grid.height,
        &config.soil,
        &mut rng.stream(SOIL_STREAM),
    )
}

pub struct Engine {
    config: SimConfig,
    name: String,
    seed: u64,
    kernel: DispersalKernel,
    world: World,
    scheduler: StepScheduler,
    stats: StatsAggregator,
    rng: RngManager,
}

impl Engine {
    /// Default parameters on a `width x height` grid.
    pub fn initialize(width: u32, height: u32, seed: u64) -> Result<Self, ConfigError> {
        EngineBuilder::new(SimConfig::with_dimensions(width, height))
            .with_seed(seed)
            .build()
    }

    pub fn tick(&mut self) -> TickStats {
        let mut rng = self.rng.stream(STEP_STREAM);
        self.scheduler.tick(
            &mut self.world,
            &self.config,
            &self.kernel,
            &mut self.stats,
            &mut rng,
        )
    }

    pub fn run(&mut self, ticks: u64) -> Vec<TickStats> {
        (0..ticks).map(|_| self.tick()).collect()
    }

    /// Runs `ticks` ticks, handing a snapshot to `hook` after each one.
    pub fn run_with_hook<F>(&mut self, ticks: u64, mut hook: F)
    where
        F: FnMut(&WorldSnapshot),
    {
        for _ in 0..ticks {
            self.tick();
            hook(&self.snapshot());
        }
    }

    /// Puts a seed on an empty in-bounds tile.
    pub fn place_seed(&mut self, x: i64, y: i64) -> bool {
        match self.world.grid.pos(x, y) {
            Some(pos) => self
                .world
                .grid
                .place_if_empty(pos, Tile::seed(SeedOrigin::Planted)),
            None => false,
        }
    }

    pub fn set_wind_vector(&mut self, dx: f64, dy: f64) {
        self.world.wind = Wind::new(dx, dy);
        info!(
            "wind set to ({:.2}, {:.2}) strength {:.2}",
            self.world.wind.direction().0,
            self.world.wind.direction().1,
            self.world.wind.strength()
        );
    }

    /// Regenerates the soil, clears every tile and zeroes the counters.
    pub fn reset(&mut self) {
        let soil = generate_soil(&self.config, &mut self.rng);
        self.world.reset(soil);
        self.scheduler.clear_history();
        self.stats
            .recompute(self.world.grid(), self.config.lifecycle.germination_age, 0);
        info!("reset '{}'", self.name);
    }

    pub fn apply(&mut self, command: Command) -> CommandOutcome {
        match command {
            Command::PlaceSeed { x, y } => CommandOutcome::SeedPlaced(self.place_seed(x, y)),
            Command::SetWind { dx, dy } => {
                self.set_wind_vector(dx, dy);
                CommandOutcome::WindSet
            }
            Command::Step { ticks } => CommandOutcome::Stepped(self.run(ticks as u64)),
            Command::Reset => {
                self.reset();
                CommandOutcome::Reset
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        self.world.grid()
    }

    pub fn width(&self) -> u32 {
        self.world.grid.width()
    }

    pub fn height(&self) -> u32 {
        self.world.grid.height()
    }

    pub fn tile(&self, x: i64, y: i64) -> Option<Tile> {
        let pos = self.world.grid.pos(x, y)?;
        self.world.grid.tile(pos).copied()
    }

    pub fn tile_kind(&self, x: i64, y: i64) -> Option<TileKind> {
        self.tile(x, y).map(|tile| tile.kind())
    }

    pub fn tree_age(&self, x: i64, y: i64) -> Option<f64> {
        self.tile(x, y)?.tree_age()
    }

    pub fn seed_timer(&self, x: i64, y: i64) -> Option<f64> {
        self.tile(x, y)?.seed_timer()
    }

    pub fn moisture(&self, x: i64, y: i64) -> Option<f64> {
        let pos = self.world.grid.pos(x, y)?;
        self.world.grid.moisture(pos)
    }

    pub fn nutrients(&self, x: i64, y: i64) -> Option<f64> {
        let pos = self.world.grid.pos(x, y)?;
        self.world.grid.nutrients(pos)
    }

    pub fn stats(&self) -> ForestStats {
        self.stats.latest()
    }

    pub fn tree_count(&self) -> u64 {
        self.stats.latest().tree_count
    }

    pub fn tree_percentage(&self) -> f64 {
        self.stats.latest().tree_percentage
    }

    pub fn death_count(&self) -> u64 {
        self.world.death_count()
    }

    pub fn current_tick(&self) -> u64 {
        self.world.clock().tick
    }

    pub fn current_year(&self) -> f64 {
        self.world.clock().current_year
    }

    pub fn season(&self) -> Season {
        self.world.clock().season
    }

    pub fn half_year_parity(&self) -> bool {
        self.season().parity()
    }

    pub fn wind(&self) -> Wind {
        self.world.wind()
    }

    pub fn scheduler(&self) -> &StepScheduler {
        &self.scheduler
    }

    pub fn inspect(&self, x: i64, y: i64) -> Option<TileReport> {
        let pos = self.world.grid.pos(x, y)?;
        let tile = *self.world.grid.tile(pos)?;
        let moisture = self.world.grid.moisture(pos)?;
        let nutrients = self.world.grid.nutrients(pos)?;
        let life = &self.config.lifecycle;
        let chance = if moisture > life.germination_moisture_ceiling {
            0.0
        } else {
            growth_chance(moisture, nutrients, life)
        };
        let tree = match tile {
            Tile::Tree(tree) => Some(TreeReport {
                age: tree.age,
                mature: tree.age >= life.germination_age,
                mast_year: tree.mast.is_mast_year,
                years_until_mast: tree.mast.years_until_next(),
            }),
            _ => None,
        };
        Some(TileReport {
            x: pos.x,
            y: pos.y,
            kind: tile.kind(),
            origin: tile.origin(),
            moisture,
            nutrients,
            growth_chance: chance,
            tree,
            seed_age: tile.seed_timer(),
        })
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let wind = self.world.wind();
        let (dx, dy) = wind.direction();
        let clock = self.world.clock();
        WorldSnapshot {
            scenario: self.name.clone(),
            tick: clock.tick,
            year: clock.current_year,
            season: clock.season,
            width: self.width(),
            height: self.height(),
            wind: WindSnapshot {
                dx,
                dy,
                strength: wind.strength(),
            },
            stats: self.stats.latest(),
        }
    }

    /// Positions of every tile of `kind`, in row-major order.
    pub fn positions_of(&self, kind: TileKind) -> Vec<TilePos> {
        self.world
            .grid
            .iter()
            .filter(|(_, tile)| tile.kind() == kind)
            .map(|(pos, _)| pos)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_rejects_bad_config() {
        assert!(Engine::initialize(0, 10, 1).is_err());
        let mut config = SimConfig::with_dimensions(10, 10);
        config.mast.interval = crate::config::Range::new(5.0, 1.0);
        assert!(EngineBuilder::new(config).build().is_err());
    }

    #[test]
    fn test_fresh_engine_is_empty() {
        let engine = Engine::initialize(12, 8, 3).unwrap();
        assert_eq!(engine.tree_count(), 0);
        assert_eq!(engine.current_year(), 0.0);
        assert!(!engine.half_year_parity());
        assert!(engine.wind().is_calm());
        assert_eq!(engine.positions_of(TileKind::Empty).len(), 96);
    }

    #[test]
    fn test_place_seed_bounds_and_occupancy() {
        let mut engine = Engine::initialize(5, 5, 3).unwrap();
        assert!(engine.place_seed(2, 2));
        assert!(!engine.place_seed(2, 2));
        assert!(!engine.place_seed(-1, 2));
        assert!(!engine.place_seed(5, 0));
        assert_eq!(engine.tile_kind(2, 2), Some(TileKind::Seed));
        assert_eq!(engine.seed_timer(2, 2), Some(0.0));
        assert_eq!(engine.tile_kind(7, 7), None);
    }

    #[test]
    fn test_inspect_reports_soil_and_seed() {
        let mut engine = Engine::initialize(5, 5, 9).unwrap();
        engine.place_seed(1, 3);
        let report = engine.inspect(1, 3).unwrap();
        assert_eq!(report.kind, TileKind::Seed);
        assert_eq!(report.origin, Some(SeedOrigin::Planted));
        assert_eq!(report.seed_age, Some(0.0));
        assert_eq!(Some(report.moisture), engine.moisture(1, 3));
        assert!(report.tree.is_none());
        assert!(engine.inspect(5, 5).is_none());
    }

    #[test]
    fn test_apply_commands() {
        let mut engine = Engine::initialize(6, 6, 2).unwrap();
        assert_eq!(
            engine.apply(Command::PlaceSeed { x: 0, y: 0 }),
            CommandOutcome::SeedPlaced(true)
        );
        assert_eq!(
            engine.apply(Command::SetWind { dx: 0.0, dy: 2.0 }),
            CommandOutcome::WindSet
        );
        assert_eq!(engine.wind().strength(), 2.0);
        match engine.apply(Command::Step { ticks: 3 }) {
            CommandOutcome::Stepped(stats) => assert_eq!(stats.len(), 3),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(engine.current_tick(), 3);
        assert_eq!(engine.apply(Command::Reset), CommandOutcome::Reset);
        assert_eq!(engine.current_tick(), 0);
        assert_eq!(engine.tile_kind(0, 0), Some(TileKind::Empty));
    }

    #[test]
    fn test_snapshot_serialises() {
        let mut engine = Engine::initialize(4, 4, 1).unwrap();
        engine.set_wind_vector(1.0, 0.0);
        engine.tick();
        let json = serde_json::to_string(&engine.snapshot()).unwrap();
        assert!(json.contains("\"tick\":1"));
        assert!(json.contains("\"season\":\"SecondHalf\""));
    }
}
