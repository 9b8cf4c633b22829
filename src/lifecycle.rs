//! Per-tile lifecycle transition.
//!
//! `advance` moves a single tile forward by one tick. Seeds dispersed by a
//! tree are written into the grid immediately, so a tile visited later in
//! the same pass already sees them; a tile visited earlier picks them up on
//! the next tick.

use log::trace;
use rand::Rng;

use crate::config::{LifecycleConfig, MortalityConfig, SimConfig};
use crate::dispersal::{DispersalKernel, Wind};
use crate::grid::{Grid, TilePos};
use crate::tile::{roll, sample_count, SeedState, Tile, TreeState};
use crate::world::Season;

/// Everything a transition reads besides the grid itself.
pub struct TickContext<'a> {
    pub config: &'a SimConfig,
    pub kernel: &'a DispersalKernel,
    pub wind: Wind,
    pub season: Season,
    pub dt: f64,
}

/// What happened to a tile during one transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    Idle,
    TreeDied {
        age: f64,
    },
    TreeGrew {
        mast_year: bool,
        seeds_released: u32,
        seeds_placed: u32,
    },
    SeedWaiting {
        attempted_germination: bool,
    },
    Germinated,
    SeedExpired,
}

/// Converts an annual probability into a per-step probability for a step of
/// `dt` years.
pub fn per_step_probability(annual: f64, dt: f64) -> f64 {
    1.0 - (1.0 - annual).powf(dt)
}

/// Logistic senescence term, rising from ~0 to `senescence_cap` around
/// `senescence_midpoint`.
pub fn senescence(age: f64, config: &MortalityConfig) -> f64 {
    let exponent = -config.senescence_steepness * (age - config.senescence_midpoint);
    config.senescence_cap / (1.0 + exponent.exp())
}

/// Death probability for a tree of `age` over one step of `dt` years.
pub fn death_probability(age: f64, dt: f64, config: &MortalityConfig) -> f64 {
    let p = if age < config.young_threshold {
        per_step_probability(config.young_annual_rate, dt)
    } else {
        per_step_probability(config.mature_annual_rate, dt) + senescence(age, config)
    };
    p.clamp(0.0, 1.0)
}

/// Chance that a seed on this soil passes the growth draw.
pub fn growth_chance(moisture: f64, nutrients: f64, config: &LifecycleConfig) -> f64 {
    config.germination_rate * moisture.sqrt() * nutrients.sqrt()
}

/// Chance that a seed survives competition from neighbouring trees.
pub fn competition_factor(live_neighbors: usize, config: &LifecycleConfig) -> f64 {
    1.0 - (live_neighbors as f64 / 8.0) * config.competition_weight
}

pub fn advance<R: Rng>(grid: &mut Grid, pos: TilePos, ctx: &TickContext<'_>, rng: &mut R) -> Transition {
    let tile = match grid.tile(pos) {
        Some(tile) => *tile,
        None => return Transition::Idle,
    };
    match tile {
        Tile::Empty => Transition::Idle,
        Tile::Tree(tree) => advance_tree(grid, pos, tree, ctx, rng),
        Tile::Seed(seed) => advance_seed(grid, pos, seed, ctx, rng),
    }
}

fn advance_tree<R: Rng>(
    grid: &mut Grid,
    pos: TilePos,
    mut tree: TreeState,
    ctx: &TickContext<'_>,
    rng: &mut R,
) -> Transition {
    tree.age += ctx.dt;

    let p_death = death_probability(tree.age, ctx.dt, &ctx.config.mortality);
    if roll(rng) < p_death {
        grid.set_tile(pos, Tile::Empty);
        trace!("tree at ({}, {}) died aged {:.1}", pos.x, pos.y, tree.age);
        return Transition::TreeDied { age: tree.age };
    }

    let mast_year = tree.mast.advance(ctx.dt, ctx.config.mast.interval, rng);
    grid.set_tile(pos, Tile::Tree(tree));

    let life = &ctx.config.lifecycle;
    let (mut released, mut placed) = (0, 0);
    if tree.age >= life.germination_age {
        let range = if mast_year {
            life.mast_seeds
        } else {
            life.seeds_per_year
        };
        released = sample_count(range, rng);
        for _ in 0..released {
            if disperse_one(grid, pos, ctx, rng) {
                placed += 1;
            }
        }
    }

    Transition::TreeGrew {
        mast_year,
        seeds_released: released,
        seeds_placed: placed,
    }
}

/// Sends one seed from `origin`. Seeds landing off-grid or on an occupied
/// tile are dropped.
fn disperse_one<R: Rng>(grid: &mut Grid, origin: TilePos, ctx: &TickContext<'_>, rng: &mut R) -> bool {
    let mode = ctx.kernel.choose_mode(rng);
    let offset = ctx.kernel.sample(mode, ctx.wind, ctx.season, rng);
    let tx = (origin.x as f64 + offset.dx).round() as i64;
    let ty = (origin.y as f64 + offset.dy).round() as i64;
    match grid.pos(tx, ty) {
        Some(target) => grid.place_if_empty(target, Tile::seed(mode.into())),
        None => false,
    }
}

fn advance_seed<R: Rng>(
    grid: &mut Grid,
    pos: TilePos,
    mut seed: SeedState,
    ctx: &TickContext<'_>,
    rng: &mut R,
) -> Transition {
    let life = &ctx.config.lifecycle;
    seed.timer += ctx.dt;

    let moisture = grid.moisture(pos).unwrap_or(0.0);
    let nutrients = grid.nutrients(pos).unwrap_or(0.0);

    let mut attempted = false;
    let mut germinated = false;
    if moisture <= life.germination_moisture_ceiling && seed.timer >= life.seed_min_delay {
        attempted = true;
        if roll(rng) < growth_chance(moisture, nutrients, life) {
            let competition = competition_factor(grid.live_tree_neighbors(pos), life);
            germinated = roll(rng) < competition;
        }
    }

    if seed.timer > life.seed_expiry {
        grid.set_tile(pos, Tile::Empty);
        return Transition::SeedExpired;
    }

    if germinated {
        grid.set_tile(pos, Tile::sapling(seed.origin, ctx.config.mast.interval, rng));
        trace!("seed at ({}, {}) germinated", pos.x, pos.y);
        return Transition::Germinated;
    }

    grid.set_tile(pos, Tile::Seed(seed));
    Transition::SeedWaiting {
        attempted_germination: attempted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Range;
    use crate::soil::SoilField;
    use crate::tile::SeedOrigin;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn setup(config: &SimConfig, moisture: f64) -> (Grid, DispersalKernel) {
        let grid = Grid::new(SoilField::uniform(
            config.grid.width,
            config.grid.height,
            moisture,
            1.0,
        ));
        let kernel = DispersalKernel::new(config.dispersal.clone(), grid.diagonal());
        (grid, kernel)
    }

    fn ctx<'a>(config: &'a SimConfig, kernel: &'a DispersalKernel) -> TickContext<'a> {
        TickContext {
            config,
            kernel,
            wind: Wind::new(1.0, 0.0),
            season: Season::FirstHalf,
            dt: config.clock.years_per_tick,
        }
    }

    #[test]
    fn test_young_mortality_matches_annual_rate() {
        let config = MortalityConfig::default();
        let p = death_probability(1.0, 1.0, &config);
        assert!((p - config.young_annual_rate).abs() < 1e-12);
        let half = death_probability(1.0, 0.5, &config);
        assert!((1.0 - (1.0 - half).powi(2) - config.young_annual_rate).abs() < 1e-12);
    }

    #[test]
    fn test_mortality_rises_with_age() {
        let config = MortalityConfig::default();
        let mut previous = death_probability(config.young_threshold, 0.5, &config);
        let mut age = config.young_threshold;
        while age < 1_000.0 {
            age += 2.5;
            let p = death_probability(age, 0.5, &config);
            assert!(p >= previous, "mortality fell at age {age}");
            previous = p;
        }
        assert!(previous <= 1.0);
        assert!(senescence(config.young_threshold, &config) < 1e-6);
        assert!((senescence(10_000.0, &config) - config.senescence_cap).abs() < 1e-9);
    }

    #[test]
    fn test_empty_tile_is_idle() {
        let config = SimConfig::with_dimensions(3, 3);
        let (mut grid, kernel) = setup(&config, 0.5);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let t = advance(&mut grid, TilePos::new(1, 1), &ctx(&config, &kernel), &mut rng);
        assert_eq!(t, Transition::Idle);
        assert!(grid.tile(TilePos::new(1, 1)).unwrap().is_empty());
    }

    #[test]
    fn test_seed_before_min_delay_never_attempts() {
        let mut config = SimConfig::with_dimensions(3, 3);
        config.lifecycle.germination_rate = 1.0;
        let (mut grid, kernel) = setup(&config, 0.5);
        let pos = TilePos::new(1, 1);
        grid.set_tile(pos, Tile::seed(SeedOrigin::Planted));
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let context = ctx(&config, &kernel);

        // 0.5, 1.0, ... 4.5 years: all strictly below the 5 year delay.
        for _ in 0..9 {
            let t = advance(&mut grid, pos, &context, &mut rng);
            assert_eq!(
                t,
                Transition::SeedWaiting {
                    attempted_germination: false
                }
            );
        }
        assert_eq!(grid.tile(pos).unwrap().seed_timer(), Some(4.5));
    }

    #[test]
    fn test_seed_germinates_on_good_soil() {
        let mut config = SimConfig::with_dimensions(3, 3);
        config.lifecycle.germination_rate = 1.0;
        config.lifecycle.competition_weight = 0.0;
        let (mut grid, kernel) = setup(&config, 0.5);
        let pos = TilePos::new(1, 1);
        grid.set_tile(
            pos,
            Tile::Seed(SeedState {
                timer: 5.0,
                origin: SeedOrigin::Animal,
            }),
        );
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        // growth chance = sqrt(0.5); retry until the draw lands.
        let mut outcome = Transition::Idle;
        for _ in 0..50 {
            outcome = advance(&mut grid, pos, &ctx(&config, &kernel), &mut rng);
            if outcome == Transition::Germinated {
                break;
            }
        }
        assert_eq!(outcome, Transition::Germinated);
        let tile = grid.tile(pos).unwrap();
        assert_eq!(tile.tree_age(), Some(0.0));
        assert_eq!(tile.origin(), Some(SeedOrigin::Animal));
    }

    #[test]
    fn test_too_wet_seed_skips_germination() {
        let mut config = SimConfig::with_dimensions(3, 3);
        config.lifecycle.germination_rate = 1.0;
        let (mut grid, kernel) = setup(&config, 0.95);
        let pos = TilePos::new(0, 0);
        grid.set_tile(
            pos,
            Tile::Seed(SeedState {
                timer: 10.0,
                origin: SeedOrigin::Wind,
            }),
        );
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let t = advance(&mut grid, pos, &ctx(&config, &kernel), &mut rng);
        assert_eq!(
            t,
            Transition::SeedWaiting {
                attempted_germination: false
            }
        );
        assert_eq!(grid.tile(pos).unwrap().seed_timer(), Some(10.5));
    }

    #[test]
    fn test_expiry_overrides_germination() {
        let mut config = SimConfig::with_dimensions(3, 3);
        config.lifecycle.germination_rate = 1.0;
        config.lifecycle.competition_weight = 0.0;
        let (mut grid, kernel) = setup(&config, 0.5);
        let pos = TilePos::new(2, 2);
        grid.set_tile(
            pos,
            Tile::Seed(SeedState {
                timer: 30.0,
                origin: SeedOrigin::Wind,
            }),
        );
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let t = advance(&mut grid, pos, &ctx(&config, &kernel), &mut rng);
        assert_eq!(t, Transition::SeedExpired);
        assert!(grid.tile(pos).unwrap().is_empty());
    }

    #[test]
    fn test_tree_death_clears_tile() {
        let mut config = SimConfig::with_dimensions(3, 3);
        config.mortality.young_annual_rate = 1.0;
        let (mut grid, kernel) = setup(&config, 0.5);
        let pos = TilePos::new(1, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        grid.set_tile(pos, Tile::sapling(SeedOrigin::Planted, Range::new(2.0, 7.0), &mut rng));
        let t = advance(&mut grid, pos, &ctx(&config, &kernel), &mut rng);
        assert!(matches!(t, Transition::TreeDied { .. }));
        assert_eq!(grid.tile(pos), Some(&Tile::Empty));
    }

    #[test]
    fn test_immature_tree_releases_nothing() {
        let mut config = SimConfig::with_dimensions(5, 5);
        config.mortality.young_annual_rate = 0.0;
        let (mut grid, kernel) = setup(&config, 0.5);
        let pos = TilePos::new(2, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        grid.set_tile(pos, Tile::sapling(SeedOrigin::Planted, Range::new(2.0, 7.0), &mut rng));
        match advance(&mut grid, pos, &ctx(&config, &kernel), &mut rng) {
            Transition::TreeGrew { seeds_released, .. } => assert_eq!(seeds_released, 0),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(grid.tile(pos).unwrap().tree_age(), Some(0.5));
    }

    #[test]
    fn test_mature_tree_seeds_land_in_bounds_on_empty_tiles() {
        let mut config = SimConfig::with_dimensions(40, 40);
        config.lifecycle.germination_age = 0.0;
        config.mortality.young_annual_rate = 0.0;
        config.mortality.mature_annual_rate = 0.0;
        config.mortality.senescence_cap = 0.0;
        let (mut grid, kernel) = setup(&config, 0.5);
        let pos = TilePos::new(20, 20);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        grid.set_tile(pos, Tile::sapling(SeedOrigin::Planted, Range::new(2.0, 7.0), &mut rng));

        let mut placed_total = 0;
        for _ in 0..40 {
            if let Transition::TreeGrew {
                seeds_released,
                seeds_placed,
                ..
            } = advance(&mut grid, pos, &ctx(&config, &kernel), &mut rng)
            {
                assert!(seeds_placed <= seeds_released);
                placed_total += seeds_placed;
            }
        }
        let seeds = grid.tiles().iter().filter(|t| t.seed_timer().is_some()).count();
        assert_eq!(seeds as u32, placed_total);
        assert!(grid.tile(pos).unwrap().is_tree());
    }

    #[test]
    fn test_competition_factor() {
        let config = LifecycleConfig::default();
        assert_eq!(competition_factor(0, &config), 1.0);
        assert_eq!(competition_factor(8, &config), 0.5);
        assert_eq!(competition_factor(4, &config), 0.75);
    }
}
