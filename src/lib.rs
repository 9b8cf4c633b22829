pub mod command;
pub mod config;
pub mod dispersal;
pub mod engine;
pub mod grid;
pub mod lifecycle;
pub mod rng;
pub mod scenario;
pub mod scheduler;
pub mod snapshot;
pub mod soil;
pub mod stats;
pub mod tile;
pub mod world;

pub use command::{Command, CommandOutcome};
pub use config::{ConfigError, SimConfig};
pub use engine::{Engine, EngineBuilder};
pub use scheduler::TickStats;
pub use tile::{Tile, TileKind};
