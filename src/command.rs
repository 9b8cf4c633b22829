use serde::{Deserialize, Serialize};

use crate::scheduler::TickStats;

/// Discrete requests from the presentation layer. Applied only between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    PlaceSeed { x: i64, y: i64 },
    SetWind { dx: f64, dy: f64 },
    Step { ticks: u32 },
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    SeedPlaced(bool),
    WindSet,
    Stepped(Vec<TickStats>),
    Reset,
}
