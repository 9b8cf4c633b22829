use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::engine::{Engine, EngineBuilder};

fn default_ticks() -> u64 {
    200
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    #[serde(default)]
    pub wind: Option<[f64; 2]>,
    #[serde(default)]
    pub initial_seeds: Vec<SeedPlacement>,
    #[serde(default)]
    pub config: SimConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPlacement {
    pub x: i64,
    pub y: i64,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    /// Builds the engine, applies the wind and plants the initial seeds.
    pub fn build_engine(&self) -> Result<Engine> {
        self.build_engine_with_seed(self.seed)
    }

    pub fn build_engine_with_seed(&self, seed: u64) -> Result<Engine> {
        let mut engine = EngineBuilder::new(self.config.clone())
            .with_seed(seed)
            .with_name(self.name.clone())
            .build()
            .with_context(|| format!("Failed to build scenario '{}'", self.name))?;
        if let Some([dx, dy]) = self.wind {
            engine.set_wind_vector(dx, dy);
        }
        for placement in &self.initial_seeds {
            if !engine.place_seed(placement.x, placement.y) {
                warn!(
                    "scenario '{}': could not place seed at ({}, {})",
                    self.name, placement.x, placement.y
                );
            }
        }
        Ok(engine)
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.unwrap_or(self.ticks)
    }
}
