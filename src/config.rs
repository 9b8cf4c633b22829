//! Simulation parameters
//!
//! Every field has a default so partial YAML documents load; `validate`
//! rejects configurations the simulation cannot run with.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be finite")]
    NotFinite { field: &'static str },
    #[error("{field} must lie in [0, 1] (got {value})")]
    NotProbability { field: &'static str, value: f64 },
    #[error("{field} range is empty: min {min} > max {max}")]
    EmptyRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("{field} out of bounds: {reason}")]
    OutOfBounds {
        field: &'static str,
        reason: String,
    },
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Inclusive `[min, max]` pair, written `[min, max]` in YAML.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[T; 2]", into = "[T; 2]")]
pub struct Range<T: Copy> {
    pub min: T,
    pub max: T,
}

impl<T: Copy> Range<T> {
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: Copy> From<[T; 2]> for Range<T> {
    fn from(value: [T; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl<T: Copy> From<Range<T>> for [T; 2] {
    fn from(value: Range<T>) -> Self {
        [value.min, value.max]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub soil: SoilConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub mortality: MortalityConfig,
    #[serde(default)]
    pub mast: MastConfig,
    #[serde(default)]
    pub dispersal: DispersalConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_width() -> u32 {
    100
}

fn default_height() -> u32 {
    80
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Simulated years per tick. A tick is one half-year by default.
    #[serde(default = "default_years_per_tick")]
    pub years_per_tick: f64,
}

fn default_years_per_tick() -> f64 {
    0.5
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            years_per_tick: default_years_per_tick(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilConfig {
    #[serde(default = "default_moisture_gradient")]
    pub moisture_gradient: f64,
    #[serde(default = "default_nutrient_gradient")]
    pub nutrient_gradient: f64,
    #[serde(default = "default_soil_noise")]
    pub noise: f64,
    #[serde(default = "default_streams")]
    pub streams: Range<u32>,
    #[serde(default = "default_stream_radius")]
    pub stream_radius: Range<u32>,
    #[serde(default = "default_stream_drift")]
    pub stream_drift: u32,
    #[serde(default = "default_stream_step")]
    pub stream_step: Range<u32>,
    #[serde(default = "default_stream_moisture_boost")]
    pub stream_moisture_boost: f64,
    #[serde(default = "default_stream_nutrient_boost")]
    pub stream_nutrient_boost: f64,
}

fn default_moisture_gradient() -> f64 {
    0.7
}

fn default_nutrient_gradient() -> f64 {
    0.8
}

fn default_soil_noise() -> f64 {
    0.15
}

fn default_streams() -> Range<u32> {
    Range::new(1, 3)
}

fn default_stream_radius() -> Range<u32> {
    Range::new(2, 4)
}

fn default_stream_drift() -> u32 {
    2
}

fn default_stream_step() -> Range<u32> {
    Range::new(1, 2)
}

fn default_stream_moisture_boost() -> f64 {
    0.5
}

fn default_stream_nutrient_boost() -> f64 {
    0.2
}

impl Default for SoilConfig {
    fn default() -> Self {
        Self {
            moisture_gradient: default_moisture_gradient(),
            nutrient_gradient: default_nutrient_gradient(),
            noise: default_soil_noise(),
            streams: default_streams(),
            stream_radius: default_stream_radius(),
            stream_drift: default_stream_drift(),
            stream_step: default_stream_step(),
            stream_moisture_boost: default_stream_moisture_boost(),
            stream_nutrient_boost: default_stream_nutrient_boost(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Age in years at which a tree starts releasing seeds.
    #[serde(default = "default_germination_age")]
    pub germination_age: f64,
    #[serde(default = "default_seed_min_delay")]
    pub seed_min_delay: f64,
    #[serde(default = "default_seed_expiry")]
    pub seed_expiry: f64,
    #[serde(default = "default_germination_rate")]
    pub germination_rate: f64,
    /// Seeds on soil wetter than this never germinate.
    #[serde(default = "default_germination_moisture_ceiling")]
    pub germination_moisture_ceiling: f64,
    #[serde(default = "default_competition_weight")]
    pub competition_weight: f64,
    #[serde(default = "default_seeds_per_year")]
    pub seeds_per_year: Range<u32>,
    #[serde(default = "default_mast_seeds")]
    pub mast_seeds: Range<u32>,
}

fn default_germination_age() -> f64 {
    40.0
}

fn default_seed_min_delay() -> f64 {
    5.0
}

fn default_seed_expiry() -> f64 {
    30.0
}

fn default_germination_rate() -> f64 {
    0.3
}

fn default_germination_moisture_ceiling() -> f64 {
    0.85
}

fn default_competition_weight() -> f64 {
    0.5
}

fn default_seeds_per_year() -> Range<u32> {
    Range::new(1, 2)
}

fn default_mast_seeds() -> Range<u32> {
    Range::new(5, 10)
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            germination_age: default_germination_age(),
            seed_min_delay: default_seed_min_delay(),
            seed_expiry: default_seed_expiry(),
            germination_rate: default_germination_rate(),
            germination_moisture_ceiling: default_germination_moisture_ceiling(),
            competition_weight: default_competition_weight(),
            seeds_per_year: default_seeds_per_year(),
            mast_seeds: default_mast_seeds(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortalityConfig {
    #[serde(default = "default_young_threshold")]
    pub young_threshold: f64,
    #[serde(default = "default_young_annual_rate")]
    pub young_annual_rate: f64,
    #[serde(default = "default_mature_annual_rate")]
    pub mature_annual_rate: f64,
    #[serde(default = "default_senescence_midpoint")]
    pub senescence_midpoint: f64,
    #[serde(default = "default_senescence_steepness")]
    pub senescence_steepness: f64,
    /// Upper bound of the per-step senescence term.
    #[serde(default = "default_senescence_cap")]
    pub senescence_cap: f64,
}

fn default_young_threshold() -> f64 {
    10.0
}

fn default_young_annual_rate() -> f64 {
    0.05
}

fn default_mature_annual_rate() -> f64 {
    0.005
}

fn default_senescence_midpoint() -> f64 {
    350.0
}

fn default_senescence_steepness() -> f64 {
    0.05
}

fn default_senescence_cap() -> f64 {
    0.25
}

impl Default for MortalityConfig {
    fn default() -> Self {
        Self {
            young_threshold: default_young_threshold(),
            young_annual_rate: default_young_annual_rate(),
            mature_annual_rate: default_mature_annual_rate(),
            senescence_midpoint: default_senescence_midpoint(),
            senescence_steepness: default_senescence_steepness(),
            senescence_cap: default_senescence_cap(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MastConfig {
    /// Years between mast years, drawn uniformly per cycle.
    #[serde(default = "default_mast_interval")]
    pub interval: Range<f64>,
}

fn default_mast_interval() -> Range<f64> {
    Range::new(2.0, 7.0)
}

impl Default for MastConfig {
    fn default() -> Self {
        Self {
            interval: default_mast_interval(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispersalConfig {
    #[serde(default = "default_animal_probability")]
    pub animal_probability: f64,
    #[serde(default = "default_seasonal_bias_degrees")]
    pub seasonal_bias_degrees: f64,
    #[serde(default = "default_pareto_shape")]
    pub pareto_shape: f64,
    #[serde(default = "default_pareto_scale")]
    pub pareto_scale: f64,
    #[serde(default = "default_wind_spread_degrees")]
    pub wind_spread_degrees: f64,
    #[serde(default = "default_wind_seed_factor")]
    pub wind_seed_factor: f64,
    #[serde(default = "default_wind_base_multiplier")]
    pub wind_base_multiplier: f64,
    #[serde(default = "default_wind_variability")]
    pub wind_variability: f64,
    #[serde(default = "default_wind_min_distance")]
    pub wind_min_distance: f64,
}

fn default_animal_probability() -> f64 {
    0.95
}

fn default_seasonal_bias_degrees() -> f64 {
    30.0
}

fn default_pareto_shape() -> f64 {
    2.5
}

fn default_pareto_scale() -> f64 {
    8.0
}

fn default_wind_spread_degrees() -> f64 {
    45.0
}

fn default_wind_seed_factor() -> f64 {
    1.0
}

fn default_wind_base_multiplier() -> f64 {
    5.0
}

fn default_wind_variability() -> f64 {
    0.6
}

fn default_wind_min_distance() -> f64 {
    0.5
}

impl Default for DispersalConfig {
    fn default() -> Self {
        Self {
            animal_probability: default_animal_probability(),
            seasonal_bias_degrees: default_seasonal_bias_degrees(),
            pareto_shape: default_pareto_shape(),
            pareto_scale: default_pareto_scale(),
            wind_spread_degrees: default_wind_spread_degrees(),
            wind_seed_factor: default_wind_seed_factor(),
            wind_base_multiplier: default_wind_base_multiplier(),
            wind_variability: default_wind_variability(),
            wind_min_distance: default_wind_min_distance(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl SimConfig {
    /// Default parameters on a `width x height` grid.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            grid: GridConfig { width, height },
            ..Self::default()
        }
    }

    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.width == 0 {
            return Err(ConfigError::NotPositive {
                field: "grid.width",
                value: 0.0,
            });
        }
        if self.grid.height == 0 {
            return Err(ConfigError::NotPositive {
                field: "grid.height",
                value: 0.0,
            });
        }

        positive("clock.years_per_tick", self.clock.years_per_tick)?;

        let soil = &self.soil;
        non_negative("soil.moisture_gradient", soil.moisture_gradient)?;
        non_negative("soil.nutrient_gradient", soil.nutrient_gradient)?;
        non_negative("soil.noise", soil.noise)?;
        count_range("soil.streams", soil.streams)?;
        count_range("soil.stream_radius", soil.stream_radius)?;
        if soil.stream_radius.min == 0 {
            return Err(ConfigError::NotPositive {
                field: "soil.stream_radius",
                value: 0.0,
            });
        }
        count_range("soil.stream_step", soil.stream_step)?;
        if soil.stream_step.min == 0 {
            return Err(ConfigError::NotPositive {
                field: "soil.stream_step",
                value: 0.0,
            });
        }
        non_negative("soil.stream_moisture_boost", soil.stream_moisture_boost)?;
        non_negative("soil.stream_nutrient_boost", soil.stream_nutrient_boost)?;

        let life = &self.lifecycle;
        non_negative("lifecycle.germination_age", life.germination_age)?;
        non_negative("lifecycle.seed_min_delay", life.seed_min_delay)?;
        non_negative("lifecycle.seed_expiry", life.seed_expiry)?;
        probability("lifecycle.germination_rate", life.germination_rate)?;
        probability(
            "lifecycle.germination_moisture_ceiling",
            life.germination_moisture_ceiling,
        )?;
        probability("lifecycle.competition_weight", life.competition_weight)?;
        count_range("lifecycle.seeds_per_year", life.seeds_per_year)?;
        count_range("lifecycle.mast_seeds", life.mast_seeds)?;

        let mortality = &self.mortality;
        non_negative("mortality.young_threshold", mortality.young_threshold)?;
        probability("mortality.young_annual_rate", mortality.young_annual_rate)?;
        probability("mortality.mature_annual_rate", mortality.mature_annual_rate)?;
        non_negative("mortality.senescence_midpoint", mortality.senescence_midpoint)?;
        non_negative(
            "mortality.senescence_steepness",
            mortality.senescence_steepness,
        )?;
        probability("mortality.senescence_cap", mortality.senescence_cap)?;

        let interval = self.mast.interval;
        positive("mast.interval", interval.min)?;
        finite("mast.interval", interval.max)?;
        if interval.min > interval.max {
            return Err(ConfigError::EmptyRange {
                field: "mast.interval",
                min: interval.min,
                max: interval.max,
            });
        }

        let dispersal = &self.dispersal;
        probability("dispersal.animal_probability", dispersal.animal_probability)?;
        finite(
            "dispersal.seasonal_bias_degrees",
            dispersal.seasonal_bias_degrees,
        )?;
        positive("dispersal.pareto_shape", dispersal.pareto_shape)?;
        positive("dispersal.pareto_scale", dispersal.pareto_scale)?;
        non_negative("dispersal.wind_spread_degrees", dispersal.wind_spread_degrees)?;
        non_negative("dispersal.wind_seed_factor", dispersal.wind_seed_factor)?;
        non_negative(
            "dispersal.wind_base_multiplier",
            dispersal.wind_base_multiplier,
        )?;
        non_negative("dispersal.wind_variability", dispersal.wind_variability)?;
        if dispersal.wind_variability > 2.0 {
            return Err(ConfigError::OutOfBounds {
                field: "dispersal.wind_variability",
                reason: format!("{} exceeds 2.0", dispersal.wind_variability),
            });
        }
        non_negative("dispersal.wind_min_distance", dispersal.wind_min_distance)?;

        Ok(())
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field })
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value <= 0.0 {
        return Err(ConfigError::NotPositive { field, value });
    }
    Ok(())
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(())
}

fn probability(field: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::NotProbability { field, value });
    }
    Ok(())
}

fn count_range(field: &'static str, range: Range<u32>) -> Result<(), ConfigError> {
    if range.min > range.max {
        return Err(ConfigError::EmptyRange {
            field,
            min: range.min as f64,
            max: range.max as f64,
        });
    }
    Ok(())
}
