//! Configuration file handling

use serde::Deserialize;
use std::path::Path;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Simulation settings
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Default settings applied to every test run
    #[serde(default)]
    pub defaults: Defaults,
}

/// Settings for the simulated design
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Clock period used to convert cycles to simulated time
    #[serde(default = "default_clock_period")]
    pub clock_period_ns: u64,

    /// Cycles spent in reset before firmware starts
    #[serde(default = "default_reset_cycles")]
    pub reset_cycles: u64,

    /// The driver yields to the runtime after this many cycles
    #[serde(default = "default_yield_interval")]
    pub yield_interval: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            clock_period_ns: default_clock_period(),
            reset_cycles: default_reset_cycles(),
            yield_interval: default_yield_interval(),
        }
    }
}

fn default_clock_period() -> u64 {
    25
}
fn default_reset_cycles() -> u64 {
    20
}
fn default_yield_interval() -> u64 {
    4096
}

/// Default settings
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Defaults {
    /// Overrides the cycle timeout every test passes to `test_configure`
    #[serde(default)]
    pub timeout_cycles: Option<u64>,
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))?;

        if config.simulation.clock_period_ns == 0 {
            return Err(super::Error::ConfigParse(
                "simulation.clock_period_ns must be greater than zero".to_string(),
            ));
        }
        if config.simulation.yield_interval == 0 {
            return Err(super::Error::ConfigParse(
                "simulation.yield_interval must be greater than zero".to_string(),
            ));
        }

        Ok(config)
    }
}
