//! TOML configuration for ratings, match model, format and batches

use rating_core::EloConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::monte_carlo::MonteCarloConfig;
use crate::orchestrator::TournamentFormat;
use crate::outcome::OutcomeConfig;

/// Root configuration file.
///
/// Every table is optional; a missing table or key takes its default, so an
/// empty file describes AFCON 2025 with the standard Elo weights.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub elo: EloConfig,
    pub outcome: OutcomeConfig,
    pub format: TournamentFormat,
    pub monte_carlo: MonteCarloConfig,
}

impl SimulatorConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: SimulatorConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.elo.validate()?;
        self.outcome.validate()?;
        self.format.validate()?;
        self.monte_carlo.validate()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
