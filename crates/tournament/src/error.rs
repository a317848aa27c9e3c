//! Error types for simulation and configuration

use rating_core::RatingError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// Fewer than two competitors, duplicates or empty ids inside one group
    #[error("invalid group {group}: {reason}")]
    InvalidGroup { group: String, reason: String },

    /// A knockout draw that cannot produce a single champion
    #[error("invalid bracket: {0}")]
    InvalidBracket(String),

    /// Groups and qualifier counts that do not fill a power-of-two bracket
    #[error("invalid tournament format: {0}")]
    InvalidFormat(String),

    #[error("invalid simulation config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Rating(#[from] RatingError),
}

pub type Result<T> = std::result::Result<T, SimulationError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error(transparent)]
    Rating(#[from] RatingError),
}
