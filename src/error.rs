//! Error types for the battle simulator

use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("a team needs exactly {expected} characters, got {got}")]
    RosterSize { expected: usize, got: usize },

    #[error("unknown archetype '{name}' (expected one of: tank, hybrid, offensive)")]
    UnknownArchetype { name: String },

    #[error("hyperparameter {name} = {value} must be finite and within [0, 1]")]
    InvalidHyperparameter { name: &'static str, value: f64 },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
