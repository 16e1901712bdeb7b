//! # Effect Error Types
//!
//! Only configuration loading can fail. Simulation and rendering degrade to
//! an empty frame instead of returning errors.

use thiserror::Error;

/// Errors that can occur while loading effect configuration.
#[derive(Error, Debug)]
pub enum EmberError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config text is not valid TOML for an effect.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config parsed but describes something the engine cannot run.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for configuration operations.
pub type EmberResult<T> = Result<T, EmberError>;
