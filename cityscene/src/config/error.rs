//! Configuration errors.

use thiserror::Error;

/// Errors loading or querying the cities configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or parse the INI file.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to parse INI text.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] ini::ParseError),

    /// A section is missing a required key.
    #[error("Missing configuration key: [{section}] {key}")]
    MissingKey { section: String, key: String },

    /// A value could not be interpreted.
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// A section name does not follow `city.<c>`, `layer.<c>.<l>` or
    /// `representation.<c>.<l>.<r>`.
    #[error("Invalid section name: [{0}]")]
    InvalidSection(String),

    /// No city with this name is configured.
    #[error("unknown city: {0}")]
    UnknownCity(String),

    /// The city has no layer with this name.
    #[error("unknown layer '{layer}' for city '{city}'")]
    UnknownLayer { city: String, layer: String },

    /// The layer has no representation with this name.
    #[error("unknown representation '{representation}' for layer '{city}/{layer}'")]
    UnknownRepresentation {
        city: String,
        layer: String,
        representation: String,
    },
}
