//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use cityscene::config::ConfigError;
use cityscene::rules::RuleSetError;
use cityscene::store::StoreError;
use cityscene::SceneError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Cities configuration could not be loaded
    Config(ConfigError),
    /// Dataset file could not be loaded into the store
    Dataset(StoreError),
    /// Rule set is malformed
    Rules(RuleSetError),
    /// Scene build failed
    Build(SceneError),
    /// Failed to read an input file
    FileRead { path: PathBuf, error: std::io::Error },
    /// Failed to write the tileset
    Output(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Config(ConfigError::ReadError(_)) => {
                eprintln!();
                eprintln!("Pass a cities configuration with --config <file>.");
                eprintln!("Run 'cityscene cities --help' for the expected INI layout.");
            }
            CliError::Build(SceneError::InvalidContinuation { .. }) => {
                eprintln!();
                eprintln!("--tile and --depth must be given together.");
            }
            CliError::Build(SceneError::EmptyContinuation { .. }) => {
                eprintln!();
                eprintln!("--depth is the depth of the children of --tile.");
            }
            CliError::Rules(_) => {
                eprintln!();
                eprintln!("Check the rule set with: cityscene check-rules <file>");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Dataset(e) => write!(f, "Failed to load dataset: {}", e),
            CliError::Rules(e) => write!(f, "Invalid rule set: {}", e),
            CliError::Build(e) => write!(f, "Scene build failed: {}", e),
            CliError::FileRead { path, error } => {
                write!(f, "Failed to read file '{}': {}", path.display(), error)
            }
            CliError::Output(msg) => write!(f, "Failed to write tileset: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Dataset(e) => Some(e),
            CliError::Rules(e) => Some(e),
            CliError::Build(e) => Some(e),
            CliError::FileRead { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Dataset(e)
    }
}

impl From<RuleSetError> for CliError {
    fn from(e: RuleSetError) -> Self {
        CliError::Rules(e)
    }
}

impl From<SceneError> for CliError {
    fn from(e: SceneError) -> Self {
        match e {
            SceneError::Config(e) => CliError::Config(e),
            SceneError::Rules(e) => CliError::Rules(e),
            other => CliError::Build(other),
        }
    }
}
