//! Input loading shared across CLI commands.

use std::fs;
use std::path::{Path, PathBuf};

use cityscene::config::CitiesConfig;
use cityscene::store::MemoryStore;

use crate::error::CliError;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "cities.ini";

/// Default configuration path: `<config dir>/cityscene/cities.ini`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cityscene")
        .join(CONFIG_FILE_NAME)
}

/// Load the cities configuration from `path`, or the default location.
pub fn load_config(path: Option<&Path>) -> Result<CitiesConfig, CliError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    tracing::debug!(path = %path.display(), "Loading cities configuration");
    Ok(CitiesConfig::load_from(&path)?)
}

/// Load a JSON dataset file into an in-memory store.
pub fn load_dataset(path: &Path) -> Result<MemoryStore, CliError> {
    let text = read_file(path)?;
    Ok(MemoryStore::from_json(&text)?)
}

/// Rule set text: inline JSON when the argument starts with `{`, otherwise
/// the contents of the named file.
pub fn load_rules(arg: &str) -> Result<String, CliError> {
    if arg.trim_start().starts_with('{') {
        Ok(arg.to_string())
    } else {
        read_file(Path::new(arg))
    }
}

fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|error| CliError::FileRead {
        path: path.to_path_buf(),
        error,
    })
}
