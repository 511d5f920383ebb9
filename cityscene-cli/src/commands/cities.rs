//! `cities` command: list configured cities, layers and representations.

use std::path::PathBuf;

use cityscene::config::CitiesConfig;

use super::common::load_config;
use crate::error::CliError;

/// Run the cities command.
pub fn run(config_path: Option<PathBuf>) -> Result<(), CliError> {
    let config = load_config(config_path.as_deref())?;
    print!("{}", describe(&config));
    Ok(())
}

/// Human-readable listing of the configuration.
fn describe(config: &CitiesConfig) -> String {
    let mut out = String::new();
    if config.cities.is_empty() {
        out.push_str("No cities configured.\n");
        return out;
    }

    for city in config.cities.values() {
        out.push_str(&format!(
            "{} (depth {}, srid {})\n",
            city.name,
            city.depth(),
            city.srid
        ));
        for layer in city.layers.values() {
            out.push_str(&format!("  {} [{}]\n", layer.name, layer.feature_table));
            for rep in layer.representations.values() {
                let mut tables = Vec::new();
                if let Some(t) = &rep.tile_table {
                    tables.push(format!("tiles: {}", t));
                }
                if let Some(t) = &rep.feature_table {
                    tables.push(format!("features: {}", t));
                }
                out.push_str(&format!(
                    "    {:<16} {:<18} {}\n",
                    rep.name,
                    rep.datatype.to_string(),
                    tables.join(", ")
                ));
            }
        }
    }
    out
}
