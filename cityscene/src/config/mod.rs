//! Cities configuration.
//!
//! Describes, per city, where the tile metadata and hierarchy live, the
//! scale pyramid, and for each layer the feature table and the available
//! representations with their content tables.
//!
//! # Example
//!
//! ```
//! use cityscene::config::CitiesConfig;
//!
//! let config = CitiesConfig::load_from_str(
//!     "[city.lyon]\n\
//!      tile_table = lyon.tiles\n\
//!      tile_hierarchy = lyon.tile_hierarchy\n\
//!      scales = 1000, 0\n",
//! )
//! .unwrap();
//! assert_eq!(config.city("lyon").unwrap().depth(), 1);
//! ```

mod error;
mod parser;
mod types;

use std::path::Path;

use ini::Ini;

pub use error::ConfigError;
pub use types::{
    CitiesConfig, CityConfig, Datatype, LayerConfig, RepresentationConfig, TilesetConfig,
    DEFAULT_ERROR_STEP, DEFAULT_GEOMETRIC_ERROR, DEFAULT_ROOT_ERROR,
};

impl CitiesConfig {
    /// Load configuration from an INI file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path)?;
        parser::parse_ini(&ini)
    }

    /// Load configuration from INI text.
    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text)?;
        parser::parse_ini(&ini)
    }
}
