//! Configuration descriptors for cities, layers and representations.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::error::ConfigError;

/// Default tileset-level geometric error.
pub const DEFAULT_GEOMETRIC_ERROR: f64 = 100.0;

/// Default geometric error of the root node.
pub const DEFAULT_ROOT_ERROR: f64 = 10.0;

/// Default increment of the geometric error per depth level.
pub const DEFAULT_ERROR_STEP: f64 = 1.0;

/// Geometry encoding of a representation's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datatype {
    /// Triangulated 3D surfaces (served as B3DM).
    PolyhedralSurface,
    /// Footprints with height range (served as GeoJSON).
    Extruded,
}

impl FromStr for Datatype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "polyhedralsurface" => Ok(Datatype::PolyhedralSurface),
            "2.5d" => Ok(Datatype::Extruded),
            other => Err(format!("unknown datatype '{}'", other)),
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datatype::PolyhedralSurface => write!(f, "polyhedralsurface"),
            Datatype::Extruded => write!(f, "2.5D"),
        }
    }
}

/// A named content variant of a layer.
///
/// Tile-level content is keyed by tile id in `tile_table`; feature-level
/// content is keyed by feature id in `feature_table`. A representation may
/// have either or both.
#[derive(Debug, Clone, PartialEq)]
pub struct RepresentationConfig {
    pub name: String,
    pub tile_table: Option<String>,
    pub feature_table: Option<String>,
    pub datatype: Datatype,
}

impl RepresentationConfig {
    /// Create a representation with no content tables.
    pub fn new(name: impl Into<String>, datatype: Datatype) -> Self {
        Self {
            name: name.into(),
            tile_table: None,
            feature_table: None,
            datatype,
        }
    }

    /// Set the tile-keyed content table.
    pub fn with_tile_table(mut self, table: impl Into<String>) -> Self {
        self.tile_table = Some(table.into());
        self
    }

    /// Set the feature-keyed content table.
    pub fn with_feature_table(mut self, table: impl Into<String>) -> Self {
        self.feature_table = Some(table.into());
        self
    }

    /// Content table for the given node kind.
    pub fn content_table(&self, feature_level: bool) -> Option<&str> {
        if feature_level {
            self.feature_table.as_deref()
        } else {
            self.tile_table.as_deref()
        }
    }
}

/// A thematic layer of a city (buildings, vegetation, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct LayerConfig {
    pub name: String,
    /// Table of features with their owning tile and attributes.
    pub feature_table: String,
    pub representations: BTreeMap<String, RepresentationConfig>,
}

impl LayerConfig {
    pub fn new(name: impl Into<String>, feature_table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            feature_table: feature_table.into(),
            representations: BTreeMap::new(),
        }
    }

    /// Add a representation.
    pub fn with_representation(mut self, representation: RepresentationConfig) -> Self {
        self.representations
            .insert(representation.name.clone(), representation);
        self
    }
}

/// A city dataset: its tile tables and scale pyramid.
#[derive(Debug, Clone, PartialEq)]
pub struct CityConfig {
    pub name: String,
    /// Tile metadata table (id, depth, bbox, footprint).
    pub tile_table: String,
    /// Parent/child table of the tile hierarchy.
    pub tile_hierarchy: String,
    /// Scale denominators from coarsest to finest.
    pub scales: Vec<f64>,
    /// Spatial reference id of tile footprints.
    pub srid: u32,
    pub layers: BTreeMap<String, LayerConfig>,
}

impl CityConfig {
    pub fn new(
        name: impl Into<String>,
        tile_table: impl Into<String>,
        tile_hierarchy: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            tile_table: tile_table.into(),
            tile_hierarchy: tile_hierarchy.into(),
            scales: Vec::new(),
            srid: 0,
            layers: BTreeMap::new(),
        }
    }

    /// Set the scale pyramid.
    pub fn with_scales(mut self, scales: Vec<f64>) -> Self {
        self.scales = scales;
        self
    }

    /// Set the spatial reference id.
    pub fn with_srid(mut self, srid: u32) -> Self {
        self.srid = srid;
        self
    }

    /// Add a layer.
    pub fn with_layer(mut self, layer: LayerConfig) -> Self {
        self.layers.insert(layer.name.clone(), layer);
        self
    }

    /// Depth of the feature level.
    ///
    /// Tiles occupy depths `0..depth()`; depth `depth()` is the level of
    /// individual features.
    pub fn depth(&self) -> u32 {
        self.scales.len().saturating_sub(1) as u32
    }
}

/// Geometric error parameters of emitted tilesets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilesetConfig {
    /// Tileset-level `geometricError`.
    pub geometric_error: f64,
    /// `geometricError` of the root node.
    pub root_error: f64,
    /// Added to the error for every level descended.
    pub error_step: f64,
}

impl Default for TilesetConfig {
    fn default() -> Self {
        Self {
            geometric_error: DEFAULT_GEOMETRIC_ERROR,
            root_error: DEFAULT_ROOT_ERROR,
            error_step: DEFAULT_ERROR_STEP,
        }
    }
}

/// All configured cities plus tileset output settings.
///
/// Read-only for the duration of a build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CitiesConfig {
    pub cities: BTreeMap<String, CityConfig>,
    pub tileset: TilesetConfig,
}

impl CitiesConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a city.
    pub fn with_city(mut self, city: CityConfig) -> Self {
        self.cities.insert(city.name.clone(), city);
        self
    }

    /// Replace the tileset settings.
    pub fn with_tileset(mut self, tileset: TilesetConfig) -> Self {
        self.tileset = tileset;
        self
    }

    /// Look up a city.
    pub fn city(&self, city: &str) -> Result<&CityConfig, ConfigError> {
        self.cities
            .get(city)
            .ok_or_else(|| ConfigError::UnknownCity(city.to_string()))
    }

    /// Look up a layer of a city.
    pub fn layer(&self, city: &str, layer: &str) -> Result<&LayerConfig, ConfigError> {
        self.city(city)?
            .layers
            .get(layer)
            .ok_or_else(|| ConfigError::UnknownLayer {
                city: city.to_string(),
                layer: layer.to_string(),
            })
    }

    /// Look up a representation of a layer.
    pub fn representation(
        &self,
        city: &str,
        layer: &str,
        representation: &str,
    ) -> Result<&RepresentationConfig, ConfigError> {
        self.layer(city, layer)?
            .representations
            .get(representation)
            .ok_or_else(|| ConfigError::UnknownRepresentation {
                city: city.to_string(),
                layer: layer.to_string(),
                representation: representation.to_string(),
            })
    }
}
