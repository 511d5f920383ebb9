//! INI parsing logic for converting `Ini` → `CitiesConfig`.
//!
//! Section layout:
//!
//! ```ini
//! [tileset]
//! geometric_error = 100
//!
//! [city.lyon]
//! tile_table = lyon.tiles
//! tile_hierarchy = lyon.tile_hierarchy
//! scales = 2000, 1000, 500, 0
//! srid = 3946
//!
//! [layer.lyon.buildings]
//! feature_table = lyon.buildings
//!
//! [representation.lyon.buildings.facade]
//! tile_table = lyon.buildings_facade
//! datatype = polyhedralsurface
//! ```
//!
//! City, layer and representation names therefore cannot contain dots.

use ini::{Ini, Properties};

use super::error::ConfigError;
use super::types::{
    CitiesConfig, CityConfig, Datatype, LayerConfig, RepresentationConfig, TilesetConfig,
};

/// Parse an `Ini` object into a `CitiesConfig`.
///
/// Cities are read first, then layers, then representations, so sections may
/// appear in any order in the file.
pub(super) fn parse_ini(ini: &Ini) -> Result<CitiesConfig, ConfigError> {
    let mut config = CitiesConfig::default();

    if let Some(section) = ini.section(Some("tileset")) {
        config.tileset = parse_tileset(section)?;
    }

    for (name, props) in ini.iter() {
        let Some(name) = name else { continue };
        if let Some(city) = name.strip_prefix("city.") {
            check_name(name, city)?;
            config.cities.insert(city.to_string(), parse_city(name, city, props)?);
        }
    }

    for (name, props) in ini.iter() {
        let Some(name) = name else { continue };
        if let Some(rest) = name.strip_prefix("layer.") {
            let (city, layer) = split_two(name, rest)?;
            let feature_table = required(name, props, "feature_table")?;
            let city_config = config
                .cities
                .get_mut(city)
                .ok_or_else(|| ConfigError::UnknownCity(city.to_string()))?;
            city_config
                .layers
                .insert(layer.to_string(), LayerConfig::new(layer, feature_table));
        }
    }

    for (name, props) in ini.iter() {
        let Some(name) = name else { continue };
        if let Some(rest) = name.strip_prefix("representation.") {
            let (city, rest) = split_two(name, rest).map_err(|_| invalid_section(name))?;
            let (layer, representation) =
                split_two(name, rest).map_err(|_| invalid_section(name))?;
            let parsed = parse_representation(name, representation, props)?;
            let layer_config = config
                .cities
                .get_mut(city)
                .ok_or_else(|| ConfigError::UnknownCity(city.to_string()))?
                .layers
                .get_mut(layer)
                .ok_or_else(|| ConfigError::UnknownLayer {
                    city: city.to_string(),
                    layer: layer.to_string(),
                })?;
            layer_config
                .representations
                .insert(representation.to_string(), parsed);
        } else if name != "tileset"
            && !name.starts_with("city.")
            && !name.starts_with("layer.")
        {
            return Err(invalid_section(name));
        }
    }

    Ok(config)
}

fn parse_tileset(props: &Properties) -> Result<TilesetConfig, ConfigError> {
    let mut tileset = TilesetConfig::default();
    if let Some(v) = props.get("geometric_error") {
        tileset.geometric_error = parse_number("tileset", "geometric_error", v)?;
    }
    if let Some(v) = props.get("root_error") {
        tileset.root_error = parse_number("tileset", "root_error", v)?;
    }
    if let Some(v) = props.get("error_step") {
        tileset.error_step = parse_number("tileset", "error_step", v)?;
    }
    Ok(tileset)
}

fn parse_city(section: &str, name: &str, props: &Properties) -> Result<CityConfig, ConfigError> {
    let tile_table = required(section, props, "tile_table")?;
    let tile_hierarchy = required(section, props, "tile_hierarchy")?;
    let mut city = CityConfig::new(name, tile_table, tile_hierarchy);

    let scales = required(section, props, "scales")?;
    city.scales = scales
        .split(',')
        .map(|s| parse_number(section, "scales", s))
        .collect::<Result<Vec<_>, _>>()?;
    if city.scales.is_empty() {
        return Err(invalid(section, "scales", scales, "at least one scale is required"));
    }

    if let Some(v) = props.get("srid") {
        city.srid = v
            .trim()
            .parse()
            .map_err(|_| invalid(section, "srid", v, "must be a positive integer"))?;
    }

    Ok(city)
}

fn parse_representation(
    section: &str,
    name: &str,
    props: &Properties,
) -> Result<RepresentationConfig, ConfigError> {
    let datatype = match props.get("datatype") {
        Some(v) => v
            .parse::<Datatype>()
            .map_err(|_| invalid(section, "datatype", v, "must be 'polyhedralsurface' or '2.5d'"))?,
        None => Datatype::PolyhedralSurface,
    };

    let mut representation = RepresentationConfig::new(name, datatype);
    representation.tile_table = optional(props, "tile_table");
    representation.feature_table = optional(props, "feature_table");

    if representation.tile_table.is_none() && representation.feature_table.is_none() {
        return Err(ConfigError::MissingKey {
            section: section.to_string(),
            key: "tile_table or feature_table".to_string(),
        });
    }

    Ok(representation)
}

fn required<'a>(section: &str, props: &'a Properties, key: &str) -> Result<&'a str, ConfigError> {
    props
        .get(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingKey {
            section: section.to_string(),
            key: key.to_string(),
        })
}

fn optional(props: &Properties, key: &str) -> Option<String> {
    props
        .get(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_number(section: &str, key: &str, value: &str) -> Result<f64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, "must be a number"))
}

fn split_two<'a>(section: &str, rest: &'a str) -> Result<(&'a str, &'a str), ConfigError> {
    match rest.split_once('.') {
        Some((a, b)) if !a.is_empty() && !b.is_empty() => Ok((a, b)),
        _ => Err(invalid_section(section)),
    }
}

fn check_name(section: &str, name: &str) -> Result<(), ConfigError> {
    if name.is_empty() || name.contains('.') {
        return Err(invalid_section(section));
    }
    Ok(())
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn invalid_section(section: &str) -> ConfigError {
    ConfigError::InvalidSection(section.to_string())
}
