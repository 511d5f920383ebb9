//! Per-tile node materialization.

use tracing::{debug, warn};

use super::graph::{Node, NodeId, SceneGraph};
use crate::config::{CitiesConfig, CityConfig, LayerConfig};
use crate::error::SceneResult;
use crate::geometry::Box3D;
use crate::rules::RuleEngine;
use crate::store::{SceneStore, TileId, TileRecord};

/// A tile during a build: its node chain and child tiles.
///
/// Tiles never appear in the emitted scene; only their nodes do.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildTile {
    pub id: TileId,
    pub depth: u32,
    /// Nodes of this tile, least to most specific.
    pub nodes: Vec<NodeId>,
    /// Bounding box of the tile row, if it has one.
    pub bbox: Option<Box3D>,
}

impl BuildTile {
    pub fn new(id: TileId, depth: u32, bbox: Option<Box3D>) -> Self {
        Self {
            id,
            depth,
            nodes: Vec::new(),
            bbox,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Turns tile rows into representation nodes.
pub struct Materializer<'a> {
    store: &'a dyn SceneStore,
    config: &'a CitiesConfig,
    city: &'a CityConfig,
    layer: &'a LayerConfig,
    engine: &'a RuleEngine,
}

impl<'a> Materializer<'a> {
    pub fn new(
        store: &'a dyn SceneStore,
        config: &'a CitiesConfig,
        city: &'a CityConfig,
        layer: &'a LayerConfig,
        engine: &'a RuleEngine,
    ) -> Self {
        Self {
            store,
            config,
            city,
            layer,
            engine,
        }
    }

    /// Materialize the nodes of one tile row.
    ///
    /// Tiles at the deepest tile level also get feature-level nodes one
    /// depth below, unless `max_depth` excludes that level.
    pub fn materialize(
        &self,
        graph: &mut SceneGraph,
        record: &TileRecord,
        max_depth: Option<u32>,
    ) -> SceneResult<BuildTile> {
        let bbox = match &record.bbox {
            Some(text) => Some(Box3D::parse(text)?),
            None => {
                warn!(tile = record.id, "Tile has no bounding box");
                None
            }
        };

        let mut tile = BuildTile::new(record.id, record.depth, bbox);
        self.generate(graph, &mut tile, record.depth, false)?;

        let feature_depth = record.depth + 1;
        if feature_depth == self.city.depth() && max_depth.map_or(true, |max| feature_depth <= max) {
            self.generate(graph, &mut tile, feature_depth, true)?;
        }

        debug!(
            tile = tile.id,
            depth = tile.depth,
            nodes = tile.nodes.len(),
            "Materialized tile"
        );
        Ok(tile)
    }

    fn generate(
        &self,
        graph: &mut SceneGraph,
        tile: &mut BuildTile,
        depth: u32,
        feature_level: bool,
    ) -> SceneResult<()> {
        let candidates = self.engine.resolve_tile(tile.id, depth).representations();
        if candidates.is_empty() {
            return Ok(());
        }

        let features: Vec<_> = self
            .engine
            .resolve_features(tile.id)
            .iter()
            .filter(|f| f.threshold().is_some_and(|t| t <= depth))
            .cloned()
            .collect();

        for name in candidates {
            let representation =
                self.config
                    .representation(&self.city.name, &self.layer.name, name)?;
            let Some(table) = representation.content_table(feature_level) else {
                continue;
            };

            let has_content = if feature_level {
                self.store
                    .tile_has_feature_content(table, &self.layer.feature_table, tile.id)?
            } else {
                self.store.tile_has_content(table, tile.id)?
            };

            if has_content {
                let node = Node::representation(tile.id, depth, name.as_str(), tile.bbox)
                    .with_features(features.clone());
                tile.nodes.push(graph.add(node));
            }
        }
        Ok(())
    }
}
