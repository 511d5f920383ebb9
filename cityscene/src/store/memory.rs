//! In-memory backing store.
//!
//! `MemoryStore` keeps every table in hash maps and indexes tile footprints
//! in an R-tree, so the zone predicate (footprint intersects a buffered
//! point) is a `locate_within_distance` query instead of a PostGIS
//! `ST_Intersects(footprint, ST_Buffer(point, radius))`.
//!
//! Stores are assembled either with the `with_*` builder methods or from a
//! JSON dataset:
//!
//! ```json
//! {
//!   "tile_tables": { "lyon.tiles": { "srid": 3946, "tiles": [
//!       { "id": 1, "depth": 0, "bbox": "BOX3D(0 0 0,100 100 30)" } ] } },
//!   "hierarchy_tables": { "lyon.tile_hierarchy": [ { "parent": 1, "child": 2 } ] },
//!   "feature_tables": { "lyon.buildings": [
//!       { "gid": 10, "tile": 2, "attributes": { "height": 52.0 } } ] },
//!   "content_tables": { "lyon.buildings_facade": { "tiles": [1, 2], "features": [10] } }
//! }
//! ```

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap, HashSet};

use rstar::primitives::{GeomWithData, Rectangle};
use rstar::RTree;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::traits::{SceneStore, StoreError, StoreResult};
use super::types::{DepthWindow, FeatureId, FeatureMatch, HierarchyEdge, TileId, TileRecord};
use crate::geometry::Box3D;

type FootprintEntry = GeomWithData<Rectangle<[f64; 2]>, TileId>;

/// A feature row: id, owning tile and numeric attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Feature id.
    pub gid: FeatureId,
    /// Owning tile.
    pub tile: TileId,
    /// Numeric attributes usable by attribute conditions.
    #[serde(default)]
    pub attributes: BTreeMap<String, f64>,
}

impl FeatureRecord {
    /// Create a feature owned by `tile` with no attributes.
    pub fn new(gid: FeatureId, tile: TileId) -> Self {
        Self {
            gid,
            tile,
            attributes: BTreeMap::new(),
        }
    }

    /// Set a numeric attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: f64) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }
}

/// Serialized tile table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TileTableData {
    /// Spatial reference of the footprints.
    #[serde(default)]
    pub srid: u32,
    /// Tile rows.
    #[serde(default)]
    pub tiles: Vec<TileRecord>,
}

/// Serialized content table: ids of tiles and features that have content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentTableData {
    #[serde(default)]
    pub tiles: Vec<TileId>,
    #[serde(default)]
    pub features: Vec<FeatureId>,
}

/// JSON dataset accepted by [`MemoryStore::from_dataset`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub tile_tables: BTreeMap<String, TileTableData>,
    #[serde(default)]
    pub hierarchy_tables: BTreeMap<String, Vec<HierarchyEdge>>,
    #[serde(default)]
    pub feature_tables: BTreeMap<String, Vec<FeatureRecord>>,
    #[serde(default)]
    pub content_tables: BTreeMap<String, ContentTableData>,
}

#[derive(Default)]
struct TileTable {
    srid: u32,
    rows: BTreeMap<TileId, TileRecord>,
    footprints: RTree<FootprintEntry>,
}

#[derive(Default)]
struct HierarchyTable {
    edges: Vec<HierarchyEdge>,
    parents: HashMap<TileId, TileId>,
}

#[derive(Default)]
struct ContentTable {
    tiles: HashSet<TileId>,
    features: HashSet<FeatureId>,
}

/// Backing store held entirely in memory.
///
/// Counts every query so callers can check how many round-trips a build
/// performed.
#[derive(Default)]
pub struct MemoryStore {
    tile_tables: HashMap<String, TileTable>,
    hierarchy_tables: HashMap<String, HierarchyTable>,
    feature_tables: HashMap<String, Vec<FeatureRecord>>,
    content_tables: HashMap<String, ContentTable>,
    queries: Cell<usize>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a parsed dataset.
    pub fn from_dataset(dataset: Dataset) -> Self {
        let mut store = Self::new();
        for (name, table) in dataset.tile_tables {
            store.create_tile_table(&name, table.srid);
            for tile in table.tiles {
                store.insert_tile(&name, tile);
            }
        }
        for (name, edges) in dataset.hierarchy_tables {
            store.hierarchy_tables.entry(name.clone()).or_default();
            for edge in edges {
                store.insert_edge(&name, edge.parent, edge.child);
            }
        }
        for (name, features) in dataset.feature_tables {
            store.feature_tables.entry(name.clone()).or_default();
            for feature in features {
                store.insert_feature(&name, feature);
            }
        }
        for (name, content) in dataset.content_tables {
            store.create_content_table(&name);
            for tile in content.tiles {
                store.insert_tile_content(&name, tile);
            }
            for feature in content.features {
                store.insert_feature_content(&name, feature);
            }
        }
        store
    }

    /// Parse a JSON dataset and build a store from it.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let dataset: Dataset =
            serde_json::from_str(json).map_err(|e| StoreError::Dataset(e.to_string()))?;
        Ok(Self::from_dataset(dataset))
    }

    /// Number of queries served so far.
    pub fn query_count(&self) -> usize {
        self.queries.get()
    }

    /// Create (or re-tag) a tile table with the given spatial reference.
    pub fn create_tile_table(&mut self, table: &str, srid: u32) {
        self.tile_tables.entry(table.to_string()).or_default().srid = srid;
    }

    /// Insert a tile row, indexing its footprint when the box parses.
    pub fn insert_tile(&mut self, table: &str, tile: TileRecord) {
        let entry = self.tile_tables.entry(table.to_string()).or_default();
        if let Some(text) = tile.bbox.as_deref() {
            match Box3D::parse(text) {
                Ok(bbox) => {
                    let (min, max) = bbox.footprint();
                    entry
                        .footprints
                        .insert(GeomWithData::new(Rectangle::from_corners(min, max), tile.id));
                }
                Err(e) => warn!(table, tile = tile.id, error = %e, "Tile footprint not indexed"),
            }
        }
        entry.rows.insert(tile.id, tile);
    }

    /// Insert a hierarchy edge.
    pub fn insert_edge(&mut self, table: &str, parent: TileId, child: TileId) {
        let entry = self.hierarchy_tables.entry(table.to_string()).or_default();
        entry.edges.push(HierarchyEdge::new(parent, child));
        entry.parents.insert(child, parent);
    }

    /// Insert a feature row.
    pub fn insert_feature(&mut self, table: &str, feature: FeatureRecord) {
        self.feature_tables
            .entry(table.to_string())
            .or_default()
            .push(feature);
    }

    /// Create an empty content table.
    pub fn create_content_table(&mut self, table: &str) {
        self.content_tables.entry(table.to_string()).or_default();
    }

    /// Record tile-keyed content.
    pub fn insert_tile_content(&mut self, table: &str, tile: TileId) {
        self.content_tables
            .entry(table.to_string())
            .or_default()
            .tiles
            .insert(tile);
    }

    /// Record feature-keyed content.
    pub fn insert_feature_content(&mut self, table: &str, feature: FeatureId) {
        self.content_tables
            .entry(table.to_string())
            .or_default()
            .features
            .insert(feature);
    }

    /// Builder form of [`create_content_table`](Self::create_content_table).
    pub fn with_content_table(mut self, table: &str) -> Self {
        self.create_content_table(table);
        self
    }

    /// Builder form of [`create_tile_table`](Self::create_tile_table).
    pub fn with_tile_table(mut self, table: &str, srid: u32) -> Self {
        self.create_tile_table(table, srid);
        self
    }

    /// Builder form of [`insert_tile`](Self::insert_tile).
    pub fn with_tile(mut self, table: &str, tile: TileRecord) -> Self {
        self.insert_tile(table, tile);
        self
    }

    /// Builder form of [`insert_edge`](Self::insert_edge).
    pub fn with_edge(mut self, table: &str, parent: TileId, child: TileId) -> Self {
        self.insert_edge(table, parent, child);
        self
    }

    /// Builder form of [`insert_feature`](Self::insert_feature).
    pub fn with_feature(mut self, table: &str, feature: FeatureRecord) -> Self {
        self.insert_feature(table, feature);
        self
    }

    /// Builder form of [`insert_tile_content`](Self::insert_tile_content).
    pub fn with_tile_content(mut self, table: &str, tile: TileId) -> Self {
        self.insert_tile_content(table, tile);
        self
    }

    /// Builder form of [`insert_feature_content`](Self::insert_feature_content).
    pub fn with_feature_content(mut self, table: &str, feature: FeatureId) -> Self {
        self.insert_feature_content(table, feature);
        self
    }

    fn record_query(&self) {
        self.queries.set(self.queries.get() + 1);
    }

    fn tile_table(&self, table: &str) -> StoreResult<&TileTable> {
        self.tile_tables
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))
    }

    fn hierarchy_table(&self, table: &str) -> StoreResult<&HierarchyTable> {
        self.hierarchy_tables
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))
    }

    fn feature_table(&self, table: &str) -> StoreResult<&[FeatureRecord]> {
        self.feature_tables
            .get(table)
            .map(Vec::as_slice)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))
    }

    fn content_table(&self, table: &str) -> StoreResult<&ContentTable> {
        self.content_tables
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))
    }
}

impl SceneStore for MemoryStore {
    fn tiles_in_zone(
        &self,
        tile_table: &str,
        center: [f64; 2],
        radius: f64,
        srid: u32,
    ) -> StoreResult<Vec<TileId>> {
        self.record_query();
        let table = self.tile_table(tile_table)?;
        if table.srid != srid {
            return Err(StoreError::Query(format!(
                "SRID mismatch on {}: table uses {}, query uses {}",
                tile_table, table.srid, srid
            )));
        }

        let radius = radius.max(0.0);
        let mut ids: Vec<TileId> = table
            .footprints
            .locate_within_distance(center, radius * radius)
            .map(|entry| entry.data)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn features_at_least(
        &self,
        feature_table: &str,
        attribute: &str,
        threshold: f64,
    ) -> StoreResult<Vec<FeatureMatch>> {
        self.record_query();
        let rows = self.feature_table(feature_table)?;
        Ok(rows
            .iter()
            .filter(|row| {
                row.attributes
                    .get(attribute)
                    .is_some_and(|value| *value >= threshold)
            })
            .map(|row| FeatureMatch {
                feature: row.gid,
                tile: row.tile,
            })
            .collect())
    }

    fn parent_tile(&self, hierarchy_table: &str, child: TileId) -> StoreResult<Option<TileId>> {
        self.record_query();
        let table = self.hierarchy_table(hierarchy_table)?;
        Ok(table.parents.get(&child).copied())
    }

    fn hierarchy_edges(
        &self,
        hierarchy_table: &str,
        tile_table: &str,
        window: DepthWindow,
    ) -> StoreResult<Vec<HierarchyEdge>> {
        self.record_query();
        let hierarchy = self.hierarchy_table(hierarchy_table)?;
        if window.is_unbounded() {
            return Ok(hierarchy.edges.clone());
        }

        let tiles = self.tile_table(tile_table)?;
        Ok(hierarchy
            .edges
            .iter()
            .filter(|edge| {
                tiles
                    .rows
                    .get(&edge.child)
                    .is_some_and(|child| window.contains(child.depth))
            })
            .copied()
            .collect())
    }

    fn tiles(&self, tile_table: &str, window: DepthWindow) -> StoreResult<Vec<TileRecord>> {
        self.record_query();
        let table = self.tile_table(tile_table)?;
        Ok(table
            .rows
            .values()
            .filter(|tile| window.contains(tile.depth))
            .cloned()
            .collect())
    }

    fn tile_has_content(&self, content_table: &str, tile: TileId) -> StoreResult<bool> {
        self.record_query();
        Ok(self.content_table(content_table)?.tiles.contains(&tile))
    }

    fn tile_has_feature_content(
        &self,
        content_table: &str,
        feature_table: &str,
        tile: TileId,
    ) -> StoreResult<bool> {
        self.record_query();
        let content = self.content_table(content_table)?;
        let features = self.feature_table(feature_table)?;
        Ok(features
            .iter()
            .any(|row| row.tile == tile && content.features.contains(&row.gid)))
    }

    fn tiles_with_content(
        &self,
        content_table: &str,
        tiles: &[TileId],
    ) -> StoreResult<HashSet<TileId>> {
        self.record_query();
        let content = self.content_table(content_table)?;
        Ok(tiles
            .iter()
            .filter(|id| content.tiles.contains(id))
            .copied()
            .collect())
    }
}
