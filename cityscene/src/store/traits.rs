//! The backing store contract.
//!
//! A scene build talks to the store exclusively through [`SceneStore`]. Each
//! method is one round-trip; the build never batches or caches results, so
//! the number of calls is the cost model of a build.
//!
//! Table arguments are the table references handed out by
//! [`crate::config::CitiesConfig`] (for example `lyon.tiles`). Implementations
//! must reject references they do not know with [`StoreError::UnknownTable`].

use std::collections::HashSet;

use thiserror::Error;

use super::types::{DepthWindow, FeatureMatch, HierarchyEdge, TileId, TileRecord};

/// Errors raised by a backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("connection failed: {0}")]
    Connection(String),

    /// A query failed to execute.
    #[error("query failed: {0}")]
    Query(String),

    /// The referenced table does not exist.
    #[error("unknown table: {0}")]
    UnknownTable(String),

    /// A dataset could not be loaded into the store.
    #[error("invalid dataset: {0}")]
    Dataset(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Synchronous query interface over the tile, hierarchy, feature and
/// content tables of a city.
///
/// Implementations are used from a single thread for the duration of one
/// build and need not be `Sync`.
pub trait SceneStore {
    /// Tiles whose footprint intersects the disc of `radius` around `center`.
    ///
    /// `srid` is the spatial reference of `center`; it must match the tile
    /// table's.
    fn tiles_in_zone(
        &self,
        tile_table: &str,
        center: [f64; 2],
        radius: f64,
        srid: u32,
    ) -> StoreResult<Vec<TileId>>;

    /// Features whose numeric `attribute` is `>= threshold`.
    fn features_at_least(
        &self,
        feature_table: &str,
        attribute: &str,
        threshold: f64,
    ) -> StoreResult<Vec<FeatureMatch>>;

    /// Parent of `child`, or `None` for a root tile.
    fn parent_tile(&self, hierarchy_table: &str, child: TileId) -> StoreResult<Option<TileId>>;

    /// Hierarchy edges whose child lies inside `window`.
    fn hierarchy_edges(
        &self,
        hierarchy_table: &str,
        tile_table: &str,
        window: DepthWindow,
    ) -> StoreResult<Vec<HierarchyEdge>>;

    /// Tile metadata rows inside `window`.
    fn tiles(&self, tile_table: &str, window: DepthWindow) -> StoreResult<Vec<TileRecord>>;

    /// Whether `content_table` holds a row keyed by `tile`.
    fn tile_has_content(&self, content_table: &str, tile: TileId) -> StoreResult<bool>;

    /// Whether `content_table` holds a row for at least one feature owned by
    /// `tile` in `feature_table`.
    fn tile_has_feature_content(
        &self,
        content_table: &str,
        feature_table: &str,
        tile: TileId,
    ) -> StoreResult<bool>;

    /// The subset of `tiles` that have a row in `content_table`.
    fn tiles_with_content(
        &self,
        content_table: &str,
        tiles: &[TileId],
    ) -> StoreResult<HashSet<TileId>>;
}
