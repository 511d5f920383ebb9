//! Row types exchanged with the backing store.

use serde::{Deserialize, Serialize};

/// Tile identifier as stored in the tile and hierarchy tables.
pub type TileId = i64;

/// Feature identifier (`gid` column of a layer's feature table).
pub type FeatureId = i64;

/// Tile metadata row: id, depth and the raw `BOX3D` text, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileRecord {
    /// Tile id.
    pub id: TileId,
    /// Depth in the city hierarchy (0 = coarsest).
    pub depth: u32,
    /// Bounding box in `BOX3D(x y z,x y z)` text form.
    #[serde(default)]
    pub bbox: Option<String>,
}

impl TileRecord {
    /// Create a tile row without a bounding box.
    pub fn new(id: TileId, depth: u32) -> Self {
        Self {
            id,
            depth,
            bbox: None,
        }
    }

    /// Attach a bounding box in `BOX3D` text form.
    pub fn with_bbox(mut self, bbox: impl Into<String>) -> Self {
        self.bbox = Some(bbox.into());
        self
    }
}

/// Parent/child edge of the tile hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HierarchyEdge {
    /// Parent tile.
    pub parent: TileId,
    /// Child tile.
    pub child: TileId,
}

impl HierarchyEdge {
    pub fn new(parent: TileId, child: TileId) -> Self {
        Self { parent, child }
    }
}

/// A feature returned by an attribute probe, with the tile that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureMatch {
    /// Feature id.
    pub feature: FeatureId,
    /// Tile the feature belongs to.
    pub tile: TileId,
}

/// Inclusive depth range restricting hierarchy and tile loads.
///
/// Either bound may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepthWindow {
    /// Smallest depth to load.
    pub min: Option<u32>,
    /// Largest depth to load.
    pub max: Option<u32>,
}

impl DepthWindow {
    /// Window without bounds.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Window `[min, max]` where either bound may be absent.
    pub fn new(min: Option<u32>, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Whether neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Whether `depth` lies inside the window.
    pub fn contains(&self, depth: u32) -> bool {
        self.min.map_or(true, |min| depth >= min) && self.max.map_or(true, |max| depth <= max)
    }
}
