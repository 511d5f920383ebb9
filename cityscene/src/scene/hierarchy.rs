//! Tile hierarchy loading for a depth window.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::config::CityConfig;
use crate::store::{DepthWindow, SceneStore, StoreResult, TileId, TileRecord};

/// Tiles and parent/child edges of one city inside a depth window.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    /// Tile rows ordered by depth, then id.
    tiles: Vec<TileRecord>,
    ids: HashSet<TileId>,
    children: HashMap<TileId, Vec<TileId>>,
}

impl Hierarchy {
    /// Load the hierarchy edges and tile rows of `city` inside `window`.
    ///
    /// Edges are kept when their child lies in the window, so a tile just
    /// above the window still lists its in-window children.
    pub fn load(store: &dyn SceneStore, city: &CityConfig, window: DepthWindow) -> StoreResult<Self> {
        let edges = store.hierarchy_edges(&city.tile_hierarchy, &city.tile_table, window)?;
        let tiles = store.tiles(&city.tile_table, window)?;
        debug!(
            edges = edges.len(),
            tiles = tiles.len(),
            "Loaded tile hierarchy"
        );
        Ok(Self::from_parts(
            tiles,
            edges.into_iter().map(|e| (e.parent, e.child)),
        ))
    }

    /// Build from tile rows and `(parent, child)` pairs.
    pub fn from_parts<I>(mut tiles: Vec<TileRecord>, edges: I) -> Self
    where
        I: IntoIterator<Item = (TileId, TileId)>,
    {
        tiles.sort_by_key(|t| (t.depth, t.id));
        let mut children: HashMap<TileId, Vec<TileId>> = HashMap::new();
        for (parent, child) in edges {
            children.entry(parent).or_default().push(child);
        }
        for list in children.values_mut() {
            list.sort_unstable();
        }
        let ids = tiles.iter().map(|t| t.id).collect();
        Self {
            tiles,
            ids,
            children,
        }
    }

    pub fn tiles(&self) -> &[TileRecord] {
        &self.tiles
    }

    /// Children of `tile` in the loaded edges.
    pub fn children(&self, tile: TileId) -> &[TileId] {
        self.children.get(&tile).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `tile` is a loaded tile or the parent of a loaded edge.
    pub fn contains(&self, tile: TileId) -> bool {
        self.children.contains_key(&tile) || self.ids.contains(&tile)
    }

    /// All tiles below `tile`, excluding `tile` itself.
    pub fn descendants(&self, tile: TileId) -> HashSet<TileId> {
        let mut found = HashSet::new();
        let mut stack: Vec<TileId> = self.children(tile).to_vec();
        while let Some(id) = stack.pop() {
            if found.insert(id) {
                stack.extend_from_slice(self.children(id));
            }
        }
        found
    }

    /// Keep only the tiles strictly below `tile`.
    pub fn restrict_to_subtree(&mut self, tile: TileId) {
        let keep = self.descendants(tile);
        self.tiles.retain(|t| keep.contains(&t.id));
        self.ids.retain(|id| keep.contains(id));
    }
}
