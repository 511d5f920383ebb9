//! Recursive linking of per-tile node chains into one scene tree.
//!
//! Linking is post-order over the tile hierarchy. Each tile reports the
//! node its subtree is entered through and the tiles of its subtree that
//! yielded no content. Tiles without nodes are elided: their children's
//! entry nodes pass straight through to the nearest ancestor with content.
//!
//! When a tile with content has some children with content and some
//! without, the tiles without are probed against the tile's most specific
//! representation. Tiles that do have content there get a partial node, a
//! copy of the most specific node one level deeper restricted to them.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::graph::{Node, NodeId, SceneGraph};
use super::hierarchy::Hierarchy;
use super::materialize::BuildTile;
use crate::config::{CitiesConfig, CityConfig, LayerConfig};
use crate::error::SceneResult;
use crate::store::{SceneStore, TileId};

/// Result of linking one tile's subtree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Linked {
    /// Entry nodes of the subtree. Empty when the subtree has no content.
    pub top: Vec<NodeId>,
    /// Tiles of the subtree with no resolvable content so far.
    pub missing: Vec<TileId>,
}

/// Links materialized tiles into a [`SceneGraph`].
pub struct Linker<'a> {
    store: &'a dyn SceneStore,
    config: &'a CitiesConfig,
    city: &'a CityConfig,
    layer: &'a LayerConfig,
    hierarchy: &'a Hierarchy,
    tiles: &'a HashMap<TileId, BuildTile>,
}

impl<'a> Linker<'a> {
    pub fn new(
        store: &'a dyn SceneStore,
        config: &'a CitiesConfig,
        city: &'a CityConfig,
        layer: &'a LayerConfig,
        hierarchy: &'a Hierarchy,
        tiles: &'a HashMap<TileId, BuildTile>,
    ) -> Self {
        Self {
            store,
            config,
            city,
            layer,
            hierarchy,
            tiles,
        }
    }

    /// Link the subtree rooted at `tile`.
    pub fn link(&self, graph: &mut SceneGraph, tile: TileId) -> SceneResult<Linked> {
        let Some(build) = self.tiles.get(&tile) else {
            return Ok(Linked::default());
        };

        if build.is_empty() {
            self.link_empty(graph, build)
        } else {
            self.link_with_content(graph, build)
        }
    }

    fn children(&self, tile: TileId) -> impl Iterator<Item = TileId> + '_ {
        self.hierarchy.children(tile).iter().copied().filter(move |child| {
            let loaded = self.tiles.contains_key(child);
            if !loaded {
                warn!(tile, child, "Child tile has no metadata row; skipping");
            }
            loaded
        })
    }

    fn link_empty(&self, graph: &mut SceneGraph, build: &BuildTile) -> SceneResult<Linked> {
        let mut linked = Linked::default();
        for child in self.children(build.id) {
            let sub = self.link(graph, child)?;
            linked.top.extend(sub.top);
            linked.missing.extend(sub.missing);
        }

        if linked.top.is_empty() {
            debug!(tile = build.id, "Elided tile without content");
            return Ok(Linked {
                top: Vec::new(),
                missing: vec![build.id],
            });
        }
        Ok(linked)
    }

    fn link_with_content(&self, graph: &mut SceneGraph, build: &BuildTile) -> SceneResult<Linked> {
        for pair in build.nodes.windows(2) {
            graph.link(pair[0], pair[1]);
        }
        let first = build.nodes[0];
        let last = build.nodes[build.nodes.len() - 1];

        let mut missing = Vec::new();
        let mut any_child_content = false;
        for child in self.children(build.id) {
            let sub = self.link(graph, child)?;
            if sub.top.is_empty() {
                missing.push(child);
            } else {
                any_child_content = true;
                missing.extend(sub.missing);
                for node in sub.top {
                    graph.link(last, node);
                }
            }
        }

        if any_child_content && !missing.is_empty() {
            self.reconcile(graph, last, &missing)?;
        }

        Ok(Linked {
            top: vec![first],
            missing: Vec::new(),
        })
    }

    /// Add a partial node under `last` for the `missing` tiles that have
    /// content in `last`'s representation.
    fn reconcile(&self, graph: &mut SceneGraph, last: NodeId, missing: &[TileId]) -> SceneResult<()> {
        let node = graph.node(last);
        let Some(name) = node.representation_name() else {
            return Ok(());
        };
        let representation = self
            .config
            .representation(&self.city.name, &self.layer.name, name)?;
        let Some(table) = representation.content_table(false) else {
            debug!(
                tile = node.tile,
                representation = name,
                "Representation has no tile content table; skipping reconciliation"
            );
            return Ok(());
        };

        let existing = self.store.tiles_with_content(table, missing)?;
        let partial: Vec<TileId> = missing
            .iter()
            .copied()
            .filter(|t| existing.contains(t))
            .collect();
        if partial.is_empty() {
            return Ok(());
        }

        debug!(
            tile = node.tile,
            representation = name,
            partial = ?partial,
            "Added partial node"
        );
        let partial_node = Node::representation(node.tile, node.depth + 1, name, node.bbox)
            .with_features(node.features.clone())
            .with_partial(partial);
        let id = graph.add(partial_node);
        graph.link(last, id);
        Ok(())
    }
}
