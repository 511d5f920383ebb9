//! Arena-backed scene graph.
//!
//! Nodes live in a flat vector and refer to each other by [`NodeId`].
//! Parent links are lookups into the arena, never ownership.

use std::collections::HashSet;

use crate::geometry::Box3D;
use crate::rules::FeatureRule;
use crate::store::TileId;

/// Tile id used by synthetic aggregation roots.
pub const AGGREGATION_TILE_ID: TileId = -1;

/// Index of a node in a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a node emits as content.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Content-less parent of several independent roots.
    Aggregation,
    /// Tile content in the named representation.
    Representation(String),
    /// Deferred continuation: re-runs the compiler on the tile's subtree.
    Link,
}

/// A node of the emitted scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub tile: TileId,
    pub depth: u32,
    pub kind: NodeKind,
    pub bbox: Option<Box3D>,
    /// Features drawn in their own branches instead of this node's content.
    pub features: Vec<FeatureRule>,
    /// When non-empty, the node's content is restricted to these tiles.
    pub partial: Vec<TileId>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    /// A content node for `tile` in `representation`.
    pub fn representation(
        tile: TileId,
        depth: u32,
        representation: impl Into<String>,
        bbox: Option<Box3D>,
    ) -> Self {
        Self::with_kind(tile, depth, NodeKind::Representation(representation.into()), bbox)
    }

    /// A content-less aggregation root.
    pub fn aggregation(depth: u32, bbox: Option<Box3D>) -> Self {
        Self::with_kind(AGGREGATION_TILE_ID, depth, NodeKind::Aggregation, bbox)
    }

    /// A lazy continuation for the subtree of `tile`.
    pub fn link(tile: TileId, depth: u32, bbox: Option<Box3D>) -> Self {
        Self::with_kind(tile, depth, NodeKind::Link, bbox)
    }

    fn with_kind(tile: TileId, depth: u32, kind: NodeKind, bbox: Option<Box3D>) -> Self {
        Self {
            tile,
            depth,
            kind,
            bbox,
            features: Vec::new(),
            partial: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Attach features rendered separately.
    pub fn with_features(mut self, features: Vec<FeatureRule>) -> Self {
        self.features = features;
        self
    }

    /// Restrict the content to a subset of tiles.
    pub fn with_partial(mut self, tiles: Vec<TileId>) -> Self {
        self.partial = tiles;
        self
    }

    /// Representation name, if this is a content node.
    pub fn representation_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Representation(name) => Some(name),
            _ => None,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Owner of every node produced by one build.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a detached node.
    pub fn add(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Make `child` the last child of `parent`.
    ///
    /// A node already attached elsewhere is moved, so every node keeps at
    /// most one parent.
    pub fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Some(previous) = self.nodes[child.0].parent {
            self.nodes[previous.0].children.retain(|c| *c != child);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Nodes reachable from `root`, parents before children.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev());
        }
        order
    }

    /// Whether the subgraph under `root` is a tree with consistent parent
    /// links.
    pub fn is_tree(&self, root: NodeId) -> bool {
        if self.nodes[root.0].parent.is_some() {
            return false;
        }
        let mut seen = HashSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                return false;
            }
            for child in &self.nodes[id.0].children {
                if self.nodes[child.0].parent != Some(id) {
                    return false;
                }
                stack.push(*child);
            }
        }
        true
    }
}
