//! Scene graph to tileset conversion.
//!
//! The geometric error of a node is the root error plus one step per level
//! below the root. Feature branches share the error of the node they are
//! emitted beside.

use tracing::debug;

use super::document::{Asset, BoundingVolume, Content, Refine, TileNode, Tileset};
use super::urls::ContentUrls;
use crate::config::TilesetConfig;
use crate::geometry::Box3D;
use crate::rules::FeatureRule;
use crate::scene::{NodeId, NodeKind, SceneGraph};

/// Bounding box used when neither a node nor its ancestors have one.
const DEGENERATE_BOX: [f64; 12] = [0.0; 12];

/// Writes a [`SceneGraph`] as a [`Tileset`].
pub struct TilesetWriter<'a> {
    urls: ContentUrls<'a>,
    settings: TilesetConfig,
}

impl<'a> TilesetWriter<'a> {
    pub fn new(urls: ContentUrls<'a>, settings: TilesetConfig) -> Self {
        Self { urls, settings }
    }

    /// Convert the tree under `root`.
    ///
    /// When the root itself has feature branches, the root and its branches
    /// are placed under a content-less root so the document stays
    /// single-rooted.
    pub fn write(&self, graph: &SceneGraph, root: NodeId) -> Tileset {
        let root_error = self.settings.root_error;
        let root = if has_branches(graph, root) {
            let children = self.write_node(graph, root, root_error + self.settings.error_step, None);
            debug!(branches = children.len() - 1, "Wrapped root feature branches");
            TileNode {
                bounding_volume: children[0].bounding_volume,
                geometric_error: root_error,
                children,
                content: None,
                refine: Some(Refine::Add),
            }
        } else {
            let mut nodes = self.write_node(graph, root, root_error, None);
            nodes.remove(0)
        };

        Tileset {
            asset: Asset::default(),
            geometric_error: self.settings.geometric_error,
            root,
        }
    }

    /// The tile node for `id` followed by its feature branches.
    fn write_node(
        &self,
        graph: &SceneGraph,
        id: NodeId,
        error: f64,
        inherited: Option<Box3D>,
    ) -> Vec<TileNode> {
        let node = graph.node(id);
        let bbox = node.bbox.or(inherited);
        let bounding_volume = BoundingVolume {
            bbox: bbox.map_or(DEGENERATE_BOX, |b| b.to_bounding_box()),
        };

        let children = node
            .children()
            .iter()
            .flat_map(|child| {
                self.write_node(graph, *child, error + self.settings.error_step, bbox)
            })
            .collect();

        let mut tile = TileNode {
            bounding_volume,
            geometric_error: error,
            children,
            content: None,
            refine: None,
        };

        let mut branches = Vec::new();
        match &node.kind {
            NodeKind::Aggregation => tile.refine = Some(Refine::Add),
            NodeKind::Link => {
                tile.content = Some(Content {
                    url: self.urls.scene(node.tile, node.depth + 1),
                });
            }
            NodeKind::Representation(name) => {
                let features: Vec<_> = node.features.iter().map(|f| f.feature).collect();
                tile.content = Some(Content {
                    url: self
                        .urls
                        .tile(node.tile, name, node.depth, &node.partial, &features),
                });
                branches.extend(
                    node.features
                        .iter()
                        .filter(|f| f.threshold() == Some(node.depth))
                        .filter_map(|f| self.feature_branch(f, error, bounding_volume)),
                );
            }
        }

        let mut out = Vec::with_capacity(1 + branches.len());
        out.push(tile);
        out.extend(branches);
        out
    }

    /// One content node per representation of the feature, each nested
    /// under the previous one.
    fn feature_branch(
        &self,
        feature: &FeatureRule,
        error: f64,
        bounding_volume: BoundingVolume,
    ) -> Option<TileNode> {
        let representations: Vec<&str> = feature.action.representations().collect();
        representations.iter().rev().fold(None, |child, rep| {
            Some(TileNode {
                bounding_volume,
                geometric_error: error,
                children: child.into_iter().collect(),
                content: Some(Content {
                    url: self.urls.feature(feature.feature, rep),
                }),
                refine: None,
            })
        })
    }
}

fn has_branches(graph: &SceneGraph, id: NodeId) -> bool {
    let node = graph.node(id);
    matches!(node.kind, NodeKind::Representation(_))
        && node
            .features
            .iter()
            .any(|f| f.threshold() == Some(node.depth) && !f.action.is_empty())
}
