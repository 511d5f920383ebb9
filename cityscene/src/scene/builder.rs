//! Scene build entry point.

use std::collections::HashMap;

use tracing::{debug, info, info_span};

use super::graph::{Node, NodeId, SceneGraph};
use super::hierarchy::Hierarchy;
use super::linker::Linker;
use super::materialize::Materializer;
use crate::config::{CitiesConfig, CityConfig, LayerConfig};
use crate::error::{SceneError, SceneResult};
use crate::geometry::Box3D;
use crate::rules::{RuleEngine, RuleSet};
use crate::store::{DepthWindow, SceneStore, TileId};
use crate::tileset::{ContentUrls, Tileset, TilesetWriter};

/// Parameters of one build.
///
/// A continuation build compiles the subtree below `tile`, rooted at its
/// descendants at `starting_depth` (normally the depth of `tile`'s
/// children). Both must be set together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildRequest {
    /// Deepest tile depth to include.
    pub max_depth: Option<u32>,
    /// Continuation tile whose subtree is compiled.
    pub tile: Option<TileId>,
    /// Depth of the roots of this build. Defaults to 0.
    pub starting_depth: Option<u32>,
}

impl BuildRequest {
    pub fn new(max_depth: Option<u32>, tile: Option<TileId>, starting_depth: Option<u32>) -> Self {
        Self {
            max_depth,
            tile,
            starting_depth,
        }
    }

    /// Limit the build to tiles at or above `depth`.
    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Continue below `tile`, rooting the build at `starting_depth`.
    pub fn with_continuation(mut self, tile: TileId, starting_depth: u32) -> Self {
        self.tile = Some(tile);
        self.starting_depth = Some(starting_depth);
        self
    }

    /// Check that the continuation tile and starting depth come together.
    pub fn validate(&self) -> SceneResult<()> {
        match (self.tile, self.starting_depth) {
            (Some(_), None) | (None, Some(_)) => Err(SceneError::InvalidContinuation {
                tile: self.tile,
                starting_depth: self.starting_depth,
            }),
            _ => Ok(()),
        }
    }

    fn window(&self) -> DepthWindow {
        DepthWindow::new(self.starting_depth, self.max_depth)
    }

    fn root_depth(&self) -> u32 {
        self.starting_depth.unwrap_or(0)
    }
}

/// A linked scene graph and its single root.
#[derive(Debug)]
pub struct Scene {
    pub graph: SceneGraph,
    pub root: NodeId,
}

/// Compiles scenes of one city layer under one rule set.
///
/// Construction resolves configuration and parses the rules without
/// touching the store. Every build re-evaluates the rules from scratch.
pub struct SceneBuilder<'a> {
    store: &'a dyn SceneStore,
    config: &'a CitiesConfig,
    city: &'a CityConfig,
    layer: &'a LayerConfig,
    rules: RuleSet,
    rules_text: String,
}

impl<'a> SceneBuilder<'a> {
    /// Create a builder for `city` / `layer` with the JSON rule set `rules`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Config`] for an unknown city or layer and
    /// [`SceneError::Rules`] for a malformed rule set.
    pub fn new(
        store: &'a dyn SceneStore,
        config: &'a CitiesConfig,
        city: &str,
        layer: &str,
        rules: &str,
    ) -> SceneResult<Self> {
        let city = config.city(city)?;
        let layer = config.layer(&city.name, layer)?;
        let parsed = RuleSet::parse(rules)?;
        Ok(Self {
            store,
            config,
            city,
            layer,
            rules: parsed,
            rules_text: rules.to_string(),
        })
    }

    pub fn city(&self) -> &CityConfig {
        self.city
    }

    pub fn layer(&self) -> &LayerConfig {
        self.layer
    }

    /// Compile the tileset for `request`.
    pub fn build(&self, request: BuildRequest) -> SceneResult<Tileset> {
        let scene = self.build_scene(request)?;
        let urls = ContentUrls::new(&self.city.name, &self.layer.name, &self.rules_text);
        Ok(TilesetWriter::new(urls, self.config.tileset).write(&scene.graph, scene.root))
    }

    /// Compile the linked scene graph for `request`.
    pub fn build_scene(&self, request: BuildRequest) -> SceneResult<Scene> {
        request.validate()?;

        let span = info_span!("scene_build", city = %self.city.name, layer = %self.layer.name);
        let _guard = span.enter();

        let engine = RuleEngine::evaluate(self.rules.clone(), self.store, self.city, self.layer)?;

        let mut hierarchy = Hierarchy::load(self.store, self.city, request.window())?;
        if let Some(tile) = request.tile {
            if !hierarchy.contains(tile) {
                return Err(SceneError::UnknownContinuationTile(tile));
            }
            hierarchy.restrict_to_subtree(tile);
        }

        let mut graph = SceneGraph::new();
        let materializer = Materializer::new(self.store, self.config, self.city, self.layer, &engine);
        let root_depth = request.root_depth();

        let mut tiles = HashMap::new();
        let mut roots = Vec::new();
        for record in hierarchy.tiles() {
            let tile = materializer.materialize(&mut graph, record, request.max_depth)?;
            if record.depth == root_depth {
                roots.push(tile.id);
            }
            tiles.insert(tile.id, tile);
        }
        if let (Some(tile), true) = (request.tile, roots.is_empty()) {
            return Err(SceneError::EmptyContinuation {
                tile,
                starting_depth: root_depth,
            });
        }

        let linker = Linker::new(self.store, self.config, self.city, self.layer, &hierarchy, &tiles);
        let mut top = Vec::new();
        for root in &roots {
            top.extend(linker.link(&mut graph, *root)?.top);
        }

        let root = if top.len() == 1 {
            top[0]
        } else {
            let bbox = if top.is_empty() {
                Box3D::union_all(roots.iter().filter_map(|id| tiles[id].bbox.as_ref()))
            } else {
                Box3D::union_all(top.iter().filter_map(|id| graph.node(*id).bbox.as_ref()))
            };
            let aggregate = graph.add(Node::aggregation(root_depth, bbox));
            for node in &top {
                graph.link(aggregate, *node);
            }
            debug!(roots = top.len(), "Added aggregation root");
            aggregate
        };

        info!(
            tiles = tiles.len(),
            roots = roots.len(),
            nodes = graph.len(),
            "Built scene graph"
        );
        Ok(Scene { graph, root })
    }
}
