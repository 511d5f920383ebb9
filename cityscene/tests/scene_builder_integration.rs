//! Integration tests for scene compilation.
//!
//! These tests build complete tilesets against an in-memory store and
//! check the emitted document:
//! - Elision of tiles without content
//! - Single-rooted tree shape
//! - Rule fallback, zone rules and feature branches
//! - Partial nodes for coverage gaps
//! - Continuation requests and their validation
//!
//! Run with: `cargo test --test scene_builder_integration`

use std::fs;

use cityscene::config::{
    CitiesConfig, CityConfig, Datatype, LayerConfig, RepresentationConfig, TilesetConfig,
};
use cityscene::scene::{BuildRequest, Node, SceneBuilder, SceneGraph};
use cityscene::store::{FeatureRecord, MemoryStore, TileRecord};
use cityscene::tileset::{ContentUrls, Refine, TileNode, Tileset, TilesetWriter};
use cityscene::SceneError;

// ============================================================================
// Helper Functions
// ============================================================================

/// City `c` with four scales: tiles at depths 0 to 2, features at depth 3.
fn city_config() -> CitiesConfig {
    CitiesConfig::new().with_city(
        CityConfig::new("c", "tiles", "hierarchy")
            .with_scales(vec![8000.0, 4000.0, 2000.0, 1000.0])
            .with_srid(3946)
            .with_layer(
                LayerConfig::new("l", "features")
                    .with_representation(
                        RepresentationConfig::new("footprint", Datatype::Extruded)
                            .with_tile_table("footprint_tiles"),
                    )
                    .with_representation(
                        RepresentationConfig::new("facade", Datatype::PolyhedralSurface)
                            .with_tile_table("facade_tiles")
                            .with_feature_table("facade_features"),
                    )
                    .with_representation(
                        RepresentationConfig::new("textured", Datatype::PolyhedralSurface)
                            .with_tile_table("textured_tiles"),
                    ),
            ),
    )
}

/// Tile pyramid `1 -> {2, 3}`, `2 -> {4, 5}`, `3 -> {6, 7}` laid out
/// along the x axis, 10 units per leaf tile.
fn pyramid() -> MemoryStore {
    MemoryStore::new()
        .with_tile_table("tiles", 3946)
        .with_tile("tiles", TileRecord::new(1, 0).with_bbox("BOX3D(0 0 0,40 20 30)"))
        .with_tile("tiles", TileRecord::new(2, 1).with_bbox("BOX3D(0 0 0,20 20 30)"))
        .with_tile("tiles", TileRecord::new(3, 1).with_bbox("BOX3D(20 0 0,40 20 30)"))
        .with_tile("tiles", TileRecord::new(4, 2).with_bbox("BOX3D(0 0 0,10 20 30)"))
        .with_tile("tiles", TileRecord::new(5, 2).with_bbox("BOX3D(10 0 0,20 20 30)"))
        .with_tile("tiles", TileRecord::new(6, 2).with_bbox("BOX3D(20 0 0,30 20 30)"))
        .with_tile("tiles", TileRecord::new(7, 2).with_bbox("BOX3D(30 0 0,40 20 30)"))
        .with_edge("hierarchy", 1, 2)
        .with_edge("hierarchy", 1, 3)
        .with_edge("hierarchy", 2, 4)
        .with_edge("hierarchy", 2, 5)
        .with_edge("hierarchy", 3, 6)
        .with_edge("hierarchy", 3, 7)
        .with_feature("features", FeatureRecord::new(500, 4).with_attribute("height", 80.0))
        .with_feature("features", FeatureRecord::new(501, 5).with_attribute("height", 12.0))
        .with_content_table("footprint_tiles")
        .with_content_table("facade_tiles")
        .with_content_table("facade_features")
        .with_content_table("textured_tiles")
}

const LOD_RULES: &str = r#"{
    "default": { "0": ["footprint"], "1": ["footprint"], "2": ["facade"] },
    "tileConditions": [],
    "featureConditions": []
}"#;

fn build(store: &MemoryStore, rules: &str, request: BuildRequest) -> Tileset {
    let config = city_config();
    SceneBuilder::new(store, &config, "c", "l", rules)
        .expect("builder")
        .build(request)
        .expect("build")
}

fn urls(tileset: &Tileset) -> Vec<String> {
    tileset
        .root
        .walk()
        .into_iter()
        .filter_map(TileNode::url)
        .map(str::to_string)
        .collect()
}

fn find<'a>(tileset: &'a Tileset, url: &str) -> Option<&'a TileNode> {
    tileset.root.walk().into_iter().find(|n| n.url() == Some(url))
}

// ============================================================================
// Integration Tests
// ============================================================================

/// A single root tile with one representation yields a one-node tileset.
#[test]
fn test_end_to_end_single_tile() {
    let store = MemoryStore::new()
        .with_tile_table("tiles", 3946)
        .with_tile("tiles", TileRecord::new(1, 0).with_bbox("BOX3D(0 0 0,10 10 10)"))
        .with_edge("hierarchy", 1, 2)
        .with_tile_content("facade_tiles", 1);
    let rules = r#"{"default": {"0": ["facade"]}, "tileConditions": [], "featureConditions": []}"#;

    let tileset = build(&store, rules, BuildRequest::new(None, None, None));

    assert_eq!(tileset.geometric_error, 100.0);
    assert_eq!(tileset.asset.version, "1.0");
    assert_eq!(tileset.asset.gltf_up_axis, "Z");
    assert_eq!(
        tileset.root.url(),
        Some("getTile?city=c&layer=l&tile=1&representation=facade&depth=0")
    );
    assert!(tileset.root.children.is_empty());
}

/// Tiles without content and without content below them never appear.
#[test]
fn test_empty_subtrees_are_elided() {
    let store = pyramid()
        .with_tile_content("footprint_tiles", 1)
        .with_tile_content("footprint_tiles", 2)
        .with_tile_content("facade_tiles", 4)
        .with_tile_content("facade_tiles", 5);

    let tileset = build(&store, LOD_RULES, BuildRequest::default());
    let all = urls(&tileset);

    assert_eq!(
        all,
        vec![
            "getTile?city=c&layer=l&tile=1&representation=footprint&depth=0",
            "getTile?city=c&layer=l&tile=2&representation=footprint&depth=1",
            "getTile?city=c&layer=l&tile=4&representation=facade&depth=2",
            "getTile?city=c&layer=l&tile=5&representation=facade&depth=2",
        ]
    );
    for elided in [3, 6, 7] {
        let marker = format!("tile={}&", elided);
        assert!(
            all.iter().all(|u| !u.contains(&marker)),
            "tile {} should be elided",
            elided
        );
    }
}

/// An empty tile passes its children's nodes to its parent.
#[test]
fn test_empty_intermediate_tile_is_skipped() {
    let store = pyramid()
        .with_tile_content("footprint_tiles", 1)
        .with_tile_content("facade_tiles", 4)
        .with_tile_content("facade_tiles", 6);

    let tileset = build(&store, LOD_RULES, BuildRequest::default());
    let children: Vec<_> = tileset
        .root
        .children
        .iter()
        .filter_map(TileNode::url)
        .collect();

    assert_eq!(
        children,
        vec![
            "getTile?city=c&layer=l&tile=4&representation=facade&depth=2",
            "getTile?city=c&layer=l&tile=6&representation=facade&depth=2",
        ]
    );
}

/// Every node of the linked graph has one parent and the graph has one root.
#[test]
fn test_scene_is_single_rooted_tree() {
    let store = pyramid()
        .with_tile_content("footprint_tiles", 1)
        .with_tile_content("footprint_tiles", 2)
        .with_tile_content("footprint_tiles", 3)
        .with_tile_content("facade_tiles", 4)
        .with_tile_content("facade_tiles", 7);
    let config = city_config();
    let builder = SceneBuilder::new(&store, &config, "c", "l", LOD_RULES).unwrap();

    let scene = builder.build_scene(BuildRequest::default()).unwrap();
    assert!(scene.graph.is_tree(scene.root));
    assert_eq!(scene.graph.descendants(scene.root).len(), scene.graph.len());
}

/// Several depth-0 roots get a content-less aggregation root.
#[test]
fn test_multiple_roots_are_aggregated() {
    let store = pyramid()
        .with_tile("tiles", TileRecord::new(10, 0).with_bbox("BOX3D(40 0 0,60 20 50)"))
        .with_tile_content("footprint_tiles", 1)
        .with_tile_content("footprint_tiles", 10);

    let tileset = build(&store, LOD_RULES, BuildRequest::default());

    assert_eq!(tileset.root.refine, Some(Refine::Add));
    assert!(tileset.root.content.is_none());
    assert_eq!(tileset.root.children.len(), 2);
    assert_eq!(
        tileset.root.bounding_volume.bbox,
        [30.0, 10.0, 25.0, 30.0, 0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 25.0]
    );
    assert_eq!(tileset.root.geometric_error, 10.0);
    assert_eq!(tileset.root.children[0].geometric_error, 11.0);
}

/// A zone rule overrides the default only at the depths it names.
#[test]
fn test_zone_rule_overrides_default() {
    let store = pyramid()
        .with_tile_content("footprint_tiles", 1)
        .with_tile_content("footprint_tiles", 3)
        .with_tile_content("facade_tiles", 6)
        .with_tile_content("textured_tiles", 7)
        .with_tile_content("facade_tiles", 7);
    let rules = r#"{
        "default": { "0": ["footprint"], "1": ["footprint"], "2": ["facade"] },
        "tileConditions": [
            [ { "type": "zone", "center": [35, 10], "radius": 1 }, { "2": ["textured"] } ]
        ],
        "featureConditions": []
    }"#;

    let tileset = build(&store, rules, BuildRequest::default());
    let all = urls(&tileset);

    assert!(all.contains(&"getTile?city=c&layer=l&tile=7&representation=textured&depth=2".to_string()));
    assert!(all.contains(&"getTile?city=c&layer=l&tile=6&representation=facade&depth=2".to_string()));
    assert!(!all.contains(&"getTile?city=c&layer=l&tile=7&representation=facade&depth=2".to_string()));
    // Tiles 1 and 3 lie in the zone but the rule has no entry for their depth.
    assert!(all.contains(&"getTile?city=c&layer=l&tile=3&representation=footprint&depth=1".to_string()));
}

/// A sibling with content in the parent's representation gets a partial node.
#[test]
fn test_reconciliation_adds_partial_node() {
    let store = pyramid()
        .with_tile_content("footprint_tiles", 1)
        .with_tile_content("footprint_tiles", 2)
        .with_tile_content("footprint_tiles", 5)
        .with_tile_content("facade_tiles", 4);

    let tileset = build(&store, LOD_RULES, BuildRequest::default());

    let parent = find(
        &tileset,
        "getTile?city=c&layer=l&tile=2&representation=footprint&depth=1",
    )
    .expect("parent node");
    let children: Vec<_> = parent.children.iter().filter_map(TileNode::url).collect();
    assert_eq!(
        children,
        vec![
            "getTile?city=c&layer=l&tile=4&representation=facade&depth=2",
            "getTile?city=c&layer=l&tile=2&representation=footprint&depth=2&onlyTiles=5",
        ]
    );
}

/// Without a row for the missing sibling, no partial node is added.
#[test]
fn test_no_reconciliation_without_content_row() {
    let store = pyramid()
        .with_tile_content("footprint_tiles", 1)
        .with_tile_content("footprint_tiles", 2)
        .with_tile_content("facade_tiles", 4);

    let tileset = build(&store, LOD_RULES, BuildRequest::default());

    let parent = find(
        &tileset,
        "getTile?city=c&layer=l&tile=2&representation=footprint&depth=1",
    )
    .expect("parent node");
    assert_eq!(parent.children.len(), 1);
    assert!(urls(&tileset).iter().all(|u| !u.contains("onlyTiles")));
}

/// Matched features get their own branch at their threshold depth and are
/// excluded from tile content from then on.
#[test]
fn test_feature_branches() {
    let store = pyramid()
        .with_tile_content("footprint_tiles", 1)
        .with_tile_content("footprint_tiles", 2)
        .with_tile_content("facade_tiles", 4)
        .with_feature_content("facade_features", 500);
    let rules = r#"{
        "default": { "0": ["footprint"], "1": ["footprint"], "2": ["facade"], "3": ["facade"] },
        "tileConditions": [],
        "featureConditions": [
            [ { "type": "greater", "attribute": "height", "value": 50 }, { "3": ["textured"], "1": ["facade"] } ]
        ]
    }"#;

    let tileset = build(&store, rules, BuildRequest::default());
    let all = urls(&tileset);

    // Depth 0 is above the feature's threshold.
    assert!(all.contains(&"getTile?city=c&layer=l&tile=1&representation=footprint&depth=0".to_string()));

    let root_children = &tileset.root.children;
    assert_eq!(root_children.len(), 2);
    assert_eq!(
        root_children[0].url(),
        Some("getTile?city=c&layer=l&tile=2&representation=footprint&depth=1&withoutFeatures=500")
    );

    let branch = &root_children[1];
    assert_eq!(
        branch.url(),
        Some("getFeature?city=c&layer=l&id=500&representation=facade")
    );
    assert_eq!(
        branch.children[0].url(),
        Some("getFeature?city=c&layer=l&id=500&representation=textured")
    );
    assert_eq!(branch.geometric_error, root_children[0].geometric_error);

    assert!(all.contains(
        &"getTile?city=c&layer=l&tile=4&representation=facade&depth=2&withoutFeatures=500".to_string()
    ));
    // Feature-level node of the deepest tile.
    assert!(all.contains(
        &"getTile?city=c&layer=l&tile=4&representation=facade&depth=3&withoutFeatures=500".to_string()
    ));
}

/// `max_depth` drops deeper tiles and the feature level.
#[test]
fn test_max_depth_limits_tiles() {
    let store = pyramid()
        .with_tile_content("footprint_tiles", 1)
        .with_tile_content("footprint_tiles", 2)
        .with_tile_content("facade_tiles", 4);

    let tileset = build(&store, LOD_RULES, BuildRequest::default().with_max_depth(1));
    assert_eq!(
        urls(&tileset),
        vec![
            "getTile?city=c&layer=l&tile=1&representation=footprint&depth=0",
            "getTile?city=c&layer=l&tile=2&representation=footprint&depth=1",
        ]
    );
}

/// A continuation compiles only the subtree below the continuation tile.
#[test]
fn test_continuation_subtree() {
    let store = pyramid()
        .with_tile_content("footprint_tiles", 1)
        .with_tile_content("footprint_tiles", 2)
        .with_tile_content("facade_tiles", 4)
        .with_tile_content("facade_tiles", 5)
        .with_tile_content("facade_tiles", 6);

    let tileset = build(
        &store,
        LOD_RULES,
        BuildRequest::default().with_continuation(2, 2),
    );

    assert_eq!(tileset.root.refine, Some(Refine::Add));
    assert_eq!(
        urls(&tileset),
        vec![
            "getTile?city=c&layer=l&tile=4&representation=facade&depth=2",
            "getTile?city=c&layer=l&tile=5&representation=facade&depth=2",
        ]
    );
}

/// The parameters of a `getScene` link compile the children of the link tile.
#[test]
fn test_link_url_compiles_link_subtree() {
    let store = pyramid()
        .with_tile_content("facade_tiles", 4)
        .with_tile_content("facade_tiles", 5);

    let mut graph = SceneGraph::new();
    let link = graph.add(Node::link(2, 1, None));
    let linked = TilesetWriter::new(ContentUrls::new("c", "l", LOD_RULES), TilesetConfig::default())
        .write(&graph, link);
    let url = linked.root.url().expect("link url").to_string();

    let param = |name: &str| {
        url.split(['?', '&'])
            .find_map(|pair| pair.strip_prefix(name))
            .expect("query parameter")
            .to_string()
    };
    let tile: i64 = param("tile=").parse().unwrap();
    let depth: u32 = param("depth=").parse().unwrap();
    assert_eq!((tile, depth), (2, 2));

    let tileset = build(
        &store,
        LOD_RULES,
        BuildRequest::default().with_continuation(tile, depth),
    );
    assert_eq!(
        urls(&tileset),
        vec![
            "getTile?city=c&layer=l&tile=4&representation=facade&depth=2",
            "getTile?city=c&layer=l&tile=5&representation=facade&depth=2",
        ]
    );
}

/// A continuation rooted at the link tile's own depth is rejected.
#[test]
fn test_continuation_at_tile_depth_is_rejected() {
    let store = pyramid().with_tile_content("facade_tiles", 4);
    let config = city_config();
    let builder = SceneBuilder::new(&store, &config, "c", "l", LOD_RULES).unwrap();

    let result = builder.build(BuildRequest::default().with_continuation(2, 1));
    assert!(matches!(
        result,
        Err(SceneError::EmptyContinuation { tile: 2, starting_depth: 1 })
    ));
}

/// Continuation arguments must come together; nothing is queried otherwise.
#[test]
fn test_invalid_continuation_arguments() {
    let store = pyramid();
    let config = city_config();
    let builder = SceneBuilder::new(&store, &config, "c", "l", LOD_RULES).unwrap();

    let only_depth = builder.build(BuildRequest::new(None, None, Some(5)));
    assert!(matches!(
        only_depth,
        Err(SceneError::InvalidContinuation { .. })
    ));

    let only_tile = builder.build(BuildRequest::new(Some(2), Some(3), None));
    assert!(matches!(only_tile, Err(SceneError::InvalidContinuation { .. })));

    assert_eq!(store.query_count(), 0);
}

/// A typo in a condition type fails the build instead of matching nothing.
#[test]
fn test_unknown_condition_fails() {
    let store = pyramid();
    let config = city_config();
    let rules = r#"{
        "default": {},
        "tileConditions": [ [ { "type": "zones", "center": [0, 0], "radius": 1 }, {} ] ],
        "featureConditions": []
    }"#;
    let result = SceneBuilder::new(&store, &config, "c", "l", rules);
    assert!(matches!(result, Err(SceneError::Rules(_))));
}

/// Store errors abort the build unchanged.
#[test]
fn test_store_error_aborts_build() {
    let store = MemoryStore::new().with_tile_table("tiles", 3946);
    let tileset = {
        let config = city_config();
        let builder = SceneBuilder::new(&store, &config, "c", "l", LOD_RULES).unwrap();
        builder.build(BuildRequest::default())
    };
    assert!(matches!(tileset, Err(SceneError::Store(_))));
}

/// Configuration and data loaded from files build the same tileset.
#[test]
fn test_build_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("cities.ini");
    fs::write(
        &config_path,
        "[tileset]\n\
         geometric_error = 250\n\
         \n\
         [city.c]\n\
         tile_table = tiles\n\
         tile_hierarchy = hierarchy\n\
         scales = 1000\n\
         srid = 3946\n\
         \n\
         [layer.c.l]\n\
         feature_table = features\n\
         \n\
         [representation.c.l.facade]\n\
         tile_table = facade_tiles\n\
         datatype = polyhedralsurface\n",
    )
    .unwrap();
    let config = CitiesConfig::load_from(&config_path).unwrap();

    let store = MemoryStore::from_json(
        r#"{
            "tile_tables": {
                "tiles": { "srid": 3946, "tiles": [ { "id": 1, "depth": 0, "bbox": "BOX3D(0 0 0,10 10 10)" } ] }
            },
            "hierarchy_tables": { "hierarchy": [] },
            "content_tables": { "facade_tiles": { "tiles": [1] } }
        }"#,
    )
    .unwrap();

    let rules = r#"{"default": {"0": ["facade"]}, "tileConditions": [], "featureConditions": []}"#;
    let tileset = SceneBuilder::new(&store, &config, "c", "l", rules)
        .unwrap()
        .build(BuildRequest::default())
        .unwrap();

    assert_eq!(tileset.geometric_error, 250.0);
    assert_eq!(
        tileset.root.url(),
        Some("getTile?city=c&layer=l&tile=1&representation=facade&depth=0")
    );

    let json: serde_json::Value = serde_json::from_str(&tileset.to_json().unwrap()).unwrap();
    assert_eq!(json["asset"]["gltfUpAxis"], "Z");
    assert_eq!(json["root"]["boundingVolume"]["box"][0], 5.0);
}
