//! Rule evaluation against the backing store.
//!
//! The engine turns a [`RuleSet`] into two lookup indexes before a build:
//!
//! - tile index: tile id to the action of the first zone rule covering it
//! - tile-feature index: tile id to the features whose attribute rule
//!   matched, registered on the feature's own tile and every ancestor
//!
//! Lookups during the build never touch the store.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use super::ruleset::{Action, Condition, RuleSet, RuleSetError, ATTRIBUTE_THRESHOLD_TAG, ZONE_TAG};
use crate::config::{CityConfig, LayerConfig};
use crate::error::SceneResult;
use crate::store::{FeatureId, SceneStore, TileId};

/// A feature matched by an attribute rule, with the rule's action.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRule {
    pub feature: FeatureId,
    pub action: Arc<Action>,
}

impl FeatureRule {
    /// Depth at which the feature gets its own branch.
    pub fn threshold(&self) -> Option<u32> {
        self.action.min_depth()
    }
}

/// Outcome of resolving the representations of a tile at a depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    /// A tile rule covers the tile and has an entry for the depth.
    Rule(&'a [String]),
    /// No tile rule applies; the default has an entry for the depth.
    Default(&'a [String]),
    /// Neither a tile rule nor the default names a representation.
    Unresolved,
}

impl<'a> Resolution<'a> {
    /// Representations to materialize, empty when unresolved.
    pub fn representations(&self) -> &'a [String] {
        match *self {
            Resolution::Rule(reps) | Resolution::Default(reps) => reps,
            Resolution::Unresolved => &[],
        }
    }
}

/// Evaluated rule set for one city layer.
#[derive(Debug, Default)]
pub struct RuleEngine {
    rules: RuleSet,
    tile_index: HashMap<TileId, Arc<Action>>,
    feature_index: HashMap<TileId, Vec<FeatureRule>>,
}

impl RuleEngine {
    /// Create an engine with empty indexes.
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            tile_index: HashMap::new(),
            feature_index: HashMap::new(),
        }
    }

    /// Create an engine and evaluate every rule for `city` / `layer`.
    pub fn evaluate(
        rules: RuleSet,
        store: &dyn SceneStore,
        city: &CityConfig,
        layer: &LayerConfig,
    ) -> SceneResult<Self> {
        let mut engine = Self::new(rules);
        engine.evaluate_tile_rules(store, city)?;
        engine.evaluate_feature_rules(store, city, layer)?;
        Ok(engine)
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Build the tile index.
    ///
    /// Rules are applied in order and a tile keeps the first rule that
    /// covers it.
    pub fn evaluate_tile_rules(
        &mut self,
        store: &dyn SceneStore,
        city: &CityConfig,
    ) -> SceneResult<()> {
        for rule in &self.rules.tile_conditions {
            let Condition::Zone { center, radius } = rule.condition else {
                return Err(RuleSetError::MisplacedCondition {
                    kind: rule.condition.kind(),
                    list: "tileConditions",
                }
                .into());
            };

            let tiles = store.tiles_in_zone(&city.tile_table, center, radius, city.srid)?;
            debug!(
                kind = ZONE_TAG,
                matched = tiles.len(),
                "Evaluated tile rule"
            );
            for tile in tiles {
                self.tile_index
                    .entry(tile)
                    .or_insert_with(|| Arc::clone(&rule.action));
            }
        }
        Ok(())
    }

    /// Build the tile-feature index.
    ///
    /// A feature keeps the first rule that matches it. Each match is
    /// registered on the feature's tile and then on each ancestor, walking
    /// up `city.depth() - 1` levels. A missing parent ends the walk early.
    pub fn evaluate_feature_rules(
        &mut self,
        store: &dyn SceneStore,
        city: &CityConfig,
        layer: &LayerConfig,
    ) -> SceneResult<()> {
        let levels = city.depth().saturating_sub(1);
        let mut seen: HashSet<FeatureId> = HashSet::new();

        for rule in &self.rules.feature_conditions {
            let Condition::AttributeThreshold { attribute, value } = &rule.condition else {
                return Err(RuleSetError::MisplacedCondition {
                    kind: rule.condition.kind(),
                    list: "featureConditions",
                }
                .into());
            };

            let matches = store.features_at_least(&layer.feature_table, attribute, *value)?;
            debug!(
                kind = ATTRIBUTE_THRESHOLD_TAG,
                attribute = %attribute,
                matched = matches.len(),
                "Evaluated feature rule"
            );

            for found in matches {
                if !seen.insert(found.feature) {
                    continue;
                }
                let entry = FeatureRule {
                    feature: found.feature,
                    action: Arc::clone(&rule.action),
                };

                let mut tile = found.tile;
                self.feature_index
                    .entry(tile)
                    .or_default()
                    .push(entry.clone());

                for _ in 0..levels {
                    match store.parent_tile(&city.tile_hierarchy, tile)? {
                        Some(parent) => {
                            tile = parent;
                            self.feature_index
                                .entry(tile)
                                .or_default()
                                .push(entry.clone());
                        }
                        None => {
                            warn!(
                                tile,
                                feature = found.feature,
                                "Tile has no parent before reaching the top level"
                            );
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Representations for `tile` at `depth`.
    ///
    /// A tile rule wins when it has an entry for the depth. Otherwise the
    /// default's entry for the depth is used.
    pub fn resolve_tile(&self, tile: TileId, depth: u32) -> Resolution<'_> {
        if let Some(reps) = self.tile_index.get(&tile).and_then(|a| a.at(depth)) {
            return Resolution::Rule(reps);
        }
        match self.rules.default.at(depth) {
            Some(reps) => Resolution::Default(reps),
            None => Resolution::Unresolved,
        }
    }

    /// Feature rules registered on `tile`, in match order.
    pub fn resolve_features(&self, tile: TileId) -> &[FeatureRule] {
        self.feature_index
            .get(&tile)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of tiles covered by a tile rule.
    pub fn indexed_tiles(&self) -> usize {
        self.tile_index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FeatureRecord, MemoryStore, TileRecord};

    fn city() -> CityConfig {
        CityConfig::new("c", "tiles", "hierarchy")
            .with_scales(vec![4000.0, 2000.0, 1000.0, 500.0])
            .with_srid(3946)
            .with_layer(LayerConfig::new("l", "features"))
    }

    /// Tiles at depths 0 to 2: 1 -> {2, 3}, 2 -> {4}, 3 -> {5}.
    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_tile_table("tiles", 3946)
            .with_tile("tiles", TileRecord::new(1, 0).with_bbox("BOX3D(0 0 0,20 10 5)"))
            .with_tile("tiles", TileRecord::new(2, 1).with_bbox("BOX3D(0 0 0,10 10 5)"))
            .with_tile("tiles", TileRecord::new(3, 1).with_bbox("BOX3D(10 0 0,20 10 5)"))
            .with_tile("tiles", TileRecord::new(4, 2).with_bbox("BOX3D(0 0 0,10 10 5)"))
            .with_tile("tiles", TileRecord::new(5, 2).with_bbox("BOX3D(10 0 0,20 10 5)"))
            .with_edge("hierarchy", 1, 2)
            .with_edge("hierarchy", 1, 3)
            .with_edge("hierarchy", 2, 4)
            .with_edge("hierarchy", 3, 5)
            .with_feature("features", FeatureRecord::new(100, 4).with_attribute("height", 80.0))
            .with_feature("features", FeatureRecord::new(101, 5).with_attribute("height", 20.0))
            .with_feature("features", FeatureRecord::new(102, 5).with_attribute("height", 55.0))
    }

    fn engine(text: &str, store: &MemoryStore) -> RuleEngine {
        let city = city();
        let layer = city.layers["l"].clone();
        RuleEngine::evaluate(RuleSet::parse(text).unwrap(), store, &city, &layer).unwrap()
    }

    #[test]
    fn test_default_fallback() {
        let store = store();
        let engine = engine(
            r#"{ "default": { "0": ["footprint"] }, "tileConditions": [], "featureConditions": [] }"#,
            &store,
        );
        let footprint = vec!["footprint".to_string()];
        assert_eq!(engine.resolve_tile(1, 0), Resolution::Default(&footprint));
        assert_eq!(engine.resolve_tile(99, 0), Resolution::Default(&footprint));
        assert_eq!(engine.resolve_tile(1, 1), Resolution::Unresolved);
        assert!(engine.resolve_tile(1, 1).representations().is_empty());
    }

    #[test]
    fn test_first_zone_rule_wins() {
        let store = store();
        let engine = engine(
            r#"{
                "default": { "1": ["footprint"] },
                "tileConditions": [
                    [ { "type": "zone", "center": [5, 5], "radius": 1 }, { "1": ["textured"] } ],
                    [ { "type": "zone", "center": [15, 5], "radius": 100 }, { "1": ["facade"] } ]
                ],
                "featureConditions": []
            }"#,
            &store,
        );

        // Tile 2 lies in both zones; the first rule keeps it.
        assert_eq!(
            engine.resolve_tile(2, 1).representations(),
            &["textured".to_string()]
        );
        assert_eq!(
            engine.resolve_tile(3, 1).representations(),
            &["facade".to_string()]
        );
        assert_eq!(engine.indexed_tiles(), 5);
    }

    #[test]
    fn test_rule_without_depth_entry_falls_back() {
        let store = store();
        let engine = engine(
            r#"{
                "default": { "0": ["footprint"] },
                "tileConditions": [
                    [ { "type": "zone", "center": [5, 5], "radius": 1 }, { "1": ["textured"] } ]
                ],
                "featureConditions": []
            }"#,
            &store,
        );
        assert!(matches!(engine.resolve_tile(1, 0), Resolution::Default(_)));
        assert!(matches!(engine.resolve_tile(2, 1), Resolution::Rule(_)));
    }

    #[test]
    fn test_feature_propagates_to_ancestors() {
        let store = store();
        let engine = engine(
            r#"{
                "default": {},
                "tileConditions": [],
                "featureConditions": [
                    [ { "type": "greater", "attribute": "height", "value": 50 }, { "1": ["facade"] } ]
                ]
            }"#,
            &store,
        );

        let ids = |tile| {
            engine
                .resolve_features(tile)
                .iter()
                .map(|f| f.feature)
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(4), vec![100]);
        assert_eq!(ids(2), vec![100]);
        assert_eq!(ids(1), vec![100, 102]);
        assert_eq!(ids(5), vec![102]);
        assert_eq!(ids(3), vec![102]);
        assert!(engine.resolve_features(99).is_empty());
    }

    #[test]
    fn test_feature_keeps_first_matching_rule() {
        let store = store();
        let engine = engine(
            r#"{
                "default": {},
                "tileConditions": [],
                "featureConditions": [
                    [ { "type": "greater", "attribute": "height", "value": 70 }, { "2": ["textured"] } ],
                    [ { "type": "greater", "attribute": "height", "value": 10 }, { "1": ["facade"] } ]
                ]
            }"#,
            &store,
        );

        let on_leaf = engine.resolve_features(4);
        assert_eq!(on_leaf.len(), 1);
        assert_eq!(on_leaf[0].threshold(), Some(2));

        let on_root: Vec<_> = engine.resolve_features(1).iter().map(|f| f.feature).collect();
        assert_eq!(on_root, vec![100, 101, 102]);
    }

    #[test]
    fn test_walk_stops_at_missing_parent() {
        let store = store().with_feature(
            "features",
            FeatureRecord::new(200, 42).with_attribute("height", 90.0),
        );
        let engine = engine(
            r#"{
                "default": {},
                "tileConditions": [],
                "featureConditions": [
                    [ { "type": "greater", "attribute": "height", "value": 85 }, { "0": ["facade"] } ]
                ]
            }"#,
            &store,
        );
        assert_eq!(engine.resolve_features(42).len(), 1);
    }

    #[test]
    fn test_store_errors_propagate() {
        let store = MemoryStore::new();
        let city = city();
        let layer = city.layers["l"].clone();
        let rules = RuleSet::parse(
            r#"{
                "default": {},
                "tileConditions": [ [ { "type": "zone", "center": [0, 0], "radius": 1 }, {} ] ],
                "featureConditions": []
            }"#,
        )
        .unwrap();
        let result = RuleEngine::evaluate(rules, &store, &city, &layer);
        assert!(matches!(result, Err(crate::SceneError::Store(_))));
    }
}
