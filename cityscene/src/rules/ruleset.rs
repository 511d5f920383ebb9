//! Rule set wire format and parsing.
//!
//! A rule set is JSON of the form
//!
//! ```json
//! {
//!   "default": { "0": ["footprint"], "1": ["facade"] },
//!   "tileConditions": [
//!     [ { "type": "zone", "center": [1843000, 5175000], "radius": 500 },
//!       { "1": ["facade", "textured"] } ]
//!   ],
//!   "featureConditions": [
//!     [ { "type": "greater", "attribute": "height", "value": 60 },
//!       { "1": ["facade"], "2": ["textured"] } ]
//!   ]
//! }
//! ```
//!
//! Tile-condition actions map a depth to the representations to show at that
//! depth. Feature-condition actions map a minimum depth to representations;
//! the smallest key is the depth at which the feature gets its own branch.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Condition `type` tag for zone conditions.
pub const ZONE_TAG: &str = "zone";

/// Condition `type` tag for attribute threshold conditions.
pub const ATTRIBUTE_THRESHOLD_TAG: &str = "greater";

/// Errors in a rule set document.
#[derive(Debug, Error)]
pub enum RuleSetError {
    /// The document is not valid JSON or has the wrong shape.
    #[error("invalid rule set JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A top-level key is absent.
    #[error("missing required key '{0}'")]
    MissingKey(&'static str),

    /// A condition has a `type` this engine does not implement.
    #[error("unknown condition type '{0}'")]
    UnknownCondition(String),

    /// A condition has no `type` field.
    #[error("condition without a 'type' field: {0}")]
    UntypedCondition(String),

    /// A known condition type with missing or ill-typed fields.
    #[error("invalid '{kind}' condition: {reason}")]
    InvalidCondition { kind: &'static str, reason: String },

    /// A condition kind used in the wrong list.
    #[error("'{kind}' condition is not allowed in {list}")]
    MisplacedCondition {
        kind: &'static str,
        list: &'static str,
    },

    /// An action key that is not a non-negative integer depth.
    #[error("invalid depth key '{0}'")]
    InvalidDepthKey(String),
}

/// A predicate evaluated against the backing store.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Tiles whose footprint intersects a disc around `center`.
    Zone { center: [f64; 2], radius: f64 },
    /// Features whose `attribute` is at least `value`.
    AttributeThreshold { attribute: String, value: f64 },
}

impl Condition {
    /// The wire `type` tag of this condition.
    pub fn kind(&self) -> &'static str {
        match self {
            Condition::Zone { .. } => ZONE_TAG,
            Condition::AttributeThreshold { .. } => ATTRIBUTE_THRESHOLD_TAG,
        }
    }

    fn from_value(value: &Value) -> Result<Self, RuleSetError> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| RuleSetError::UntypedCondition(value.to_string()))?;

        match kind {
            ZONE_TAG => {
                let zone: ZoneFields =
                    serde_json::from_value(value.clone()).map_err(|e| {
                        RuleSetError::InvalidCondition {
                            kind: ZONE_TAG,
                            reason: e.to_string(),
                        }
                    })?;
                Ok(Condition::Zone {
                    center: zone.center,
                    radius: zone.radius,
                })
            }
            ATTRIBUTE_THRESHOLD_TAG => {
                let fields: ThresholdFields =
                    serde_json::from_value(value.clone()).map_err(|e| {
                        RuleSetError::InvalidCondition {
                            kind: ATTRIBUTE_THRESHOLD_TAG,
                            reason: e.to_string(),
                        }
                    })?;
                let threshold = match fields.value {
                    NumberOrText::Number(n) => n,
                    NumberOrText::Text(s) => s.trim().parse().map_err(|_| {
                        RuleSetError::InvalidCondition {
                            kind: ATTRIBUTE_THRESHOLD_TAG,
                            reason: format!("value '{}' is not a number", s),
                        }
                    })?,
                };
                Ok(Condition::AttributeThreshold {
                    attribute: fields.attribute,
                    value: threshold,
                })
            }
            other => Err(RuleSetError::UnknownCondition(other.to_string())),
        }
    }
}

#[derive(Deserialize)]
struct ZoneFields {
    center: [f64; 2],
    radius: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

#[derive(Deserialize)]
struct ThresholdFields {
    attribute: String,
    value: NumberOrText,
}

/// Representations to use, keyed by depth.
///
/// For tile conditions and the default, the key is the exact depth. For
/// feature conditions the key is a minimum depth.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Action {
    by_depth: BTreeMap<u32, Vec<String>>,
}

impl Action {
    /// Create an action from `(depth, representations)` pairs.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (u32, Vec<S>)>,
        S: Into<String>,
    {
        Self {
            by_depth: entries
                .into_iter()
                .map(|(depth, reps)| (depth, reps.into_iter().map(Into::into).collect()))
                .collect(),
        }
    }

    /// Representations registered for exactly `depth`.
    pub fn at(&self, depth: u32) -> Option<&[String]> {
        self.by_depth.get(&depth).map(Vec::as_slice)
    }

    /// Smallest depth key, if any.
    pub fn min_depth(&self) -> Option<u32> {
        self.by_depth.keys().next().copied()
    }

    /// All representations in ascending depth order.
    pub fn representations(&self) -> impl Iterator<Item = &str> {
        self.by_depth.values().flatten().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.by_depth.is_empty()
    }

    fn from_wire(wire: BTreeMap<String, Vec<String>>) -> Result<Self, RuleSetError> {
        let mut by_depth = BTreeMap::new();
        for (key, reps) in wire {
            let depth: u32 = key
                .trim()
                .parse()
                .map_err(|_| RuleSetError::InvalidDepthKey(key.clone()))?;
            by_depth.insert(depth, reps);
        }
        Ok(Self { by_depth })
    }
}

/// A condition with the action applied to whatever it matches.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub condition: Condition,
    pub action: Arc<Action>,
}

#[derive(Deserialize)]
struct WireRuleSet {
    default: Option<BTreeMap<String, Vec<String>>>,
    #[serde(rename = "tileConditions")]
    tile_conditions: Option<Vec<(Value, BTreeMap<String, Vec<String>>)>>,
    #[serde(rename = "featureConditions")]
    feature_conditions: Option<Vec<(Value, BTreeMap<String, Vec<String>>)>>,
}

/// A parsed rule set.
///
/// Rules are kept in declaration order; earlier rules take priority.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    pub default: Action,
    pub tile_conditions: Vec<Rule>,
    pub feature_conditions: Vec<Rule>,
}

impl RuleSet {
    /// Parse a rule set from its JSON text.
    ///
    /// All three top-level keys are required. Unknown condition types, and
    /// condition kinds used in the wrong list, are errors.
    pub fn parse(text: &str) -> Result<Self, RuleSetError> {
        let wire: WireRuleSet = serde_json::from_str(text)?;

        let default = Action::from_wire(wire.default.ok_or(RuleSetError::MissingKey("default"))?)?;
        let tile_conditions = parse_rules(
            wire.tile_conditions
                .ok_or(RuleSetError::MissingKey("tileConditions"))?,
            "tileConditions",
            ZONE_TAG,
        )?;
        let feature_conditions = parse_rules(
            wire.feature_conditions
                .ok_or(RuleSetError::MissingKey("featureConditions"))?,
            "featureConditions",
            ATTRIBUTE_THRESHOLD_TAG,
        )?;

        Ok(Self {
            default,
            tile_conditions,
            feature_conditions,
        })
    }

    /// Every representation name the rule set refers to, without duplicates.
    pub fn representation_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .default
            .representations()
            .chain(
                self.tile_conditions
                    .iter()
                    .chain(&self.feature_conditions)
                    .flat_map(|rule| rule.action.representations()),
            )
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

fn parse_rules(
    wire: Vec<(Value, BTreeMap<String, Vec<String>>)>,
    list: &'static str,
    allowed: &'static str,
) -> Result<Vec<Rule>, RuleSetError> {
    wire.into_iter()
        .map(|(condition, action)| {
            let condition = Condition::from_value(&condition)?;
            if condition.kind() != allowed {
                return Err(RuleSetError::MisplacedCondition {
                    kind: condition.kind(),
                    list,
                });
            }
            Ok(Rule {
                condition,
                action: Arc::new(Action::from_wire(action)?),
            })
        })
        .collect()
}
