//! Representation selection rules.
//!
//! [`RuleSet`] is the parsed JSON document; [`RuleEngine`] evaluates it
//! against a [`crate::store::SceneStore`] and answers per-tile lookups.

mod engine;
mod ruleset;

pub use engine::{FeatureRule, Resolution, RuleEngine};
pub use ruleset::{Action, Condition, Rule, RuleSet, RuleSetError};
