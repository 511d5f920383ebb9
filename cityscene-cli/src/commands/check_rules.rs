//! `check-rules` command: validate a rule set without store access.

use std::path::PathBuf;

use cityscene::rules::{Condition, RuleSet};

use super::common::{load_config, load_rules};
use crate::error::CliError;

/// Run the check-rules command.
///
/// When `city` and `layer` are given, every representation the rules name
/// must also exist in the configuration.
pub fn run(
    config_path: Option<PathBuf>,
    rules: &str,
    city: Option<&str>,
    layer: Option<&str>,
) -> Result<(), CliError> {
    let text = load_rules(rules)?;
    let parsed = RuleSet::parse(&text)?;

    if let (Some(city), Some(layer)) = (city, layer) {
        let config = load_config(config_path.as_deref())?;
        for name in parsed.representation_names() {
            config.representation(city, layer, name)?;
        }
    }

    print!("{}", summarize(&parsed));
    Ok(())
}

fn summarize(rules: &RuleSet) -> String {
    let mut out = String::from("Rule set is valid.\n");
    out.push_str(&format!("  tile conditions:    {}\n", rules.tile_conditions.len()));
    out.push_str(&format!("  feature conditions: {}\n", rules.feature_conditions.len()));
    for rule in rules.tile_conditions.iter().chain(&rules.feature_conditions) {
        let line = match &rule.condition {
            Condition::Zone { center, radius } => {
                format!("zone ({}, {}) radius {}", center[0], center[1], radius)
            }
            Condition::AttributeThreshold { attribute, value } => {
                format!("{} >= {}", attribute, value)
            }
        };
        out.push_str(&format!("    {}\n", line));
    }
    out.push_str(&format!(
        "  representations:    {}\n",
        rules.representation_names().join(", ")
    ));
    out
}
