//! CLI command implementations.

pub mod check_rules;
pub mod cities;
pub mod common;
pub mod scene;
