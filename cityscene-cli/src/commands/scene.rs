//! `scene` command: compile and print a tileset.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use cityscene::scene::{BuildRequest, SceneBuilder};
use tracing::info;

use super::common::{load_config, load_dataset, load_rules};
use crate::error::CliError;

/// Arguments of the `scene` command.
#[derive(Debug, Args)]
pub struct SceneArgs {
    /// City name as configured in the cities configuration
    #[arg(long)]
    pub city: String,

    /// Layer of the city
    #[arg(long)]
    pub layer: String,

    /// Rule set as inline JSON or a path to a JSON file
    #[arg(long)]
    pub rules: String,

    /// JSON dataset loaded into the in-memory store
    #[arg(long)]
    pub dataset: PathBuf,

    /// Deepest tile depth to include
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Continuation tile (requires --depth)
    #[arg(long)]
    pub tile: Option<i64>,

    /// Starting depth of a continuation, the depth of the tile's children (requires --tile)
    #[arg(long)]
    pub depth: Option<u32>,

    /// Write the tileset to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Pretty-print the tileset JSON
    #[arg(long)]
    pub pretty: bool,
}

/// Run the scene command.
pub fn run(config_path: Option<PathBuf>, args: SceneArgs) -> Result<(), CliError> {
    let config = load_config(config_path.as_deref())?;
    let store = load_dataset(&args.dataset)?;
    let rules = load_rules(&args.rules)?;

    let builder = SceneBuilder::new(&store, &config, &args.city, &args.layer, &rules)?;
    let tileset = builder.build(BuildRequest::new(args.max_depth, args.tile, args.depth))?;

    let json = if args.pretty {
        tileset.to_json_pretty()
    } else {
        tileset.to_json()
    }
    .map_err(|e| CliError::Output(e.to_string()))?;

    info!(queries = store.query_count(), "Tileset compiled");

    match args.output {
        Some(path) => fs::write(&path, json)
            .map_err(|e| CliError::Output(format!("{}: {}", path.display(), e)))?,
        None => println!("{}", json),
    }
    Ok(())
}
