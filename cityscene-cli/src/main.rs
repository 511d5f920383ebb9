//! CityScene CLI - Command-line interface
//!
//! Compiles level-of-detail tilesets for configured city datasets.

mod commands;
mod error;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::scene::SceneArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "cityscene")]
#[command(version = cityscene::VERSION)]
#[command(about = "Compile level-of-detail 3D tilesets for city datasets", long_about = None)]
struct Cli {
    /// Cities configuration file (default: <config dir>/cityscene/cities.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Log debug output (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the tileset of a city layer
    Scene(SceneArgs),

    /// List configured cities, layers and representations
    Cities,

    /// Validate a rule set
    CheckRules {
        /// Rule set as inline JSON or a path to a JSON file
        rules: String,

        /// Also check representation names against this city
        #[arg(long, requires = "layer")]
        city: Option<String>,

        /// Layer used with --city
        #[arg(long, requires = "city")]
        layer: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let _guard = match logging::init_logging(level, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => CliError::LoggingInit(e.to_string()).exit(),
    };

    let result = match cli.command {
        Commands::Scene(args) => commands::scene::run(cli.config, args),
        Commands::Cities => commands::cities::run(cli.config),
        Commands::CheckRules {
            rules,
            city,
            layer,
        } => commands::check_rules::run(cli.config, &rules, city.as_deref(), layer.as_deref()),
    };

    if let Err(e) = result {
        e.exit();
    }
}
