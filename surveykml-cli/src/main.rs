//! SurveyKML CLI - Command-line interface
//!
//! Converts SLD99 survey drawings to KML and reports the current position.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::convert::ConvertArgs;
use commands::layers::LayersArgs;
use commands::locate::LocateArgs;
use commands::transform::TransformCommands;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "surveykml")]
#[command(version = surveykml::VERSION)]
#[command(about = "Convert SLD99 survey drawings to KML for Google Earth", long_about = None)]
struct Cli {
    /// Use this config file instead of ~/.surveykml/config.ini
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Debug logging, mirrored to stdout
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the layers of a DXF drawing with entity counts and colors
    Layers(LayersArgs),

    /// Convert a DXF drawing to KML
    Convert(ConvertArgs),

    /// Convert a single coordinate between SLD99 and WGS84
    Transform {
        #[command(subcommand)]
        command: TransformCommands,
    },

    /// Acquire the current position in WGS84 and SLD99
    Locate(LocateArgs),

    /// View or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = dispatch(cli).await {
        e.exit();
    }
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Transform { command } => commands::transform::run(command),
        Commands::Config { command } => commands::config::run(command, config_path),
        Commands::Layers(args) => {
            let runner = CliRunner::new(config_path, cli.debug)?;
            commands::layers::run(&runner, args)
        }
        Commands::Convert(args) => {
            let runner = CliRunner::new(config_path, cli.debug)?;
            commands::convert::run(&runner, args).await
        }
        Commands::Locate(args) => {
            let runner = CliRunner::new(config_path, cli.debug)?;
            commands::locate::run(&runner, args).await
        }
    }
}
