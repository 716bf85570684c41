//! `surveykml layers` - list the layers of a drawing.

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use super::common::{print_layers, scan, LayerSelection};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for `layers`.
#[derive(Debug, Args)]
pub struct LayersArgs {
    /// DXF drawing to inspect
    pub drawing: PathBuf,

    #[command(flatten)]
    pub selection: LayerSelection,
}

pub fn run(runner: &CliRunner, args: LayersArgs) -> Result<(), CliError> {
    runner.log_startup("layers");

    let (drawing, mut registry) = scan(&args.drawing)?;
    args.selection.apply(&mut registry)?;
    info!(
        drawing = %args.drawing.display(),
        layers = registry.len(),
        entities = drawing.entities().len(),
        "Drawing scanned"
    );

    println!(
        "{} {} ({} entities)",
        style("Drawing:").bold(),
        drawing.name(),
        drawing.entities().len()
    );
    println!();
    if registry.is_empty() {
        println!("  No convertible entities found.");
        return Ok(());
    }
    print_layers(&registry);
    Ok(())
}
