//! `surveykml convert` - DXF to KML.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, ValueEnum};
use console::style;
use dialoguer::{theme::ColorfulTheme, Select};
use surveykml::config::CollisionPolicy;
use surveykml::convert::{
    spawn_conversion, CollisionDecision, ConversionOutcome, ConversionResult, FinalizeOutcome,
};
use tracing::info;

use super::common::{print_layers, scan, LayerSelection};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Collision handling on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CollisionArg {
    /// Prompt (requires a terminal)
    Ask,
    /// Replace the existing file
    Overwrite,
    /// Write name_1.kml, name_2.kml, ...
    Rename,
    /// Keep the existing file and discard the result
    Cancel,
}

impl From<CollisionArg> for CollisionPolicy {
    fn from(arg: CollisionArg) -> Self {
        match arg {
            CollisionArg::Ask => CollisionPolicy::Ask,
            CollisionArg::Overwrite => CollisionPolicy::Overwrite,
            CollisionArg::Rename => CollisionPolicy::Rename,
            CollisionArg::Cancel => CollisionPolicy::Cancel,
        }
    }
}

/// Arguments for `convert`.
#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// DXF drawing in SLD99 grid coordinates
    pub drawing: PathBuf,

    /// Output directory (default: config conversion.output_dir, else beside the drawing)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Document name shown in Google Earth
    #[arg(long)]
    pub name: Option<String>,

    /// What to do if the KML file already exists
    #[arg(long, value_enum)]
    pub on_collision: Option<CollisionArg>,

    #[command(flatten)]
    pub selection: LayerSelection,
}

pub async fn run(runner: &CliRunner, args: ConvertArgs) -> Result<(), CliError> {
    runner.log_startup("convert");
    let config = runner.config();

    let (_, mut registry) = scan(&args.drawing)?;
    args.selection.apply(&mut registry)?;
    print_layers(&registry);
    println!();

    let destination = output_dir(
        &args.drawing,
        args.output.as_deref(),
        config.conversion.output_dir.as_deref(),
    );
    let policy: CollisionPolicy = args
        .on_collision
        .map(CollisionPolicy::from)
        .unwrap_or(config.conversion.on_collision);

    let pipeline = Arc::new(runner.pipeline(args.name));
    let mut task = spawn_conversion(
        Arc::clone(&pipeline),
        args.drawing.clone(),
        registry,
        destination,
    );

    while let Some(progress) = task.progress.recv().await {
        println!("  {} {}", style(format!("[{:>3}%]", progress.percent)).dim(), progress);
    }

    match task.finish().await? {
        ConversionOutcome::Written(result) => {
            print_written(&result);
            Ok(())
        }
        ConversionOutcome::Collision(result) => {
            let decision = match policy.decision() {
                Some(decision) => decision,
                None => prompt_decision(&result.destination)?,
            };
            info!(?decision, destination = %result.destination.display(), "Resolving collision");
            match pipeline.finalize(result, decision)? {
                FinalizeOutcome::Written(result) => print_written(&result),
                FinalizeOutcome::Cancelled => {
                    println!("Cancelled; existing file left unchanged.");
                }
            }
            Ok(())
        }
    }
}

/// Pick the output directory: flag, then config, then the drawing's folder.
fn output_dir(drawing: &Path, flag: Option<&Path>, configured: Option<&Path>) -> PathBuf {
    flag.or(configured)
        .map(Path::to_path_buf)
        .or_else(|| {
            drawing
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
        })
        .unwrap_or_else(|| PathBuf::from("."))
}

fn prompt_decision(existing: &Path) -> Result<CollisionDecision, CliError> {
    if !std::io::stdin().is_terminal() {
        return Err(CliError::Prompt(format!(
            "{} already exists; pass --on-collision overwrite|rename|cancel",
            existing.display()
        )));
    }

    let choices = ["Overwrite", "Save with a new name", "Cancel"];
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("{} already exists", existing.display()))
        .items(&choices)
        .default(1)
        .interact()
        .map_err(|e| CliError::Prompt(format!("Selection error: {}", e)))?;

    Ok(match selection {
        0 => CollisionDecision::Overwrite,
        1 => CollisionDecision::AutoRename,
        _ => CollisionDecision::Cancel,
    })
}

fn print_written(result: &ConversionResult) {
    println!();
    println!(
        "{} {}",
        style("✓ KML saved:").green().bold(),
        result.destination.display()
    );
    println!(
        "  {} features converted, {} skipped",
        result.converted, result.skipped
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_dir_precedence() {
        let drawing = Path::new("/surveys/plan.dxf");
        assert_eq!(
            output_dir(drawing, Some(Path::new("/out")), Some(Path::new("/cfg"))),
            PathBuf::from("/out")
        );
        assert_eq!(
            output_dir(drawing, None, Some(Path::new("/cfg"))),
            PathBuf::from("/cfg")
        );
        assert_eq!(output_dir(drawing, None, None), PathBuf::from("/surveys"));
        assert_eq!(
            output_dir(Path::new("plan.dxf"), None, None),
            PathBuf::from(".")
        );
    }

    #[test]
    fn test_collision_arg_maps_to_policy() {
        assert_eq!(CollisionPolicy::from(CollisionArg::Rename), CollisionPolicy::Rename);
        assert_eq!(CollisionPolicy::from(CollisionArg::Ask), CollisionPolicy::Ask);
    }
}
