//! `surveykml locate` - acquire the current position.
//!
//! This build has no platform positioning service; positions come from a
//! replay file of recorded fixes.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use console::style;
use surveykml::location::{
    replay_backend, AcquisitionOutcome, LocationSession, SessionUpdate,
};
use tracing::info;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for `locate`.
#[derive(Debug, Args)]
pub struct LocateArgs {
    /// CSV of recorded fixes (provider,lat,lon,alt,accuracy)
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Give up after this many seconds (default: config location.timeout_secs)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}

pub async fn run(runner: &CliRunner, args: LocateArgs) -> Result<(), CliError> {
    runner.log_startup("locate");
    let config = runner.config();

    let replay = args
        .replay
        .or_else(|| config.location.replay_file.clone())
        .ok_or(CliError::NoBackend)?;
    let backend = replay_backend(&replay)?;
    info!(replay = %replay.display(), "Using replay backend");

    let mut settings = config.location.acquisition_settings();
    if let Some(secs) = args.timeout {
        settings.timeout = Duration::from_secs(secs);
    }

    println!("Acquiring location (Ctrl-C to stop)...");
    let mut handle = LocationSession::new(Arc::new(backend), settings).start();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut stopping = false;

    loop {
        tokio::select! {
            update = handle.next_update() => match update {
                Some(update) => print_update(&update),
                None => break,
            },
            _ = &mut ctrl_c, if !stopping => {
                stopping = true;
                println!("Stopping...");
                handle.stop();
            }
        }
    }

    match handle.outcome().await {
        AcquisitionOutcome::Done(fix) => {
            println!();
            println!("{}", style("Position").bold());
            for line in fix.summary().lines() {
                println!("  {}", line);
            }
            Ok(())
        }
        AcquisitionOutcome::Cancelled => {
            println!("Cancelled.");
            Ok(())
        }
        AcquisitionOutcome::Failed(failure) => Err(CliError::Location(failure)),
    }
}

fn print_update(update: &SessionUpdate) {
    match update {
        SessionUpdate::StateChanged(state) => {
            println!("  {} {}", style("state").dim(), state);
        }
        SessionUpdate::Elapsed {
            elapsed,
            best_accuracy,
        } => match best_accuracy {
            Some(accuracy) => println!(
                "  {:>3}s  best ±{:.1} m",
                elapsed.as_secs(),
                accuracy
            ),
            None => println!("  {:>3}s  waiting for a fix", elapsed.as_secs()),
        },
        SessionUpdate::BestFixImproved(fix) => {
            println!(
                "  {} ±{:.1} m from {}",
                style("fix").green(),
                fix.accuracy,
                fix.provider
            );
        }
        SessionUpdate::Finished(_) => {}
    }
}
