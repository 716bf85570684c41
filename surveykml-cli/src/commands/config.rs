//! Configuration management CLI commands.
//!
//! `config get`, `config set`, `config list` and `config path`.

use std::path::Path;

use clap::Subcommand;
use surveykml::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;
use crate::runner::load_config;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., location.timeout_secs)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., conversion.on_collision)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand against `config_path` or the default file.
pub fn run(command: ConfigCommands, config_path: Option<&Path>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => run_get(&key, config_path),
        ConfigCommands::Set { key, value } => run_set(&key, &value, config_path),
        ConfigCommands::List => run_list(config_path),
        ConfigCommands::Path => {
            println!("{}", target_path(config_path).display());
            Ok(())
        }
    }
}

fn target_path(config_path: Option<&Path>) -> std::path::PathBuf {
    config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path)
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'surveykml config list' to see available keys.",
            key
        ))
    })
}

fn run_get(key: &str, config_path: Option<&Path>) -> Result<(), CliError> {
    let config_key = parse_key(key)?;
    let config = load_config(config_path)?;
    let value = config_key.get(&config);

    if value.is_empty() {
        println!("(not set)");
    } else {
        println!("{}", value);
    }
    Ok(())
}

fn run_set(key: &str, value: &str, config_path: Option<&Path>) -> Result<(), CliError> {
    let config_key = parse_key(key)?;
    let mut config = load_config(config_path)?;
    config_key
        .set(&mut config, value)
        .map_err(|e| CliError::Config(e.to_string()))?;
    save(&config, config_path)?;

    println!("Set {} = {}", config_key.name(), config_key.get(&config));
    Ok(())
}

fn save(config: &ConfigFile, config_path: Option<&Path>) -> Result<(), CliError> {
    match config_path {
        Some(path) => config.save_to(path)?,
        None => config.save()?,
    }
    Ok(())
}

fn run_list(config_path: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(config_path)?;

    println!("Configuration Settings");
    println!("======================");
    println!();

    let mut current_section = "";
    for key in ConfigKey::all() {
        let section = key.section();
        if section != current_section {
            if !current_section.is_empty() {
                println!();
            }
            println!("[{}]", section);
            current_section = section;
        }

        let value = key.get(&config);
        if value.is_empty() {
            println!("  {} = (not set)", key.key_name());
        } else {
            println!("  {} = {}", key.key_name(), value);
        }
    }
    Ok(())
}
