// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use gatehouse_core::domain::config::GatehouseConfig;

const EXAMPLE_CONFIG: &str = include_str!("../../templates/config-with-examples.yaml");

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show effective configuration (file + environment overrides)
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./gatehouse.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  1. --config flag: {}", path.display()),
            None => println!("  1. --config flag: {}", "(not set)".dimmed()),
        }
        println!(
            "  2. GATEHOUSE_CONFIG_PATH: {}",
            std::env::var("GATEHOUSE_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./gatehouse.yaml");
        println!("  4. ~/.gatehouse/config.yaml");
        println!("  5. /etc/gatehouse/config.yaml");
        match GatehouseConfig::discover_config() {
            Some(found) if config_override.is_none() => {
                println!("  Using: {}", found.display().to_string().green())
            }
            _ => {}
        }
        println!();
    }

    let config = GatehouseConfig::load_or_default(config_override)
        .context("Failed to load configuration")?;

    println!("{}", "Current configuration:".bold());
    println!();
    print!("{}", render(&config)?);
    Ok(())
}

/// Effective configuration as YAML.
pub fn render(config: &GatehouseConfig) -> Result<String> {
    serde_yaml::to_string(config).context("Failed to serialize configuration")
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = GatehouseConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    write_sample(&output, with_examples)?;
    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );
    Ok(())
}

/// Write either the commented example or the serialized defaults to `output`.
pub fn write_sample(output: &std::path::Path, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        EXAMPLE_CONFIG.to_string()
    } else {
        render(&GatehouseConfig::default())?
    };
    std::fs::write(output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))
}
