// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Gatehouse CLI
//!
//! The `gatehouse` binary runs a gateway-fronted server and answers operator
//! questions about roles, permissions and configuration.
//!
//! ## Commands
//!
//! - `gatehouse serve [--host H] [--port P]` - Run the protected HTTP server
//! - `gatehouse config show|validate|generate` - Configuration management
//! - `gatehouse roles list|show <name>` - Built-in roles
//! - `gatehouse check <agent-type> <permission>` - Resolve one permission

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use gatehouse_cli::commands::{self, ConfigCommand, RolesCommand};
use gatehouse_core::domain::config::GatehouseConfig;

/// Gatehouse - request admission and permission resolution for agent traffic
#[derive(Parser)]
#[command(name = "gatehouse")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "GATEHOUSE_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "GATEHOUSE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an HTTP server fronted by the gateway and permission layers
    #[command(name = "serve")]
    Serve {
        /// Bind host
        #[arg(long, env = "GATEHOUSE_HOST", default_value = "127.0.0.1")]
        host: String,

        /// Bind port
        #[arg(long, env = "GATEHOUSE_PORT", default_value = "8000")]
        port: u16,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Inspect built-in roles
    #[command(name = "roles")]
    Roles {
        #[command(subcommand)]
        command: RolesCommand,
    },

    /// Resolve a permission for an agent type
    #[command(name = "check")]
    Check {
        /// Agent type (role name)
        agent_type: String,

        /// Permission wire name, e.g. admin_write
        permission: String,

        /// Agent id to resolve for
        #[arg(long)]
        agent_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env before clap so env-backed flags see it
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Commands::Serve { host, port } => {
            let config = GatehouseConfig::load_or_default(cli.config)
                .context("Failed to load configuration")?;
            info!("Starting Gatehouse v{}", env!("CARGO_PKG_VERSION"));
            commands::serve::execute(host, port, config).await?;
        }
        Commands::Config { command } => {
            commands::config::handle_command(command, cli.config).await?;
        }
        Commands::Roles { command } => commands::roles::handle_command(command).await?,
        Commands::Check {
            agent_type,
            permission,
            agent_id,
        } => {
            let resolution =
                commands::check::execute(agent_type, permission, agent_id, cli.config).await?;
            if !resolution.allowed() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
