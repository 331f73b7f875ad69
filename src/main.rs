//! Unified keyward CLI.
//!
//! This binary provides a unified interface to all keyward components:
//! - `keyward auth` - Manage users, roles and schema upgrades
//! - `keyward config` - Validate a configuration file
//!
//! `keyward auth` can also be run as the standalone `keyward-auth` binary.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use keyward_config::CliOverrides;

/// Keyward unified CLI.
#[derive(Parser)]
#[command(
    name = "keyward",
    version,
    about = "Database-backed username/password authentication",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users, roles and schema upgrades.
    #[command(name = "auth")]
    Auth(keyward_auth::AuthArgs),

    /// Validate a configuration file and print the effective settings.
    #[command(name = "config")]
    Config {
        /// Configuration file (.toml, .json, .jsonc, .yaml, .yml).
        #[arg(short, long)]
        config: PathBuf,

        #[command(flatten)]
        overrides: CliOverrides,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Auth(args) => keyward_auth::cli::run(args).await,
        Commands::Config { config, overrides } => {
            match keyward_auth::cli::resolve_config(Some(config.as_path()), &overrides) {
                Ok(config) => {
                    println!("{config:#?}");
                    Ok(())
                }
                Err(e) => Err(e.into()),
            }
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
