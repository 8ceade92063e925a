// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stravach - renames Strava activities from a Telegram chat.
//!
//! This is the binary entry point for the bot.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Stravach - witty names for new Strava activities, picked in Telegram.
#[derive(Parser, Debug)]
#[command(name = "stravach", version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of the standard search path.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Run the bot, the rename queue and the HTTP gateway (default).
    Serve,
    /// Validate the configuration and report missing credentials.
    CheckConfig,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => stravach_config::load_and_validate_path(path),
        None => stravach_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            stravach_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("stravach: {e}");
                std::process::exit(1);
            }
        }
        Commands::CheckConfig => {
            let report = check::check(&config, std::env::var_os("OPENAI_API_KEY").is_some());
            report.print();
            if !report.is_ready() {
                std::process::exit(1);
            }
        }
    }
}
