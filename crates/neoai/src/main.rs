// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! neoai - authenticated, quota-limited LLM chat gateway.
//!
//! This is the binary entry point.

mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use neoai_config::NeoaiConfig;

/// neoai - authenticated, quota-limited LLM chat gateway.
#[derive(Parser, Debug)]
#[command(name = "neoai", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway (default).
    Serve,
    /// Validate configuration, print warnings, and exit.
    CheckConfig,
}

fn load(path: Option<&PathBuf>) -> NeoaiConfig {
    let loaded = match path {
        Some(path) => neoai_config::load_and_validate_path(path),
        None => neoai_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            neoai_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load(cli.config.as_ref());

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("neoai: {e}");
                std::process::exit(1);
            }
        }
        Commands::CheckConfig => {
            for warning in neoai_config::collect_warnings(&config) {
                eprintln!("warning: {warning}");
            }
            println!(
                "neoai: config ok (environment={}, listen={}:{})",
                config.server.environment, config.server.bind_address, config.server.port
            );
        }
    }
}
