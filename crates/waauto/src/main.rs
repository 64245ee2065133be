// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! waauto - WhatsApp automation dashboard service.
//!
//! This is the binary entry point for the waauto daemon.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod serve;

/// waauto - WhatsApp automation dashboard service.
#[derive(Parser, Debug)]
#[command(name = "waauto", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the dashboard server, scheduler, and WhatsApp bridge link.
    Serve,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match waauto_config::load_and_validate() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("waauto: {e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("waauto serve: {e}");
                std::process::exit(1);
            }
        }
        None => {
            println!("waauto: use --help for available commands");
        }
    }
}
