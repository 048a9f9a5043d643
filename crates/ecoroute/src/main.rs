// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ecoroute - a carbon-aware router for local language models.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod bootstrap;
mod route;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ecoroute_config::EcorouteConfig;

/// Ecoroute - a carbon-aware router for local language models.
#[derive(Parser, Debug)]
#[command(name = "ecoroute", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway.
    Serve,
    /// Route a single query and print the decision as JSON.
    Route {
        /// Query text.
        query: String,
        /// Carbon intensity in gCO2eq/kWh; read from the carbon provider when omitted.
        #[arg(long)]
        intensity: Option<f64>,
        /// Explicit model id instead of policy routing.
        #[arg(long)]
        model: Option<String>,
        /// Grid zone for the carbon lookup.
        #[arg(long)]
        zone: Option<String>,
    },
    /// Print the effective configuration as TOML.
    Config,
}

fn load_config(path: Option<&PathBuf>) -> EcorouteConfig {
    let loaded = match path {
        Some(path) => ecoroute_config::load_and_validate_path(path),
        None => ecoroute_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            ecoroute_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Route {
            query,
            intensity,
            model,
            zone,
        }) => route::run_route(config, &query, intensity, model.as_deref(), zone.as_deref()).await,
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(text) => {
                print!("{text}");
                Ok(())
            }
            Err(e) => Err(ecoroute_core::EcorouteError::Internal(format!(
                "failed to serialize configuration: {e}"
            ))),
        },
        None => {
            println!("ecoroute: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("ecoroute: {e}");
        std::process::exit(1);
    }
}
