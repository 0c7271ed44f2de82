//! # Quadrille - Graph Record Mapper
//!
//! The main binary for the Quadrille mapping layer.
//!
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │               apps/quadrille (THE BINARY)         │
//! │                                                   │
//! │   ┌─────────────┐        ┌───────────────────┐    │
//! │   │   CLI       │        │  Schema loading   │    │
//! │   │  (clap)     │        │  (toml)           │    │
//! │   └──────┬──────┘        └─────────┬─────────┘    │
//! │          │                         │              │
//! │          └────────────┬────────────┘              │
//! │                       ▼                           │
//! │              ┌─────────────────┐                  │
//! │              │ quadrille-core  │                  │
//! │              │  (THE LOGIC)    │                  │
//! │              └─────────────────┘                  │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Summarize a resolved record stream
//! quadrille resolve -S schema.toml -f people.json -t Person
//!
//! # Compile records into N-Quad assertion statements
//! quadrille assert -S schema.toml -f people.json -t Person
//! ```

use clap::Parser;
use quadrille::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Initialize tracing — QUADRILLE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("QUADRILLE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "quadrille=warn".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if cli.verbose && !cli.quiet {
        eprintln!("quadrille v{}", env!("CARGO_PKG_VERSION"));
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
