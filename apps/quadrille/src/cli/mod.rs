//! # Quadrille CLI Module
//!
//! This module implements the CLI interface for Quadrille.
//!
//! ## Available Commands
//!
//! - `resolve` - Resolve a record stream into an entity graph and summarize it
//! - `assert` - Compile a record stream into assertion statements (N-Quads)

mod commands;

use crate::CliError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::{cmd_assert, cmd_resolve};

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Quadrille - graph record mapper
///
/// Resolves JSON record streams into typed entity graphs and compiles them
/// into assertion statements for a graph store.
#[derive(Parser, Debug)]
#[command(name = "quadrille")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the schema description file
    #[arg(short = 'S', long, global = true, default_value = "schema.toml")]
    pub schema: PathBuf,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a record stream into an entity graph and summarize it
    Resolve {
        /// Path to the input records (JSON)
        #[arg(short = 'f', long)]
        data: PathBuf,

        /// Entry entity type of the records
        #[arg(short = 't', long = "type")]
        entry_type: String,
    },

    /// Compile a record stream into assertion statements (N-Quads)
    Assert {
        /// Path to the input records (JSON)
        #[arg(short = 'f', long)]
        data: PathBuf,

        /// Entry entity type of the records
        #[arg(short = 't', long = "type")]
        entry_type: String,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments, printing command output to stdout.
pub fn execute(cli: Cli) -> Result<(), CliError> {
    let output = match cli.command {
        Commands::Resolve { data, entry_type } => {
            cmd_resolve(&cli.schema, &data, &entry_type, cli.json_mode)?
        }
        Commands::Assert { data, entry_type } => {
            cmd_assert(&cli.schema, &data, &entry_type, cli.json_mode)?
        }
    };
    print!("{output}");
    Ok(())
}
