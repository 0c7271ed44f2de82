//! # Quadrille CLI Library
//!
//! Command implementations for the `quadrille` binary, exposed as a library
//! so integration tests can drive the commands directly.

pub mod cli;
pub mod error;
pub mod schema_file;

pub use error::CliError;
