//! Spellcheck CLI library
//!
//! Components of the `spellcheck` binary: argument parsing, TOML
//! configuration, the console chat adapter and command dispatch.

pub mod cli;
pub mod commands;
pub mod config;
pub mod console;
pub mod error;

pub use cli::{Cli, Commands};
pub use commands::{CommandDispatcher, ConsoleSession};
pub use config::AppConfig;
pub use error::{CliError, Result};
