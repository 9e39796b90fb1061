//! Command-line interface definitions and parsing

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Data directory for the session snapshot and stored screenshots
    #[arg(short, long)]
    pub data_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the tracker against a console chat (stdin in, stdout out)
    Run {
        /// Channel name the console messages are posted in
        #[arg(long)]
        channel: Option<String>,
    },
    /// Show the saved session state
    Status,
    /// Write an example configuration file
    InitConfig {
        /// Where to write it (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
