//! CLI interface for the tutor
//!
//! Commands and global flags, parsed with clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Conversational language tutor
///
/// Asks a question in the target language, waits for your answer and
/// evaluates it. Runs as an HTTP service or interactively in the terminal.
#[derive(Parser, Debug)]
#[command(name = "tutor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP chat server
    Serve {
        /// Address to listen on (overrides server.bind)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Take a quiz in the terminal
    Chat,

    /// List stored threads, or show one thread in full
    History {
        /// Thread to show
        thread_id: Option<String>,

        /// Number of threads to list (default: 10)
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show the effective configuration
    Config,
}
