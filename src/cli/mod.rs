//! Command-line interface.

mod commands;

use clap::{Parser, Subcommand};

/// Shufflr - self-hosted random image API
#[derive(Parser)]
#[command(name = "shufflr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server (default)
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Manage API keys without the web UI
    Keys {
        #[command(subcommand)]
        command: KeysCommands,
    },
}

#[derive(Subcommand)]
pub enum KeysCommands {
    /// Create a key and print its token once
    Create {
        /// Display name
        #[arg(required = true)]
        name: Vec<String>,
    },
    /// List all keys
    #[command(alias = "ls")]
    List,
    /// Disable a key
    Disable {
        /// Key ID
        id: i32,
    },
}

pub use commands::*;
