//! Command-line interface for `ReelTrack`.

mod commands;

use clap::{Parser, Subcommand};

/// `ReelTrack` - personal movie and TV tracker
#[derive(Parser)]
#[command(name = "reeltrack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the HTTP API (and the refresh scheduler when enabled)
    #[command(alias = "-d", alias = "--daemon", alias = "serve")]
    Daemon,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Search TMDb and the local catalogue
    #[command(alias = "s")]
    Search {
        /// Search query
        #[arg(required = true)]
        query: Vec<String>,
        /// Restrict to `movie` or `tv`
        #[arg(long = "type")]
        media_type: Option<String>,
    },

    /// Re-fetch provider metadata
    Refresh {
        /// Refresh a single media row instead of the whole catalogue
        #[arg(long)]
        id: Option<i32>,
    },

    /// Create an account
    CreateUser {
        username: String,
        email: String,
        nickname: String,
        /// Falls back to the `REELTRACK_PASSWORD` environment variable
        #[arg(long)]
        password: Option<String>,
    },
}

pub use commands::*;
