//! Command-line interface for the ritual host.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Hollow ritual host - authoritative reducer runner
#[derive(Parser, Debug)]
#[command(name = "ritual_host")]
#[command(about = "Authoritative host for the Hollow ritual game", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Host configuration file (TOML). Defaults apply when omitted.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a scripted game and print the final snapshot
    Replay {
        /// Script file (TOML, or JSON by extension)
        script: PathBuf,

        /// Pretty-print the snapshot
        #[arg(long)]
        pretty: bool,

        /// Override the host's random seed
        #[arg(long)]
        rng_seed: Option<u64>,
    },

    /// Show the role deal for a table size and seed
    Roles {
        /// Number of players
        #[arg(short, long)]
        players: usize,

        /// Deal seed
        #[arg(short, long)]
        seed: String,
    },
}
