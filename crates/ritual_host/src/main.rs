//! Ritual host - CLI
//!
//! Replays scripted games through the authority and inspects role deals.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use ritual_engine::assign_roles;
use ritual_host::{Authority, HostConfig, ManualClock, RecordingTransport, ReplayScript};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Replay {
            script,
            pretty,
            rng_seed,
        } => run_replay(config, script, pretty, rng_seed),
        Command::Roles { players, seed } => show_roles(players, &seed),
    }
}

/// Loads the host config, falling back to defaults, then applies env overrides.
fn load_config(path: Option<&Path>) -> Result<HostConfig> {
    let config = match path {
        Some(path) => HostConfig::from_file(path)?,
        None => HostConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}

/// Replays a script and prints the final snapshot.
#[instrument(skip(config, script), fields(script = %script.display()))]
fn run_replay(config: HostConfig, script: PathBuf, pretty: bool, rng_seed: Option<u64>) -> Result<()> {
    let config = match rng_seed {
        Some(seed) => config.with_rng_seed(seed),
        None => config,
    };
    let replay = ReplayScript::from_file(&script)?;

    let clock = ManualClock::new(0);
    let mut authority = Authority::new(&config, clock.clone(), RecordingTransport::new());
    let summary = replay.run(&mut authority, &clock)?;
    info!(?summary, "Replay complete");

    let snapshot = authority
        .transport()
        .latest()
        .context("Replay published no snapshots")??;

    let json = if pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    println!("{}", json);
    Ok(())
}

/// Prints the seat-ordered role deal for a table.
fn show_roles(players: usize, seed: &str) -> Result<()> {
    let roles = assign_roles(players, seed)?;
    for (seat, role) in roles.iter().enumerate() {
        println!("{:>2}  {:<10} {}", seat, role.display_name(), role.faction());
    }
    Ok(())
}
