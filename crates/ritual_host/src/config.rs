//! Host configuration loaded from TOML.
//!
//! ```toml
//! room = "moonlit-glade"
//! rng_seed = 7
//!
//! [game]
//! maxRounds = 7
//!
//! [durations]
//! discussionMs = 120000
//!
//! [rulesets]
//! enableInfection = true
//! ```

use crate::error::ConfigError;
use derive_getters::Getters;
use ritual_engine::{GameConfig, GameMeta, PhaseDurations, Rulesets, SHARED_STATE_SCHEMA_VERSION};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Environment variable that overrides the configured generator seed.
pub const RNG_SEED_ENV: &str = "HOLLOW_RNG_SEED";

/// Configuration for one authoritative host.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
pub struct HostConfig {
    /// Room snapshots are published to.
    #[serde(default = "default_room")]
    room: String,

    /// Seed for the host's random source. Entropy when absent.
    #[serde(default)]
    rng_seed: Option<u64>,

    /// Rules tuning.
    #[serde(default)]
    game: GameConfig,

    /// Phase timers.
    #[serde(default)]
    durations: PhaseDurations,

    /// Optional mechanics.
    #[serde(default)]
    rulesets: Rulesets,
}

fn default_room() -> String {
    "hollow".to_string()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            room: default_room(),
            rng_seed: None,
            game: GameConfig::default(),
            durations: PhaseDurations::default(),
            rulesets: Rulesets::default(),
        }
    }
}

impl HostConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml_str(&content)?;
        info!(room = %config.room, "Config loaded successfully");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from the environment.
    #[instrument(skip(self))]
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(raw) = std::env::var(RNG_SEED_ENV) {
            let seed = raw.trim().parse::<u64>().map_err(|e| {
                ConfigError::new(format!("{} must be an unsigned integer: {}", RNG_SEED_ENV, e))
            })?;
            debug!(seed, "Seed overridden from environment");
            self.rng_seed = Some(seed);
        }
        Ok(self)
    }

    /// Replaces the generator seed.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Metadata handed to the engine when a game starts.
    pub fn meta(&self) -> GameMeta {
        GameMeta {
            schema_version: SHARED_STATE_SCHEMA_VERSION,
            config: self.game.clone(),
            phase_durations: self.durations.clone(),
            rulesets: self.rulesets,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let game = &self.game;
        if !(0.0..=1.0).contains(&game.pure_threshold)
            || !(0.0..=1.0).contains(&game.backfire_threshold)
        {
            return Err(ConfigError::new(
                "Ritual thresholds must lie in [0, 1]".to_string(),
            ));
        }
        if game.pure_threshold > game.backfire_threshold {
            return Err(ConfigError::new(format!(
                "pureThreshold {} exceeds backfireThreshold {}",
                game.pure_threshold, game.backfire_threshold
            )));
        }
        if game.max_rounds == 0 {
            return Err(ConfigError::new("maxRounds must be at least 1".to_string()));
        }
        if game.infection_start_round > game.infection_end_round {
            warn!(
                start = game.infection_start_round,
                end = game.infection_end_round,
                "Infection window is empty"
            );
        }
        Ok(())
    }
}
