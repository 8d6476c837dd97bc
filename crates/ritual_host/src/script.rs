//! Scripted games driven through an [`Authority`].
//!
//! A replay script lists the roster and a sequence of steps: participant
//! actions and clock advances. Running it against a seeded authority and a
//! manual clock reproduces a game exactly.
//!
//! ```toml
//! seed = "moon"
//!
//! [[players]]
//! id = "p0"
//! name = "Ash"
//! isHost = true
//!
//! [[steps]]
//! kind = "advance"
//! ms = 120000
//!
//! [[steps]]
//! kind = "action"
//! playerId = "p0"
//! action = { type = "NOMINATION_VOTE", targetId = "p1" }
//! ```

use crate::authority::{Authority, Delivery};
use crate::clock::ManualClock;
use crate::error::{HostError, HostErrorKind};
use crate::transport::{ActionMessage, Transport};
use ritual_engine::{Millis, PlayerSeed, SharedState};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Upper bound on timeouts fired by a single clock advance.
const MAX_TIMEOUTS_PER_ADVANCE: usize = 16;

/// One step of a replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Deliver a participant message.
    Action(ActionMessage),
    /// Move the clock forward, firing any deadlines that pass.
    Advance {
        /// Milliseconds to advance.
        ms: Millis,
    },
}

/// A complete replay: roster, deal seed, and steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayScript {
    /// Roster in seat order.
    pub players: Vec<PlayerSeed>,
    /// Role deal seed.
    pub seed: String,
    /// Steps applied after the game starts.
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

/// Counters from a finished replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Actions the authority applied.
    pub applied: usize,
    /// Actions the authority refused.
    pub refused: usize,
    /// Phase timeouts fired by clock advances.
    pub timeouts: usize,
}

impl ReplayScript {
    /// Loads a script from a TOML or JSON file, chosen by extension.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, HostError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            HostError::new(HostErrorKind::Script(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            )))
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            serde_json::from_str(&content)
                .map_err(|e| HostError::new(HostErrorKind::Script(e.to_string())))
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Parses a script from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, HostError> {
        toml::from_str(content).map_err(|e| HostError::new(HostErrorKind::Script(e.to_string())))
    }

    /// Starts the game and plays every step.
    ///
    /// Engine rejections of individual actions abort the replay; a refused
    /// host-only action does not.
    #[instrument(skip_all, fields(room = %authority.room(), steps = self.steps.len()))]
    pub fn run<T: Transport>(
        &self,
        authority: &mut Authority<ManualClock, T>,
        clock: &ManualClock,
    ) -> Result<ReplaySummary, HostError> {
        authority.start(self.players.clone(), &self.seed)?;
        let mut summary = ReplaySummary::default();

        for (index, step) in self.steps.iter().enumerate() {
            match step {
                ScriptStep::Action(message) => match authority.handle_action(message.clone())? {
                    Delivery::Applied => summary.applied += 1,
                    Delivery::Refused => summary.refused += 1,
                },
                ScriptStep::Advance { ms } => {
                    clock.advance(*ms);
                    summary.timeouts += authority.catch_up(MAX_TIMEOUTS_PER_ADVANCE)?;
                }
            }
            debug!(index, phase = ?authority.state().map(|s| s.phase), "Step applied");
        }

        info!(
            applied = summary.applied,
            refused = summary.refused,
            timeouts = summary.timeouts,
            "Replay finished"
        );
        Ok(summary)
    }
}

/// Convenience accessor for the state a replay ended in.
pub fn final_state<T: Transport>(authority: &Authority<ManualClock, T>) -> Result<&SharedState, HostError> {
    authority
        .state()
        .ok_or_else(|| HostError::new(HostErrorKind::Script("Replay produced no state".to_string())))
}
