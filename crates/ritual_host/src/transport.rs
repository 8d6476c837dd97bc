//! The seam between the authority and whatever carries messages.
//!
//! Outbound, the authority publishes whole [`Snapshot`]s to a room.
//! Inbound, participants send [`ActionMessage`]s that the authority turns
//! into engine intents. No participant other than the authority ever calls
//! the reducer.

use crate::error::{HostError, HostErrorKind};
use derive_getters::Getters;
use derive_new::new;
use ritual_engine::{CouncilChoice, IngredientId, Intent, PlayerId, SharedState};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;
use tracing::{debug, instrument};

/// Something a participant asks the authority to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerAction {
    /// Nominate a performer.
    #[serde(rename_all = "camelCase")]
    NominationVote {
        /// Nominee.
        target_id: PlayerId,
    },
    /// Lock in an ingredient.
    Ingredient {
        /// Chosen ingredient.
        ingredient: IngredientId,
    },
    /// Spend the pending performer power.
    #[serde(rename_all = "camelCase")]
    PowerTarget {
        /// Chosen target.
        target_id: PlayerId,
    },
    /// Cast a council ballot.
    CouncilVote {
        /// Ballot.
        target: CouncilChoice,
    },
    /// Dismiss the tutorial.
    TutorialComplete,
    /// Skip ahead to the next phase. Host only.
    AdvancePhase,
}

impl PlayerAction {
    /// Whether only the host may send this action.
    pub fn is_host_only(&self) -> bool {
        matches!(self, PlayerAction::AdvancePhase)
    }
}

/// An action tagged with its sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct ActionMessage {
    /// Sender.
    pub player_id: PlayerId,
    /// Requested action.
    pub action: PlayerAction,
}

impl ActionMessage {
    /// The engine intent this message asks for.
    ///
    /// `AdvancePhase` maps to `AdvanceFromDiscussion` during discussion and
    /// to a phase timeout otherwise, so the host can move any stalled phase.
    pub fn into_intent(self, state: Option<&SharedState>) -> Intent {
        let player_id = self.player_id;
        match self.action {
            PlayerAction::NominationVote { target_id } => Intent::SubmitNominationVote {
                player_id,
                target_id,
            },
            PlayerAction::Ingredient { ingredient } => Intent::SubmitIngredient {
                player_id,
                ingredient,
            },
            PlayerAction::PowerTarget { target_id } => Intent::SubmitPowerTarget {
                player_id,
                target_id,
            },
            PlayerAction::CouncilVote { target } => Intent::SubmitCouncilVote { player_id, target },
            PlayerAction::TutorialComplete => Intent::MarkTutorialComplete,
            PlayerAction::AdvancePhase => match state.map(|s| s.phase) {
                Some(ritual_engine::Phase::NominationDiscussion) | None => {
                    Intent::AdvanceFromDiscussion
                }
                Some(_) => Intent::PhaseTimeout,
            },
        }
    }
}

/// A published copy of the authoritative state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, new)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Increases by one with every publication from the same authority.
    sequence: u64,
    /// The state at publication time.
    state: SharedState,
}

impl Snapshot {
    /// Encodes the snapshot as JSON.
    pub fn to_json(&self) -> Result<String, HostError> {
        serde_json::to_string(self)
            .map_err(|e| HostError::new(HostErrorKind::Transport(e.to_string())))
    }

    /// Consumes the snapshot, keeping the state.
    pub fn into_state(self) -> SharedState {
        self.state
    }

    /// Decodes a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, HostError> {
        serde_json::from_str(json)
            .map_err(|e| HostError::new(HostErrorKind::Transport(e.to_string())))
    }
}

/// Delivers snapshots to a room.
pub trait Transport {
    /// Publishes `snapshot` to everyone in `room`.
    fn deliver_snapshot(&mut self, room: &str, snapshot: &Snapshot) -> Result<(), HostError>;
}

/// A transport that keeps every delivery in memory.
#[derive(Debug, Clone, Default, Getters)]
pub struct RecordingTransport {
    /// Room and encoded snapshot, in delivery order.
    deliveries: Vec<(String, String)>,
}

impl RecordingTransport {
    /// Creates an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes the most recent delivery.
    pub fn latest(&self) -> Option<Result<Snapshot, HostError>> {
        self.deliveries
            .last()
            .map(|(_, json)| Snapshot::from_json(json))
    }
}

impl Transport for RecordingTransport {
    #[instrument(skip(self, snapshot), fields(sequence = snapshot.sequence))]
    fn deliver_snapshot(&mut self, room: &str, snapshot: &Snapshot) -> Result<(), HostError> {
        let json = snapshot.to_json()?;
        debug!(bytes = json.len(), "Snapshot recorded");
        self.deliveries.push((room.to_string(), json));
        Ok(())
    }
}
