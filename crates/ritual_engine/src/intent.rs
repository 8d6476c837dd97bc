//! First-class intents accepted by the reducer.
//!
//! Intents are domain events, not side effects: they carry the acting
//! player's request and can be logged, serialized, and replayed.

use crate::catalog::IngredientId;
use crate::state::{CouncilChoice, GameMeta, PlayerId};
use derive_new::new;
use serde::{Deserialize, Serialize};

/// A roster entry supplied when a game starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSeed {
    /// Player id.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Whether this player runs the authority.
    #[serde(default)]
    pub is_host: bool,
}

/// Everything the reducer can be asked to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    /// Deal roles and begin round one. Replaces any existing game.
    StartGame {
        /// Roster in seat order.
        players: Vec<PlayerSeed>,
        /// Seed for role dealing.
        seed: String,
        /// Rules for this game; defaults apply when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<GameMeta>,
    },
    /// Close discussion and open the nomination vote.
    AdvanceFromDiscussion,
    /// Nominate a performer.
    #[serde(rename_all = "camelCase")]
    SubmitNominationVote {
        /// Voter.
        player_id: PlayerId,
        /// Nominee.
        target_id: PlayerId,
    },
    /// Finish the nomination reveal.
    CompleteNominationReveal,
    /// Lock in an ingredient.
    #[serde(rename_all = "camelCase")]
    SubmitIngredient {
        /// Contributor.
        player_id: PlayerId,
        /// Chosen ingredient.
        ingredient: IngredientId,
    },
    /// Spend a pending performer power.
    #[serde(rename_all = "camelCase")]
    SubmitPowerTarget {
        /// Performer.
        player_id: PlayerId,
        /// Chosen target.
        target_id: PlayerId,
    },
    /// Cast a council ballot.
    #[serde(rename_all = "camelCase")]
    SubmitCouncilVote {
        /// Voter.
        player_id: PlayerId,
        /// Ballot.
        target: CouncilChoice,
    },
    /// The table dismissed the tutorial.
    MarkTutorialComplete,
    /// The active phase's deadline passed.
    PhaseTimeout,
}

impl Intent {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Intent::StartGame { .. } => "START_GAME",
            Intent::AdvanceFromDiscussion => "ADVANCE_FROM_DISCUSSION",
            Intent::SubmitNominationVote { .. } => "SUBMIT_NOMINATION_VOTE",
            Intent::CompleteNominationReveal => "COMPLETE_NOMINATION_REVEAL",
            Intent::SubmitIngredient { .. } => "SUBMIT_INGREDIENT",
            Intent::SubmitPowerTarget { .. } => "SUBMIT_POWER_TARGET",
            Intent::SubmitCouncilVote { .. } => "SUBMIT_COUNCIL_VOTE",
            Intent::MarkTutorialComplete => "MARK_TUTORIAL_COMPLETE",
            Intent::PhaseTimeout => "PHASE_TIMEOUT",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::SubmitNominationVote {
                player_id,
                target_id,
            }
            | Intent::SubmitPowerTarget {
                player_id,
                target_id,
            } => write!(f, "{} {} -> {}", self.name(), player_id, target_id),
            Intent::SubmitIngredient {
                player_id,
                ingredient,
            } => write!(f, "{} {} -> {}", self.name(), player_id, ingredient),
            Intent::SubmitCouncilVote { player_id, target } => match target.target() {
                Some(t) => write!(f, "{} {} -> {}", self.name(), player_id, t),
                None => write!(f, "{} {} -> skip", self.name(), player_id),
            },
            _ => f.write_str(self.name()),
        }
    }
}
