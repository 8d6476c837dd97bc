//! Ritual engine - the authoritative reducer for the Hollow ritual game
//!
//! A table of witches hides a Hollow minority. Each round the table
//! nominates a performer, everyone secretly adds an ingredient to the
//! cauldron, the ritual resolves, the performer may spend a role power, and
//! a council may burn one suspect.
//!
//! # Architecture
//!
//! - **Engine**: [`apply_intent`] folds one [`Intent`] into a fresh [`SharedState`]
//! - **Ritual**: corruption index, severity, deaths
//! - **Powers**: role powers unlocked by favorable rituals
//! - **Tally / Victory**: vote counting and win conditions
//! - **Mechanics**: optional corruption and infection rules
//!
//! All randomness flows through the [`EngineContext`] random source, so a
//! seeded generator replays a game exactly.
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng;
//! use ritual_engine::{apply_intent, EngineContext, Intent, Phase, PlayerSeed};
//!
//! # fn main() -> Result<(), ritual_engine::EngineError> {
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let mut ctx = EngineContext::new(0, &mut rng);
//!
//! let players = ["ash", "briar", "cinder"]
//!     .iter()
//!     .map(|id| PlayerSeed::new(id.to_string(), id.to_string(), *id == "ash"))
//!     .collect();
//! let state = apply_intent(
//!     None,
//!     Intent::StartGame { players, seed: "moon".into(), meta: None },
//!     &mut ctx,
//! )?;
//! assert_eq!(state.phase, Phase::NominationDiscussion);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod catalog;
mod chance;
mod engine;
mod error;
mod intent;
mod invariants;
mod mechanics;
mod powers;
mod ritual;
mod roles;
mod state;
mod tally;
mod victory;

// Crate-level exports - Catalog
pub use catalog::{Faction, IngredientCategory, IngredientId, MAX_INGREDIENT_WEIGHT, RoleId};

// Crate-level exports - Randomness
pub use chance::SeedSequence;

// Crate-level exports - Reducer
pub use engine::{EngineContext, apply_intent};
pub use intent::{Intent, PlayerSeed};

// Crate-level exports - Errors
pub use error::{EngineError, EngineErrorKind};

// Crate-level exports - Invariants
pub use invariants::{
    Invariant, InvariantSet, InvariantViolation, PendingPowerScopedInvariant,
    PerformerSetInvariant, RoundStartsAtOneInvariant, SelectionsBoundedInvariant,
    SharedStateInvariants, VotesReferenceLivingInvariant, WinnerIsTerminalInvariant,
    check_transition,
};

// Crate-level exports - Rules
pub use mechanics::{apply_corruption, apply_infection};
pub use powers::{grant_power, power_for_role, resolve_power};
pub use ritual::{
    IngredientPlay, RitualInput, RitualResult, classify, corruption_index, dominant_ingredient,
    resolve_ritual,
};
pub use roles::{MAX_PLAYERS, MIN_PLAYERS, assign_roles, roles_for_player_count};
pub use tally::{Tally, majority_threshold};
pub use victory::{
    REASON_COVEN_ENDURES, REASON_HOLLOW_ELIMINATED, REASON_HOLLOW_PARITY,
    evaluate as evaluate_victory,
};

// Crate-level exports - State
pub use state::{
    AlignmentInsight, CouncilChoice, GameConfig, GameMeta, IngredientInsight, Millis,
    OutcomeSeverity, PendingPower, Phase, PhaseDurations, PlayerId, PlayerStatus,
    PowerKind, PowerResolution, Rulesets, RoundOutcome, SHARED_STATE_SCHEMA_VERSION,
    SharedState, Victory, VoteRevealEntry,
};
