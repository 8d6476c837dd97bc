//! First-class invariants over [`SharedState`].
//!
//! The reducer checks these after every transition in debug builds. Vote
//! maps are phase-scoped and only constrained while the phase that fills
//! them is active. Ingredient selections are constrained in every phase.

use crate::state::{CouncilChoice, Phase, SharedState};
use tracing::{instrument, warn};

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants checked together. Implemented for tuples.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

macro_rules! impl_invariant_set {
    ($($inv:ident),+) => {
        impl<S, $($inv),+> InvariantSet<S> for ($($inv,)+)
        where
            $($inv: Invariant<S>,)+
        {
            fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
                let mut violations = Vec::new();
                $(
                    if !$inv::holds(state) {
                        violations.push(InvariantViolation::new($inv::description()));
                    }
                )+
                if violations.is_empty() {
                    Ok(())
                } else {
                    Err(violations)
                }
            }
        }
    };
}

impl_invariant_set!(I1, I2);
impl_invariant_set!(I1, I2, I3);
impl_invariant_set!(I1, I2, I3, I4);
impl_invariant_set!(I1, I2, I3, I4, I5);
impl_invariant_set!(I1, I2, I3, I4, I5, I6);

/// Round numbers start at one.
pub struct RoundStartsAtOneInvariant;

impl Invariant<SharedState> for RoundStartsAtOneInvariant {
    fn holds(state: &SharedState) -> bool {
        state.round_number >= 1
    }

    fn description() -> &'static str {
        "Round number is at least 1"
    }
}

/// A performer is set exactly from the nomination reveal through the council.
pub struct PerformerSetInvariant;

impl Invariant<SharedState> for PerformerSetInvariant {
    fn holds(state: &SharedState) -> bool {
        match state.phase {
            Phase::NominationDiscussion => state.current_performer_id.is_none(),
            Phase::NominationReveal
            | Phase::IngredientChoice
            | Phase::RitualResolution
            | Phase::PerformerPower
            | Phase::CouncilVote => state
                .current_performer_id
                .as_ref()
                .is_some_and(|id| state.players.contains_key(id)),
            Phase::NominationVote | Phase::GameOver => true,
        }
    }

    fn description() -> &'static str {
        "Exactly one performer between nomination reveal and the next round"
    }
}

/// Open vote maps only reference living players, and nobody votes for themselves.
pub struct VotesReferenceLivingInvariant;

impl Invariant<SharedState> for VotesReferenceLivingInvariant {
    fn holds(state: &SharedState) -> bool {
        match state.phase {
            Phase::NominationVote => state.nomination_votes.iter().all(|(voter, target)| {
                voter != target && state.is_alive(voter) && state.is_alive(target)
            }),
            Phase::CouncilVote => state.council_votes.iter().all(|(voter, choice)| {
                state.is_alive(voter)
                    && match choice {
                        CouncilChoice::Target(target) => {
                            target != voter && state.is_alive(target)
                        }
                        CouncilChoice::Skip => true,
                    }
            }),
            _ => true,
        }
    }

    fn description() -> &'static str {
        "Vote map entries reference living players"
    }
}

/// Only living players have ingredients on the table, never more than the
/// living count. While ingredients are being chosen the map stays strictly
/// below it, since the last pick resolves the ritual.
pub struct SelectionsBoundedInvariant;

impl Invariant<SharedState> for SelectionsBoundedInvariant {
    fn holds(state: &SharedState) -> bool {
        let alive = state.alive_count();
        let within = if state.phase == Phase::IngredientChoice {
            state.ingredient_selections.len() < alive
        } else {
            state.ingredient_selections.len() <= alive
        };
        within
            && state
                .ingredient_selections
                .keys()
                .all(|id| state.is_alive(id))
    }

    fn description() -> &'static str {
        "Ingredient selections belong to living players and never outnumber them"
    }
}

/// A pending power exists exactly when its phase needs one.
pub struct PendingPowerScopedInvariant;

impl Invariant<SharedState> for PendingPowerScopedInvariant {
    fn holds(state: &SharedState) -> bool {
        match state.phase {
            Phase::PerformerPower => state
                .pending_power
                .as_ref()
                .is_some_and(|p| p.kind.is_targeted()),
            Phase::NominationDiscussion
            | Phase::NominationVote
            | Phase::NominationReveal
            | Phase::IngredientChoice => state.pending_power.is_none(),
            Phase::CouncilVote => state.pending_power.as_ref().is_none_or(|p| p.applied),
            Phase::RitualResolution | Phase::GameOver => true,
        }
    }

    fn description() -> &'static str {
        "Pending power is scoped to the ritual, power, and council phases"
    }
}

/// A winner is recorded exactly when the game is over.
pub struct WinnerIsTerminalInvariant;

impl Invariant<SharedState> for WinnerIsTerminalInvariant {
    fn holds(state: &SharedState) -> bool {
        state.winner.is_some() == state.phase.is_terminal()
    }

    fn description() -> &'static str {
        "Winner is set if and only if the game is over"
    }
}

/// Every invariant the reducer maintains.
pub type SharedStateInvariants = (
    RoundStartsAtOneInvariant,
    PerformerSetInvariant,
    VotesReferenceLivingInvariant,
    SelectionsBoundedInvariant,
    PendingPowerScopedInvariant,
    WinnerIsTerminalInvariant,
);

/// Checks a transition: every state invariant on `after`, plus round
/// monotonicity unless the transition started a fresh game.
#[instrument(skip(before, after))]
pub fn check_transition(
    before: Option<&SharedState>,
    after: &SharedState,
    fresh_game: bool,
) -> Result<(), Vec<InvariantViolation>> {
    let mut violations = match SharedStateInvariants::check_all(after) {
        Ok(()) => Vec::new(),
        Err(violations) => violations,
    };

    if let Some(before) = before
        && !fresh_game
        && after.round_number < before.round_number
    {
        violations.push(InvariantViolation::new(
            "Round number never decreases within a game",
        ));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        warn!(count = violations.len(), "Invariant violations detected");
        Err(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Faction, IngredientId, RoleId};
    use crate::state::Victory;
    use crate::state::testing::table;

    fn three() -> SharedState {
        table(&[RoleId::Protection, RoleId::Hex, RoleId::Oracle])
    }

    #[test]
    fn test_fresh_table_satisfies_every_invariant() {
        assert_eq!(SharedStateInvariants::check_all(&three()), Ok(()));
    }

    #[test]
    fn test_full_selections_flagged_before_resolution() {
        let mut state = three();
        for id in ["p0", "p1", "p2"] {
            state
                .ingredient_selections
                .insert(id.to_string(), IngredientId::EyeOfNewt);
        }
        let violations = SharedStateInvariants::check_all(&state).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].description,
            SelectionsBoundedInvariant::description()
        );
    }

    #[test]
    fn test_selections_of_the_dead_flagged_in_every_phase() {
        let mut state = three();
        state.phase = Phase::RitualResolution;
        for id in ["p0", "p1", "p2"] {
            state
                .ingredient_selections
                .insert(id.to_string(), IngredientId::BloodOfTheInnocent);
        }
        assert!(SelectionsBoundedInvariant::holds(&state));

        if let Some(player) = state.players.get_mut("p2") {
            player.alive = false;
        }
        assert!(!SelectionsBoundedInvariant::holds(&state));

        state.ingredient_selections.remove("p2");
        assert!(SelectionsBoundedInvariant::holds(&state));
    }

    #[test]
    fn test_council_votes_must_reference_the_living() {
        let mut state = three();
        state.phase = Phase::CouncilVote;
        state
            .council_votes
            .insert("p0".to_string(), CouncilChoice::Skip);
        assert!(VotesReferenceLivingInvariant::holds(&state));

        if let Some(player) = state.players.get_mut("p2") {
            player.alive = false;
        }
        state
            .council_votes
            .insert("p1".to_string(), CouncilChoice::Target("p2".to_string()));
        assert!(!VotesReferenceLivingInvariant::holds(&state));

        // Stale maps outside their phase are not constrained.
        state.phase = Phase::RitualResolution;
        assert!(VotesReferenceLivingInvariant::holds(&state));
    }

    #[test]
    fn test_winner_only_when_terminal() {
        let mut state = three();
        state.winner = Some(Victory {
            faction: Faction::Coven,
            reason: "done".to_string(),
        });
        assert!(!WinnerIsTerminalInvariant::holds(&state));

        state.phase = Phase::GameOver;
        assert!(WinnerIsTerminalInvariant::holds(&state));
    }

    #[test]
    fn test_round_regression_caught_unless_fresh_game() {
        let mut before = three();
        before.round_number = 3;
        let after = three();

        let violations = check_transition(Some(&before), &after, false).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].description.contains("never decreases"));

        assert_eq!(check_transition(Some(&before), &after, true), Ok(()));
        assert_eq!(check_transition(None, &after, false), Ok(()));
    }
}
