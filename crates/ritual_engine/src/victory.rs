//! End-of-round victory checks.

use crate::catalog::Faction;
use crate::state::{SharedState, Victory};
use tracing::{info, instrument};

/// Reason shown when the Coven purges every Hollow witch.
pub const REASON_HOLLOW_ELIMINATED: &str = "All Hollow witches have been eliminated.";

/// Reason shown when the Hollow catch up with the Coven.
pub const REASON_HOLLOW_PARITY: &str = "Hollow equal or outnumber the Coven.";

/// Reason shown when the final round passes without a decision.
pub const REASON_COVEN_ENDURES: &str = "The Coven endures through the final round.";

/// Checks the win conditions after a council. At most one fires.
///
/// The round limit defaults to the Coven because every dealt table starts
/// with at least as many Coven as Hollow.
#[instrument(skip(state), fields(round = state.round_number))]
pub fn evaluate(state: &SharedState) -> Option<Victory> {
    let coven = state.alive_in_faction(Faction::Coven);
    let hollow = state.alive_in_faction(Faction::Hollow);

    let victory = if hollow == 0 && coven > 0 {
        Some((Faction::Coven, REASON_HOLLOW_ELIMINATED))
    } else if hollow > 0 && hollow >= coven {
        Some((Faction::Hollow, REASON_HOLLOW_PARITY))
    } else if state.round_number >= state.meta.config.max_rounds {
        Some((Faction::Coven, REASON_COVEN_ENDURES))
    } else {
        None
    };

    victory.map(|(faction, reason)| {
        info!(%faction, reason, coven, hollow, "Victory condition met");
        Victory {
            faction,
            reason: reason.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RoleId;
    use crate::state::testing::table;

    fn kill(state: &mut SharedState, id: &str) {
        if let Some(player) = state.players.get_mut(id) {
            player.alive = false;
        }
    }

    #[test]
    fn test_no_victory_mid_game() {
        let state = table(&[RoleId::Protection, RoleId::Hex, RoleId::Oracle]);
        assert_eq!(evaluate(&state), None);
    }

    #[test]
    fn test_coven_wins_when_hollow_gone() {
        let mut state = table(&[RoleId::Protection, RoleId::Hex, RoleId::Oracle]);
        kill(&mut state, "p1");
        let victory = evaluate(&state).unwrap();
        assert_eq!(victory.faction, Faction::Coven);
        assert_eq!(victory.reason, REASON_HOLLOW_ELIMINATED);
    }

    #[test]
    fn test_hollow_parity() {
        let mut state = table(&[
            RoleId::Protection,
            RoleId::Hex,
            RoleId::Oracle,
            RoleId::Chronicler,
            RoleId::Harbinger,
        ]);
        assert_eq!(evaluate(&state), None);

        kill(&mut state, "p3");
        let victory = evaluate(&state).unwrap();
        assert_eq!(victory.faction, Faction::Hollow);
        assert_eq!(victory.reason, REASON_HOLLOW_PARITY);
    }

    #[test]
    fn test_parity_outranks_round_limit() {
        let mut state = table(&[RoleId::Protection, RoleId::Hex, RoleId::Oracle]);
        state.round_number = state.meta.config.max_rounds;
        assert_eq!(evaluate(&state).unwrap().reason, REASON_COVEN_ENDURES);

        kill(&mut state, "p0");
        assert_eq!(evaluate(&state).unwrap().faction, Faction::Hollow);
    }

    #[test]
    fn test_infected_players_count_as_hollow() {
        let mut state = table(&[RoleId::Protection, RoleId::Hex, RoleId::Oracle]);
        if let Some(player) = state.players.get_mut("p2") {
            player.faction = Faction::Hollow;
            player.infected = true;
        }
        assert_eq!(evaluate(&state).unwrap().faction, Faction::Hollow);
    }
}
