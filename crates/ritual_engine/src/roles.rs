//! Role distribution and deterministic role dealing.

use crate::catalog::RoleId;
use crate::chance::SeedSequence;
use crate::error::{EngineError, EngineErrorKind};
use tracing::{debug, instrument};

/// Smallest supported table.
pub const MIN_PLAYERS: usize = 3;

/// Largest supported table.
pub const MAX_PLAYERS: usize = 9;

/// Returns the unshuffled role set for a player count.
///
/// # Errors
///
/// Returns `UnsupportedPlayerCount` outside `3..=9`.
#[instrument]
pub fn roles_for_player_count(player_count: usize) -> Result<Vec<RoleId>, EngineError> {
    use RoleId::*;

    let roles = match player_count {
        3 => vec![Protection, Hex, Oracle],
        4 => vec![Protection, Hex, Oracle, Chronicler],
        5 => vec![Protection, Hex, Oracle, Chronicler, Harbinger],
        6 => vec![Protection, Hex, Oracle, Chronicler, Harbinger, Mimic],
        7 => vec![
            Protection, Protection, Hex, Oracle, Chronicler, Harbinger, Mimic,
        ],
        8 => vec![
            Protection, Protection, Hex, Hex, Oracle, Chronicler, Harbinger, Mimic,
        ],
        9 => vec![
            Protection, Protection, Hex, Hex, Oracle, Exorcist, Chronicler, Harbinger, Mimic,
        ],
        other => return Err(EngineErrorKind::UnsupportedPlayerCount(other).into()),
    };
    Ok(roles)
}

/// Deals roles for `player_count` players, shuffled by `seed`.
///
/// The same seed and count always produce the same order, so a game can be
/// audited by replaying its start request.
///
/// # Errors
///
/// Returns `UnsupportedPlayerCount` outside `3..=9`.
#[instrument]
pub fn assign_roles(player_count: usize, seed: &str) -> Result<Vec<RoleId>, EngineError> {
    let mut roles = roles_for_player_count(player_count)?;
    SeedSequence::new(seed).shuffle(&mut roles);
    debug!(?roles, "Dealt roles");
    Ok(roles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Faction;

    #[test]
    fn test_every_supported_count_has_matching_size() {
        for n in MIN_PLAYERS..=MAX_PLAYERS {
            assert_eq!(roles_for_player_count(n).unwrap().len(), n);
        }
    }

    #[test]
    fn test_coven_never_outnumbered_at_start() {
        for n in MIN_PLAYERS..=MAX_PLAYERS {
            let roles = roles_for_player_count(n).unwrap();
            let coven = roles.iter().filter(|r| r.faction() == Faction::Coven).count();
            assert!(coven * 2 >= roles.len());
        }
    }

    #[test]
    fn test_out_of_range_counts_rejected() {
        for n in [0, 1, 2, 10, 12] {
            let err = roles_for_player_count(n).unwrap_err();
            assert_eq!(err.kind, EngineErrorKind::UnsupportedPlayerCount(n));
        }
    }

    #[test]
    fn test_same_seed_same_deal() {
        let first = assign_roles(3, "s1").unwrap();
        let second = assign_roles(3, "s1").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_deal_is_permutation_of_table() {
        for seed in ["s1", "rematch", "", "🜏 coven"] {
            let mut dealt = assign_roles(9, seed).unwrap();
            let mut table = roles_for_player_count(9).unwrap();
            dealt.sort();
            table.sort();
            assert_eq!(dealt, table);
        }
    }
}
