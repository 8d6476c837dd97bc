//! Role powers unlocked by a favorable ritual.
//!
//! | Role       | Power            | Kind     |
//! |------------|------------------|----------|
//! | Oracle     | IngredientReveal | targeted |
//! | Protection | ProtectPlayer    | targeted (plus a passive self blessing) |
//! | Chronicler | AlignmentReveal  | targeted |
//! | Mimic      | StealVision      | targeted |
//! | Exorcist   | DoubleVote       | auto     |
//! | Hex        | ChaosSpread      | auto     |
//! | Harbinger  | AmplifyChaos     | auto     |

use crate::catalog::RoleId;
use crate::state::{
    AlignmentInsight, IngredientInsight, Millis, OutcomeSeverity, PendingPower, PlayerId,
    PowerKind, PowerResolution, SharedState,
};
use tracing::{debug, info, instrument};

/// Power a role receives after a pure ritual.
pub fn power_for_role(role: RoleId) -> PowerKind {
    match role {
        RoleId::Oracle => PowerKind::IngredientReveal,
        RoleId::Protection => PowerKind::ProtectPlayer,
        RoleId::Chronicler => PowerKind::AlignmentReveal,
        RoleId::Mimic => PowerKind::StealVision,
        RoleId::Exorcist => PowerKind::DoubleVote,
        RoleId::Hex => PowerKind::ChaosSpread,
        RoleId::Harbinger => PowerKind::AmplifyChaos,
    }
}

/// Grants the performer's power for this ritual, or clears any stale one.
///
/// Pure rituals grant the role's power. A tainted ritual still grants the
/// seer a reduced ingredient reveal. Anything else clears the pending power
/// and the protection blessing.
#[instrument(skip(state), fields(round = state.round_number))]
pub fn grant_power(
    state: &mut SharedState,
    performer_id: &str,
    severity: OutcomeSeverity,
    now: Millis,
) {
    let Some(role) = state.players.get(performer_id).map(|p| p.role) else {
        state.pending_power = None;
        state.protection_blessing = None;
        return;
    };

    let kind = match severity {
        OutcomeSeverity::Pure => power_for_role(role),
        OutcomeSeverity::Tainted if role.is_seer() => PowerKind::IngredientReveal,
        _ => {
            debug!(%role, ?severity, "No power granted");
            state.pending_power = None;
            state.protection_blessing = None;
            return;
        }
    };

    if kind == PowerKind::ProtectPlayer {
        state.protection_blessing = Some(performer_id.to_string());
    }

    let expires_at = now + state.meta.phase_durations.performer_power_ms;
    let targets = state.alive_others(performer_id);

    let pending = if kind.is_targeted() {
        if targets.is_empty() {
            debug!(%kind, "No eligible targets; power not granted");
            return;
        }
        PendingPower {
            kind,
            performer_id: performer_id.to_string(),
            available_targets: targets,
            expires_at,
            used: false,
            applied: false,
            resolution: None,
        }
    } else {
        PendingPower {
            kind,
            performer_id: performer_id.to_string(),
            available_targets: Vec::new(),
            expires_at,
            used: false,
            applied: true,
            resolution: None,
        }
    };

    info!(%kind, performer = performer_id, "Power granted");
    state.pending_power = Some(pending);
}

/// Spends the pending power on `target_id`.
///
/// Returns `false`, leaving the state untouched, when the caller is not the
/// performer, the power is auto-applied or expired, the target is not
/// eligible, or the effect has nothing to act on.
#[instrument(skip(state))]
pub fn resolve_power(
    state: &mut SharedState,
    player_id: &str,
    target_id: &str,
    now: Millis,
) -> bool {
    let Some(pending) = state.pending_power.as_ref() else {
        return false;
    };
    if pending.performer_id != player_id
        || !pending.kind.is_targeted()
        || pending.used
        || now > pending.expires_at
        || !pending.available_targets.iter().any(|t| t == target_id)
    {
        debug!("Power submission rejected");
        return false;
    }
    let kind = pending.kind;
    let target: PlayerId = target_id.to_string();

    let resolution = match kind {
        PowerKind::IngredientReveal => {
            let Some(ingredient) = state.ingredient_selections.get(target_id).copied() else {
                debug!(target = target_id, "Target has no ingredient to reveal");
                return false;
            };
            state
                .ingredient_insights
                .entry(player_id.to_string())
                .or_default()
                .push(IngredientInsight {
                    target_id: target.clone(),
                    ingredient,
                    round_number: state.round_number,
                });
            PowerResolution::IngredientRevealed {
                target_id: target,
                ingredient,
            }
        }
        PowerKind::AlignmentReveal => {
            let Some(faction) = state.players.get(target_id).map(|p| p.faction) else {
                return false;
            };
            state
                .alignment_insights
                .entry(player_id.to_string())
                .or_default()
                .push(AlignmentInsight {
                    target_id: target.clone(),
                    faction,
                    accurate: true,
                    recorded_at: now,
                });
            PowerResolution::AlignmentRevealed {
                target_id: target,
                faction,
                accurate: true,
            }
        }
        PowerKind::ProtectPlayer => {
            state.protection_blessing = Some(target.clone());
            PowerResolution::Protected { target_id: target }
        }
        PowerKind::StealVision => {
            let stolen = state
                .alignment_insights
                .get(target_id)
                .cloned()
                .unwrap_or_default();
            let copied = stolen.len();
            state
                .alignment_insights
                .entry(player_id.to_string())
                .or_default()
                .extend(stolen);
            PowerResolution::VisionStolen {
                target_id: target,
                copied,
            }
        }
        PowerKind::DoubleVote | PowerKind::ChaosSpread | PowerKind::AmplifyChaos => return false,
    };

    info!(%kind, performer = player_id, target = target_id, "Power resolved");
    if let Some(pending) = state.pending_power.as_mut() {
        pending.used = true;
        pending.applied = true;
        pending.resolution = Some(resolution);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Faction, IngredientId};
    use crate::state::testing::table;

    fn three() -> SharedState {
        table(&[RoleId::Oracle, RoleId::Hex, RoleId::Protection])
    }

    #[test]
    fn test_pure_oracle_gets_targeted_reveal() {
        let mut state = three();
        grant_power(&mut state, "p0", OutcomeSeverity::Pure, 100);

        let pending = state.pending_power.as_ref().unwrap();
        assert_eq!(pending.kind, PowerKind::IngredientReveal);
        assert_eq!(pending.available_targets, vec!["p1".to_string(), "p2".to_string()]);
        assert_eq!(pending.expires_at, 100 + 30_000);
        assert!(!pending.applied);
    }

    #[test]
    fn test_tainted_oracle_keeps_reduced_reveal() {
        let mut state = three();
        grant_power(&mut state, "p0", OutcomeSeverity::Tainted, 0);
        assert_eq!(
            state.pending_power.as_ref().map(|p| p.kind),
            Some(PowerKind::IngredientReveal)
        );
    }

    #[test]
    fn test_failed_ritual_clears_power_and_blessing() {
        let mut state = table(&[RoleId::Hex, RoleId::Oracle, RoleId::Protection]);
        state.protection_blessing = Some("p2".into());
        grant_power(&mut state, "p0", OutcomeSeverity::Tainted, 0);
        assert!(state.pending_power.is_none());
        assert!(state.protection_blessing.is_none());
    }

    #[test]
    fn test_protection_blesses_itself_and_may_protect() {
        let mut state = table(&[RoleId::Protection, RoleId::Hex, RoleId::Oracle]);
        grant_power(&mut state, "p0", OutcomeSeverity::Pure, 0);
        assert_eq!(state.protection_blessing.as_deref(), Some("p0"));

        assert!(resolve_power(&mut state, "p0", "p2", 10));
        assert_eq!(state.protection_blessing.as_deref(), Some("p2"));
        let pending = state.pending_power.as_ref().unwrap();
        assert!(pending.used && pending.applied);
        assert_eq!(
            pending.resolution,
            Some(PowerResolution::Protected {
                target_id: "p2".into()
            })
        );
    }

    #[test]
    fn test_auto_power_is_applied_at_grant() {
        let mut state = table(&[RoleId::Hex, RoleId::Oracle, RoleId::Protection]);
        grant_power(&mut state, "p0", OutcomeSeverity::Pure, 0);

        let pending = state.pending_power.as_ref().unwrap();
        assert_eq!(pending.kind, PowerKind::ChaosSpread);
        assert!(pending.applied);
        assert!(pending.available_targets.is_empty());
        assert!(!resolve_power(&mut state, "p0", "p1", 0));
    }

    #[test]
    fn test_ingredient_reveal_records_insight() {
        let mut state = three();
        state
            .ingredient_selections
            .insert("p1".into(), IngredientId::ShadowAsh);
        grant_power(&mut state, "p0", OutcomeSeverity::Pure, 0);

        assert!(resolve_power(&mut state, "p0", "p1", 5));
        let insights = &state.ingredient_insights["p0"];
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].ingredient, IngredientId::ShadowAsh);
        assert_eq!(insights[0].round_number, 1);
    }

    #[test]
    fn test_reveal_on_target_without_selection_is_noop() {
        let mut state = three();
        grant_power(&mut state, "p0", OutcomeSeverity::Pure, 0);
        let before = state.clone();

        assert!(!resolve_power(&mut state, "p0", "p2", 5));
        assert_eq!(state, before);
    }

    #[test]
    fn test_alignment_reveal_is_accurate() {
        let mut state = table(&[RoleId::Chronicler, RoleId::Hex, RoleId::Oracle]);
        grant_power(&mut state, "p0", OutcomeSeverity::Pure, 0);

        assert!(resolve_power(&mut state, "p0", "p1", 42));
        let insight = &state.alignment_insights["p0"][0];
        assert_eq!(insight.faction, Faction::Hollow);
        assert!(insight.accurate);
        assert_eq!(insight.recorded_at, 42);
    }

    #[test]
    fn test_steal_vision_copies_alignment_log() {
        let mut state = table(&[RoleId::Mimic, RoleId::Chronicler, RoleId::Oracle]);
        state.alignment_insights.insert(
            "p1".into(),
            vec![AlignmentInsight {
                target_id: "p0".into(),
                faction: Faction::Hollow,
                accurate: true,
                recorded_at: 1,
            }],
        );
        grant_power(&mut state, "p0", OutcomeSeverity::Pure, 0);

        assert!(resolve_power(&mut state, "p0", "p1", 2));
        assert_eq!(state.alignment_insights["p0"], state.alignment_insights["p1"]);
    }

    #[test]
    fn test_only_performer_with_eligible_target_may_resolve() {
        let mut state = table(&[RoleId::Chronicler, RoleId::Hex, RoleId::Oracle]);
        grant_power(&mut state, "p0", OutcomeSeverity::Pure, 0);

        assert!(!resolve_power(&mut state, "p1", "p2", 0));
        assert!(!resolve_power(&mut state, "p0", "p0", 0));
        assert!(!resolve_power(&mut state, "p0", "p1", 30_001));
        assert!(state.alignment_insights.is_empty());
    }
}
