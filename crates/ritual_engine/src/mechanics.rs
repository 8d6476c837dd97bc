//! Optional rule modules applied after a ritual resolves.

use crate::catalog::{Faction, IngredientId};
use crate::chance;
use crate::ritual::IngredientPlay;
use crate::state::{OutcomeSeverity, PlayerId, SharedState};
use rand::RngCore;
use tracing::{debug, info, instrument};

/// Marks one or two of this round's ingredients as unusable.
///
/// Clears the previous corrupted set first. A coin flip chooses one or two
/// items; the distinct played items are shuffled and the first ones taken.
#[instrument(skip(state, plays, rng), fields(round = state.round_number))]
pub fn apply_corruption(state: &mut SharedState, plays: &[IngredientPlay], rng: &mut dyn RngCore) {
    state.corrupted_ingredients.clear();

    let mut distinct: Vec<IngredientId> = Vec::new();
    for play in plays {
        if !distinct.contains(&play.ingredient) {
            distinct.push(play.ingredient);
        }
    }

    let wanted = if chance::chance(rng, 0.5) { 1 } else { 2 };

    for i in (1..distinct.len()).rev() {
        let j = chance::pick_index(rng, i + 1).unwrap_or(i);
        distinct.swap(i, j);
    }
    distinct.truncate(wanted);

    debug!(corrupted = ?distinct, "Ingredients corrupted");
    state.corrupted_ingredients = distinct;
}

/// Possibly flips one living Coven player to the Hollow.
///
/// Only fires inside the configured round window, after a tainted or
/// backfired ritual, and while under the infection cap. The player's role
/// is untouched. Returns the infected player, if any.
#[instrument(skip(state, rng), fields(round = state.round_number))]
pub fn apply_infection(
    state: &mut SharedState,
    severity: OutcomeSeverity,
    rng: &mut dyn RngCore,
) -> Option<PlayerId> {
    let config = &state.meta.config;
    let round = state.round_number;

    if round < config.infection_start_round || round > config.infection_end_round {
        return None;
    }
    if state.infected_players.len() >= config.max_infections {
        return None;
    }

    let probability = match severity {
        OutcomeSeverity::Pure => return None,
        OutcomeSeverity::Tainted => config.infection_chance_tainted,
        OutcomeSeverity::Backfired => config.infection_chance_backfired,
    };

    if chance::roll(rng) > probability {
        return None;
    }

    let candidates: Vec<PlayerId> = state
        .players
        .values()
        .filter(|p| {
            p.alive && p.faction == Faction::Coven && !state.infected_players.contains(&p.id)
        })
        .map(|p| p.id.clone())
        .collect();

    let chosen = chance::pick(rng, &candidates)?.clone();
    if let Some(player) = state.players.get_mut(&chosen) {
        player.faction = Faction::Hollow;
        player.infected = true;
    }
    state.infected_players.push(chosen.clone());

    info!(infected = %chosen, total = state.infected_players.len(), "Infection spread");
    Some(chosen)
}
