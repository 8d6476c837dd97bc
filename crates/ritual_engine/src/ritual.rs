//! Ritual resolution: turns a round's ingredient plays into an outcome.
//!
//! The resolver is a pure function of its inputs plus draws from the
//! injected random source (spite roll and victim).

use crate::catalog::{IngredientCategory, IngredientId, MAX_INGREDIENT_WEIGHT};
use crate::chance;
use crate::state::{GameConfig, OutcomeSeverity, PlayerId, RoundOutcome};
use rand::RngCore;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};

/// One contributor's ingredient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientPlay {
    /// Contributor.
    pub player_id: PlayerId,
    /// Ingredient played.
    pub ingredient: IngredientId,
}

/// Everything the resolver reads.
#[derive(Debug, Clone, Copy)]
pub struct RitualInput<'a> {
    /// Plays in contributor order.
    pub plays: &'a [IngredientPlay],
    /// The round's performer.
    pub performer_id: &'a str,
    /// Round being resolved.
    pub round_number: u32,
    /// Living player ids; spite victims are drawn from these.
    pub alive_ids: &'a BTreeSet<PlayerId>,
    /// Thresholds and chances.
    pub config: &'a GameConfig,
}

/// Outcome plus the players it kills.
#[derive(Debug, Clone, PartialEq)]
pub struct RitualResult {
    /// Outcome for presentation and power granting.
    pub outcome: RoundOutcome,
    /// Performer first, then any spite victim.
    pub dead_player_ids: Vec<PlayerId>,
}

/// Normalized corruption of a set of plays, clamped to `[0, 1]`.
///
/// Positive and negative weights are summed separately and combined, then
/// divided by the heaviest possible contribution for this many plays.
pub fn corruption_index(plays: &[IngredientPlay]) -> f64 {
    if plays.is_empty() {
        return 0.0;
    }

    let (positive, negative) = plays.iter().map(|p| p.ingredient.weight()).fold(
        (0.0_f64, 0.0_f64),
        |(pos, neg), w| if w > 0.0 { (pos + w, neg) } else { (pos, neg + w) },
    );

    let effective = (positive + negative).max(0.0);
    let denominator = plays.len() as f64 * MAX_INGREDIENT_WEIGHT;
    (effective / denominator).clamp(0.0, 1.0)
}

/// Classifies a corruption index against the configured thresholds.
pub fn classify(index: f64, config: &GameConfig) -> OutcomeSeverity {
    if index < config.pure_threshold {
        OutcomeSeverity::Pure
    } else if index < config.backfire_threshold {
        OutcomeSeverity::Tainted
    } else {
        OutcomeSeverity::Backfired
    }
}

/// Most frequently played ingredient; ties go to the higher total weight,
/// then to the ingredient seen first.
pub fn dominant_ingredient(plays: &[IngredientPlay]) -> IngredientId {
    let mut order: Vec<IngredientId> = Vec::new();
    let mut totals: BTreeMap<IngredientId, (usize, f64)> = BTreeMap::new();

    for play in plays {
        let entry = totals.entry(play.ingredient).or_insert_with(|| {
            order.push(play.ingredient);
            (0, 0.0)
        });
        entry.0 += 1;
        entry.1 += play.ingredient.weight();
    }

    let mut best: Option<(IngredientId, usize, f64)> = None;
    for id in order {
        let (count, weight) = totals[&id];
        best = match best {
            None => Some((id, count, weight)),
            Some((_, best_count, best_weight))
                if count > best_count || (count == best_count && weight > best_weight) =>
            {
                Some((id, count, weight))
            }
            keep => keep,
        };
    }

    best.map(|(id, _, _)| id).unwrap_or(IngredientId::EyeOfNewt)
}

/// Resolves one ritual.
#[instrument(skip(input, rng), fields(round = input.round_number, performer = %input.performer_id, plays = input.plays.len()))]
pub fn resolve_ritual(input: RitualInput<'_>, rng: &mut dyn RngCore) -> RitualResult {
    let corruption = corruption_index(input.plays);
    let dominant = dominant_ingredient(input.plays);
    let mut severity = classify(corruption, input.config);

    let mut notes = Vec::new();
    let mut performer_dies = false;
    let mut spite_victim_id = None;

    match severity {
        OutcomeSeverity::Backfired if input.plays.iter().any(|p| p.ingredient.is_protective()) => {
            severity = OutcomeSeverity::Tainted;
            notes.push("Protection ingredients softened a lethal backfire.".to_string());
        }
        OutcomeSeverity::Backfired => {
            performer_dies = true;
            notes.push("The ritual collapses inward and devours the Performer.".to_string());

            if chance::chance(rng, input.config.spite_chance) {
                spite_victim_id = choose_spite_victim(&input, rng);
                if spite_victim_id.is_some() {
                    notes.push("The backlash lashes out and claims another witch.".to_string());
                }
            }
        }
        OutcomeSeverity::Pure => {
            notes.push("The cauldron's light is clear and steady.".to_string());
        }
        OutcomeSeverity::Tainted => {
            notes.push("Smoke darkens the rim; the omen twists but holds.".to_string());
        }
    }

    notes.push(category_note(dominant.category()).to_string());

    let mut dead_player_ids = Vec::new();
    if performer_dies {
        dead_player_ids.push(input.performer_id.to_string());
    }
    if let Some(victim) = &spite_victim_id {
        dead_player_ids.push(victim.clone());
    }

    debug!(corruption, ?severity, ?dominant, performer_dies, ?spite_victim_id, "Ritual resolved");

    RitualResult {
        outcome: RoundOutcome {
            round_number: input.round_number,
            severity,
            dominant_ingredient: dominant,
            dominant_category: dominant.category(),
            corruption_index: corruption,
            performer_dies,
            spite_victim_id,
            notes,
        },
        dead_player_ids,
    }
}

/// Picks a living contributor other than the performer.
fn choose_spite_victim(input: &RitualInput<'_>, rng: &mut dyn RngCore) -> Option<PlayerId> {
    let contributors: BTreeSet<&str> = input.plays.iter().map(|p| p.player_id.as_str()).collect();
    let candidates: Vec<&PlayerId> = input
        .alive_ids
        .iter()
        .filter(|id| id.as_str() != input.performer_id && contributors.contains(id.as_str()))
        .collect();
    chance::pick(rng, &candidates).map(|id| (*id).clone())
}

fn category_note(category: IngredientCategory) -> &'static str {
    match category {
        IngredientCategory::Divination => "Divination dominates the ritual; truths (or lies) surface.",
        IngredientCategory::Protection => "Protective magic wraps around the Circle.",
        IngredientCategory::Corruption => "The Hollow's touch creeps along the edge of the cauldron.",
        IngredientCategory::Misdirection => "Whispers scatter; what is seen may not be what is true.",
        IngredientCategory::Amplification => "Power surges; the ritual's effect is amplified.",
    }
}
