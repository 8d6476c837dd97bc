//! The phase state machine.
//!
//! [`apply_intent`] is the only entry point. It clones the current state,
//! applies one intent to the clone and returns it. Intents that arrive in the
//! wrong phase, from dead players, or with ineligible targets are ignored and
//! the clone comes back unchanged.

use crate::catalog::{IngredientId, RoleId};
use crate::chance;
use crate::error::{EngineError, EngineErrorKind};
use crate::intent::{Intent, PlayerSeed};
use crate::mechanics;
use crate::powers;
use crate::ritual::{self, IngredientPlay, RitualInput};
use crate::roles::{self, MIN_PLAYERS};
use crate::state::{
    CouncilChoice, GameMeta, IngredientInsight, Millis, OutcomeSeverity, Phase, PlayerId,
    PlayerStatus, SharedState, VoteRevealEntry,
};
use crate::tally::{self, Tally};
use crate::victory;
use rand::RngCore;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument, warn};

/// Per-call inputs owned by the authority: its clock and its random source.
pub struct EngineContext<'a> {
    /// Authority wall clock in milliseconds.
    pub now_ms: Millis,
    /// Every random draw the reducer makes comes from here.
    pub rng: &'a mut dyn RngCore,
}

impl<'a> EngineContext<'a> {
    /// Creates a context for one reducer call.
    pub fn new(now_ms: Millis, rng: &'a mut dyn RngCore) -> Self {
        Self { now_ms, rng }
    }
}

impl std::fmt::Debug for EngineContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext")
            .field("now_ms", &self.now_ms)
            .finish_non_exhaustive()
    }
}

/// Applies one intent and returns the next state.
///
/// `StartGame` always builds a fresh game. Every other intent requires an
/// existing state. The input is never mutated.
///
/// # Errors
///
/// Returns an error for a roster that cannot be dealt, for intents sent
/// before any game exists, and (debug builds) when a transition would break
/// a state invariant.
#[instrument(skip(state, intent, ctx), fields(intent = intent.name(), now = ctx.now_ms))]
pub fn apply_intent(
    state: Option<&SharedState>,
    intent: Intent,
    ctx: &mut EngineContext<'_>,
) -> Result<SharedState, EngineError> {
    #[cfg(debug_assertions)]
    let fresh_game = matches!(intent, Intent::StartGame { .. });

    let next = match intent {
        Intent::StartGame {
            players,
            seed,
            meta,
        } => start_game(&players, &seed, meta.unwrap_or_default(), ctx.now_ms)?,
        intent => {
            let Some(current) = state else {
                warn!("Intent received before a game was started");
                return Err(EngineErrorKind::NotStarted.into());
            };
            let mut next = current.clone();
            step(&mut next, intent, ctx);
            next
        }
    };

    #[cfg(debug_assertions)]
    if let Err(violations) = crate::invariants::check_transition(state, &next, fresh_game) {
        let joined = violations
            .iter()
            .map(|v| v.description.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(EngineErrorKind::InvariantViolation(joined).into());
    }

    Ok(next)
}

fn step(state: &mut SharedState, intent: Intent, ctx: &mut EngineContext<'_>) {
    match intent {
        Intent::StartGame { .. } => {}
        Intent::MarkTutorialComplete => state.tutorial_complete = true,
        Intent::AdvanceFromDiscussion => {
            if state.phase == Phase::NominationDiscussion {
                begin_nomination_vote(state, ctx.now_ms);
            }
        }
        Intent::SubmitNominationVote {
            player_id,
            target_id,
        } => {
            if state.phase == Phase::NominationVote {
                handle_nomination_vote(state, player_id, target_id, ctx);
            }
        }
        Intent::CompleteNominationReveal => {
            if state.phase == Phase::NominationReveal {
                move_to_ingredient_choice(state, ctx.now_ms);
            }
        }
        Intent::SubmitIngredient {
            player_id,
            ingredient,
        } => {
            if state.phase == Phase::IngredientChoice {
                handle_ingredient(state, player_id, ingredient, ctx);
                if everyone_locked_in(state) {
                    resolve_current_ritual(state, ctx);
                }
            }
        }
        Intent::SubmitPowerTarget {
            player_id,
            target_id,
        } => {
            if state.phase == Phase::PerformerPower
                && powers::resolve_power(state, &player_id, &target_id, ctx.now_ms)
            {
                move_to_council_vote(state, ctx.now_ms);
            }
        }
        Intent::SubmitCouncilVote { player_id, target } => {
            if state.phase == Phase::CouncilVote {
                handle_council_vote(state, player_id, target, ctx);
            }
        }
        Intent::PhaseTimeout => handle_phase_timeout(state, ctx),
    }
}

#[instrument(skip(players, meta), fields(players = players.len()))]
fn start_game(
    players: &[PlayerSeed],
    seed: &str,
    meta: GameMeta,
    now: Millis,
) -> Result<SharedState, EngineError> {
    if players.len() < MIN_PLAYERS {
        return Err(EngineErrorKind::NotEnoughPlayers(players.len()).into());
    }

    let mut seen = BTreeSet::new();
    for player in players {
        if !seen.insert(player.id.as_str()) {
            return Err(EngineErrorKind::DuplicatePlayer(player.id.clone()).into());
        }
    }

    let dealt = roles::assign_roles(players.len(), seed)?;
    let statuses: BTreeMap<PlayerId, PlayerStatus> = players
        .iter()
        .zip(dealt)
        .map(|(seat, role)| {
            let status = PlayerStatus {
                id: seat.id.clone(),
                name: seat.name.clone(),
                role,
                faction: role.faction(),
                alive: true,
                is_host: seat.is_host,
                eliminated_round: None,
                infected: false,
            };
            (seat.id.clone(), status)
        })
        .collect();

    let host = players
        .iter()
        .find(|p| p.is_host)
        .unwrap_or(&players[0])
        .id
        .clone();

    let phase_expires_at = Some(now + meta.phase_durations.discussion_ms);

    info!(host = %host, seed, "Game started");

    Ok(SharedState {
        meta,
        phase: Phase::NominationDiscussion,
        round_number: 1,
        host_player_id: host,
        players: statuses,
        current_performer_id: None,
        nomination_votes: BTreeMap::new(),
        nomination_reveal_order: Vec::new(),
        ingredient_selections: BTreeMap::new(),
        ritual_outcome: None,
        pending_power: None,
        protection_blessing: None,
        council_votes: BTreeMap::new(),
        alignment_insights: BTreeMap::new(),
        ingredient_insights: BTreeMap::new(),
        last_used_ingredients: BTreeMap::new(),
        corrupted_ingredients: Vec::new(),
        infected_players: Vec::new(),
        winner: None,
        tutorial_complete: false,
        phase_expires_at,
    })
}

fn begin_nomination_vote(state: &mut SharedState, now: Millis) {
    state.phase = Phase::NominationVote;
    state.nomination_votes.clear();
    state.nomination_reveal_order.clear();
    state.phase_expires_at = Some(now + state.meta.phase_durations.nomination_vote_ms);
}

fn handle_nomination_vote(
    state: &mut SharedState,
    voter: PlayerId,
    target: PlayerId,
    ctx: &mut EngineContext<'_>,
) {
    if !state.is_alive(&voter) || !state.is_alive(&target) || voter == target {
        debug!(%voter, %target, "Nomination ignored");
        return;
    }

    let previous = state.nomination_votes.insert(voter, target.clone());
    if previous.is_none() {
        let vote_number = state
            .nomination_votes
            .values()
            .filter(|t| **t == target)
            .count()
            .max(1);
        state.nomination_reveal_order.push(VoteRevealEntry {
            target_id: target,
            vote_number,
        });
    }

    if tally::is_complete(&state.nomination_votes, &state.alive_player_ids()) {
        finalize_performer(state, ctx);
    }
}

#[instrument(skip_all, fields(round = state.round_number))]
fn finalize_performer(state: &mut SharedState, ctx: &mut EngineContext<'_>) {
    let alive = state.alive_player_ids();
    let Some(fallback) = chance::pick(ctx.rng, &alive).cloned() else {
        state.current_performer_id = None;
        return;
    };

    // Ballots are read in voter-id order, which fixes the tie scan order.
    let tally = Tally::count(state.nomination_votes.values().map(|t| Some(t.as_str())));
    let (performer, votes) = tally.scan_leader(Some(fallback), ctx.rng);

    info!(performer = ?performer, votes, "Performer chosen");
    state.current_performer_id = performer;
    state.phase = Phase::NominationReveal;
    state.phase_expires_at = Some(ctx.now_ms + state.meta.phase_durations.reveal_ms);
}

fn move_to_ingredient_choice(state: &mut SharedState, now: Millis) {
    state.phase = Phase::IngredientChoice;
    state.ingredient_selections.clear();
    state.phase_expires_at = Some(now + state.meta.phase_durations.ingredient_choice_ms);
}

fn handle_ingredient(
    state: &mut SharedState,
    player_id: PlayerId,
    ingredient: IngredientId,
    ctx: &mut EngineContext<'_>,
) {
    if !state.is_alive(&player_id) {
        return;
    }
    if state.last_used_ingredients.get(&player_id) == Some(&ingredient) {
        debug!(player = %player_id, %ingredient, "Ingredient on cooldown");
        return;
    }
    if state.corrupted_ingredients.contains(&ingredient) {
        debug!(player = %player_id, %ingredient, "Ingredient corrupted");
        return;
    }

    state
        .ingredient_selections
        .insert(player_id.clone(), ingredient);
    state
        .last_used_ingredients
        .insert(player_id.clone(), ingredient);

    let is_seer = state
        .players
        .get(&player_id)
        .is_some_and(|p| p.role == RoleId::Oracle);
    if ingredient.is_scrying() && is_seer {
        scry(state, &player_id, ctx);
    }
}

/// Shows the seer what a random other living player already put in.
fn scry(state: &mut SharedState, seer_id: &str, ctx: &mut EngineContext<'_>) {
    let others = state.alive_others(seer_id);
    let Some(target) = chance::pick(ctx.rng, &others) else {
        return;
    };
    let Some(ingredient) = state.ingredient_selections.get(target).copied() else {
        debug!(%target, "Scrying target has not chosen yet");
        return;
    };

    debug!(seer = seer_id, %target, %ingredient, "Scrying revealed an ingredient");
    state
        .ingredient_insights
        .entry(seer_id.to_string())
        .or_default()
        .push(IngredientInsight {
            target_id: target.clone(),
            ingredient,
            round_number: state.round_number,
        });
}

fn everyone_locked_in(state: &SharedState) -> bool {
    tally::is_complete(&state.ingredient_selections, &state.alive_player_ids())
}

#[instrument(skip_all, fields(round = state.round_number))]
fn resolve_current_ritual(state: &mut SharedState, ctx: &mut EngineContext<'_>) {
    let Some(performer_id) = state.current_performer_id.clone() else {
        return;
    };

    let plays: Vec<IngredientPlay> = state
        .ingredient_selections
        .iter()
        .map(|(player_id, ingredient)| IngredientPlay {
            player_id: player_id.clone(),
            ingredient: *ingredient,
        })
        .collect();
    let alive_ids: BTreeSet<PlayerId> = state.alive_player_ids().into_iter().collect();

    let result = ritual::resolve_ritual(
        RitualInput {
            plays: &plays,
            performer_id: &performer_id,
            round_number: state.round_number,
            alive_ids: &alive_ids,
            config: &state.meta.config,
        },
        ctx.rng,
    );

    let round = state.round_number;
    for id in &result.dead_player_ids {
        if state.eliminate(id, round) {
            info!(player = %id, "Killed by the ritual");
        }
    }

    let severity = result.outcome.severity;
    state.ritual_outcome = Some(result.outcome);
    state.phase = Phase::RitualResolution;
    state.phase_expires_at = Some(ctx.now_ms + state.meta.phase_durations.reveal_ms);

    let rulesets = state.meta.rulesets;
    if rulesets.enable_corruption && severity == OutcomeSeverity::Tainted {
        mechanics::apply_corruption(state, &plays, ctx.rng);
    }
    if rulesets.enable_infection && severity != OutcomeSeverity::Pure {
        mechanics::apply_infection(state, severity, ctx.rng);
    }

    powers::grant_power(state, &performer_id, severity, ctx.now_ms);
}

fn move_to_performer_power(state: &mut SharedState, now: Millis) {
    let deadline = now + state.meta.phase_durations.performer_power_ms;
    match state.pending_power.as_mut() {
        Some(pending) if pending.kind.is_targeted() => {
            pending.expires_at = deadline;
            state.phase = Phase::PerformerPower;
            state.phase_expires_at = Some(deadline);
        }
        _ => move_to_council_vote(state, now),
    }
}

fn move_to_council_vote(state: &mut SharedState, now: Millis) {
    state.phase = Phase::CouncilVote;
    state.council_votes.clear();
    state.phase_expires_at = Some(now + state.meta.phase_durations.council_vote_ms);
    if state.pending_power.as_ref().is_some_and(|p| !p.applied) {
        debug!("Unspent power lapsed");
        state.pending_power = None;
    }
}

fn handle_council_vote(
    state: &mut SharedState,
    voter: PlayerId,
    choice: CouncilChoice,
    ctx: &mut EngineContext<'_>,
) {
    if !state.is_alive(&voter) {
        return;
    }
    if let CouncilChoice::Target(target) = &choice
        && (!state.is_alive(target) || *target == voter)
    {
        debug!(%voter, %target, "Council ballot ignored");
        return;
    }

    state.council_votes.insert(voter, choice);

    if tally::is_complete(&state.council_votes, &state.alive_player_ids()) {
        finalize_council_vote(state, ctx);
    }
}

#[instrument(skip_all, fields(round = state.round_number, ballots = state.council_votes.len()))]
fn finalize_council_vote(state: &mut SharedState, ctx: &mut EngineContext<'_>) {
    if state.alive_count() == 0 {
        conclude_round(state, ctx.now_ms);
        return;
    }

    let tally = Tally::count(state.council_votes.values().map(CouncilChoice::target));
    let threshold = tally::majority_threshold(state.council_votes.len());
    let (leader, highest) = tally.scan_leader(None, ctx.rng);

    match leader {
        Some(target) if highest >= threshold => {
            if state.protection_blessing.as_deref() == Some(target.as_str()) {
                info!(%target, "Protection blessing spared the council's choice");
            } else if state.eliminate(&target, state.round_number) {
                info!(%target, votes = highest, "Council eliminated a player");
            }
        }
        _ => debug!(highest, threshold, "No majority; nobody eliminated"),
    }

    state.protection_blessing = None;
    conclude_round(state, ctx.now_ms);
}

fn conclude_round(state: &mut SharedState, now: Millis) {
    if let Some(victory) = victory::evaluate(state) {
        state.winner = Some(victory);
        state.phase = Phase::GameOver;
        state.phase_expires_at = None;
        return;
    }

    state.round_number += 1;
    state.phase = Phase::NominationDiscussion;
    state.current_performer_id = None;
    state.nomination_votes.clear();
    state.nomination_reveal_order.clear();
    state.ingredient_selections.clear();
    state.ritual_outcome = None;
    state.pending_power = None;
    state.protection_blessing = None;
    state.council_votes.clear();
    state.phase_expires_at = Some(now + state.meta.phase_durations.discussion_ms);
    debug!(round = state.round_number, "Next round");
}

#[instrument(skip_all, fields(phase = %state.phase))]
fn handle_phase_timeout(state: &mut SharedState, ctx: &mut EngineContext<'_>) {
    match state.phase {
        Phase::NominationDiscussion => begin_nomination_vote(state, ctx.now_ms),
        Phase::NominationVote => finalize_performer(state, ctx),
        Phase::NominationReveal => move_to_ingredient_choice(state, ctx.now_ms),
        Phase::IngredientChoice => resolve_current_ritual(state, ctx),
        Phase::RitualResolution => move_to_performer_power(state, ctx.now_ms),
        Phase::PerformerPower => move_to_council_vote(state, ctx.now_ms),
        Phase::CouncilVote => finalize_council_vote(state, ctx),
        Phase::GameOver => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chance::testing::ScriptedRng;

    fn roster(n: usize) -> Vec<PlayerSeed> {
        (0..n)
            .map(|i| PlayerSeed::new(format!("p{i}"), format!("Player {i}"), i == 0))
            .collect()
    }

    fn started(n: usize) -> SharedState {
        let mut rng = ScriptedRng::constant(0.5);
        let mut ctx = EngineContext::new(1_000, &mut rng);
        apply_intent(
            None,
            Intent::StartGame {
                players: roster(n),
                seed: "seed".into(),
                meta: None,
            },
            &mut ctx,
        )
        .unwrap()
    }

    #[test]
    fn test_start_game_sets_discussion_deadline() {
        let state = started(5);
        assert_eq!(state.phase, Phase::NominationDiscussion);
        assert_eq!(state.round_number, 1);
        assert_eq!(state.host_player_id, "p0");
        assert_eq!(state.phase_expires_at, Some(1_000 + 300_000));
    }

    #[test]
    fn test_two_players_rejected() {
        let mut rng = ScriptedRng::constant(0.5);
        let mut ctx = EngineContext::new(0, &mut rng);
        let err = apply_intent(
            None,
            Intent::StartGame {
                players: roster(2),
                seed: "s".into(),
                meta: None,
            },
            &mut ctx,
        )
        .unwrap_err();
        assert_eq!(err.kind, EngineErrorKind::NotEnoughPlayers(2));
    }

    #[test]
    fn test_intent_without_game_is_not_started() {
        let mut rng = ScriptedRng::constant(0.5);
        let mut ctx = EngineContext::new(0, &mut rng);
        let err = apply_intent(None, Intent::PhaseTimeout, &mut ctx).unwrap_err();
        assert_eq!(err.kind, EngineErrorKind::NotStarted);
    }

    #[test]
    fn test_wrong_phase_intent_is_ignored() {
        let state = started(4);
        let mut rng = ScriptedRng::constant(0.5);
        let mut ctx = EngineContext::new(2_000, &mut rng);
        let next = apply_intent(
            Some(&state),
            Intent::CompleteNominationReveal,
            &mut ctx,
        )
        .unwrap();
        assert_eq!(next, state);
    }

    #[test]
    fn test_input_state_is_not_mutated() {
        let state = started(4);
        let snapshot = state.clone();
        let mut rng = ScriptedRng::constant(0.5);
        let mut ctx = EngineContext::new(2_000, &mut rng);
        let next = apply_intent(Some(&state), Intent::AdvanceFromDiscussion, &mut ctx).unwrap();
        assert_eq!(state, snapshot);
        assert_eq!(next.phase, Phase::NominationVote);
    }
}
