//! Shared game state: the single value threaded through the reducer.
//!
//! The whole structure is plain owned data with ordered maps. Cloning it
//! gives a fully independent copy and serializing it gives a stable JSON
//! snapshot that the transport can publish as-is.

use crate::catalog::{Faction, IngredientCategory, IngredientId, RoleId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::Display;

/// Unique identifier for a player.
pub type PlayerId = String;

/// Milliseconds since the Unix epoch on the authority's clock.
pub type Millis = u64;

/// Snapshot schema version, bumped on any breaking field change.
pub const SHARED_STATE_SCHEMA_VERSION: u32 = 2;

/// Phase of a round. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Open discussion before nominating a performer.
    NominationDiscussion,
    /// Secret vote choosing the performer.
    NominationVote,
    /// Votes and the chosen performer are revealed.
    NominationReveal,
    /// Every living player picks one ingredient.
    IngredientChoice,
    /// The ritual outcome is shown.
    RitualResolution,
    /// The performer spends a granted power.
    PerformerPower,
    /// Vote that may eliminate one player.
    CouncilVote,
    /// Terminal phase.
    GameOver,
}

impl Phase {
    /// Whether the game has ended.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::GameOver)
    }
}

/// Tuning knobs for ritual resolution, mechanics, and game length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfig {
    /// Round after which the Coven endures.
    pub max_rounds: u32,
    /// Corruption below this is pure.
    pub pure_threshold: f64,
    /// Corruption at or above this backfires.
    pub backfire_threshold: f64,
    /// Chance a backfire claims a second contributor.
    pub spite_chance: f64,
    /// First round in which infection can strike.
    pub infection_start_round: u32,
    /// Last round in which infection can strike.
    pub infection_end_round: u32,
    /// Most infections in one game.
    pub max_infections: usize,
    /// Infection chance after a tainted ritual.
    pub infection_chance_tainted: f64,
    /// Infection chance after a backfired ritual.
    pub infection_chance_backfired: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_rounds: 9,
            pure_threshold: 0.25,
            backfire_threshold: 0.55,
            spite_chance: 0.15,
            infection_start_round: 1,
            infection_end_round: 3,
            max_infections: 2,
            infection_chance_tainted: 0.08,
            infection_chance_backfired: 0.25,
        }
    }
}

/// How long each timed phase lasts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhaseDurations {
    /// Discussion before the nomination vote.
    pub discussion_ms: Millis,
    /// Nomination vote.
    pub nomination_vote_ms: Millis,
    /// Nomination reveal and ritual reveal.
    pub reveal_ms: Millis,
    /// Ingredient choice.
    pub ingredient_choice_ms: Millis,
    /// Performer power.
    pub performer_power_ms: Millis,
    /// Council vote.
    pub council_vote_ms: Millis,
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            discussion_ms: 300_000,
            nomination_vote_ms: 60_000,
            reveal_ms: 15_000,
            ingredient_choice_ms: 60_000,
            performer_power_ms: 30_000,
            council_vote_ms: 60_000,
        }
    }
}

/// Optional rule modules layered onto ritual resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Rulesets {
    /// Tainted rituals disable some of the ingredients just played.
    pub enable_corruption: bool,
    /// Failed early rituals may secretly flip a Coven player.
    pub enable_infection: bool,
}

/// Versioned metadata fixed at game start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMeta {
    /// Snapshot schema version.
    pub schema_version: u32,
    /// Rules tuning.
    pub config: GameConfig,
    /// Phase timers.
    pub phase_durations: PhaseDurations,
    /// Enabled optional mechanics.
    pub rulesets: Rulesets,
}

impl Default for GameMeta {
    fn default() -> Self {
        Self {
            schema_version: SHARED_STATE_SCHEMA_VERSION,
            config: GameConfig::default(),
            phase_durations: PhaseDurations::default(),
            rulesets: Rulesets::default(),
        }
    }
}

/// Per-player record. Dead players stay in the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatus {
    /// Player id.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Dealt role; never changes.
    pub role: RoleId,
    /// Current alignment; infection can change it.
    pub faction: Faction,
    /// Whether the player is still in the game.
    pub alive: bool,
    /// Whether this player runs the authority.
    pub is_host: bool,
    /// Round in which the player died, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eliminated_round: Option<u32>,
    /// Whether infection flipped this player.
    #[serde(default)]
    pub infected: bool,
}

/// One entry in the nomination reveal sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRevealEntry {
    /// Nominated player.
    pub target_id: PlayerId,
    /// Running vote count for the target when this vote landed.
    pub vote_number: usize,
}

/// A council ballot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CouncilChoice {
    /// Vote to eliminate this player.
    Target(PlayerId),
    /// Abstain.
    Skip,
}

impl CouncilChoice {
    /// The targeted player, if this is not a skip.
    pub fn target(&self) -> Option<&str> {
        match self {
            CouncilChoice::Target(id) => Some(id),
            CouncilChoice::Skip => None,
        }
    }
}

/// Severity of a ritual outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeSeverity {
    /// Clean ritual; unlocks performer powers.
    Pure,
    /// Middle outcome.
    Tainted,
    /// Lethal unless softened.
    Backfired,
}

/// Result of resolving one ritual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundOutcome {
    /// Round this outcome belongs to.
    pub round_number: u32,
    /// Outcome class.
    pub severity: OutcomeSeverity,
    /// Most played ingredient.
    pub dominant_ingredient: IngredientId,
    /// Category of the dominant ingredient.
    pub dominant_category: IngredientCategory,
    /// Normalized corruption in `[0, 1]`.
    pub corruption_index: f64,
    /// Whether the performer dies.
    pub performer_dies: bool,
    /// Secondary victim of a spiteful backfire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spite_victim_id: Option<PlayerId>,
    /// Narrative lines for presentation.
    pub notes: Vec<String>,
}

/// Type of performer power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PowerKind {
    /// See the ingredient a target played this round.
    IngredientReveal,
    /// Learn a target's alignment.
    AlignmentReveal,
    /// Bless a target against this round's council.
    ProtectPlayer,
    /// Copy a target's alignment insights.
    StealVision,
    /// Auto-applied Exorcist power.
    DoubleVote,
    /// Auto-applied Hex power.
    ChaosSpread,
    /// Auto-applied Harbinger power.
    AmplifyChaos,
}

impl PowerKind {
    /// Whether the power needs a chosen target.
    pub fn is_targeted(self) -> bool {
        matches!(
            self,
            PowerKind::IngredientReveal
                | PowerKind::AlignmentReveal
                | PowerKind::ProtectPlayer
                | PowerKind::StealVision
        )
    }
}

/// What a consumed power produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum PowerResolution {
    /// A target's ingredient was revealed.
    #[serde(rename_all = "camelCase")]
    IngredientRevealed {
        /// Revealed player.
        target_id: PlayerId,
        /// Their ingredient.
        ingredient: IngredientId,
    },
    /// A target's alignment was revealed.
    #[serde(rename_all = "camelCase")]
    AlignmentRevealed {
        /// Revealed player.
        target_id: PlayerId,
        /// Their alignment at the time.
        faction: Faction,
        /// Whether the reveal was truthful.
        accurate: bool,
    },
    /// A target received the protection blessing.
    #[serde(rename_all = "camelCase")]
    Protected {
        /// Blessed player.
        target_id: PlayerId,
    },
    /// A target's insights were copied.
    #[serde(rename_all = "camelCase")]
    VisionStolen {
        /// Player whose insights were copied.
        target_id: PlayerId,
        /// Number of entries copied.
        copied: usize,
    },
}

/// A granted, not yet resolved performer power.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPower {
    /// Power type.
    pub kind: PowerKind,
    /// Performer who may use it.
    pub performer_id: PlayerId,
    /// Eligible targets; empty for auto-applied powers.
    pub available_targets: Vec<PlayerId>,
    /// Deadline after which the power lapses.
    pub expires_at: Millis,
    /// Whether a target was submitted.
    pub used: bool,
    /// Whether the effect took hold.
    pub applied: bool,
    /// Payload once consumed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<PowerResolution>,
}

/// A private alignment reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentInsight {
    /// Player read.
    pub target_id: PlayerId,
    /// Alignment shown.
    pub faction: Faction,
    /// Whether the reading was truthful.
    pub accurate: bool,
    /// When it was recorded.
    pub recorded_at: Millis,
}

/// A private ingredient reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientInsight {
    /// Player read.
    pub target_id: PlayerId,
    /// Ingredient they played.
    pub ingredient: IngredientId,
    /// Round of the reading.
    pub round_number: u32,
}

/// Winning faction and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Victory {
    /// Winner.
    pub faction: Faction,
    /// Player-facing reason.
    pub reason: String,
}

/// Complete shared game state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedState {
    /// Versioned metadata.
    pub meta: GameMeta,
    /// Active phase.
    pub phase: Phase,
    /// Current round, starting at 1.
    pub round_number: u32,
    /// Player running the authority.
    pub host_player_id: PlayerId,
    /// Every dealt player, alive or dead.
    pub players: BTreeMap<PlayerId, PlayerStatus>,
    /// Performer chosen for this round.
    pub current_performer_id: Option<PlayerId>,
    /// Voter to nominee.
    pub nomination_votes: BTreeMap<PlayerId, PlayerId>,
    /// First votes in arrival order.
    pub nomination_reveal_order: Vec<VoteRevealEntry>,
    /// Player to chosen ingredient.
    pub ingredient_selections: BTreeMap<PlayerId, IngredientId>,
    /// Outcome of this round's ritual.
    pub ritual_outcome: Option<RoundOutcome>,
    /// Power awaiting a target.
    pub pending_power: Option<PendingPower>,
    /// Player spared from this round's council.
    pub protection_blessing: Option<PlayerId>,
    /// Voter to ballot.
    pub council_votes: BTreeMap<PlayerId, CouncilChoice>,
    /// Private alignment readings per player.
    pub alignment_insights: BTreeMap<PlayerId, Vec<AlignmentInsight>>,
    /// Private ingredient readings per player.
    pub ingredient_insights: BTreeMap<PlayerId, Vec<IngredientInsight>>,
    /// Cooldown record.
    pub last_used_ingredients: BTreeMap<PlayerId, IngredientId>,
    /// Ingredients currently unusable.
    pub corrupted_ingredients: Vec<IngredientId>,
    /// Players flipped by infection.
    pub infected_players: Vec<PlayerId>,
    /// Set once the game ends.
    pub winner: Option<Victory>,
    /// Whether the table dismissed the tutorial.
    pub tutorial_complete: bool,
    /// Deadline of the active phase.
    pub phase_expires_at: Option<Millis>,
}

impl SharedState {
    /// Ids of living players, in id order.
    pub fn alive_player_ids(&self) -> Vec<PlayerId> {
        self.players
            .values()
            .filter(|p| p.alive)
            .map(|p| p.id.clone())
            .collect()
    }

    /// Number of living players.
    pub fn alive_count(&self) -> usize {
        self.players.values().filter(|p| p.alive).count()
    }

    /// Number of living members of `faction`.
    pub fn alive_in_faction(&self, faction: Faction) -> usize {
        self.players
            .values()
            .filter(|p| p.alive && p.faction == faction)
            .count()
    }

    /// Whether `id` names a living player.
    pub fn is_alive(&self, id: &str) -> bool {
        self.players.get(id).is_some_and(|p| p.alive)
    }

    /// Marks `id` dead in `round` and withdraws any ingredient they still
    /// have on the table. Returns whether a living player was eliminated.
    pub fn eliminate(&mut self, id: &str, round: u32) -> bool {
        let Some(status) = self.players.get_mut(id).filter(|p| p.alive) else {
            return false;
        };
        status.alive = false;
        status.eliminated_round = Some(round);
        self.ingredient_selections.remove(id);
        true
    }

    /// Living players other than `id`.
    pub fn alive_others(&self, id: &str) -> Vec<PlayerId> {
        self.players
            .values()
            .filter(|p| p.alive && p.id != id)
            .map(|p| p.id.clone())
            .collect()
    }

    /// Serializes the state to a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Fails only if a field cannot be represented in JSON.
    pub fn to_snapshot(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// Restores a state from a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Fails on malformed input or when the snapshot's schema version is not
    /// [`SHARED_STATE_SCHEMA_VERSION`].
    pub fn from_snapshot(value: serde_json::Value) -> serde_json::Result<Self> {
        let state: Self = serde_json::from_value(value)?;
        if state.meta.schema_version != SHARED_STATE_SCHEMA_VERSION {
            return Err(serde::de::Error::custom(format!(
                "unsupported schema version {} (expected {})",
                state.meta.schema_version, SHARED_STATE_SCHEMA_VERSION
            )));
        }
        Ok(state)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Hand-built states for rule tests.

    use super::*;

    /// A round-one table in ingredient choice with players `p0..pN` dealt
    /// `roles` in order. `p0` performs.
    pub fn table(roles: &[RoleId]) -> SharedState {
        let players = roles
            .iter()
            .enumerate()
            .map(|(i, role)| {
                let id = format!("p{i}");
                let status = PlayerStatus {
                    id: id.clone(),
                    name: format!("Player {i}"),
                    role: *role,
                    faction: role.faction(),
                    alive: true,
                    is_host: i == 0,
                    eliminated_round: None,
                    infected: false,
                };
                (id, status)
            })
            .collect();

        SharedState {
            meta: GameMeta::default(),
            phase: Phase::IngredientChoice,
            round_number: 1,
            host_player_id: "p0".into(),
            players,
            current_performer_id: Some("p0".into()),
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
            phase_expires_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::table;
    use super::*;

    #[test]
    fn test_alive_queries_skip_the_dead() {
        let mut state = table(&[RoleId::Protection, RoleId::Hex, RoleId::Oracle]);
        if let Some(p) = state.players.get_mut("p1") {
            p.alive = false;
        }
        assert_eq!(state.alive_player_ids(), vec!["p0".to_string(), "p2".to_string()]);
        assert_eq!(state.alive_in_faction(Faction::Hollow), 0);
        assert_eq!(state.alive_others("p0"), vec!["p2".to_string()]);
        assert!(!state.is_alive("p1"));
        assert!(!state.is_alive("nobody"));
    }

    #[test]
    fn test_snapshot_uses_camel_case_and_schema_version() {
        let state = table(&[RoleId::Protection, RoleId::Hex, RoleId::Oracle]);
        let snapshot = state.to_snapshot().unwrap();
        assert_eq!(snapshot["meta"]["schemaVersion"], SHARED_STATE_SCHEMA_VERSION);
        assert_eq!(snapshot["phase"], "INGREDIENT_CHOICE");
        assert_eq!(snapshot["currentPerformerId"], "p0");
        assert_eq!(SharedState::from_snapshot(snapshot).unwrap(), state);
    }

    #[test]
    fn test_eliminate_withdraws_the_selection() {
        let mut state = table(&[RoleId::Protection, RoleId::Hex, RoleId::Oracle]);
        state
            .ingredient_selections
            .insert("p1".into(), IngredientId::BoneDust);
        state
            .ingredient_selections
            .insert("p2".into(), IngredientId::EyeOfNewt);

        assert!(state.eliminate("p1", 3));
        assert!(!state.eliminate("p1", 4));
        assert!(!state.eliminate("nobody", 4));

        assert_eq!(state.players["p1"].eliminated_round, Some(3));
        assert_eq!(
            state.ingredient_selections.keys().collect::<Vec<_>>(),
            vec!["p2"]
        );
    }

    #[test]
    fn test_snapshot_from_another_schema_rejected() {
        let state = table(&[RoleId::Protection, RoleId::Hex, RoleId::Oracle]);
        let mut snapshot = state.to_snapshot().unwrap();
        snapshot["meta"]["schemaVersion"] = serde_json::json!(SHARED_STATE_SCHEMA_VERSION + 1);

        let err = SharedState::from_snapshot(snapshot).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }
}
