//! Shared harness for reducer integration tests.

#![allow(dead_code)]

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use ritual_engine::{
    CouncilChoice, EngineContext, GameMeta, IngredientId, Intent, Millis, Phase, PlayerId,
    PlayerSeed, RoleId, SharedState, apply_intent,
};

/// Replays a fixed list of unit values, cycling when exhausted.
pub struct ScriptedRng {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedRng {
    pub fn new(values: &[f64]) -> Self {
        assert!(!values.is_empty());
        Self {
            values: values.to_vec(),
            cursor: 0,
        }
    }

    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RngCore for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        let mantissa = (value.clamp(0.0, 0.999_999_999) * (1u64 << 53) as f64) as u64;
        mantissa << 11
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

/// Roster `p0..pN` with `p0` hosting.
pub fn roster(n: usize) -> Vec<PlayerSeed> {
    (0..n)
        .map(|i| PlayerSeed::new(format!("p{i}"), format!("Witch {i}"), i == 0))
        .collect()
}

/// A running game driven through the public reducer.
pub struct Table {
    pub state: SharedState,
    pub now: Millis,
    rng: ChaCha8Rng,
}

impl Table {
    pub fn start(n: usize) -> Self {
        Self::start_with(n, None)
    }

    pub fn start_with(n: usize, meta: Option<GameMeta>) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let now = 1_000;
        let mut ctx = EngineContext::new(now, &mut rng);
        let state = apply_intent(
            None,
            Intent::StartGame {
                players: roster(n),
                seed: "table".into(),
                meta,
            },
            &mut ctx,
        )
        .expect("start game");
        Self { state, now, rng }
    }

    /// Applies an intent with the table's seeded generator.
    pub fn apply(&mut self, intent: Intent) -> &SharedState {
        self.now += 1_000;
        let mut ctx = EngineContext::new(self.now, &mut self.rng);
        self.state = apply_intent(Some(&self.state), intent, &mut ctx).expect("apply intent");
        &self.state
    }

    /// Applies an intent with a scripted random source.
    pub fn apply_scripted(&mut self, intent: Intent, rng: &mut ScriptedRng) -> &SharedState {
        self.now += 1_000;
        let mut ctx = EngineContext::new(self.now, rng);
        self.state = apply_intent(Some(&self.state), intent, &mut ctx).expect("apply intent");
        &self.state
    }

    pub fn timeout(&mut self) -> &SharedState {
        self.apply(Intent::PhaseTimeout)
    }

    /// First player dealt `role`.
    pub fn holder(&self, role: RoleId) -> PlayerId {
        self.state
            .players
            .values()
            .find(|p| p.role == role)
            .map(|p| p.id.clone())
            .expect("role dealt")
    }

    pub fn alive(&self) -> Vec<PlayerId> {
        self.state.alive_player_ids()
    }

    /// Runs a full nomination that makes `performer` the performer and
    /// opens ingredient choice.
    pub fn nominate(&mut self, performer: &str) {
        assert_eq!(self.state.phase, Phase::NominationDiscussion);
        self.apply(Intent::AdvanceFromDiscussion);
        for voter in self.alive() {
            let target = if voter == performer {
                self.alive().into_iter().find(|id| id != performer).expect("other")
            } else {
                performer.to_string()
            };
            self.apply(Intent::SubmitNominationVote {
                player_id: voter,
                target_id: target,
            });
        }
        assert_eq!(self.state.phase, Phase::NominationReveal);
        assert_eq!(self.state.current_performer_id.as_deref(), Some(performer));
        self.apply(Intent::CompleteNominationReveal);
        assert_eq!(self.state.phase, Phase::IngredientChoice);
    }

    /// Every living player submits `ingredient`.
    pub fn play_all(&mut self, ingredient: IngredientId) {
        for id in self.alive() {
            self.apply(Intent::SubmitIngredient {
                player_id: id,
                ingredient,
            });
        }
    }

    /// Times out until the council opens.
    pub fn to_council(&mut self) {
        for _ in 0..3 {
            if self.state.phase == Phase::CouncilVote {
                return;
            }
            self.timeout();
        }
        assert_eq!(self.state.phase, Phase::CouncilVote);
    }

    pub fn ballot(&mut self, voter: &str, choice: CouncilChoice) -> &SharedState {
        self.apply(Intent::SubmitCouncilVote {
            player_id: voter.to_string(),
            target: choice,
        })
    }
}
