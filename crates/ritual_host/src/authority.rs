//! The single writer.
//!
//! An [`Authority`] owns the only mutable copy of the game. It is the sole
//! caller of the reducer: participant messages and deadline ticks become
//! intents here, and every accepted transition is published as a snapshot.
//! This is single-writer replication, not consensus. If the authority goes
//! away the game stops.

use crate::clock::Clock;
use crate::config::HostConfig;
use crate::error::HostError;
use crate::transport::{ActionMessage, Snapshot, Transport};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use ritual_engine::{EngineContext, GameMeta, Intent, PlayerSeed, SharedState, apply_intent};
use tracing::{debug, info, instrument, warn};

/// Outcome of offering a message to the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The intent was applied and a snapshot published.
    Applied,
    /// The sender may not send this action; nothing happened.
    Refused,
}

/// Authoritative owner of one room's game.
pub struct Authority<C: Clock, T: Transport> {
    room: String,
    meta: GameMeta,
    state: Option<SharedState>,
    rng: ChaCha8Rng,
    clock: C,
    transport: T,
    sequence: u64,
}

impl<C: Clock, T: Transport> std::fmt::Debug for Authority<C, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authority")
            .field("room", &self.room)
            .field("phase", &self.state.as_ref().map(|s| s.phase))
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}

impl<C: Clock, T: Transport> Authority<C, T> {
    /// Creates an authority with no game running.
    #[instrument(skip_all, fields(room = %config.room()))]
    pub fn new(config: &HostConfig, clock: C, transport: T) -> Self {
        let rng = match config.rng_seed() {
            Some(seed) => ChaCha8Rng::seed_from_u64(*seed),
            None => ChaCha8Rng::from_os_rng(),
        };
        info!(seeded = config.rng_seed().is_some(), "Authority ready");
        Self {
            room: config.room().clone(),
            meta: config.meta(),
            state: None,
            rng,
            clock,
            transport,
            sequence: 0,
        }
    }

    /// The current authoritative state, if a game has started.
    pub fn state(&self) -> Option<&SharedState> {
        self.state.as_ref()
    }

    /// The transport snapshots are published on.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Sequence number of the last published snapshot.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// The room this authority publishes to.
    pub fn room(&self) -> &str {
        &self.room
    }

    /// Starts (or restarts) a game with the configured rules.
    #[instrument(skip(self, players), fields(room = %self.room, players = players.len()))]
    pub fn start(&mut self, players: Vec<PlayerSeed>, seed: &str) -> Result<&SharedState, HostError> {
        self.apply(Intent::StartGame {
            players,
            seed: seed.to_string(),
            meta: Some(self.meta.clone()),
        })
    }

    /// Applies an intent, then publishes the result.
    ///
    /// Nothing is committed unless the snapshot is delivered: on failure the
    /// state, sequence and random source are left as they were, so a retry
    /// replays the same draws under the same sequence number.
    #[instrument(skip(self, intent), fields(room = %self.room, intent = intent.name()))]
    pub fn apply(&mut self, intent: Intent) -> Result<&SharedState, HostError> {
        let now = self.clock.now_ms();
        let mut rng = self.rng.clone();
        let mut ctx = EngineContext::new(now, &mut rng);
        let next = apply_intent(self.state.as_ref(), intent, &mut ctx)?;

        let sequence = self.sequence + 1;
        let snapshot = Snapshot::new(sequence, next);
        if let Err(e) = self.transport.deliver_snapshot(&self.room, &snapshot) {
            warn!(sequence, error = %e, "Snapshot delivery failed; transition discarded");
            return Err(e);
        }
        debug!(sequence, phase = %snapshot.state().phase, "Published");

        self.rng = rng;
        self.sequence = sequence;
        let state = self.state.insert(snapshot.into_state());
        Ok(&*state)
    }

    /// Translates a participant message into an intent and applies it.
    ///
    /// Host-only actions from anyone but the host are refused.
    #[instrument(skip(self, message), fields(room = %self.room, player = %message.player_id))]
    pub fn handle_action(&mut self, message: ActionMessage) -> Result<Delivery, HostError> {
        if message.action.is_host_only() {
            let host = self.state.as_ref().map(|s| s.host_player_id.as_str());
            if host != Some(message.player_id.as_str()) {
                let action: &'static str = (&message.action).into();
                warn!(action, "Host-only action refused");
                return Ok(Delivery::Refused);
            }
        }

        let intent = message.into_intent(self.state.as_ref());
        self.apply(intent)?;
        Ok(Delivery::Applied)
    }

    /// Fires a phase timeout if the active deadline has passed.
    ///
    /// Returns whether a timeout was applied.
    #[instrument(skip(self), fields(room = %self.room))]
    pub fn tick(&mut self) -> Result<bool, HostError> {
        let now = self.clock.now_ms();
        let due = self
            .state
            .as_ref()
            .and_then(|s| s.phase_expires_at)
            .is_some_and(|deadline| now >= deadline);

        if !due {
            return Ok(false);
        }

        debug!(now, "Deadline passed");
        self.apply(Intent::PhaseTimeout)?;
        Ok(true)
    }

    /// Ticks until no deadline is due, bounded by `max_steps`.
    pub fn catch_up(&mut self, max_steps: usize) -> Result<usize, HostError> {
        let mut steps = 0;
        while steps < max_steps && self.tick()? {
            steps += 1;
        }
        Ok(steps)
    }
}
