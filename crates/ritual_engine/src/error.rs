//! Engine error types.
//!
//! Only configuration problems surface as errors. Precondition violations
//! (wrong phase, dead actor, stale votes) leave the state unchanged instead.

use derive_more::{Display, Error};
use tracing::instrument;

/// Kind of configuration failure.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum EngineErrorKind {
    /// Fewer than three players on the roster.
    #[display("Need at least three players to start, got {}", _0)]
    NotEnoughPlayers(usize),

    /// No role distribution exists for this player count.
    #[display("Unsupported player count: {}. Expected 3-9", _0)]
    UnsupportedPlayerCount(usize),

    /// An intent arrived before any game was started.
    #[display("Game state not initialized; start a game first")]
    NotStarted,

    /// The roster names the same player id twice.
    #[display("Player {} appears more than once in the roster", _0)]
    DuplicatePlayer(String),

    /// A transition broke a state invariant (debug builds only).
    #[display("Invariant violation: {}", _0)]
    InvariantViolation(String),
}

/// Engine error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Engine error: {} at {}:{}", kind, file, line)]
pub struct EngineError {
    /// What went wrong.
    pub kind: EngineErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl EngineError {
    /// Creates a new engine error with caller location tracking.
    #[track_caller]
    #[instrument]
    pub fn new(kind: EngineErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<EngineErrorKind> for EngineError {
    #[track_caller]
    fn from(kind: EngineErrorKind) -> Self {
        Self::new(kind)
    }
}
