//! Ritual host - the authoritative runner for the Hollow ritual game
//!
//! One participant acts as the authority. It owns the only mutable copy of
//! the game, is the only caller of [`ritual_engine::apply_intent`], keeps
//! the clock that drives phase deadlines, and publishes every transition as
//! a whole [`Snapshot`].
//!
//! # Architecture
//!
//! - **Authority**: single writer that turns messages and ticks into intents
//! - **Transport**: seam for delivering snapshots to a room
//! - **Clock**: wall time for deadlines, or a manual clock for replays
//! - **Config**: TOML host settings and rules tuning
//! - **Script**: deterministic scripted games
//!
//! # Example
//!
//! ```
//! use ritual_host::{Authority, HostConfig, ManualClock, RecordingTransport};
//! use ritual_engine::{Phase, PlayerSeed};
//!
//! # fn main() -> Result<(), ritual_host::HostError> {
//! let config = HostConfig::default().with_rng_seed(7);
//! let mut authority = Authority::new(&config, ManualClock::new(0), RecordingTransport::new());
//!
//! let players = ["ash", "briar", "cinder"]
//!     .iter()
//!     .map(|id| PlayerSeed::new(id.to_string(), id.to_string(), *id == "ash"))
//!     .collect();
//! let state = authority.start(players, "moon")?;
//! assert_eq!(state.phase, Phase::NominationDiscussion);
//! assert_eq!(authority.transport().deliveries().len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod authority;
mod clock;
mod config;
mod error;
mod script;
mod transport;

// Crate-level exports - Authority
pub use authority::{Authority, Delivery};

// Crate-level exports - Clock
pub use clock::{Clock, ManualClock, SystemClock};

// Crate-level exports - Configuration
pub use config::{HostConfig, RNG_SEED_ENV};

// Crate-level exports - Errors
pub use error::{ConfigError, HostError, HostErrorKind};

// Crate-level exports - Replay
pub use script::{ReplayScript, ReplaySummary, ScriptStep, final_state};

// Crate-level exports - Transport
pub use transport::{ActionMessage, PlayerAction, RecordingTransport, Snapshot, Transport};
