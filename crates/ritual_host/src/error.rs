//! Host error types.

use derive_more::{Display, Error};
use ritual_engine::EngineError;
use tracing::instrument;

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Kind of host failure.
#[derive(Debug, Clone, Display)]
pub enum HostErrorKind {
    /// The reducer rejected an intent.
    #[display("{}", _0)]
    Engine(EngineError),

    /// Host configuration could not be loaded.
    #[display("{}", _0)]
    Config(ConfigError),

    /// A replay script could not be read or parsed.
    #[display("Script error: {}", _0)]
    Script(String),

    /// A snapshot could not be encoded or delivered.
    #[display("Transport error: {}", _0)]
    Transport(String),
}

/// Host error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Host error: {} at {}:{}", kind, file, line)]
pub struct HostError {
    /// What went wrong.
    pub kind: HostErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl HostError {
    /// Creates a new host error with caller location tracking.
    #[track_caller]
    #[instrument]
    pub fn new(kind: HostErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<EngineError> for HostError {
    #[track_caller]
    fn from(err: EngineError) -> Self {
        Self::new(HostErrorKind::Engine(err))
    }
}

impl From<ConfigError> for HostError {
    #[track_caller]
    fn from(err: ConfigError) -> Self {
        Self::new(HostErrorKind::Config(err))
    }
}
