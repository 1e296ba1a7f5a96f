use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ScoutError {
    /// Referenced unit id is unknown to the store. Surfaced to callers.
    NotFound(String),
    /// Lost a claim race to a concurrent caller. Retried internally, never surfaced.
    Conflict(String),
    /// Illegal lifecycle transition was requested.
    StateTransitionError(String),
    /// Notification delivery failed. Logged and swallowed, never surfaced.
    SinkUnavailable(String),
    /// Durable snapshot write failed. In-memory state stays authoritative.
    PersistenceError(String),
    ConfigurationError(String),
}

impl fmt::Display for ScoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoutError::NotFound(msg) => write!(f, "Not found: {msg}"),
            ScoutError::Conflict(msg) => write!(f, "Claim conflict: {msg}"),
            ScoutError::StateTransitionError(msg) => write!(f, "State transition error: {msg}"),
            ScoutError::SinkUnavailable(msg) => write!(f, "Sink unavailable: {msg}"),
            ScoutError::PersistenceError(msg) => write!(f, "Persistence error: {msg}"),
            ScoutError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for ScoutError {}

pub type Result<T> = std::result::Result<T, ScoutError>;
