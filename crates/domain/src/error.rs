//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`HapError`]
//! at port boundaries.

use std::time::Duration;

/// Boxed error coming from an adapter (bus transport or hardware).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error shared by the domain, application and adapter layers.
#[derive(Debug, thiserror::Error)]
pub enum HapError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The bus transport failed (publish, subscribe, connect).
    #[error("bus transport error")]
    Transport(#[source] BoxError),

    /// A hardware adapter failed to carry out an action.
    #[error("hardware adapter error")]
    Hardware(#[source] BoxError),

    /// A payload could not be encoded or decoded as JSON.
    #[error("malformed payload")]
    Payload(#[from] serde_json::Error),

    /// A hardware dispatch did not complete in time.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Violations of domain invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("hardware id must not be empty")]
    EmptyHardwareId,

    #[error("logical name '{0}' is configured more than once")]
    DuplicateName(String),

    #[error("hardware id '{0}' is configured more than once")]
    DuplicateHardwareId(String),

    #[error("level {0} is outside 0..=15")]
    LevelOutOfRange(i64),

    #[error("invalid command '{0}'")]
    InvalidCommand(String),

    #[error("revertive payload must be a JSON object")]
    RevertiveNotObject,
}
