//! Error types for the vigil core

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, LockError>;

/// Errors that can occur while locking and authenticating
#[derive(Debug, Error)]
pub enum LockError {
    /// The display server connection failed or went away
    #[error("Display error: {0}")]
    Display(String),

    /// No credential source could be resolved
    #[error("Credential error: {0}")]
    Credential(String),

    /// Credential backend failed while verifying
    #[error("Verification error: {0}")]
    Verification(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons a single screen's lock session could not reach the grabbed state
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GrabError {
    /// The cover window could not be created
    #[error("cannot create cover window: {0}")]
    Window(String),

    /// Every pointer grab attempt was refused
    #[error("pointer grab failed after {0} attempts")]
    PointerExhausted(u32),

    /// Every keyboard grab attempt was refused
    #[error("keyboard grab failed after {0} attempts")]
    KeyboardExhausted(u32),

    /// The display server returned an error during a grab request
    #[error("grab request failed: {0}")]
    Request(String),
}
