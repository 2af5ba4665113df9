//! Error types for the X11 backend

use thiserror::Error;
use vigil_core::{GrabError, LockError};

/// Result type alias for X11 operations
pub type Result<T> = std::result::Result<T, X11Error>;

/// Errors raised while talking to the X server
#[derive(Debug, Error)]
pub enum X11Error {
    /// Could not connect to the display
    #[error("cannot open display: {0}")]
    Connect(#[from] x11rb::errors::ConnectError),

    /// The connection broke
    #[error("connection error: {0}")]
    Connection(#[from] x11rb::errors::ConnectionError),

    /// A request returned an error reply
    #[error("request failed: {0}")]
    Reply(#[from] x11rb::errors::ReplyError),

    /// Resource id allocation or request failed
    #[error("request failed: {0}")]
    ReplyOrId(#[from] x11rb::errors::ReplyOrIdError),
}

impl From<X11Error> for LockError {
    fn from(e: X11Error) -> Self {
        LockError::Display(e.to_string())
    }
}

impl From<X11Error> for GrabError {
    fn from(e: X11Error) -> Self {
        GrabError::Request(e.to_string())
    }
}
