//! Error types for system countermeasures

use thiserror::Error;

/// Result type alias for countermeasure operations
pub type Result<T> = std::result::Result<T, ActionError>;

/// Errors raised by a single countermeasure step
#[derive(Debug, Error)]
pub enum ActionError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An external program could not be started
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An external program exited unsuccessfully
    #[error("{program} failed: {detail}")]
    Command { program: String, detail: String },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A remote service rejected the request
    #[error("{service} returned {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// Response body did not have the expected shape
    #[error("Unexpected {service} response: {source}")]
    Response {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The step needs configuration that was not provided
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}
