//! Error types for the client library modules.
//!
//! The CLI layer wraps these in `anyhow::Error`; everything below it returns
//! one of the typed errors here.

use thiserror::Error;

/// Failure of a REST call.
#[derive(Debug, Error)]
pub enum RestError {
    /// The backend answered with a non-2xx status.
    #[error("{command} failed with {status}: {body}")]
    Status {
        command: String,
        status: reqwest::StatusCode,
        body: String,
    },

    /// The request could not be sent or the response could not be read.
    #[error("{command} failed: {source}")]
    Transport {
        command: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not the expected JSON.
    #[error("{command} returned an unexpected body: {source}")]
    Decode {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    /// A local file needed for the request could not be read.
    #[error("could not read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl RestError {
    /// HTTP status of the failure, if the backend answered at all.
    pub const fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure reported by a pub/sub session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PubSubError {
    #[error("login rejected: {0}")]
    LoginRejected(String),

    #[error("not logged in")]
    NotLoggedIn,

    #[error("no provider for rpc '{0}'")]
    NoRpcProvider(String),

    #[error("rpc '{name}' failed: {reason}")]
    Rpc { name: String, reason: String },
}

/// Reason the session bootstrap stopped.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// No display name was given; registration was not attempted.
    #[error("Choose a nickname, please!")]
    EmptyDisplayName,

    #[error("Could not register: {0}")]
    Registration(#[source] RestError),

    #[error("Could not connect: {0}")]
    Login(#[source] PubSubError),
}
