//! Error types for dispatching requests and talking to history storage.
//!
//! # Design
//! `DispatchError` never escapes `Dispatcher::dispatch`: it is folded into the
//! `ResponseEnvelope` as a message plus a `FailureKind`, so callers can both
//! display it and decide whether the exchange belongs in history.
//! `HistoryError` is returned directly by every `HistoryBackend`.

use thiserror::Error;

use crate::types::FailureKind;

/// A method name outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown HTTP method: {0}")]
pub struct MethodParseError(pub String);

/// Failure reported by a `Transport` (DNS, refused connection, timeout...).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError(err.to_string())
    }
}

/// Why a dispatch did not produce an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("URL is required.")]
    MissingUrl,

    #[error("Invalid URL: {0}. Ensure it includes a protocol (e.g., https://).")]
    InvalidUrl(String),

    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("Request cancelled.")]
    Cancelled,
}

impl DispatchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            DispatchError::MissingUrl | DispatchError::InvalidUrl(_) => FailureKind::Validation,
            DispatchError::Transport(_) => FailureKind::Transport,
            DispatchError::Cancelled => FailureKind::Cancelled,
        }
    }
}

/// Errors returned by history backends and the history wire client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// The draft lacks a url or a method.
    #[error("Missing required fields: url and method")]
    MissingFields,

    /// The history service answered with an unexpected status.
    #[error("history service returned HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The history service could not be reached.
    #[error("history service unreachable: {0}")]
    Unreachable(String),

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<TransportError> for HistoryError {
    fn from(err: TransportError) -> Self {
        HistoryError::Unreachable(err.0)
    }
}
