use std::io::Error as IoError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use explorer_core::{ErrorBody, HistoryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// A history call that failed, rendered as `{"message": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    /// Missing fields are the caller's fault; anything else is ours.
    pub fn saving(err: HistoryError) -> Self {
        match err {
            HistoryError::MissingFields => Self {
                status: StatusCode::BAD_REQUEST,
                body: ErrorBody {
                    message: err.to_string(),
                    error: None,
                },
            },
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: ErrorBody {
                    message: "Error saving history".to_string(),
                    error: Some(other.to_string()),
                },
            },
        }
    }

    pub fn listing(err: HistoryError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorBody {
                message: "Error fetching history".to_string(),
                error: Some(err.to_string()),
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_is_a_client_error() {
        assert_eq!(
            ApiError::saving(HistoryError::MissingFields).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn other_failures_are_server_errors() {
        let err = ApiError::saving(HistoryError::Serialization("bad".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body.error.as_deref(), Some("serialization failed: bad"));
    }
}
