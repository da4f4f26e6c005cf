//! Stateless HTTP request builder and response parser for the history service.
//!
//! # Design
//! `HistoryClient` holds only a `base_url` and carries no mutable state
//! between calls. Each endpoint is split into a `build_*` method that produces
//! an `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! `RemoteHistory` runs the round-trip in between through a `Transport`.

use crate::error::HistoryError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{AppendAck, ErrorBody, HistoryDraft, HistoryEntry};

const HISTORY_PATH: &str = "/history";

#[derive(Debug, Clone)]
pub struct HistoryClient {
    base_url: String,
}

impl HistoryClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn build_list_history(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}{HISTORY_PATH}", self.base_url),
            headers: vec![("accept".to_string(), "application/json".to_string())],
            body: None,
        }
    }

    pub fn build_append_history(&self, draft: &HistoryDraft) -> Result<HttpRequest, HistoryError> {
        let body =
            serde_json::to_string(draft).map_err(|e| HistoryError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}{HISTORY_PATH}", self.base_url),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    pub fn parse_list_history(&self, response: HttpResponse) -> Result<Vec<HistoryEntry>, HistoryError> {
        check_status(&response, 200)?;
        serde_json::from_str(&response.body).map_err(|e| HistoryError::Deserialization(e.to_string()))
    }

    pub fn parse_append_history(&self, response: HttpResponse) -> Result<HistoryEntry, HistoryError> {
        check_status(&response, 201)?;
        let ack: AppendAck = serde_json::from_str(&response.body)
            .map_err(|e| HistoryError::Deserialization(e.to_string()))?;
        Ok(ack.item)
    }
}

/// Map unexpected status codes to `HistoryError::Rejected`, preferring the
/// service's own `message` over the raw body.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), HistoryError> {
    if response.status == expected {
        return Ok(());
    }
    let message = serde_json::from_str::<ErrorBody>(&response.body)
        .map(|body| body.message)
        .unwrap_or_else(|_| response.body.clone());
    Err(HistoryError::Rejected {
        status: response.status,
        message,
    })
}
