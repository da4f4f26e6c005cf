//! Domain types shared by the dispatcher, the history store and the session.
//!
//! # Design
//! Field names serialize in camelCase so the history wire format is the one
//! the explorer has always spoken (`statusText`, `rawBody`, `responseSummary`).
//! Header rows carry an `id` that is independent of their position in the
//! list, so edits address rows by identity and never by index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DispatchError;
use crate::http::HttpMethod;

/// One editable header row of a request draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl HeaderItem {
    /// An enabled row with a freshly generated id.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: fresh_id(),
            key: key.into(),
            value: value.into(),
            enabled: true,
        }
    }

    /// Copy of this row under a new identity.
    pub fn with_fresh_id(&self) -> Self {
        Self {
            id: fresh_id(),
            ..self.clone()
        }
    }

    /// Rows that are disabled or have a blank key are never transmitted.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.key.trim().is_empty()
    }
}

pub(crate) fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}

/// Editable draft of an outbound call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSpec {
    pub url: String,
    pub method: HttpMethod,
    pub headers: Vec<HeaderItem>,
    pub body: Option<String>,
}

impl Default for RequestSpec {
    /// The draft a fresh session starts from: `GET`, no URL and a single
    /// `Content-Type: application/json` row.
    fn default() -> Self {
        Self {
            url: String::new(),
            method: HttpMethod::Get,
            headers: vec![HeaderItem::new("Content-Type", "application/json")],
            body: None,
        }
    }
}

impl RequestSpec {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(HeaderItem::new(key, value));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Appends a row and returns its id.
    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<String>) -> String {
        let item = HeaderItem::new(key, value);
        let id = item.id.clone();
        self.headers.push(item);
        id
    }

    /// Removes the row with `id`, keeping the order of the others.
    pub fn remove_header(&mut self, id: &str) -> bool {
        let before = self.headers.len();
        self.headers.retain(|h| h.id != id);
        self.headers.len() != before
    }

    pub fn header_mut(&mut self, id: &str) -> Option<&mut HeaderItem> {
        self.headers.iter_mut().find(|h| h.id == id)
    }

    /// Switching to a method without a body drops the draft body.
    pub fn set_method(&mut self, method: HttpMethod) {
        self.method = method;
        if !method.carries_body() {
            self.body = None;
        }
    }

    pub fn active_headers(&self) -> impl Iterator<Item = &HeaderItem> {
        self.headers.iter().filter(|h| h.is_active())
    }

    pub fn enabled_header_count(&self) -> usize {
        self.headers.iter().filter(|h| h.enabled).count()
    }
}

/// Which stage of a dispatch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Empty or malformed URL; nothing was sent.
    Validation,
    /// The transport reported an error.
    Transport,
    /// The caller cancelled the in-flight request.
    Cancelled,
}

/// Normalized outcome of one dispatch attempt.
///
/// Exactly one of `status` and `error` is present. `time` is populated for
/// every dispatch that got past validation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status: Option<u16>,
    pub status_text: Option<String>,
    pub headers: Option<BTreeMap<String, String>>,
    pub raw_body: Option<String>,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<u64>,
}

impl ResponseEnvelope {
    pub fn failed(err: &DispatchError, time: Option<u64>) -> Self {
        Self {
            error: Some(err.to_string()),
            failure: Some(err.kind()),
            time,
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_some()
    }

    pub fn summary(&self) -> ResponseSummary {
        ResponseSummary {
            status: self.status,
            status_text: self.status_text.clone(),
        }
    }

    /// Case-insensitive lookup in the collected response headers.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()?
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSummary {
    pub status: Option<u16>,
    pub status_text: Option<String>,
}

/// A stored exchange. Never mutated after the store creates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: i64,
    #[serde(flatten)]
    pub request: RequestSpec,
    #[serde(default)]
    pub response_summary: Option<ResponseSummary>,
}

/// Input to `HistoryBackend::append`.
///
/// Every field is optional on the wire so that a missing `url` or `method`
/// can be reported as `HistoryError::MissingFields` rather than a decoding
/// failure.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryDraft {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub method: Option<HttpMethod>,
    #[serde(default)]
    pub headers: Vec<HeaderItem>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub response_summary: Option<ResponseSummary>,
}

impl HistoryDraft {
    pub fn from_exchange(request: &RequestSpec, response: &ResponseEnvelope) -> Self {
        Self {
            url: Some(request.url.clone()),
            method: Some(request.method),
            headers: request.headers.clone(),
            body: request.body.clone(),
            response_summary: Some(response.summary()),
        }
    }
}

/// Body of a successful `POST /history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendAck {
    pub message: String,
    pub item: HistoryEntry,
}

/// Body of a rejected history call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
