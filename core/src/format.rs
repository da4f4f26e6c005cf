//! Presentation helpers for showing an envelope to a person.

use crate::types::ResponseEnvelope;

const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Human-readable byte count in base-1024 units, e.g. `1536 -> "1.5 KB"`.
pub fn format_bytes(bytes: u64, decimals: usize) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let mut number = format!("{value:.decimals$}");
    if number.contains('.') {
        let trimmed = number.trim_end_matches('0').trim_end_matches('.').len();
        number.truncate(trimmed);
    }
    format!("{number} {}", UNITS[unit])
}

/// Body text for display: indented JSON when the response declares JSON and
/// the body parses, the raw body otherwise.
pub fn pretty_body(envelope: &ResponseEnvelope) -> Option<String> {
    let raw = envelope.raw_body.as_deref()?;
    let is_json = envelope
        .header("content-type")
        .is_some_and(|v| v.to_ascii_lowercase().contains("application/json"));
    if is_json {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) {
            if let Ok(pretty) = serde_json::to_string_pretty(&value) {
                return Some(pretty);
            }
        }
    }
    Some(raw.to_string())
}

/// Coarse classification of a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// No status: the request failed before a response arrived.
    Pending,
    Informational,
    Success,
    Redirect,
    ClientError,
    ServerError,
}

impl StatusClass {
    pub fn of(status: Option<u16>) -> Self {
        match status {
            None => StatusClass::Pending,
            Some(s) if s < 200 => StatusClass::Informational,
            Some(s) if s < 300 => StatusClass::Success,
            Some(s) if s < 400 => StatusClass::Redirect,
            Some(s) if s < 500 => StatusClass::ClientError,
            Some(_) => StatusClass::ServerError,
        }
    }

    pub fn is_error(self) -> bool {
        matches!(self, StatusClass::ClientError | StatusClass::ServerError)
    }
}
