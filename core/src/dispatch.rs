//! Request dispatch: draft in, normalized envelope out.
//!
//! # Design
//! Dispatch is split the same way as every other exchange in this crate: a
//! pure `prepare` step turns a `RequestSpec` into an `HttpRequest`, the
//! `Transport` performs the round-trip, and a pure `normalize` step turns the
//! `HttpResponse` into a `ResponseEnvelope`. Only the middle step suspends,
//! and it races a `CancelToken` so a caller can abandon it.

use std::collections::BTreeMap;
use std::time::Instant;

use tokio::sync::watch;
use tracing::debug;

use crate::error::DispatchError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{RequestSpec, ResponseEnvelope};

const DEFAULT_SCHEME: &str = "https://";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Sends drafts through a `Transport` and normalizes the outcome.
#[derive(Debug, Clone)]
pub struct Dispatcher<T> {
    transport: T,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn dispatch(&self, spec: &RequestSpec) -> ResponseEnvelope {
        self.dispatch_with(spec, &CancelToken::never()).await
    }

    /// Dispatches `spec`, giving up early if `cancel` fires.
    ///
    /// Never fails: every problem is reported inside the envelope.
    pub async fn dispatch_with(&self, spec: &RequestSpec, cancel: &CancelToken) -> ResponseEnvelope {
        let request = match prepare(spec) {
            Ok(request) => request,
            Err(err) => {
                debug!(error = %err, "request rejected before sending");
                return ResponseEnvelope::failed(&err, None);
            }
        };
        debug!(method = %request.method, url = %request.url, "dispatching request");

        let started = Instant::now();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DispatchError::Cancelled),
            result = self.transport.execute(request) => result.map_err(DispatchError::from),
        };
        let time = elapsed_ms(started);

        match outcome {
            Ok(response) => {
                debug!(status = response.status, time, "response received");
                normalize(response, time)
            }
            Err(err) => {
                debug!(error = %err, time, "request failed");
                ResponseEnvelope::failed(&err, Some(time))
            }
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    (started.elapsed().as_secs_f64() * 1000.0).round() as u64
}

/// Validates a draft and builds the request that would be transmitted.
pub fn prepare(spec: &RequestSpec) -> Result<HttpRequest, DispatchError> {
    let url = normalize_url(&spec.url)?;

    let headers = spec
        .active_headers()
        .map(|h| (h.key.clone(), h.value.clone()))
        .collect();

    let body = if spec.method.carries_body() {
        spec.body.clone()
    } else {
        None
    };

    Ok(HttpRequest {
        method: spec.method,
        url,
        headers,
        body,
    })
}

/// Prefixes `https://` when the URL has no http(s) scheme, then checks that
/// the result parses. The returned string is the prefixed input, not the
/// parser's re-serialization.
pub fn normalize_url(raw: &str) -> Result<String, DispatchError> {
    if raw.trim().is_empty() {
        return Err(DispatchError::MissingUrl);
    }

    let url = if has_http_scheme(raw) {
        raw.to_string()
    } else {
        format!("{DEFAULT_SCHEME}{raw}")
    };

    reqwest::Url::parse(&url).map_err(|e| DispatchError::InvalidUrl(e.to_string()))?;
    Ok(url)
}

fn has_http_scheme(url: &str) -> bool {
    let bytes = url.as_bytes();
    ["http://", "https://"].iter().any(|scheme| {
        bytes
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme.as_bytes()))
    })
}

/// Turns a transport response into an envelope.
///
/// A JSON content type whose body fails to parse falls back to the raw text
/// in `data`; that failure is not reported.
pub fn normalize(response: HttpResponse, time: u64) -> ResponseEnvelope {
    let size = response
        .header("content-length")
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(0);

    let is_json = response
        .header("content-type")
        .is_some_and(|v| v.to_ascii_lowercase().contains(JSON_CONTENT_TYPE));

    let data = if is_json {
        serde_json::from_str(&response.body)
            .unwrap_or_else(|_| serde_json::Value::String(response.body.clone()))
    } else {
        serde_json::Value::String(response.body.clone())
    };

    let headers: BTreeMap<String, String> = response.headers.into_iter().collect();

    ResponseEnvelope {
        status: Some(response.status),
        status_text: Some(response.status_text),
        headers: Some(headers),
        raw_body: Some(response.body),
        data: Some(data),
        error: None,
        failure: None,
        size: Some(size),
        time: Some(time),
    }
}

/// Creates a linked cancel handle and token.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

/// Requests cancellation of every dispatch holding the paired token.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// A token that never fires.
    pub fn never() -> Self {
        cancel_pair().1
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested. Pends forever if the handle
    /// is dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
