//! Core of the API explorer: compose a request, dispatch it, keep a history.
//!
//! # Overview
//! A `SessionController` owns an editable `RequestSpec`. Sending it runs the
//! `Dispatcher`, which validates the draft, performs one round-trip through a
//! `Transport` and normalizes the result into a `ResponseEnvelope`. Exchanges
//! that produced an HTTP response are appended to a `HistoryBackend`, and any
//! stored entry can be loaded back into the draft.
//!
//! # Design
//! - Requests and responses cross the I/O boundary as plain data
//!   (`HttpRequest` / `HttpResponse`); only `Transport` implementations touch
//!   the network, so every other step is deterministic and testable.
//! - The history service is spoken to through the same shape:
//!   `HistoryClient` builds and parses, `RemoteHistory` executes.
//! - Dispatch never returns `Err`; failures are part of the envelope.

pub mod client;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod history;
pub mod http;
pub mod session;
pub mod transport;
pub mod types;

pub use client::HistoryClient;
pub use dispatch::{cancel_pair, CancelHandle, CancelToken, Dispatcher};
pub use error::{DispatchError, HistoryError, MethodParseError, TransportError};
pub use history::{HistoryBackend, MemoryHistory, RemoteHistory, DEFAULT_HISTORY_CAP};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use session::{Focus, Notification, NotificationLevel, SendOutcome, SessionController, SessionPhase};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    AppendAck, ErrorBody, FailureKind, HeaderItem, HistoryDraft, HistoryEntry, RequestSpec,
    ResponseEnvelope, ResponseSummary,
};
