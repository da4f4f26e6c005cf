//! Session controller: drives send → display → history-save for one draft.
//!
//! # Design
//! The controller owns the editable draft, the response currently on
//! display and the queue of notifications for the host to show. `send` takes
//! `&mut self`, so a session can never have two dispatches in flight; the
//! `Sending` phase exists for hosts that render while the future is pending.
//!
//! An exchange is saved to history exactly when the dispatch produced an HTTP
//! response, whatever its status. Validation failures, transport failures and
//! cancellations are shown but never stored.

use tracing::{debug, warn};

use crate::dispatch::{CancelToken, Dispatcher};
use crate::error::HistoryError;
use crate::history::HistoryBackend;
use crate::transport::Transport;
use crate::types::{HistoryDraft, HistoryEntry, RequestSpec, ResponseEnvelope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Sending,
    Succeeded,
    Failed,
}

/// Which view of the session the host should present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Request,
    Response,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
}

impl Notification {
    fn info(title: &str, description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            title: title.to_string(),
            description: description.into(),
        }
    }

    fn error(title: &str, description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: title.to_string(),
            description: description.into(),
        }
    }
}

/// Result of one `send`: the terminal phase reached and, when the exchange
/// was stored, the history entry created for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    pub phase: SessionPhase,
    pub history_entry: Option<HistoryEntry>,
}

pub struct SessionController<T, H> {
    dispatcher: Dispatcher<T>,
    history: H,
    draft: RequestSpec,
    response: Option<ResponseEnvelope>,
    phase: SessionPhase,
    focus: Focus,
    notifications: Vec<Notification>,
}

impl<T: Transport, H: HistoryBackend> SessionController<T, H> {
    pub fn new(dispatcher: Dispatcher<T>, history: H) -> Self {
        Self {
            dispatcher,
            history,
            draft: RequestSpec::default(),
            response: None,
            phase: SessionPhase::Idle,
            focus: Focus::Request,
            notifications: Vec::new(),
        }
    }

    pub fn with_draft(mut self, draft: RequestSpec) -> Self {
        self.draft = draft;
        self
    }

    pub fn draft(&self) -> &RequestSpec {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut RequestSpec {
        &mut self.draft
    }

    pub fn response(&self) -> Option<&ResponseEnvelope> {
        self.response.as_ref()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
    }

    pub fn history_backend(&self) -> &H {
        &self.history
    }

    /// Drains queued notifications, oldest first.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub async fn send(&mut self) -> SendOutcome {
        self.send_with(&CancelToken::never()).await
    }

    /// Sends the current draft, publishes the envelope and saves the exchange
    /// to history when a response came back.
    pub async fn send_with(&mut self, cancel: &CancelToken) -> SendOutcome {
        self.enter(SessionPhase::Sending);
        self.response = None;
        self.focus = Focus::Response;

        let envelope = self.dispatcher.dispatch_with(&self.draft, cancel).await;

        let phase = if envelope.is_success() {
            SessionPhase::Succeeded
        } else {
            SessionPhase::Failed
        };
        self.enter(phase);

        match (&envelope.error, envelope.status) {
            (Some(error), _) => self.notify(Notification::error("Request Error", error.clone())),
            (None, Some(status)) => {
                let text = envelope.status_text.as_deref().unwrap_or_default();
                self.notify(Notification::info(
                    "Request Successful",
                    format!("Status: {status} {text}").trim_end().to_string(),
                ));
            }
            (None, None) => {}
        }

        let draft = envelope
            .is_success()
            .then(|| HistoryDraft::from_exchange(&self.draft, &envelope));
        self.response = Some(envelope);

        let history_entry = match draft {
            Some(draft) => self.save(draft).await,
            None => None,
        };

        self.enter(SessionPhase::Idle);
        SendOutcome {
            phase,
            history_entry,
        }
    }

    async fn save(&mut self, draft: HistoryDraft) -> Option<HistoryEntry> {
        match self.history.append(draft).await {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "failed to save history entry");
                let description = match err {
                    HistoryError::Rejected { message, .. } => {
                        format!("Could not save to history: {message}")
                    }
                    HistoryError::Unreachable(_) => {
                        "Failed to connect to history service.".to_string()
                    }
                    other => format!("Could not save to history: {other}"),
                };
                self.notify(Notification::error("History Save Error", description));
                None
            }
        }
    }

    /// Stored exchanges, newest first. A failed fetch is reported as a
    /// notification and yields an empty list.
    pub async fn history(&mut self) -> Vec<HistoryEntry> {
        match self.history.list().await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(error = %err, "failed to fetch history");
                self.notify(Notification::error(
                    "History Fetch Error",
                    format!("Could not fetch request history: {err}"),
                ));
                Vec::new()
            }
        }
    }

    /// Copies a stored request into the draft under fresh header ids and
    /// clears the response on display.
    pub fn load_history_item(&mut self, entry: &HistoryEntry) {
        self.draft = RequestSpec {
            url: entry.request.url.clone(),
            method: entry.request.method,
            headers: entry
                .request
                .headers
                .iter()
                .map(|h| h.with_fresh_id())
                .collect(),
            body: entry.request.body.clone(),
        };
        self.response = None;
        self.focus = Focus::Request;
        self.notify(Notification::info(
            "History Item Loaded",
            "Request details loaded into composer.",
        ));
    }

    fn enter(&mut self, next: SessionPhase) {
        debug!(from = ?self.phase, to = ?next, "session phase change");
        self.phase = next;
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }
}
