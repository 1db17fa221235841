//! Notification channel consumed by session operations.
//!
//! Operations report progress through an injected [`Notifier`]. The notifier
//! is fire-and-forget: nothing it does can affect the operation.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// A notice emitted by a session operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Loading,
    Success(String),
    Error(String),
}

/// Wire form of a notice: `{loading:true}`, `{success}` or `{error}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loading: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Notice> for AlertPayload {
    fn from(notice: Notice) -> Self {
        match notice {
            Notice::Loading => AlertPayload {
                loading: Some(true),
                ..AlertPayload::default()
            },
            Notice::Success(msg) => AlertPayload {
                success: Some(msg),
                ..AlertPayload::default()
            },
            Notice::Error(msg) => AlertPayload {
                error: Some(msg),
                ..AlertPayload::default()
            },
        }
    }
}

/// Capability to publish notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);

    fn loading(&self) {
        self.notify(Notice::Loading);
    }

    fn success(&self, msg: &str) {
        self.notify(Notice::Success(msg.to_string()));
    }

    fn error(&self, msg: &str) {
        self.notify(Notice::Error(msg.to_string()));
    }
}

/// Forwards notices into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    pub fn new(tx: mpsc::UnboundedSender<Notice>) -> Self {
        Self { tx }
    }

    /// Creates a notifier together with the receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        // Receiver gone means nobody is listening; drop the notice.
        let _ = self.tx.send(notice);
    }
}

/// Emits notices as tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Loading => tracing::debug!("loading"),
            Notice::Success(msg) => tracing::info!(%msg, "success"),
            Notice::Error(msg) => tracing::warn!(%msg, "error"),
        }
    }
}
