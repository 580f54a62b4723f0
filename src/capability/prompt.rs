//! User-facing prompts and toast notices.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log only.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => tracing::info!("{}", notice.text),
            NoticeLevel::Error => tracing::warn!("{}", notice.text),
        }
    }
}

/// Forwards notices to whoever renders them.
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        if self.tx.send(notice).is_err() {
            tracing::debug!("notice dropped, no listener");
        }
    }
}

/// Asks the user for an API key.
#[async_trait]
pub trait CredentialPrompt: Send + Sync {
    /// `None` when the user declines.
    async fn request_api_key(&self, message: &str) -> Option<String>;
}

/// Never supplies a key.
pub struct DeclinePrompt;

#[async_trait]
impl CredentialPrompt for DeclinePrompt {
    async fn request_api_key(&self, _message: &str) -> Option<String> {
        None
    }
}

pub struct KeyRequest {
    pub message: String,
    pub reply: oneshot::Sender<Option<String>>,
}

/// Hands key requests to a UI that answers through the enclosed sender.
pub struct ChannelPrompt {
    tx: mpsc::UnboundedSender<KeyRequest>,
}

impl ChannelPrompt {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<KeyRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl CredentialPrompt for ChannelPrompt {
    async fn request_api_key(&self, message: &str) -> Option<String> {
        let (reply, answer) = oneshot::channel();
        let request = KeyRequest {
            message: message.to_string(),
            reply,
        };
        if self.tx.send(request).is_err() {
            tracing::warn!("no UI listening for API key requests");
            return None;
        }
        answer
            .await
            .ok()
            .flatten()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}
