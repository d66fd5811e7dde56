//! Observability - operator notices about action outcomes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    CreateRequested,
    CreateFailed,
    CreateRejected,
    DeleteRequested,
    DeleteFailed,
    RefreshFailed,
    ProvisioningSettled,
    PollExhausted,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateRequested => "create_requested",
            Self::CreateFailed => "create_failed",
            Self::CreateRejected => "create_rejected",
            Self::DeleteRequested => "delete_requested",
            Self::DeleteFailed => "delete_failed",
            Self::RefreshFailed => "refresh_failed",
            Self::ProvisioningSettled => "provisioning_settled",
            Self::PollExhausted => "poll_exhausted",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::CreateFailed | Self::CreateRejected | Self::DeleteFailed | Self::RefreshFailed
        )
    }
}

/// A message for the operator about an action outcome.
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub timestamp: DateTime<Utc>,
    pub kind: NoticeKind,
    pub store_id: Option<String>,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            store_id: None,
            message: message.into(),
        }
    }

    pub fn for_store(mut self, store_id: impl Into<String>) -> Self {
        self.store_id = Some(store_id.into());
        self
    }
}

/// Sending half of the notice channel.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notice>,
}

/// Create a notice channel.
pub fn notice_channel() -> (Notifier, mpsc::UnboundedReceiver<Notice>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Notifier { tx }, rx)
}

impl Notifier {
    /// A notifier nobody listens to
    pub fn detached() -> Self {
        notice_channel().0
    }

    /// Publish a notice. Also logged, so nothing is lost when the receiver
    /// has gone away.
    pub fn emit(&self, notice: Notice) {
        if notice.kind.is_failure() {
            tracing::warn!(
                kind = ?notice.kind,
                store_id = ?notice.store_id,
                "{}",
                notice.message
            );
        } else {
            tracing::info!(
                kind = ?notice.kind,
                store_id = ?notice.store_id,
                "{}",
                notice.message
            );
        }
        let _ = self.tx.send(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emitted_notices_reach_receiver() {
        let (notifier, mut rx) = notice_channel();
        notifier.emit(Notice::new(NoticeKind::DeleteRequested, "bye").for_store("s1"));

        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.kind, NoticeKind::DeleteRequested);
        assert_eq!(notice.store_id.as_deref(), Some("s1"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn detached_notifier_does_not_fail() {
        Notifier::detached().emit(Notice::new(NoticeKind::RefreshFailed, "down"));
    }

    #[test]
    fn notices_serialize_snake_case() {
        let json = serde_json::to_value(Notice::new(NoticeKind::PollExhausted, "gave up")).unwrap();
        assert_eq!(json["kind"], "poll_exhausted");
        assert_eq!(json["store_id"], serde_json::Value::Null);
    }
}
