//! Interactive confirmation, prompt and notification seam.
//!
//! Controllers never block on a dialog directly; they await one of these
//! calls, so a host can back them with terminal prompts, a web view, or a
//! scripted double in tests.

use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Warning,
    Error,
    Info,
}

impl NotificationKind {
    pub fn icon(self) -> &'static str {
        match self {
            Self::Success => "✅",
            Self::Warning => "⚠️",
            Self::Error => "❌",
            Self::Info => "ℹ️",
        }
    }
}

/// Transient toast shown by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, message)
    }
}

#[async_trait]
pub trait Dialogs: Send + Sync {
    /// Yes/no question. `false` when the user declines or dismisses it.
    async fn confirm(&self, message: &str) -> bool;

    /// Free-text question pre-filled with `default`. `None` on cancel.
    async fn prompt(&self, message: &str, default: &str) -> Option<String>;

    /// Blocking message that must be acknowledged.
    async fn alert(&self, message: &str);

    fn notify(&self, notification: Notification);
}
