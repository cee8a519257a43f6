use std::sync::Mutex;

use serde::Serialize;
use tracing::{info, warn};

/// Severity of a notice as the dashboards present it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Failure,
}

/// Transient user-facing message. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn failure(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Failure,
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Outbound hook for notices so workflows can be exercised without a renderer.
pub trait NoticePublisher: Send + Sync {
    fn publish(&self, notice: Notice);
}

/// In-memory notice buffer drained by whoever renders the portal.
#[derive(Debug, Default)]
pub struct NoticeLog {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeLog {
    pub fn events(&self) -> Vec<Notice> {
        self.notices.lock().expect("notice mutex poisoned").clone()
    }

    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().expect("notice mutex poisoned"))
    }
}

impl NoticePublisher for NoticeLog {
    fn publish(&self, notice: Notice) {
        match notice.kind {
            NoticeKind::Success => info!(title = %notice.title, "notice"),
            NoticeKind::Failure => warn!(title = %notice.title, reason = %notice.description, "notice"),
        }
        self.notices
            .lock()
            .expect("notice mutex poisoned")
            .push(notice);
    }
}
