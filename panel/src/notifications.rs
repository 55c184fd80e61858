//! User-visible notifications
//!
//! Two independent containers, neither persisted:
//!
//! - `ToastCenter`: transient toasts. The HTTP layer emits exactly one error
//!   toast per failed request; hooks emit success toasts. Identical toasts
//!   raised inside a short window collapse into one, so a retried read that
//!   fails twice still shows a single message.
//! - `NotificationInbox`: in-app notification list with unread tracking,
//!   newest first, bounded.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::constants::notifications::{MAX_INBOX_ENTRIES, MAX_TOASTS, TOAST_DEDUP_WINDOW};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize)]
pub struct Toast {
    pub id: Uuid,
    pub kind: ToastKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

struct ToastEntry {
    toast: Toast,
    raised_at: Instant,
}

#[derive(Clone)]
pub struct ToastCenter {
    entries: Arc<RwLock<VecDeque<ToastEntry>>>,
    sender: broadcast::Sender<Toast>,
}

impl ToastCenter {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(MAX_TOASTS);
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(MAX_TOASTS))),
            sender,
        }
    }

    pub async fn success(&self, message: impl Into<String>) -> bool {
        self.push(ToastKind::Success, message.into()).await
    }

    pub async fn error(&self, message: impl Into<String>) -> bool {
        self.push(ToastKind::Error, message.into()).await
    }

    pub async fn warning(&self, message: impl Into<String>) -> bool {
        self.push(ToastKind::Warning, message.into()).await
    }

    pub async fn info(&self, message: impl Into<String>) -> bool {
        self.push(ToastKind::Info, message.into()).await
    }

    /// Raise a toast. Returns false when it collapsed into an identical recent one.
    pub async fn push(&self, kind: ToastKind, message: String) -> bool {
        let mut entries = self.entries.write().await;
        let now = Instant::now();

        let duplicate = entries.iter().any(|entry| {
            entry.toast.kind == kind
                && entry.toast.message == message
                && now.duration_since(entry.raised_at) < TOAST_DEDUP_WINDOW
        });
        if duplicate {
            debug!("Collapsed duplicate {:?} toast: {}", kind, message);
            return false;
        }

        let toast = Toast {
            id: Uuid::new_v4(),
            kind,
            message,
            created_at: Utc::now(),
        };

        if entries.len() == MAX_TOASTS {
            entries.pop_front();
        }
        entries.push_back(ToastEntry {
            toast: toast.clone(),
            raised_at: now,
        });

        // Nobody listening is fine
        let _ = self.sender.send(toast);
        true
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.sender.subscribe()
    }

    pub async fn toasts(&self) -> Vec<Toast> {
        self.entries
            .read()
            .await
            .iter()
            .map(|entry| entry.toast.clone())
            .collect()
    }

    pub async fn count(&self, kind: ToastKind) -> usize {
        self.entries
            .read()
            .await
            .iter()
            .filter(|entry| entry.toast.kind == kind)
            .count()
    }

    pub async fn last(&self) -> Option<Toast> {
        self.entries
            .read()
            .await
            .back()
            .map(|entry| entry.toast.clone())
    }

    pub async fn dismiss(&self, id: Uuid) {
        self.entries.write().await.retain(|entry| entry.toast.id != id);
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

impl Default for ToastCenter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InboxNotification {
    pub id: Uuid,
    pub title: String,
    pub message: Option<String>,
    pub kind: ToastKind,
    pub read: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct InboxState {
    notifications: VecDeque<InboxNotification>,
    unread_count: usize,
}

#[derive(Clone, Default)]
pub struct NotificationInbox {
    state: Arc<RwLock<InboxState>>,
}

impl NotificationInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, kind: ToastKind, title: &str, message: Option<String>) -> Uuid {
        let mut state = self.state.write().await;
        let notification = InboxNotification {
            id: Uuid::new_v4(),
            title: title.to_string(),
            message,
            kind,
            read: false,
            timestamp: Utc::now(),
        };
        let id = notification.id;

        state.notifications.push_front(notification);
        state.unread_count += 1;

        while state.notifications.len() > MAX_INBOX_ENTRIES {
            if let Some(dropped) = state.notifications.pop_back() {
                if !dropped.read {
                    state.unread_count = state.unread_count.saturating_sub(1);
                }
            }
        }
        id
    }

    pub async fn mark_as_read(&self, id: Uuid) {
        let mut state = self.state.write().await;
        let mut newly_read = false;
        if let Some(n) = state.notifications.iter_mut().find(|n| n.id == id) {
            newly_read = !n.read;
            n.read = true;
        }
        if newly_read {
            state.unread_count = state.unread_count.saturating_sub(1);
        }
    }

    pub async fn mark_all_as_read(&self) {
        let mut state = self.state.write().await;
        for n in state.notifications.iter_mut() {
            n.read = true;
        }
        state.unread_count = 0;
    }

    pub async fn remove(&self, id: Uuid) {
        let mut state = self.state.write().await;
        let was_unread = state
            .notifications
            .iter()
            .any(|n| n.id == id && !n.read);
        state.notifications.retain(|n| n.id != id);
        if was_unread {
            state.unread_count = state.unread_count.saturating_sub(1);
        }
    }

    pub async fn clear_all(&self) {
        let mut state = self.state.write().await;
        state.notifications.clear();
        state.unread_count = 0;
    }

    pub async fn unread_count(&self) -> usize {
        self.state.read().await.unread_count
    }

    pub async fn notifications(&self) -> Vec<InboxNotification> {
        self.state.read().await.notifications.iter().cloned().collect()
    }
}
