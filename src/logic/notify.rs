//! User-facing Notifications
//!
//! At most one message is visible at a time. A new notification
//! replaces the current one; the superseded auto-dismiss times out
//! against a stale id and leaves the new message alone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub severity: Severity,
    pub raised_at: DateTime<Utc>,
    pub dismiss_at: DateTime<Utc>,
}

/// Publishes notifications into the store and schedules their dismissal
#[derive(Clone)]
pub struct NotificationCenter {
    store: Store,
    alive: Arc<AtomicBool>,
    dismiss_after: Duration,
}

impl NotificationCenter {
    pub fn new(store: Store, alive: Arc<AtomicBool>, dismiss_after: Duration) -> Self {
        Self {
            store,
            alive,
            dismiss_after,
        }
    }

    /// Show a message, replacing whatever is currently visible.
    /// Publishes nothing once the session has torn down.
    pub fn notify(&self, severity: Severity, message: impl Into<String>) {
        if !self.alive.load(Ordering::SeqCst) {
            return;
        }
        let message = message.into();
        let id = Uuid::new_v4();
        let raised_at = Utc::now();
        let dismiss_at =
            raised_at + chrono::Duration::milliseconds(self.dismiss_after.as_millis() as i64);

        log::debug!("notification [{}] {}", severity, message);
        self.store.update(|s| {
            s.notification = Some(Notification {
                id,
                message,
                severity,
                raised_at,
                dismiss_at,
            });
        });

        let store = self.store.clone();
        let alive = self.alive.clone();
        let delay = self.dismiss_after;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !alive.load(Ordering::SeqCst) {
                return;
            }
            store.update(|s| {
                let expired = s.notification.as_ref().map_or(false, |n| n.id == id);
                if expired {
                    s.notification = None;
                }
            });
        });
    }

    /// Close the current message immediately (user clicked the toast).
    pub fn dismiss(&self) {
        self.store.update(|s| s.notification = None);
    }
}
