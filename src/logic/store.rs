//! Shared Application State
//!
//! A single typed aggregate mirroring the daemon's state, owned behind
//! one lock. Components mutate it only through their own named
//! operations; the lock is never held across await points.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::daemon::types::{
    PanelConfig, QuarantineItem, ScanHistoryEntry, ScanProgress, ThreatItem, ThreatsSummary,
    UpdateHistoryEntry,
};
use super::notify::Notification;
use super::version::SignatureVersions;

/// Daemon connectivity as the monitor sees it
#[derive(Debug, Clone)]
pub struct ConnectionState {
    pub connected: bool,
    pub checking: bool,
    pub last_check: Option<DateTime<Utc>>,
    /// Consecutive failed liveness outcomes since the last success
    pub retry_count: u32,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self {
            connected: false,
            checking: true,
            last_check: None,
            retry_count: 0,
        }
    }
}

/// Scan lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Scanning,
    Completed,
    Failed,
}

impl ScanPhase {
    /// Map a wire status string. The daemon can also report transient
    /// statuses (`stopped`, unknown values); those read as idle.
    pub fn from_wire(status: &str) -> Self {
        match status {
            "scanning" => Self::Scanning,
            "completed" => Self::Completed,
            "failed" | "error" => Self::Failed,
            _ => Self::Idle,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Scanning => "scanning",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl Default for ScanPhase {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Current scan as last observed, replaced wholesale on every poll
#[derive(Debug, Clone, Default)]
pub struct ScanView {
    pub scan_id: Option<String>,
    pub phase: ScanPhase,
    pub progress: Option<ScanProgress>,
    pub threats: Option<ThreatsSummary>,
}

/// Active panel view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Threats,
    Quarantine,
    History,
    Updates,
    Settings,
}

impl Default for View {
    fn default() -> Self {
        Self::Threats
    }
}

/// Everything the panel renders from
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub connection: ConnectionState,
    /// Newest request sequence number whose outcome has been applied
    pub last_applied_seq: u64,
    /// Daemon-reported scan activity, independent from the scan view
    pub is_scanning: bool,
    pub scan: ScanView,
    /// Bumped on every applied scan phase transition; stale settle
    /// actions compare against it
    pub scan_epoch: u64,
    pub show_progress: bool,
    pub update_in_progress: bool,

    // Resource mirrors
    pub threats: Vec<ThreatItem>,
    pub quarantine: Vec<QuarantineItem>,
    pub quarantine_total_bytes: u64,
    pub scan_history: Vec<ScanHistoryEntry>,
    pub update_history: Vec<UpdateHistoryEntry>,
    pub versions: SignatureVersions,
    pub config: PanelConfig,

    pub notification: Option<Notification>,
    pub active_view: View,
    /// True once the first post-connect mirror fan-out has settled
    pub ready: bool,
}

/// Cheap-to-clone handle to the shared aggregate
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<RwLock<AppState>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the full state, for rendering or assertions
    pub fn snapshot(&self) -> AppState {
        self.inner.read().clone()
    }

    pub(crate) fn with<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.inner.read())
    }

    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut AppState) -> R) -> R {
        f(&mut self.inner.write())
    }

    pub fn is_connected(&self) -> bool {
        self.inner.read().connection.connected
    }

    pub fn is_ready(&self) -> bool {
        self.inner.read().ready
    }

    pub fn notification(&self) -> Option<Notification> {
        self.inner.read().notification.clone()
    }

    pub fn active_view(&self) -> View {
        self.inner.read().active_view
    }

    /// Navigate the panel
    pub fn set_active_view(&self, view: View) {
        self.inner.write().active_view = view;
    }

    /// Threats found across all recorded scans
    pub fn total_threats(&self) -> i64 {
        self.inner
            .read()
            .scan_history
            .iter()
            .map(|entry| entry.threats_found as i64)
            .sum()
    }
}
