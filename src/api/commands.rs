//! Panel Commands
//!
//! One entry point per user action. Commands never return errors to the
//! caller: outcomes land in the store and the notification slot, and
//! connectivity failures are routed to the connection monitor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::logic::daemon::client::{ApiError, DaemonApi};
use crate::logic::daemon::types::{PanelConfig, ScanKind, StartScanRequest, ThreatAction};
use crate::logic::mirrors::Mirrors;
use crate::logic::monitor::ConnectionMonitor;
use crate::logic::notify::{NotificationCenter, Severity};
use crate::logic::scan_state::ScanLifecycle;
use crate::logic::store::{Store, View};

/// Asks the operator before a destructive command runs.
///
/// The embedding shell decides how to ask (modal dialog, terminal
/// prompt). Commands call it before issuing the request; a declined
/// prompt aborts the command without any daemon traffic.
pub trait ConfirmPrompt: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Fixed confirmation answer, for headless runs and tests.
pub struct AutoConfirm(pub bool);

impl ConfirmPrompt for AutoConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

#[derive(Clone)]
pub struct CommandDispatcher {
    store: Store,
    daemon: Arc<dyn DaemonApi>,
    notifier: NotificationCenter,
    monitor: ConnectionMonitor,
    mirrors: Mirrors,
    lifecycle: ScanLifecycle,
    confirm: Arc<dyn ConfirmPrompt>,
    alive: Arc<AtomicBool>,
}

impl CommandDispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Store,
        daemon: Arc<dyn DaemonApi>,
        notifier: NotificationCenter,
        monitor: ConnectionMonitor,
        mirrors: Mirrors,
        lifecycle: ScanLifecycle,
        confirm: Arc<dyn ConfirmPrompt>,
        alive: Arc<AtomicBool>,
    ) -> Self {
        Self {
            store,
            daemon,
            notifier,
            monitor,
            mirrors,
            lifecycle,
            confirm,
            alive,
        }
    }

    // ========================================================================
    // SCANNING
    // ========================================================================

    /// Start a full or custom scan. A custom scan needs at least one
    /// configured path; without one the command redirects to settings
    /// instead of calling the daemon.
    pub async fn start_scan(&self, kind: ScanKind) {
        let paths = match kind {
            ScanKind::Full => None,
            ScanKind::Custom => {
                let paths = self.store.with(|s| s.config.scan_path_list());
                if paths.is_empty() {
                    self.notifier.notify(
                        Severity::Warning,
                        "Configure scan paths before starting a custom scan",
                    );
                    self.store.set_active_view(View::Settings);
                    return;
                }
                Some(paths)
            }
        };

        let seq = self.monitor.begin_request();
        let request = StartScanRequest {
            scan_type: kind,
            paths,
        };
        match self.daemon.start_scan(request).await {
            Ok(response) => {
                if !self.alive.load(Ordering::SeqCst) {
                    return;
                }
                self.monitor.confirm_alive(seq);
                log::info!(
                    "Scan started: {}",
                    response.scan_id.as_deref().unwrap_or("unknown")
                );
                self.lifecycle.begin_local(response.scan_id);
                let message = match kind {
                    ScanKind::Full => "Full scan started",
                    ScanKind::Custom => "Custom scan started",
                };
                self.notifier.notify(Severity::Success, message);
                self.mirrors.load_scan_history().await;
            }
            Err(err) => self.fail(seq, &err, "Failed to start scan"),
        }
    }

    /// Ask the daemon to cancel the running scan.
    pub async fn stop_scan(&self) {
        let seq = self.monitor.begin_request();
        match self.daemon.stop_scan().await {
            Ok(_) => {
                if !self.alive.load(Ordering::SeqCst) {
                    return;
                }
                self.monitor.confirm_alive(seq);
                self.store.update(|s| s.is_scanning = false);
                log::info!("Scan stop requested");
                self.notifier.notify(Severity::Info, "Scan stopped");
                self.mirrors.load_scan_history().await;
            }
            Err(err) => self.fail(seq, &err, "Failed to stop scan"),
        }
    }

    // ========================================================================
    // THREATS
    // ========================================================================

    /// Apply a disposition to a detected threat.
    pub async fn handle_threat(&self, id: i64, action: ThreatAction) {
        let seq = self.monitor.begin_request();
        match self.daemon.handle_threat(id, action).await {
            Ok(_) => {
                if !self.alive.load(Ordering::SeqCst) {
                    return;
                }
                self.monitor.confirm_alive(seq);
                log::info!("Threat {} handled: {}", id, action);
                self.notifier.notify(Severity::Success, "Threat handled");
                self.mirrors.load_threats().await;
            }
            Err(err) => self.fail(seq, &err, "Failed to handle threat"),
        }
    }

    // ========================================================================
    // QUARANTINE
    // ========================================================================

    /// Put a quarantined file back where it came from.
    pub async fn restore_quarantine(&self, uuid: &str) {
        let seq = self.monitor.begin_request();
        match self.daemon.restore_quarantine(uuid).await {
            Ok(_) => {
                if !self.alive.load(Ordering::SeqCst) {
                    return;
                }
                self.monitor.confirm_alive(seq);
                log::info!("Quarantined file restored: {}", uuid);
                self.notifier.notify(Severity::Success, "File restored");
                self.mirrors.load_quarantine().await;
            }
            Err(err) => self.fail(seq, &err, "Failed to restore file"),
        }
    }

    /// Permanently remove one quarantined file. Confirmed first.
    pub async fn delete_quarantine(&self, uuid: &str) {
        if !self.confirm.confirm("Delete this quarantined file permanently?") {
            log::debug!("Quarantine delete declined: {}", uuid);
            return;
        }
        let seq = self.monitor.begin_request();
        match self.daemon.delete_quarantine(uuid).await {
            Ok(_) => {
                if !self.alive.load(Ordering::SeqCst) {
                    return;
                }
                self.monitor.confirm_alive(seq);
                log::info!("Quarantined file deleted: {}", uuid);
                self.notifier.notify(Severity::Success, "File deleted");
                self.mirrors.load_quarantine().await;
            }
            Err(err) => self.fail(seq, &err, "Failed to delete file"),
        }
    }

    /// Wipe the whole quarantine. Confirmed first.
    pub async fn cleanup_quarantine(&self) {
        if !self.confirm.confirm("Remove all quarantined files?") {
            log::debug!("Quarantine cleanup declined");
            return;
        }
        let seq = self.monitor.begin_request();
        match self.daemon.cleanup_quarantine().await {
            Ok(response) => {
                if !self.alive.load(Ordering::SeqCst) {
                    return;
                }
                self.monitor.confirm_alive(seq);
                log::info!(
                    "Quarantine cleanup removed {} file(s), freed {} bytes",
                    response.cleaned_count,
                    response.freed_bytes
                );
                self.notifier.notify(Severity::Success, "Quarantine cleaned");
                self.mirrors.load_quarantine().await;
            }
            Err(err) => self.fail(seq, &err, "Failed to clean quarantine"),
        }
    }

    // ========================================================================
    // SCAN HISTORY
    // ========================================================================

    /// Drop one scan record. Confirmed first.
    pub async fn delete_scan_history(&self, id: i64) {
        if !self.confirm.confirm("Delete this scan record?") {
            log::debug!("Scan record delete declined: {}", id);
            return;
        }
        let seq = self.monitor.begin_request();
        match self.daemon.delete_scan_history(id).await {
            Ok(_) => {
                if !self.alive.load(Ordering::SeqCst) {
                    return;
                }
                self.monitor.confirm_alive(seq);
                log::info!("Scan record deleted: {}", id);
                self.notifier.notify(Severity::Success, "Scan record deleted");
                self.mirrors.load_scan_history().await;
            }
            Err(err) => self.fail(seq, &err, "Failed to delete scan record"),
        }
    }

    /// Drop every scan record. Confirmed first.
    pub async fn clear_scan_history(&self) {
        if !self.confirm.confirm("Clear all scan history?") {
            log::debug!("Scan history clear declined");
            return;
        }
        let seq = self.monitor.begin_request();
        match self.daemon.clear_scan_history().await {
            Ok(_) => {
                if !self.alive.load(Ordering::SeqCst) {
                    return;
                }
                self.monitor.confirm_alive(seq);
                log::info!("Scan history cleared");
                self.notifier.notify(Severity::Success, "Scan history cleared");
                self.mirrors.load_scan_history().await;
            }
            Err(err) => self.fail(seq, &err, "Failed to clear scan history"),
        }
    }

    // ========================================================================
    // SIGNATURE UPDATES
    // ========================================================================

    /// Kick off a signature database update. Completion is picked up by
    /// the polling scheduler.
    pub async fn start_update(&self) {
        let seq = self.monitor.begin_request();
        match self.daemon.start_update().await {
            Ok(_) => {
                if !self.alive.load(Ordering::SeqCst) {
                    return;
                }
                self.monitor.confirm_alive(seq);
                self.store.update(|s| s.update_in_progress = true);
                log::info!("Signature update started");
                self.notifier
                    .notify(Severity::Success, "Signature update started");
            }
            Err(err) => self.fail(seq, &err, "Failed to start update"),
        }
    }

    // ========================================================================
    // CONFIGURATION
    // ========================================================================

    /// Push the edited configuration to the daemon, then re-read it so
    /// the mirror shows what the daemon actually stored.
    pub async fn save_config(&self, config: PanelConfig) {
        let seq = self.monitor.begin_request();
        match self.daemon.put_config(config.to_wire()).await {
            Ok(_) => {
                if !self.alive.load(Ordering::SeqCst) {
                    return;
                }
                self.monitor.confirm_alive(seq);
                log::info!("Configuration saved");
                self.notifier.notify(Severity::Success, "Configuration saved");
                self.mirrors.load_config().await;
            }
            Err(err) => self.fail(seq, &err, "Failed to save configuration"),
        }
    }

    /// Shared failure path. Connectivity losses flip the monitor and
    /// show the generic message; daemon-side rejections surface their
    /// own text when they carry one. A failure resolving after session
    /// teardown is dropped.
    fn fail(&self, seq: u64, err: &ApiError, fallback: &str) {
        if !self.alive.load(Ordering::SeqCst) {
            return;
        }
        log::error!("{}: {}", fallback, err);
        if err.is_connectivity() {
            self.monitor.report_unreachable(seq);
            self.notifier.notify(Severity::Error, fallback);
            return;
        }
        self.monitor.confirm_alive(seq);
        let message = match err {
            ApiError::Application(msg) if !msg.is_empty() => msg.clone(),
            _ => fallback.to_string(),
        };
        self.notifier.notify(Severity::Error, message);
    }
}
