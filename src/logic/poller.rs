//! Polling Scheduler
//!
//! One serialized tick per poll interval while the connection gate is
//! open. Every tick refreshes system status; scan status is fetched
//! only while a scan runs or its progress panel is still shown; update
//! status only while an update is in flight. Failures inside a tick
//! are logged, never notified; connectivity-class failures go to the
//! monitor and end the tick. A tick whose request resolves after the
//! session tore down applies nothing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use super::daemon::client::DaemonApi;
use super::mirrors::Mirrors;
use super::monitor::ConnectionMonitor;
use super::scan_state::ScanLifecycle;
use super::store::Store;

pub struct PollingScheduler {
    store: Store,
    daemon: Arc<dyn DaemonApi>,
    monitor: ConnectionMonitor,
    mirrors: Mirrors,
    lifecycle: ScanLifecycle,
    alive: Arc<AtomicBool>,
    interval: Duration,
}

impl PollingScheduler {
    pub fn new(
        store: Store,
        daemon: Arc<dyn DaemonApi>,
        monitor: ConnectionMonitor,
        mirrors: Mirrors,
        lifecycle: ScanLifecycle,
        alive: Arc<AtomicBool>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            daemon,
            monitor,
            mirrors,
            lifecycle,
            alive,
            interval,
        }
    }

    /// Tick loop. Ticks are strictly sequential: the next wait starts
    /// only after the current tick has fully finished.
    pub async fn run(self, mut gate: watch::Receiver<bool>, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                return;
            }
            if !*gate.borrow() {
                tokio::select! {
                    result = gate.wait_for(|open| *open) => {
                        if result.is_err() {
                            return;
                        }
                    }
                    _ = shutdown.changed() => return,
                }
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.changed() => return,
            }
            if *shutdown.borrow() || !*gate.borrow() {
                continue;
            }
            self.tick().await;
        }
    }

    pub(crate) async fn tick(&self) {
        // system status comes first; losing it ends the tick
        let seq = self.monitor.begin_request();
        let outcome = self.daemon.status().await;
        if !self.alive.load(Ordering::SeqCst) {
            return;
        }
        let snapshot = match outcome {
            Ok(snapshot) => snapshot,
            Err(err) => {
                if err.is_connectivity() {
                    self.monitor.report_unreachable(seq);
                } else {
                    log::warn!("Status poll failed: {}", err);
                }
                return;
            }
        };
        self.monitor.confirm_connected(seq, &snapshot);

        // scan status while a scan runs or its progress is still shown
        if self.store.with(|s| s.is_scanning || s.show_progress) {
            let seq = self.monitor.begin_request();
            let outcome = self.daemon.scan_status().await;
            if !self.alive.load(Ordering::SeqCst) {
                return;
            }
            match outcome {
                Ok(scan) => {
                    self.monitor.confirm_alive(seq);
                    self.lifecycle.observe(scan).await;
                }
                Err(err) => {
                    if err.is_connectivity() {
                        self.monitor.report_unreachable(seq);
                        return;
                    }
                    log::warn!("Scan status poll failed: {}", err);
                }
            }
        }

        // update progress, if one was started
        if self.store.with(|s| s.update_in_progress) {
            let seq = self.monitor.begin_request();
            let outcome = self.daemon.update_status().await;
            if !self.alive.load(Ordering::SeqCst) {
                return;
            }
            match outcome {
                Ok(poll) => {
                    self.monitor.confirm_alive(seq);
                    if !poll.is_updating {
                        self.store.update(|s| s.update_in_progress = false);
                        log::info!("Signature update finished");
                        self.mirrors.load_signature_version().await;
                        self.mirrors.load_update_history().await;
                    }
                }
                Err(err) => {
                    if err.is_connectivity() {
                        self.monitor.report_unreachable(seq);
                    } else {
                        log::warn!("Update status poll failed: {}", err);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::daemon::client::ApiError;
    use crate::logic::daemon::fake::FakeDaemon;
    use crate::logic::daemon::types::*;
    use crate::logic::notify::{NotificationCenter, Severity};
    use crate::logic::store::ScanPhase;

    struct Rig {
        store: Store,
        daemon: Arc<FakeDaemon>,
        poller: PollingScheduler,
        gate_tx: Arc<watch::Sender<bool>>,
        gate_rx: watch::Receiver<bool>,
        shutdown: watch::Sender<bool>,
        shutdown_rx: watch::Receiver<bool>,
    }

    fn rig() -> Rig {
        let store = Store::new();
        let alive = Arc::new(AtomicBool::new(true));
        let daemon = Arc::new(FakeDaemon::new());
        let (gate_tx, gate_rx) = watch::channel(false);
        let gate_tx = Arc::new(gate_tx);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let notifier =
            NotificationCenter::new(store.clone(), alive.clone(), Duration::from_secs(3));
        let monitor = ConnectionMonitor::new(
            store.clone(),
            notifier.clone(),
            daemon.clone(),
            gate_tx.clone(),
            alive.clone(),
            Duration::from_secs(3),
        );
        let mirrors = Mirrors::new(store.clone(), daemon.clone(), monitor.clone());
        let lifecycle = ScanLifecycle::new(
            store.clone(),
            notifier,
            mirrors.clone(),
            alive.clone(),
            Duration::from_secs(5),
        );
        let poller = PollingScheduler::new(
            store.clone(),
            daemon.clone(),
            monitor,
            mirrors,
            lifecycle,
            alive,
            Duration::from_secs(2),
        );
        // tests start from an established connection
        store.update(|s| {
            s.connection.connected = true;
            s.connection.checking = false;
        });
        Rig {
            store,
            daemon,
            poller,
            gate_tx,
            gate_rx,
            shutdown,
            shutdown_rx,
        }
    }

    fn scanning_status() -> StatusResponse {
        StatusResponse {
            scan_in_progress: true,
            ..StatusResponse::default()
        }
    }

    fn scan_snapshot(status: &str, threats: u32) -> ScanStatusResponse {
        ScanStatusResponse {
            scan_id: Some("scan-1".to_string()),
            status: status.to_string(),
            threats: (threats > 0).then(|| ThreatsSummary {
                count: threats,
                files: Vec::new(),
            }),
            ..ScanStatusResponse::default()
        }
    }

    #[tokio::test]
    async fn test_tick_skips_scan_status_while_idle() {
        let r = rig();
        r.poller.tick().await;
        assert_eq!(r.daemon.status.calls(), 1);
        assert_eq!(r.daemon.scan_status.calls(), 0);
        assert_eq!(r.daemon.update_status.calls(), 0);
    }

    #[tokio::test]
    async fn test_tick_tracks_scan_while_daemon_scans() {
        let r = rig();
        r.daemon.status.set(Ok(scanning_status()));
        r.daemon.scan_status.set(Ok(scan_snapshot("scanning", 0)));

        r.poller.tick().await;

        assert_eq!(r.daemon.scan_status.calls(), 1);
        let state = r.store.snapshot();
        assert!(state.is_scanning);
        assert_eq!(state.scan.phase, ScanPhase::Scanning);
        assert!(state.show_progress);
    }

    #[tokio::test]
    async fn test_tick_keeps_tracking_while_progress_shown() {
        // daemon already reports idle again, but the progress panel is
        // still up, so the tick must keep fetching to catch completion
        let r = rig();
        r.store.update(|s| s.show_progress = true);
        r.poller.tick().await;
        assert_eq!(r.daemon.scan_status.calls(), 1);
    }

    #[tokio::test]
    async fn test_tick_routes_connectivity_failure_to_monitor() {
        let r = rig();
        r.daemon
            .status
            .set(Err(ApiError::Transport("connection refused".into())));

        r.poller.tick().await;

        let state = r.store.snapshot();
        assert!(!state.connection.connected);
        assert_eq!(state.connection.retry_count, 1);
        assert!(!*r.gate_rx.borrow(), "gate closes on disconnect");
        assert_eq!(r.daemon.scan_status.calls(), 0, "tick aborted");
        // the only message is the monitor's banner alert
        assert_eq!(
            r.store.notification().unwrap().severity,
            Severity::Error
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_resolving_after_shutdown_applies_nothing() {
        let r = rig();
        r.daemon.set_latency(Duration::from_millis(500));
        r.daemon
            .status
            .set(Err(ApiError::Transport("connection refused".into())));

        let poller = Arc::new(r.poller);
        let task = {
            let poller = poller.clone();
            tokio::spawn(async move { poller.tick().await })
        };

        // the session tears down while the status request is in flight
        tokio::time::sleep(Duration::from_millis(100)).await;
        poller.alive.store(false, Ordering::SeqCst);
        let _ = task.await;

        let state = r.store.snapshot();
        assert!(state.connection.connected, "state untouched after teardown");
        assert_eq!(state.connection.retry_count, 0);
        assert!(r.store.notification().is_none(), "no messages after teardown");
    }

    #[tokio::test]
    async fn test_tick_logs_application_errors_and_moves_on() {
        let r = rig();
        r.daemon
            .status
            .set(Err(ApiError::Application("engine warming up".into())));

        r.poller.tick().await;

        let state = r.store.snapshot();
        assert!(state.connection.connected, "daemon answered, still connected");
        assert!(r.store.notification().is_none(), "tick failures never notify");
        assert_eq!(r.daemon.scan_status.calls(), 0);
    }

    #[tokio::test]
    async fn test_update_completion_reloads_version_and_history() {
        let r = rig();
        r.store.update(|s| s.update_in_progress = true);
        r.daemon
            .update_status
            .set(Ok(UpdatePollResponse { is_updating: false }));

        r.poller.tick().await;

        let state = r.store.snapshot();
        assert!(!state.update_in_progress);
        assert_eq!(r.daemon.signature_version.calls(), 1);
        assert_eq!(r.daemon.update_history.calls(), 1);
    }

    #[tokio::test]
    async fn test_update_still_running_polls_again_later() {
        let r = rig();
        r.store.update(|s| s.update_in_progress = true);
        r.daemon
            .update_status
            .set(Ok(UpdatePollResponse { is_updating: true }));

        r.poller.tick().await;

        assert!(r.store.snapshot().update_in_progress);
        assert_eq!(r.daemon.signature_version.calls(), 0);
        assert_eq!(r.daemon.update_history.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_loop_polls_scan_to_completion() {
        let r = rig();
        r.daemon.status.set(Ok(scanning_status()));
        r.daemon.scan_status.push(Ok(scan_snapshot("scanning", 0)));
        r.daemon.scan_status.set(Ok(scan_snapshot("completed", 2)));
        let _ = r.gate_tx.send(true);

        let handle = tokio::spawn(r.poller.run(r.gate_rx.clone(), r.shutdown_rx.clone()));

        // first tick at 2s observes scanning, second at 4s completion
        tokio::time::sleep(Duration::from_millis(4_100)).await;
        let note = r.store.notification().expect("completion notice");
        assert_eq!(note.severity, Severity::Warning);
        assert!(note.message.contains('2'));

        // settle window: back to idle with history refreshed
        tokio::time::sleep(Duration::from_millis(5_100)).await;
        assert_eq!(r.store.snapshot().scan.phase, ScanPhase::Idle);
        assert!(r.daemon.scan_history.calls() >= 1);

        let _ = r.shutdown.send(true);
        let _ = handle.await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_loop_idles_while_gate_closed() {
        let r = rig();
        let handle = tokio::spawn(r.poller.run(r.gate_rx.clone(), r.shutdown_rx.clone()));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(r.daemon.status.calls(), 0, "no ticks while disconnected");

        let _ = r.shutdown.send(true);
        let _ = handle.await;
    }
}
