//! Connection Monitor
//!
//! Tracks daemon liveness from every request outcome in the system,
//! probes for recovery while disconnected, and gates the polling loop.
//! Each status-affecting request claims a sequence number up front;
//! an outcome is applied only if its number is newer than the last
//! applied one, so a stale result can never overwrite a fresh one.
//! Outcomes that resolve after session teardown are dropped unapplied.
//! Connectivity notifications fire on edges only.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use super::daemon::client::DaemonApi;
use super::daemon::types::StatusResponse;
use super::mirrors::Mirrors;
use super::notify::{NotificationCenter, Severity};
use super::store::Store;

#[derive(Clone)]
pub struct ConnectionMonitor {
    store: Store,
    notifier: NotificationCenter,
    daemon: Arc<dyn DaemonApi>,
    polling: Arc<watch::Sender<bool>>,
    seq: Arc<AtomicU64>,
    alive: Arc<AtomicBool>,
    retry_delay: Duration,
}

impl ConnectionMonitor {
    pub fn new(
        store: Store,
        notifier: NotificationCenter,
        daemon: Arc<dyn DaemonApi>,
        polling: Arc<watch::Sender<bool>>,
        alive: Arc<AtomicBool>,
        retry_delay: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            daemon,
            polling,
            seq: Arc::new(AtomicU64::new(0)),
            alive,
            retry_delay,
        }
    }

    /// Claim a sequence number for a request whose outcome will be
    /// reported back here.
    pub fn begin_request(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// False once the owning session has torn down.
    pub(crate) fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// A successful response observed while connected: refresh the
    /// liveness bookkeeping and the system-status mirror. Cannot flip
    /// a disconnected session back to connected; recovery goes through
    /// the probe loop.
    pub fn confirm_connected(&self, seq: u64, snapshot: &StatusResponse) {
        self.apply_success(seq, Some(snapshot));
    }

    /// Same as [`confirm_connected`](Self::confirm_connected) for
    /// endpoints that carry no system snapshot.
    pub fn confirm_alive(&self, seq: u64) {
        self.apply_success(seq, None);
    }

    fn apply_success(&self, seq: u64, snapshot: Option<&StatusResponse>) {
        if !self.is_alive() {
            return;
        }
        self.store.update(|s| {
            if seq <= s.last_applied_seq || !s.connection.connected {
                return;
            }
            s.last_applied_seq = seq;
            s.connection.last_check = Some(Utc::now());
            s.connection.retry_count = 0;
            if let Some(snapshot) = snapshot {
                s.is_scanning = snapshot.scan_in_progress;
            }
        });
    }

    /// A connectivity-class failure observed anywhere. Applies stale
    /// discard, bumps the retry counter, and on the connected →
    /// disconnected edge stops polling and raises the one alert.
    pub fn report_unreachable(&self, seq: u64) {
        if !self.is_alive() {
            return;
        }
        let edge = self.store.update(|s| {
            if seq <= s.last_applied_seq {
                return false;
            }
            s.last_applied_seq = seq;
            s.connection.last_check = Some(Utc::now());
            s.connection.retry_count += 1;
            if s.connection.connected {
                s.connection.connected = false;
                true
            } else {
                false
            }
        });

        if edge {
            log::warn!("Lost contact with the scanning daemon");
            let _ = self.polling.send(false);
            self.notifier
                .notify(Severity::Error, "Lost connection to scanning daemon");
        }
    }

    fn apply_probe_success(&self, seq: u64, snapshot: &StatusResponse) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.store.update(|s| {
            if seq <= s.last_applied_seq {
                return false;
            }
            s.last_applied_seq = seq;
            s.connection.last_check = Some(Utc::now());
            s.connection.retry_count = 0;
            s.is_scanning = snapshot.scan_in_progress;
            let edge = !s.connection.connected;
            s.connection.connected = true;
            edge
        })
    }

    /// Probe loop. Parks while connected; any reported disconnect wakes
    /// it for an immediate probe, then retries on a fixed delay until
    /// the daemon answers again. A recovered connection triggers the
    /// mirror fan-out before polling resumes.
    pub async fn run(self, mirrors: Mirrors, mut shutdown: watch::Receiver<bool>) {
        let mut gate = self.polling.subscribe();
        loop {
            if *shutdown.borrow() {
                return;
            }

            if self.store.is_connected() {
                tokio::select! {
                    _ = gate.wait_for(|polling| !*polling) => {}
                    _ = shutdown.changed() => return,
                }
                continue;
            }

            let seq = self.begin_request();
            self.store.update(|s| s.connection.checking = true);
            let outcome = self.daemon.status().await;
            if !self.alive.load(Ordering::SeqCst) {
                return;
            }
            self.store.update(|s| s.connection.checking = false);

            match outcome {
                Ok(snapshot) => {
                    // a discarded (stale) success must not open the gate:
                    // the store still says disconnected
                    if self.apply_probe_success(seq, &snapshot) {
                        log::info!("Connection to scanning daemon established");
                        self.notifier
                            .notify(Severity::Success, "Connected to scanning daemon");
                        mirrors.fan_out().await;
                        let _ = self.polling.send(true);
                    }
                }
                Err(err) => {
                    log::debug!("Daemon probe failed: {}", err);
                    self.report_unreachable(seq);
                    tokio::select! {
                        _ = tokio::time::sleep(self.retry_delay) => {}
                        _ = shutdown.changed() => return,
                    }
                }
            }
        }
    }
}
