//! Resource Mirrors
//!
//! Six independent fetch-and-replace loaders, one per daemon-owned
//! resource. A failed load resets its mirror to the defined default
//! (never a stale snapshot) and is logged, not notified.
//! Connectivity-class failures additionally feed the connection
//! monitor; the local fallback still applies. Loads that resolve
//! after session teardown leave the mirror as it was.

use std::sync::Arc;

use super::daemon::client::{ApiError, DaemonApi};
use super::monitor::ConnectionMonitor;
use super::store::Store;
use super::version::SignatureVersions;

#[derive(Clone)]
pub struct Mirrors {
    store: Store,
    daemon: Arc<dyn DaemonApi>,
    monitor: ConnectionMonitor,
}

impl Mirrors {
    pub fn new(store: Store, daemon: Arc<dyn DaemonApi>, monitor: ConnectionMonitor) -> Self {
        Self {
            store,
            daemon,
            monitor,
        }
    }

    /// Initial load of every mirror, issued concurrently. One loader's
    /// failure resets only its own mirror. The aggregate is marked
    /// ready once all six have settled.
    pub async fn fan_out(&self) {
        tokio::join!(
            self.load_threats(),
            self.load_quarantine(),
            self.load_scan_history(),
            self.load_update_history(),
            self.load_signature_version(),
            self.load_config(),
        );
        if !self.monitor.is_alive() {
            return;
        }
        self.store.update(|s| s.ready = true);
        log::info!("Resource mirrors loaded");
    }

    pub async fn load_threats(&self) {
        let seq = self.monitor.begin_request();
        let outcome = self.daemon.threats().await;
        if !self.monitor.is_alive() {
            return;
        }
        match outcome {
            Ok(list) => {
                self.monitor.confirm_alive(seq);
                self.store.update(|s| s.threats = list.items);
            }
            Err(err) => {
                self.fall_back("threats", seq, &err);
                self.store.update(|s| s.threats = Vec::new());
            }
        }
    }

    pub async fn load_quarantine(&self) {
        let seq = self.monitor.begin_request();
        let outcome = self.daemon.quarantine().await;
        if !self.monitor.is_alive() {
            return;
        }
        match outcome {
            Ok(list) => {
                self.monitor.confirm_alive(seq);
                self.store.update(|s| {
                    s.quarantine = list.items;
                    s.quarantine_total_bytes = list.total_size_bytes;
                });
            }
            Err(err) => {
                self.fall_back("quarantine", seq, &err);
                self.store.update(|s| {
                    s.quarantine = Vec::new();
                    s.quarantine_total_bytes = 0;
                });
            }
        }
    }

    pub async fn load_scan_history(&self) {
        let seq = self.monitor.begin_request();
        let outcome = self.daemon.scan_history().await;
        if !self.monitor.is_alive() {
            return;
        }
        match outcome {
            Ok(list) => {
                self.monitor.confirm_alive(seq);
                self.store.update(|s| s.scan_history = list.items);
            }
            Err(err) => {
                self.fall_back("scan history", seq, &err);
                self.store.update(|s| s.scan_history = Vec::new());
            }
        }
    }

    pub async fn load_update_history(&self) {
        let seq = self.monitor.begin_request();
        let outcome = self.daemon.update_history().await;
        if !self.monitor.is_alive() {
            return;
        }
        match outcome {
            Ok(list) => {
                self.monitor.confirm_alive(seq);
                self.store.update(|s| s.update_history = list.items);
            }
            Err(err) => {
                self.fall_back("update history", seq, &err);
                self.store.update(|s| s.update_history = Vec::new());
            }
        }
    }

    pub async fn load_signature_version(&self) {
        let seq = self.monitor.begin_request();
        let outcome = self.daemon.signature_version().await;
        if !self.monitor.is_alive() {
            return;
        }
        match outcome {
            Ok(payload) => {
                self.monitor.confirm_alive(seq);
                let versions = SignatureVersions::from_wire(&payload.version);
                self.store.update(|s| s.versions = versions);
            }
            Err(err) => {
                self.fall_back("signature version", seq, &err);
                self.store
                    .update(|s| s.versions = SignatureVersions::default());
            }
        }
    }

    pub async fn load_config(&self) {
        let seq = self.monitor.begin_request();
        let outcome = self.daemon.get_config().await;
        if !self.monitor.is_alive() {
            return;
        }
        match outcome {
            Ok(config) => {
                self.monitor.confirm_alive(seq);
                self.store.update(|s| s.config = config);
            }
            Err(err) => {
                self.fall_back("config", seq, &err);
                self.store.update(|s| s.config = Default::default());
            }
        }
    }

    fn fall_back(&self, what: &str, seq: u64, err: &ApiError) {
        log::warn!("Failed to load {}: {} (mirror reset)", what, err);
        if err.is_connectivity() {
            self.monitor.report_unreachable(seq);
        } else {
            self.monitor.confirm_alive(seq);
        }
    }
}
