//! Scripted in-memory daemon used by tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::client::{ApiError, DaemonApi};
use super::types::*;

/// Per-endpoint response script: queued one-shot results first, then a
/// repeating fallback. Counts calls.
pub(crate) struct Script<T> {
    queue: Mutex<VecDeque<Result<T, ApiError>>>,
    fallback: Mutex<Result<T, ApiError>>,
    calls: AtomicUsize,
}

impl<T: Clone> Script<T> {
    fn new(fallback: Result<T, ApiError>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(fallback),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn push(&self, result: Result<T, ApiError>) {
        self.queue.lock().push_back(result);
    }

    pub fn set(&self, result: Result<T, ApiError>) {
        *self.fallback.lock() = result;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self) -> Result<T, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(result) = self.queue.lock().pop_front() {
            return result;
        }
        self.fallback.lock().clone()
    }
}

fn ok_ack() -> Result<AckResponse, ApiError> {
    Ok(AckResponse {
        success: true,
        error: None,
    })
}

pub(crate) struct FakeDaemon {
    pub status: Script<StatusResponse>,
    pub scan_status: Script<ScanStatusResponse>,
    pub start_scan: Script<StartScanResponse>,
    pub stop_scan: Script<AckResponse>,
    pub threats: Script<ThreatListResponse>,
    pub handle_threat: Script<AckResponse>,
    pub quarantine: Script<QuarantineListResponse>,
    pub restore_quarantine: Script<AckResponse>,
    pub delete_quarantine: Script<AckResponse>,
    pub cleanup_quarantine: Script<CleanupResponse>,
    pub scan_history: Script<ScanHistoryResponse>,
    pub delete_scan_history: Script<AckResponse>,
    pub clear_scan_history: Script<AckResponse>,
    pub update_history: Script<UpdateHistoryResponse>,
    pub signature_version: Script<VersionPayload>,
    pub start_update: Script<AckResponse>,
    pub update_status: Script<UpdatePollResponse>,
    pub config: Script<PanelConfig>,
    pub put_config: Script<AckResponse>,

    pub last_start_scan: Mutex<Option<StartScanRequest>>,
    pub last_threat_action: Mutex<Option<(i64, ThreatAction)>>,
    pub last_config_update: Mutex<Option<ConfigUpdate>>,

    latency: Mutex<Option<Duration>>,
}

impl FakeDaemon {
    pub fn new() -> Self {
        Self {
            status: Script::new(Ok(StatusResponse::default())),
            scan_status: Script::new(Ok(ScanStatusResponse {
                status: "idle".to_string(),
                ..ScanStatusResponse::default()
            })),
            start_scan: Script::new(Ok(StartScanResponse {
                success: true,
                scan_id: Some("scan-1".to_string()),
                status: Some("scanning".to_string()),
                error: None,
            })),
            stop_scan: Script::new(ok_ack()),
            threats: Script::new(Ok(ThreatListResponse::default())),
            handle_threat: Script::new(ok_ack()),
            quarantine: Script::new(Ok(QuarantineListResponse::default())),
            restore_quarantine: Script::new(ok_ack()),
            delete_quarantine: Script::new(ok_ack()),
            cleanup_quarantine: Script::new(Ok(CleanupResponse {
                success: true,
                cleaned_count: 0,
                freed_bytes: 0,
            })),
            scan_history: Script::new(Ok(ScanHistoryResponse::default())),
            delete_scan_history: Script::new(ok_ack()),
            clear_scan_history: Script::new(ok_ack()),
            update_history: Script::new(Ok(UpdateHistoryResponse::default())),
            signature_version: Script::new(Ok(VersionPayload::default())),
            start_update: Script::new(ok_ack()),
            update_status: Script::new(Ok(UpdatePollResponse::default())),
            config: Script::new(Ok(PanelConfig::default())),
            put_config: Script::new(ok_ack()),

            last_start_scan: Mutex::new(None),
            last_threat_action: Mutex::new(None),
            last_config_update: Mutex::new(None),

            latency: Mutex::new(None),
        }
    }

    /// Delay every call by `delay`, so tests can race a request that is
    /// still in flight against local state changes.
    pub fn set_latency(&self, delay: Duration) {
        *self.latency.lock() = Some(delay);
    }

    async fn lag(&self) {
        let delay = *self.latency.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl DaemonApi for FakeDaemon {
    async fn status(&self) -> Result<StatusResponse, ApiError> {
        self.lag().await;
        self.status.next()
    }

    async fn scan_status(&self) -> Result<ScanStatusResponse, ApiError> {
        self.lag().await;
        self.scan_status.next()
    }

    async fn start_scan(&self, request: StartScanRequest) -> Result<StartScanResponse, ApiError> {
        self.lag().await;
        *self.last_start_scan.lock() = Some(request);
        self.start_scan.next()
    }

    async fn stop_scan(&self) -> Result<AckResponse, ApiError> {
        self.lag().await;
        self.stop_scan.next()
    }

    async fn threats(&self) -> Result<ThreatListResponse, ApiError> {
        self.lag().await;
        self.threats.next()
    }

    async fn handle_threat(&self, id: i64, action: ThreatAction) -> Result<AckResponse, ApiError> {
        self.lag().await;
        *self.last_threat_action.lock() = Some((id, action));
        self.handle_threat.next()
    }

    async fn quarantine(&self) -> Result<QuarantineListResponse, ApiError> {
        self.lag().await;
        self.quarantine.next()
    }

    async fn restore_quarantine(&self, _uuid: &str) -> Result<AckResponse, ApiError> {
        self.lag().await;
        self.restore_quarantine.next()
    }

    async fn delete_quarantine(&self, _uuid: &str) -> Result<AckResponse, ApiError> {
        self.lag().await;
        self.delete_quarantine.next()
    }

    async fn cleanup_quarantine(&self) -> Result<CleanupResponse, ApiError> {
        self.lag().await;
        self.cleanup_quarantine.next()
    }

    async fn scan_history(&self) -> Result<ScanHistoryResponse, ApiError> {
        self.lag().await;
        self.scan_history.next()
    }

    async fn delete_scan_history(&self, _id: i64) -> Result<AckResponse, ApiError> {
        self.lag().await;
        self.delete_scan_history.next()
    }

    async fn clear_scan_history(&self) -> Result<AckResponse, ApiError> {
        self.lag().await;
        self.clear_scan_history.next()
    }

    async fn update_history(&self) -> Result<UpdateHistoryResponse, ApiError> {
        self.lag().await;
        self.update_history.next()
    }

    async fn signature_version(&self) -> Result<VersionPayload, ApiError> {
        self.lag().await;
        self.signature_version.next()
    }

    async fn start_update(&self) -> Result<AckResponse, ApiError> {
        self.lag().await;
        self.start_update.next()
    }

    async fn update_status(&self) -> Result<UpdatePollResponse, ApiError> {
        self.lag().await;
        self.update_status.next()
    }

    async fn get_config(&self) -> Result<PanelConfig, ApiError> {
        self.lag().await;
        self.config.next()
    }

    async fn put_config(&self, config: ConfigUpdate) -> Result<AckResponse, ApiError> {
        self.lag().await;
        *self.last_config_update.lock() = Some(config);
        self.put_config.next()
    }
}
