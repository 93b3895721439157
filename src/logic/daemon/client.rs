//! Daemon API Client
//!
//! JSON-over-HTTP client for the scanning daemon's relay. Every
//! response body is screened for the uniform `{"success": false}`
//! failure shape before typed decoding, so the relay's
//! daemon-unreachable signal is recognized on every endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::constants;

use super::types::*;

/// Failure classes for daemon requests
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// Relay unreachable, non-2xx response, or undecodable body
    #[error("network error: {0}")]
    Transport(String),
    /// Relay answered but the scanning daemon behind it is down
    #[error("daemon unavailable: {0}")]
    DaemonUnavailable(String),
    /// Well-formed rejection from the daemon
    #[error("daemon error: {0}")]
    Application(String),
}

impl ApiError {
    /// True for failures that mean lost connectivity rather than a
    /// rejected operation.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::DaemonUnavailable(_))
    }
}

/// Transport seam for everything the control panel asks of the daemon
#[async_trait]
pub trait DaemonApi: Send + Sync {
    async fn status(&self) -> Result<StatusResponse, ApiError>;
    async fn scan_status(&self) -> Result<ScanStatusResponse, ApiError>;
    async fn start_scan(&self, request: StartScanRequest) -> Result<StartScanResponse, ApiError>;
    async fn stop_scan(&self) -> Result<AckResponse, ApiError>;
    async fn threats(&self) -> Result<ThreatListResponse, ApiError>;
    async fn handle_threat(&self, id: i64, action: ThreatAction) -> Result<AckResponse, ApiError>;
    async fn quarantine(&self) -> Result<QuarantineListResponse, ApiError>;
    async fn restore_quarantine(&self, uuid: &str) -> Result<AckResponse, ApiError>;
    async fn delete_quarantine(&self, uuid: &str) -> Result<AckResponse, ApiError>;
    async fn cleanup_quarantine(&self) -> Result<CleanupResponse, ApiError>;
    async fn scan_history(&self) -> Result<ScanHistoryResponse, ApiError>;
    async fn delete_scan_history(&self, id: i64) -> Result<AckResponse, ApiError>;
    async fn clear_scan_history(&self) -> Result<AckResponse, ApiError>;
    async fn update_history(&self) -> Result<UpdateHistoryResponse, ApiError>;
    async fn signature_version(&self) -> Result<VersionPayload, ApiError>;
    async fn start_update(&self) -> Result<AckResponse, ApiError>;
    async fn update_status(&self) -> Result<UpdatePollResponse, ApiError>;
    async fn get_config(&self) -> Result<PanelConfig, ApiError>;
    async fn put_config(&self, config: ConfigUpdate) -> Result<AckResponse, ApiError>;
}

/// HTTP implementation of [`DaemonApi`]
pub struct HttpDaemonClient {
    api_base: String,
    http: reqwest::Client,
}

impl HttpDaemonClient {
    /// Create a client for the relay at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_base: format!("{}/api", base_url.trim_end_matches('/')),
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        decode(response).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .http
            .post(self.url(path))
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        decode(response).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        decode(response).await
    }

    async fn put_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        decode(response).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .http
            .delete(self.url(path))
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        decode(response).await
    }
}

#[async_trait]
impl DaemonApi for HttpDaemonClient {
    async fn status(&self) -> Result<StatusResponse, ApiError> {
        self.get("status").await
    }

    async fn scan_status(&self) -> Result<ScanStatusResponse, ApiError> {
        self.get("scan/status").await
    }

    async fn start_scan(&self, request: StartScanRequest) -> Result<StartScanResponse, ApiError> {
        self.post_json("scan/start", &request).await
    }

    async fn stop_scan(&self) -> Result<AckResponse, ApiError> {
        self.post("scan/stop").await
    }

    async fn threats(&self) -> Result<ThreatListResponse, ApiError> {
        self.get("threats").await
    }

    async fn handle_threat(&self, id: i64, action: ThreatAction) -> Result<AckResponse, ApiError> {
        let request = ThreatActionRequest { action };
        self.post_json(&format!("threats/{}/handle", id), &request)
            .await
    }

    async fn quarantine(&self) -> Result<QuarantineListResponse, ApiError> {
        self.get("quarantine").await
    }

    async fn restore_quarantine(&self, uuid: &str) -> Result<AckResponse, ApiError> {
        self.post(&format!("quarantine/{}/restore", uuid)).await
    }

    async fn delete_quarantine(&self, uuid: &str) -> Result<AckResponse, ApiError> {
        self.delete(&format!("quarantine/{}", uuid)).await
    }

    async fn cleanup_quarantine(&self) -> Result<CleanupResponse, ApiError> {
        self.post("quarantine/cleanup").await
    }

    async fn scan_history(&self) -> Result<ScanHistoryResponse, ApiError> {
        self.get("scan/history").await
    }

    async fn delete_scan_history(&self, id: i64) -> Result<AckResponse, ApiError> {
        self.delete(&format!("scan/history/{}", id)).await
    }

    async fn clear_scan_history(&self) -> Result<AckResponse, ApiError> {
        self.post("scan/history/clear").await
    }

    async fn update_history(&self) -> Result<UpdateHistoryResponse, ApiError> {
        self.get("update/history").await
    }

    async fn signature_version(&self) -> Result<VersionPayload, ApiError> {
        self.get("update/version").await
    }

    async fn start_update(&self) -> Result<AckResponse, ApiError> {
        self.post("update/start").await
    }

    async fn update_status(&self) -> Result<UpdatePollResponse, ApiError> {
        self.get("update/status").await
    }

    async fn get_config(&self) -> Result<PanelConfig, ApiError> {
        self.get("config").await
    }

    async fn put_config(&self, config: ConfigUpdate) -> Result<AckResponse, ApiError> {
        self.put_json("config", &config).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Transport(format!("HTTP {}", status.as_u16())));
    }

    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;

    if let Some(err) = screen_failure(&body) {
        return Err(err);
    }

    serde_json::from_value(body).map_err(|e| ApiError::Transport(e.to_string()))
}

/// Classify a `{"success": false}` body; `None` means the body is not a
/// failure and should be decoded normally. A missing `error` text is
/// left empty so callers can substitute their own per-operation message.
fn screen_failure(body: &serde_json::Value) -> Option<ApiError> {
    if body.get("success").and_then(|v| v.as_bool()) != Some(false) {
        return None;
    }

    let message = body
        .get("error")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    if message
        .to_lowercase()
        .contains(constants::DAEMON_UNREACHABLE_MARKER)
    {
        Some(ApiError::DaemonUnavailable(message))
    } else {
        Some(ApiError::Application(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_screen_passes_success_bodies() {
        assert!(screen_failure(&json!({"success": true})).is_none());
        assert!(screen_failure(&json!({"items": []})).is_none());
        assert!(screen_failure(&json!({"is_updating": false})).is_none());
    }

    #[test]
    fn test_screen_classifies_daemon_unreachable() {
        let err = screen_failure(&json!({
            "success": false,
            "error": "Daemon Unreachable: connect ECONNREFUSED"
        }))
        .unwrap();
        assert!(matches!(err, ApiError::DaemonUnavailable(_)));
        assert!(err.is_connectivity());
    }

    #[test]
    fn test_screen_classifies_rejections() {
        let err = screen_failure(&json!({
            "success": false,
            "error": "scan already running"
        }))
        .unwrap();
        match err {
            ApiError::Application(msg) => assert_eq!(msg, "scan already running"),
            other => panic!("unexpected class: {:?}", other),
        }
    }

    #[test]
    fn test_screen_leaves_missing_error_text_empty() {
        let err = screen_failure(&json!({"success": false})).unwrap();
        assert!(!err.is_connectivity());
        match err {
            ApiError::Application(msg) => {
                assert!(msg.is_empty(), "fallback text belongs to the caller")
            }
            other => panic!("unexpected class: {:?}", other),
        }
    }

    #[test]
    fn test_transport_errors_are_connectivity() {
        assert!(ApiError::Transport("HTTP 502".into()).is_connectivity());
        assert!(!ApiError::Application("busy".into()).is_connectivity());
    }
}
