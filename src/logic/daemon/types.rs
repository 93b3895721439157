//! Wire Types for the Daemon API
//!
//! Request/response shapes of the JSON contract served by the daemon
//! relay. Response types tolerate absent optional fields from older
//! daemon builds.

use serde::{Deserialize, Deserializer, Serialize};

/// Liveness/status snapshot (`GET status`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub scan_in_progress: bool,
    #[serde(default)]
    pub current_scan_id: Option<String>,
    #[serde(default)]
    pub engine_ready: Option<bool>,
}

/// Uniform acknowledgement for mutating requests
#[derive(Debug, Clone, Deserialize)]
pub struct AckResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

// Scanning

/// Scan flavor accepted by `POST scan/start`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanKind {
    Full,
    Custom,
}

impl ScanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StartScanRequest {
    pub scan_type: ScanKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartScanResponse {
    pub success: bool,
    #[serde(default)]
    pub scan_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Live scan snapshot (`GET scan/status`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanStatusResponse {
    #[serde(default)]
    pub scan_id: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub progress: Option<ScanProgress>,
    #[serde(default)]
    pub threats: Option<ThreatsSummary>,
    #[serde(default)]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub elapsed_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScanProgress {
    pub percent: f32,
    pub scanned: u64,
    pub estimated_total: u64,
    pub current_file: String,
    /// Files found so far by the discovery pass
    #[serde(default)]
    pub discovered: Option<u64>,
    /// Files per second
    #[serde(default)]
    pub scan_rate: Option<f32>,
}

/// Threats found by the scan reported alongside progress
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ThreatsSummary {
    pub count: u32,
    #[serde(default)]
    pub files: Vec<ThreatFile>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ThreatFile {
    pub path: String,
    pub virus: String,
    #[serde(default)]
    pub action: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanHistoryResponse {
    #[serde(default)]
    pub items: Vec<ScanHistoryEntry>,
    #[serde(default)]
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScanHistoryEntry {
    pub id: i64,
    pub scan_id: String,
    pub scan_type: String,
    #[serde(default)]
    pub paths: String,
    pub status: String,
    pub start_time: i64,
    #[serde(default)]
    pub end_time: Option<i64>,
    #[serde(default)]
    pub total_files: i32,
    #[serde(default)]
    pub scanned_files: i32,
    #[serde(default)]
    pub threats_found: i32,
    #[serde(default)]
    pub error_message: Option<String>,
}

// Threats

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThreatListResponse {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub items: Vec<ThreatItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ThreatItem {
    pub id: i64,
    pub scan_id: String,
    pub file_path: String,
    pub virus_name: String,
    #[serde(default)]
    pub detected_time: i64,
    #[serde(default)]
    pub action_taken: Option<String>,
    #[serde(default)]
    pub quarantine_uuid: Option<String>,
    #[serde(default)]
    pub action_time: Option<i64>,
}

/// Disposition for a detected threat (`POST threats/{id}/handle`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatAction {
    Quarantine,
    Delete,
    Ignore,
}

impl ThreatAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quarantine => "quarantine",
            Self::Delete => "delete",
            Self::Ignore => "ignore",
        }
    }
}

impl Default for ThreatAction {
    fn default() -> Self {
        Self::Quarantine
    }
}

impl std::fmt::Display for ThreatAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ThreatActionRequest {
    pub action: ThreatAction,
}

// Quarantine

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuarantineListResponse {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub total_size_bytes: u64,
    #[serde(default)]
    pub items: Vec<QuarantineItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuarantineItem {
    pub uuid: String,
    pub original_path: String,
    pub original_name: String,
    pub file_size: u64,
    pub virus_name: String,
    pub quarantined_at: i64,
    pub scan_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CleanupResponse {
    pub success: bool,
    #[serde(default)]
    pub cleaned_count: u32,
    #[serde(default)]
    pub freed_bytes: u64,
}

// Signature updates

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionPayload {
    #[serde(default)]
    pub version: VersionInfo,
}

/// Raw signature database versions as the daemon reports them
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VersionInfo {
    #[serde(default)]
    pub daily: Option<String>,
    #[serde(default)]
    pub main: Option<String>,
    #[serde(default)]
    pub bytecode: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePollResponse {
    #[serde(default)]
    pub is_updating: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateHistoryResponse {
    #[serde(default)]
    pub items: Vec<UpdateHistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateHistoryEntry {
    pub id: i64,
    pub time: i64,
    pub result: String,
    #[serde(default)]
    pub old_version: Option<String>,
    #[serde(default)]
    pub new_version: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<i64>,
}

// Configuration

/// Daemon-side scan configuration as edited in the settings view.
///
/// `scan_paths` is kept as the view's free text; older daemons send it
/// as a JSON array, newer ones as a newline-joined string. Both decode
/// to the same text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PanelConfig {
    #[serde(default, deserialize_with = "scan_paths_as_text")]
    pub scan_paths: String,
    #[serde(default = "default_enabled")]
    pub auto_update: bool,
    #[serde(default = "default_enabled")]
    pub quarantine_enabled: bool,
    #[serde(default)]
    pub threat_action: ThreatAction,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            scan_paths: String::new(),
            auto_update: true,
            quarantine_enabled: true,
            threat_action: ThreatAction::Quarantine,
        }
    }
}

impl PanelConfig {
    /// Non-empty trimmed lines of the path field, in order
    pub fn scan_path_list(&self) -> Vec<String> {
        self.scan_paths
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Wire form for `PUT config`
    pub fn to_wire(&self) -> ConfigUpdate {
        ConfigUpdate {
            scan_paths: self.scan_path_list(),
            auto_update: self.auto_update,
            quarantine_enabled: self.quarantine_enabled,
            threat_action: self.threat_action,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigUpdate {
    pub scan_paths: Vec<String>,
    pub auto_update: bool,
    pub quarantine_enabled: bool,
    pub threat_action: ThreatAction,
}

fn default_enabled() -> bool {
    true
}

fn scan_paths_as_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PathsField {
        Lines(Vec<String>),
        Text(String),
    }

    Ok(match Option::<PathsField>::deserialize(deserializer)? {
        Some(PathsField::Lines(lines)) => lines.join("\n"),
        Some(PathsField::Text(text)) => text,
        None => String::new(),
    })
}
