//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! To change the default daemon relay, only edit this file.

/// Default daemon relay URL
///
/// This is the fallback URL when no environment variable is set.
/// The relay serves the JSON API under `<base>/api/`.
pub const DEFAULT_DAEMON_URL: &str = "http://127.0.0.1:8899";

/// Default status polling interval (milliseconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Default delay between reconnect probes (milliseconds)
pub const DEFAULT_RETRY_DELAY_MS: u64 = 3_000;

/// Settle window after a scan reaches a terminal status (milliseconds)
pub const DEFAULT_SETTLE_WINDOW_MS: u64 = 5_000;

/// Notification auto-dismiss delay (milliseconds)
pub const DEFAULT_NOTIFY_DISMISS_MS: u64 = 3_000;

/// Default per-request timeout (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Error-text marker the relay emits when the scanning daemon itself
/// is down. Matched case-insensitively as a substring.
pub const DAEMON_UNREACHABLE_MARKER: &str = "daemon unreachable";

/// Placeholder for a signature version the daemon could not report
pub const UNKNOWN_VERSION: &str = "unknown";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "ClamView";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get daemon relay URL from environment or use default
pub fn get_daemon_url() -> String {
    std::env::var("CLAMVIEW_DAEMON_URL")
        .unwrap_or_else(|_| DEFAULT_DAEMON_URL.to_string())
}

/// Get polling interval from environment or use default
pub fn get_poll_interval_ms() -> u64 {
    std::env::var("CLAMVIEW_POLL_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_POLL_INTERVAL_MS)
}

/// Get reconnect probe delay from environment or use default
pub fn get_retry_delay_ms() -> u64 {
    std::env::var("CLAMVIEW_RETRY_DELAY_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_RETRY_DELAY_MS)
}

/// Get per-request timeout from environment or use default
pub fn get_request_timeout_secs() -> u64 {
    std::env::var("CLAMVIEW_REQUEST_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
}
