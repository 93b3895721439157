//! ClamView Core - Control Panel Synchronization Layer
//!
//! Client-side engine for a control panel over a remote ClamAV-style
//! scanning daemon, reached through a JSON-over-HTTP relay. The engine
//! polls the daemon, mirrors its resources into a single shared state
//! aggregate, tracks the scan lifecycle, and dispatches user commands.
//! Rendering is left to the embedding shell: it reads [`Store`]
//! snapshots and calls [`CommandDispatcher`] methods.

pub mod api;
pub mod constants;
pub mod logic;

pub use api::commands::{AutoConfirm, CommandDispatcher, ConfirmPrompt};
pub use logic::daemon::client::{ApiError, DaemonApi, HttpDaemonClient};
pub use logic::daemon::types::{PanelConfig, ScanKind, ThreatAction};
pub use logic::notify::{Notification, Severity};
pub use logic::session::{Session, SessionConfig};
pub use logic::store::{AppState, ScanPhase, Store, View};
