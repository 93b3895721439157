//! Logic Module - Synchronization Engine
//!
//! Everything that keeps the panel state in step with the daemon:
//! connection monitoring, the polling scheduler, resource mirrors,
//! the scan lifecycle, and notifications.

pub mod daemon;
pub mod mirrors;
pub mod monitor;
pub mod notify;
pub mod poller;
pub mod scan_state;
pub mod session;
pub mod store;
pub mod version;
