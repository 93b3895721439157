//! ClamView - Headless Panel Session
//!
//! Runs the synchronization engine against the configured daemon relay
//! until interrupted. Useful as a smoke harness and as the wiring
//! reference for shells embedding the library.

use std::sync::Arc;

use clamview_core::constants;
use clamview_core::{AutoConfirm, Session, SessionConfig};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!(
        "Starting {} v{} (daemon sync engine)...",
        constants::APP_NAME,
        constants::APP_VERSION
    );

    let config = SessionConfig::default();
    // headless runs never approve destructive commands
    let session = Session::connect(&config, Arc::new(AutoConfirm(false)));

    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("Interrupt received, shutting down"),
        Err(err) => log::error!("Failed to listen for shutdown signal: {}", err),
    }

    session.shutdown().await;
}
