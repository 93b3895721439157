//! Session Wiring
//!
//! Builds the component graph around one daemon endpoint, spawns the
//! probe and polling loops, and tears them down again. The embedding
//! shell renders from the session's store and feeds user actions to
//! its command dispatcher.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::commands::{CommandDispatcher, ConfirmPrompt};
use crate::constants;

use super::daemon::client::{DaemonApi, HttpDaemonClient};
use super::mirrors::Mirrors;
use super::monitor::ConnectionMonitor;
use super::notify::NotificationCenter;
use super::poller::PollingScheduler;
use super::scan_state::ScanLifecycle;
use super::store::Store;

/// Session tunables. Defaults read the environment with compiled-in
/// fallbacks from [`constants`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub daemon_url: String,
    pub poll_interval: Duration,
    pub retry_delay: Duration,
    pub settle_window: Duration,
    pub dismiss_after: Duration,
    pub request_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            daemon_url: constants::get_daemon_url(),
            poll_interval: Duration::from_millis(constants::get_poll_interval_ms()),
            retry_delay: Duration::from_millis(constants::get_retry_delay_ms()),
            settle_window: Duration::from_millis(constants::DEFAULT_SETTLE_WINDOW_MS),
            dismiss_after: Duration::from_millis(constants::DEFAULT_NOTIFY_DISMISS_MS),
            request_timeout: Duration::from_secs(constants::get_request_timeout_secs()),
        }
    }
}

/// A running panel session.
///
/// Holds the store the shell renders from, the command dispatcher it
/// calls into, and the background loops keeping both fresh.
pub struct Session {
    store: Store,
    commands: CommandDispatcher,
    alive: Arc<AtomicBool>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Session {
    /// Wire a session over the given transport and spawn its loops.
    /// The first reconnect probe fires immediately, so a reachable
    /// daemon is connected and mirrored without waiting a poll period.
    pub fn start(
        daemon: Arc<dyn DaemonApi>,
        confirm: Arc<dyn ConfirmPrompt>,
        config: &SessionConfig,
    ) -> Self {
        let store = Store::new();
        let alive = Arc::new(AtomicBool::new(true));
        let (shutdown, shutdown_rx) = watch::channel(false);
        let (polling_tx, polling_rx) = watch::channel(false);
        let polling_tx = Arc::new(polling_tx);

        let notifier =
            NotificationCenter::new(store.clone(), alive.clone(), config.dismiss_after);
        let monitor = ConnectionMonitor::new(
            store.clone(),
            notifier.clone(),
            daemon.clone(),
            polling_tx,
            alive.clone(),
            config.retry_delay,
        );
        let mirrors = Mirrors::new(store.clone(), daemon.clone(), monitor.clone());
        let lifecycle = ScanLifecycle::new(
            store.clone(),
            notifier.clone(),
            mirrors.clone(),
            alive.clone(),
            config.settle_window,
        );
        let commands = CommandDispatcher::new(
            store.clone(),
            daemon.clone(),
            notifier,
            monitor.clone(),
            mirrors.clone(),
            lifecycle.clone(),
            confirm,
            alive.clone(),
        );
        let poller = PollingScheduler::new(
            store.clone(),
            daemon,
            monitor.clone(),
            mirrors.clone(),
            lifecycle,
            alive.clone(),
            config.poll_interval,
        );

        let tasks = vec![
            tokio::spawn(monitor.run(mirrors, shutdown_rx.clone())),
            tokio::spawn(poller.run(polling_rx, shutdown_rx)),
        ];

        Self {
            store,
            commands,
            alive,
            shutdown,
            tasks,
        }
    }

    /// Session against a live daemon relay over HTTP.
    pub fn connect(config: &SessionConfig, confirm: Arc<dyn ConfirmPrompt>) -> Self {
        log::info!("Connecting to scanning daemon at {}", config.daemon_url);
        let daemon = Arc::new(HttpDaemonClient::new(
            &config.daemon_url,
            config.request_timeout,
        ));
        Self::start(daemon, confirm, config)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn commands(&self) -> &CommandDispatcher {
        &self.commands
    }

    /// Stop the loops and void every pending timer. Tasks are awaited,
    /// so nothing touches the store once this returns.
    pub async fn shutdown(mut self) {
        self.alive.store(false, Ordering::SeqCst);
        let _ = self.shutdown.send(true);
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
        log::info!("Session stopped");
    }
}
