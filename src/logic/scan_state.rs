//! Scan Lifecycle
//!
//! Consumes polled scan snapshots and derives edge-triggered effects
//! from an explicit transition table. Completion and failure are
//! recognized only out of an observed `scanning`; repeated terminal
//! polls are absorbed. A terminal transition opens a settle window
//! after which the panel snaps back to idle and the history mirrors
//! refresh.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::daemon::types::ScanStatusResponse;
use super::mirrors::Mirrors;
use super::notify::{NotificationCenter, Severity};
use super::store::{ScanPhase, ScanView, Store};

/// Effect of one observed transition
#[derive(Debug, PartialEq)]
pub(crate) enum ScanEffect {
    ShowProgress,
    Notify(Severity, String),
    ScheduleSettle,
}

/// The transition table: prior phase plus newly observed phase (with
/// the snapshot's threat count) to effects. Pure.
pub(crate) fn transition_effects(
    prev: ScanPhase,
    next: ScanPhase,
    threat_count: u32,
) -> Vec<ScanEffect> {
    let mut effects = Vec::new();

    if next == ScanPhase::Scanning {
        effects.push(ScanEffect::ShowProgress);
    }

    if prev != ScanPhase::Scanning {
        return effects;
    }

    match next {
        ScanPhase::Completed => {
            let (severity, message) = if threat_count > 0 {
                (
                    Severity::Warning,
                    format!(
                        "Scan completed, {} threat{} found",
                        threat_count,
                        if threat_count == 1 { "" } else { "s" }
                    ),
                )
            } else {
                (
                    Severity::Success,
                    "Scan completed, no threats found".to_string(),
                )
            };
            effects.push(ScanEffect::Notify(severity, message));
            effects.push(ScanEffect::ScheduleSettle);
        }
        ScanPhase::Failed => {
            effects.push(ScanEffect::Notify(Severity::Error, "Scan failed".to_string()));
            effects.push(ScanEffect::ScheduleSettle);
        }
        _ => {}
    }

    effects
}

/// Applies observed snapshots to the store and executes their effects
#[derive(Clone)]
pub struct ScanLifecycle {
    store: Store,
    notifier: NotificationCenter,
    mirrors: Mirrors,
    alive: Arc<AtomicBool>,
    settle_window: Duration,
}

impl ScanLifecycle {
    pub fn new(
        store: Store,
        notifier: NotificationCenter,
        mirrors: Mirrors,
        alive: Arc<AtomicBool>,
        settle_window: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            mirrors,
            alive,
            settle_window,
        }
    }

    /// Apply one polled snapshot: wholesale replacement of the scan
    /// view plus whatever the transition table says.
    pub async fn observe(&self, snapshot: ScanStatusResponse) {
        let phase = ScanPhase::from_wire(&snapshot.status);
        let threat_count = snapshot.threats.as_ref().map(|t| t.count).unwrap_or(0);

        let (effects, epoch) = self.store.update(move |s| {
            let prev = s.scan.phase;
            let effects = transition_effects(prev, phase, threat_count);
            if phase != prev {
                s.scan_epoch += 1;
            }
            s.scan = ScanView {
                scan_id: snapshot.scan_id,
                phase,
                progress: snapshot.progress,
                threats: snapshot.threats,
            };
            (effects, s.scan_epoch)
        });

        for effect in effects {
            match effect {
                ScanEffect::ShowProgress => {
                    self.store.update(|s| s.show_progress = true);
                }
                ScanEffect::Notify(severity, message) => {
                    log::info!("Scan transition: {}", message);
                    self.notifier.notify(severity, message);
                }
                ScanEffect::ScheduleSettle => self.schedule_settle(epoch),
            }
        }
    }

    /// Local transition when the user starts a scan: the view flips to
    /// scanning at once instead of waiting for the next poll.
    pub fn begin_local(&self, scan_id: Option<String>) {
        self.store.update(|s| {
            if s.scan.phase != ScanPhase::Scanning {
                s.scan_epoch += 1;
            }
            s.scan = ScanView {
                scan_id,
                phase: ScanPhase::Scanning,
                progress: None,
                threats: None,
            };
            s.is_scanning = true;
            s.show_progress = true;
        });
    }

    /// After the settle window the terminal state snaps back to idle,
    /// progress disappears, and the history mirrors refresh. A new
    /// scan inside the window moves the epoch and voids the action.
    fn schedule_settle(&self, epoch: u64) {
        let store = self.store.clone();
        let mirrors = self.mirrors.clone();
        let alive = self.alive.clone();
        let window = self.settle_window;

        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            if !alive.load(Ordering::SeqCst) {
                return;
            }
            let current = store.update(|s| {
                if s.scan_epoch != epoch {
                    return false;
                }
                s.scan_epoch += 1;
                s.scan.phase = ScanPhase::Idle;
                s.scan.progress = None;
                s.show_progress = false;
                true
            });
            if current {
                log::debug!("Scan view settled back to idle");
                mirrors.load_scan_history().await;
                mirrors.load_threats().await;
            }
        });
    }
}
