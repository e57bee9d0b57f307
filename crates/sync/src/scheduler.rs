//! Auto-sync scheduler: silent background pushes on a fixed interval and
//! immediately after network reconnects.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use rand::Rng;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crewline_core::sync::{
    SyncTrigger, AUTO_SYNC_INTERVAL_JITTER_SECS, AUTO_SYNC_INTERVAL_SECS,
};

use crate::manager::SyncManager;

/// Process-wide background push loop.
///
/// One tokio task owns both the interval timer and the reconnect listener;
/// restarting tears the previous task down first, so at most one of each
/// exists at any time. Pulls are never scheduled: discarding local state
/// stays an explicit user action.
pub struct AutoSyncScheduler {
    manager: Arc<SyncManager>,
    task: Mutex<Option<JoinHandle<()>>>,
    reconnect_tx: watch::Sender<u64>,
}

impl AutoSyncScheduler {
    pub fn new(manager: Arc<SyncManager>) -> Self {
        let (reconnect_tx, _) = watch::channel(0);
        Self {
            manager,
            task: Mutex::new(None),
            reconnect_tx,
        }
    }

    /// Start the background loop at the default cadence.
    pub async fn start_default(&self) {
        self.start(Duration::from_secs(AUTO_SYNC_INTERVAL_SECS)).await;
    }

    /// Start the background loop, replacing any loop already running.
    pub async fn start(&self, interval: Duration) {
        let mut guard = self.task.lock().await;
        if let Some(handle) = guard.take() {
            handle.abort();
        }

        let manager = Arc::clone(&self.manager);
        let mut reconnect_rx = self.reconnect_tx.subscribe();
        // Events fired before this start are not replayed into the new loop.
        reconnect_rx.borrow_and_update();

        let handle = tokio::spawn(async move {
            loop {
                let tick = tokio::time::sleep(interval + jitter_for(interval));
                tokio::select! {
                    _ = tick => {
                        silent_push(&manager, SyncTrigger::Interval).await;
                    }
                    changed = reconnect_rx.changed() => {
                        if changed.is_err() {
                            // Scheduler dropped; nothing left to listen to.
                            break;
                        }
                        debug!("[BridgeSync] connectivity restored; pushing now");
                        silent_push(&manager, SyncTrigger::Reconnect).await;
                    }
                }
            }
        });
        *guard = Some(handle);
    }

    /// Stop the background loop, deregistering the timer and the reconnect
    /// listener together.
    pub async fn stop(&self) {
        let mut guard = self.task.lock().await;
        if let Some(handle) = guard.take() {
            handle.abort();
        }
    }

    /// Signal that network connectivity came back. A reconnect is the
    /// highest-value moment to resolve drift, so the loop pushes
    /// immediately instead of waiting for the next tick.
    pub fn network_restored(&self) {
        self.reconnect_tx.send_modify(|events| *events += 1);
    }

    /// Whether the background loop is currently running.
    pub async fn is_running(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for AutoSyncScheduler {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.task.try_lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

/// Jitter added to each periodic tick so co-started instances spread out.
/// Bounded by the configured jitter and by a tenth of the interval, so
/// short test intervals stay fast.
fn jitter_for(interval: Duration) -> Duration {
    let bound = (interval / 10).min(Duration::from_secs(AUTO_SYNC_INTERVAL_JITTER_SECS));
    let bound_ms = bound.as_millis() as u64;
    if bound_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=bound_ms))
}

/// Run one push, swallowing failures. A background tick must never kill
/// the loop or interrupt the user; failures are logged and the next tick
/// (or reconnect) retries.
async fn silent_push(manager: &SyncManager, trigger: SyncTrigger) {
    match manager.push(trigger).await {
        Ok(report) => debug!(
            "[BridgeSync] background push ({:?}): {:?}",
            trigger, report.outcome
        ),
        Err(err) => warn!("[BridgeSync] background push ({:?}) failed: {}", trigger, err),
    }
}
