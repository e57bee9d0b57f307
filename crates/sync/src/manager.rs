//! Sync manager: owns the single-flight guard and the collaborator seams.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use crewline_bridge_client::ConnectionTest;
use crewline_core::catalog::{default_catalog, TableDescriptor};
use crewline_core::settings::{RemoteConfig, SettingsProvider};
use crewline_core::store::LocalStore;
use crewline_core::sync::{SyncDirection, SyncSession, SyncStatus, SyncTrigger};

use crate::error::SyncError;
use crate::remote::RemoteStore;

/// Coordinates pushes and pulls against one local store and one remote.
///
/// At most one sync operation runs at a time per manager; attempts made
/// while one is in flight are skipped, never queued. The guard is an
/// instance field so tests can run independent managers side by side.
pub struct SyncManager {
    pub(crate) catalog: &'static [TableDescriptor],
    pub(crate) store: Arc<dyn LocalStore>,
    settings: Arc<dyn SettingsProvider>,
    pub(crate) remote: Arc<dyn RemoteStore>,
    in_flight: Arc<AtomicBool>,
    session: Arc<Mutex<Option<SyncSession>>>,
    status: Mutex<SyncStatus>,
}

impl SyncManager {
    /// Create a manager over the default Crewline catalog.
    pub fn new(
        store: Arc<dyn LocalStore>,
        settings: Arc<dyn SettingsProvider>,
        remote: Arc<dyn RemoteStore>,
    ) -> Self {
        Self::with_catalog(default_catalog(), store, settings, remote)
    }

    /// Create a manager over an explicit catalog.
    pub fn with_catalog(
        catalog: &'static [TableDescriptor],
        store: Arc<dyn LocalStore>,
        settings: Arc<dyn SettingsProvider>,
        remote: Arc<dyn RemoteStore>,
    ) -> Self {
        Self {
            catalog,
            store,
            settings,
            remote,
            in_flight: Arc::new(AtomicBool::new(false)),
            session: Arc::new(Mutex::new(None)),
            status: Mutex::new(SyncStatus::default()),
        }
    }

    /// Whether a sync operation is currently in flight.
    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// The most recent sync session, running or finished.
    pub fn last_session(&self) -> Option<SyncSession> {
        self.session.lock().ok().and_then(|guard| guard.clone())
    }

    /// Engine status for the settings screen.
    pub fn status(&self) -> SyncStatus {
        let mut status = self
            .status
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default();
        status.is_syncing = self.is_syncing();
        status
    }

    pub(crate) fn record_success(&self, direction: SyncDirection) {
        if let Ok(mut status) = self.status.lock() {
            match direction {
                SyncDirection::Push => status.last_push_at = Some(Utc::now()),
                SyncDirection::Pull => status.last_pull_at = Some(Utc::now()),
            }
            status.last_error = None;
        }
    }

    pub(crate) fn record_failure(&self, message: &str) {
        if let Ok(mut status) = self.status.lock() {
            status.last_error = Some(message.to_string());
        }
    }

    /// Try to acquire the single-flight guard. Returns `None` when another
    /// operation holds it; callers must retry later (typically the next
    /// scheduled tick), nothing is queued.
    pub(crate) fn try_begin(
        &self,
        direction: SyncDirection,
        trigger: SyncTrigger,
    ) -> Option<SyncPermit> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return None;
        }

        if let Ok(mut guard) = self.session.lock() {
            *guard = Some(SyncSession::start(direction, trigger));
        }
        Some(SyncPermit {
            flag: Arc::clone(&self.in_flight),
            session: Arc::clone(&self.session),
        })
    }

    /// Read the remote configuration, fresh for this call, and fail fast
    /// when no bridge URL is configured.
    pub(crate) fn load_config(&self) -> Result<RemoteConfig, SyncError> {
        let config = self.settings.remote_config()?;
        if !config.has_bridge_url() {
            return Err(SyncError::config(
                "bridge URL is not configured; set it in sync settings first",
            ));
        }
        Ok(config)
    }

    /// Probe remote connectivity with the current configuration.
    pub async fn test_remote(&self) -> Result<ConnectionTest, SyncError> {
        let config = self.load_config()?;
        Ok(self.remote.test_connection(&config).await?)
    }
}

/// RAII guard representing single-flight ownership. Releasing happens in
/// `Drop`, so the flag clears on success, error, panic, and cancelled
/// futures alike.
pub(crate) struct SyncPermit {
    flag: Arc<AtomicBool>,
    session: Arc<Mutex<Option<SyncSession>>>,
}

impl SyncPermit {
    fn record(&self, update: impl FnOnce(&mut SyncSession)) {
        if let Ok(mut guard) = self.session.lock() {
            if let Some(session) = guard.as_mut() {
                update(session);
            }
        }
    }

    pub(crate) fn succeed(&self) {
        self.record(|session| session.succeed());
    }

    pub(crate) fn fail(&self, message: &str) {
        self.record(|session| session.fail(message));
    }
}

impl Drop for SyncPermit {
    fn drop(&mut self) {
        // A session still running here was abandoned mid-flight.
        self.record(|session| {
            if session.is_running() {
                session.fail("sync aborted before completion");
            }
        });
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{configured_settings, unconfigured_settings, ScriptedRemote};
    use crewline_core::store::MemoryStore;
    use crewline_core::sync::SyncState;

    fn manager_with(remote: Arc<ScriptedRemote>) -> SyncManager {
        SyncManager::new(
            Arc::new(MemoryStore::new()),
            configured_settings(),
            remote,
        )
    }

    #[test]
    fn guard_is_exclusive_until_dropped() {
        let manager = manager_with(Arc::new(ScriptedRemote::new()));

        let permit = manager
            .try_begin(SyncDirection::Push, SyncTrigger::Manual)
            .expect("first acquire");
        assert!(manager.is_syncing());
        assert!(manager
            .try_begin(SyncDirection::Pull, SyncTrigger::Manual)
            .is_none());

        drop(permit);
        assert!(!manager.is_syncing());
        assert!(manager
            .try_begin(SyncDirection::Pull, SyncTrigger::Manual)
            .is_some());
    }

    #[test]
    fn abandoned_session_is_marked_failed_on_release() {
        let manager = manager_with(Arc::new(ScriptedRemote::new()));
        let permit = manager
            .try_begin(SyncDirection::Push, SyncTrigger::Interval)
            .expect("acquire");
        drop(permit);

        let session = manager.last_session().expect("session recorded");
        assert_eq!(session.state, SyncState::Failed);
        assert_eq!(
            session.last_error.as_deref(),
            Some("sync aborted before completion")
        );
    }

    #[test]
    fn missing_bridge_url_fails_fast() {
        let manager = SyncManager::new(
            Arc::new(MemoryStore::new()),
            unconfigured_settings(),
            Arc::new(ScriptedRemote::new()),
        );
        let err = manager.load_config().unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }

    #[tokio::test]
    async fn test_remote_reports_bridge_outcome() {
        let remote = Arc::new(ScriptedRemote::new());
        let manager = manager_with(Arc::clone(&remote));
        let outcome = manager.test_remote().await.expect("test outcome");
        assert_eq!(outcome, ConnectionTest::Ok);
    }
}
