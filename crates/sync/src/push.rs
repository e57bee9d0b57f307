//! Push coordinator: ships a full local dump to the bridge for execution.

use std::time::Instant;

use log::{debug, info, warn};
use serde::Serialize;

use crewline_core::sync::{SyncDirection, SyncTrigger, DUMP_SIZE_WARN_BYTES};

use crate::dump::generate_dump;
use crate::error::SyncError;
use crate::manager::SyncManager;

/// How a push attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PushOutcome {
    /// Dump executed on the remote store.
    Completed,
    /// Another sync was in flight; nothing was sent.
    SkippedBusy,
    /// Dump generation produced nothing; nothing to sync.
    NothingToSync,
}

/// Result of one push attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushReport {
    pub outcome: PushOutcome,
    pub script_bytes: usize,
    /// Payload exceeded the soft size threshold. Advisory only; the push
    /// still went through.
    pub oversized: bool,
    pub duration_ms: i64,
}

impl PushReport {
    fn empty(outcome: PushOutcome) -> Self {
        Self {
            outcome,
            script_bytes: 0,
            oversized: false,
            duration_ms: 0,
        }
    }

    pub fn skipped_busy() -> Self {
        Self::empty(PushOutcome::SkippedBusy)
    }

    pub fn nothing_to_sync() -> Self {
        Self::empty(PushOutcome::NothingToSync)
    }

    pub fn completed(&self) -> bool {
        self.outcome == PushOutcome::Completed
    }
}

impl SyncManager {
    /// Replace the remote dataset with the current local snapshot.
    ///
    /// Returns a busy report without any I/O when a sync is already in
    /// flight. The remote script is not atomic: a failure partway through
    /// can leave the remote store partially rewritten, and recovery is the
    /// next full push.
    pub async fn push(&self, trigger: SyncTrigger) -> Result<PushReport, SyncError> {
        let Some(permit) = self.try_begin(SyncDirection::Push, trigger) else {
            debug!("[BridgeSync] push skipped: a sync operation is already running");
            return Ok(PushReport::skipped_busy());
        };

        let started = Instant::now();
        let result = self.push_locked().await;
        let duration_ms = started.elapsed().as_millis() as i64;
        match result {
            Ok(mut report) => {
                report.duration_ms = duration_ms;
                permit.succeed();
                self.record_success(SyncDirection::Push);
                info!(
                    "[BridgeSync] push finished: {:?}, {} bytes in {} ms",
                    report.outcome, report.script_bytes, report.duration_ms
                );
                Ok(report)
            }
            Err(err) => {
                permit.fail(&err.to_string());
                self.record_failure(&err.to_string());
                Err(err)
            }
        }
    }

    async fn push_locked(&self) -> Result<PushReport, SyncError> {
        let config = self.load_config()?;

        let Some(script) = generate_dump(self.catalog, self.store.as_ref())? else {
            return Ok(PushReport::nothing_to_sync());
        };

        let script_bytes = script.len();
        let oversized = script_bytes > DUMP_SIZE_WARN_BYTES;
        if oversized {
            warn!(
                "[BridgeSync] dump payload is {} bytes (soft threshold {}); sending anyway",
                script_bytes, DUMP_SIZE_WARN_BYTES
            );
        }

        self.remote.execute_script(&config, &script).await?;

        Ok(PushReport {
            outcome: PushOutcome::Completed,
            script_bytes,
            oversized,
            duration_ms: 0,
        })
    }
}
