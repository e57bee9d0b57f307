//! Pull coordinator: fetches the full remote snapshot and atomically
//! replaces the local dataset with it.

use std::time::Instant;

use log::{debug, info};
use serde::Serialize;

use crewline_core::codec::decode_row;
use crewline_core::store::TableRows;
use crewline_core::sync::{SyncDirection, SyncTrigger};

use crate::error::SyncError;
use crate::manager::SyncManager;

/// Result of one pull attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullReport {
    /// Another sync was in flight; nothing was fetched or applied.
    pub skipped_busy: bool,
    /// Rows applied per table, in catalog order.
    pub table_counts: Vec<(String, usize)>,
    pub duration_ms: i64,
}

impl PullReport {
    pub fn skipped_busy() -> Self {
        Self {
            skipped_busy: true,
            table_counts: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn completed(&self) -> bool {
        !self.skipped_busy
    }

    pub fn total_rows(&self) -> usize {
        self.table_counts.iter().map(|(_, count)| count).sum()
    }
}

impl SyncManager {
    /// Replace the local dataset with the current remote snapshot.
    ///
    /// Destructive by design: local state is discarded wholesale, so this
    /// is only ever invoked explicitly by the user, never by the
    /// scheduler. The network phase is fully separated from the local
    /// apply phase — the store transaction starts only after every table
    /// has been fetched, so the local store never mixes old and new
    /// snapshots.
    pub async fn pull(&self) -> Result<PullReport, SyncError> {
        let Some(permit) = self.try_begin(SyncDirection::Pull, SyncTrigger::Manual) else {
            debug!("[BridgeSync] pull skipped: a sync operation is already running");
            return Ok(PullReport::skipped_busy());
        };

        let started = Instant::now();
        let result = self.pull_locked().await;
        let duration_ms = started.elapsed().as_millis() as i64;
        match result {
            Ok(mut report) => {
                report.duration_ms = duration_ms;
                permit.succeed();
                self.record_success(SyncDirection::Pull);
                info!(
                    "[BridgeSync] pull finished: {} rows across {} tables in {} ms",
                    report.total_rows(),
                    report.table_counts.len(),
                    report.duration_ms
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

    async fn pull_locked(&self) -> Result<PullReport, SyncError> {
        let config = self.load_config()?;

        // Fetch phase: every table must answer before anything is applied.
        let mut snapshot = Vec::with_capacity(self.catalog.len());
        let mut table_counts = Vec::with_capacity(self.catalog.len());
        for descriptor in self.catalog {
            let remote_rows = match self.remote.fetch_table(&config, descriptor.name).await {
                Ok(rows) => rows,
                Err(err) if err.indicates_missing_table() => {
                    // First-ever sync: the table has not been pushed yet.
                    debug!(
                        "[BridgeSync] remote table '{}' is missing; treating as empty",
                        descriptor.name
                    );
                    Vec::new()
                }
                Err(err) => return Err(err.into()),
            };

            let mut rows = Vec::with_capacity(remote_rows.len());
            for remote_row in &remote_rows {
                rows.push(decode_row(descriptor, remote_row)?);
            }
            table_counts.push((descriptor.name.to_string(), rows.len()));
            snapshot.push(TableRows::new(descriptor.name, rows));
        }

        // Apply phase: one transaction spanning every synchronized table.
        self.store.replace_all(self.catalog, snapshot)?;

        Ok(PullReport {
            skipped_busy: false,
            table_counts,
            duration_ms: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::testkit::{configured_settings, ExecuteBehavior, ScriptedRemote, TableBehavior};
    use crewline_core::store::MemoryStore;
    use crewline_core::value::{Record, Value};
    use serde_json::json;

    fn remote_row(pairs: &[(&str, serde_json::Value)]) -> crewline_bridge_client::RemoteRow {
        let mut row = serde_json::Map::new();
        for (key, value) in pairs {
            row.insert(key.to_string(), value.clone());
        }
        row
    }

    fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let mut record = Record::new();
        record.insert("id".to_string(), Value::Integer(99));
        record.insert("name".to_string(), Value::from("stale local worker"));
        store.seed("workers", vec![record]);
        store
    }

    fn manager(store: Arc<MemoryStore>, remote: Arc<ScriptedRemote>) -> SyncManager {
        SyncManager::new(store, configured_settings(), remote)
    }

    #[tokio::test]
    async fn pull_replaces_the_full_local_dataset() {
        let store = seeded_store();
        let remote = Arc::new(ScriptedRemote::new());
        remote.set_table(
            "workers",
            TableBehavior::Rows(vec![remote_row(&[
                ("id", json!(1)),
                ("name", json!("Ada")),
                ("active", json!(1)),
            ])]),
        );
        let manager = manager(Arc::clone(&store), remote);

        let report = manager.pull().await.expect("pull");
        assert!(report.completed());
        assert_eq!(report.total_rows(), 1);

        let workers = store.rows("workers");
        assert_eq!(workers.len(), 1);
        assert_eq!(workers[0].get("name"), Some(&Value::from("Ada")));
        assert_eq!(workers[0].get("active"), Some(&Value::Bool(true)));
    }

    #[tokio::test]
    async fn structured_columns_are_decoded_on_pull() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(ScriptedRemote::new());
        remote.set_table(
            "payrolls",
            TableBehavior::Rows(vec![remote_row(&[
                ("id", json!(5)),
                ("worker_id", json!(1)),
                ("details", json!("[{\"workerId\":1,\"amount\":720}]")),
            ])]),
        );
        let manager = manager(Arc::clone(&store), remote);

        manager.pull().await.expect("pull");

        let payrolls = store.rows("payrolls");
        assert_eq!(
            payrolls[0].get("details"),
            Some(&Value::Structured(json!([{"workerId": 1, "amount": 720}])))
        );
    }

    #[tokio::test]
    async fn missing_remote_table_is_tolerated_as_empty() {
        let store = seeded_store();
        let remote = Arc::new(ScriptedRemote::new());
        remote.set_table("payrolls", TableBehavior::MissingTable);
        remote.set_table(
            "workers",
            TableBehavior::Rows(vec![remote_row(&[("id", json!(1)), ("name", json!("Ada"))])]),
        );
        let manager = manager(Arc::clone(&store), remote);

        let report = manager.pull().await.expect("pull");
        assert!(report.completed());
        assert_eq!(store.row_count("payrolls"), 0);
        assert_eq!(store.row_count("workers"), 1);
    }

    #[tokio::test]
    async fn any_other_remote_failure_aborts_before_local_writes() {
        let store = seeded_store();
        let remote = Arc::new(ScriptedRemote::new());
        remote.set_table(
            "workers",
            TableBehavior::RemoteFailure("Access denied for user 'crew'@'%'".to_string()),
        );
        let manager = manager(Arc::clone(&store), remote);

        let err = manager.pull().await.unwrap_err();
        assert!(matches!(err, SyncError::Remote(_)));

        // The stale local snapshot must survive untouched.
        let workers = store.rows("workers");
        assert_eq!(workers.len(), 1);
        assert_eq!(
            workers[0].get("name"),
            Some(&Value::from("stale local worker"))
        );
        assert!(!manager.is_syncing());
    }

    #[tokio::test]
    async fn undecodable_rows_abort_before_local_writes() {
        let store = seeded_store();
        let remote = Arc::new(ScriptedRemote::new());
        remote.set_table(
            "workers",
            TableBehavior::Rows(vec![remote_row(&[("id", json!("not-a-number"))])]),
        );
        let manager = manager(Arc::clone(&store), remote);

        let err = manager.pull().await.unwrap_err();
        assert!(matches!(err, SyncError::Decode(_)));
        assert_eq!(store.row_count("workers"), 1);
    }

    #[tokio::test]
    async fn pull_while_push_is_running_is_skipped() {
        let store = seeded_store();
        let remote = Arc::new(ScriptedRemote::new());
        remote.set_execute_behavior(ExecuteBehavior::Hang(Duration::from_millis(300)));
        let manager = Arc::new(manager(Arc::clone(&store), Arc::clone(&remote)));

        let push_manager = Arc::clone(&manager);
        let push = tokio::spawn(async move {
            push_manager
                .push(crewline_core::sync::SyncTrigger::Interval)
                .await
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        let report = manager.pull().await.expect("pull");
        assert!(report.skipped_busy);
        // No table fetch was issued for the skipped pull.
        assert_eq!(remote.fetch_count.load(std::sync::atomic::Ordering::SeqCst), 0);

        push.await.expect("join").expect("push");
    }
}
