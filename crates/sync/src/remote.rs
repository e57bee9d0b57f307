//! Remote store protocol seam.
//!
//! The coordinators talk to the remote store through this trait rather
//! than the bridge client directly, so an alternative transport (e.g. a
//! structured batch-upsert RPC) can be substituted without touching them.

use std::time::Duration;

use async_trait::async_trait;

use crewline_bridge_client::{BridgeClient, BridgeError, ConnectionTest, RemoteRow};
use crewline_core::settings::RemoteConfig;
use crewline_core::sync::{PULL_TABLE_TIMEOUT_SECS, PUSH_TIMEOUT_SECS};

/// Remote side of the full-replace protocol.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Execute a multi-statement script replacing the remote dataset.
    async fn execute_script(&self, config: &RemoteConfig, sql: &str) -> Result<(), BridgeError>;

    /// Fetch every row of one remote table.
    async fn fetch_table(
        &self,
        config: &RemoteConfig,
        table: &str,
    ) -> Result<Vec<RemoteRow>, BridgeError>;

    /// Probe remote connectivity.
    async fn test_connection(&self, config: &RemoteConfig) -> Result<ConnectionTest, BridgeError>;
}

#[async_trait]
impl RemoteStore for BridgeClient {
    async fn execute_script(&self, config: &RemoteConfig, sql: &str) -> Result<(), BridgeError> {
        BridgeClient::execute_script(self, config, sql, Duration::from_secs(PUSH_TIMEOUT_SECS))
            .await
    }

    async fn fetch_table(
        &self,
        config: &RemoteConfig,
        table: &str,
    ) -> Result<Vec<RemoteRow>, BridgeError> {
        let sql = format!("SELECT * FROM `{}`", table);
        BridgeClient::query(
            self,
            config,
            &sql,
            Duration::from_secs(PULL_TABLE_TIMEOUT_SECS),
        )
        .await
    }

    async fn test_connection(&self, config: &RemoteConfig) -> Result<ConnectionTest, BridgeError> {
        BridgeClient::test_connection(self, config).await
    }
}
