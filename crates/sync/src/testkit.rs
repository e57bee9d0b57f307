//! Scripted fakes for coordinator tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crewline_bridge_client::{BridgeError, ConnectionTest, RemoteRow};
use crewline_core::settings::{RemoteConfig, SettingsProvider};

use crate::remote::RemoteStore;

pub(crate) struct StaticSettings {
    config: RemoteConfig,
}

impl SettingsProvider for StaticSettings {
    fn remote_config(&self) -> crewline_core::Result<RemoteConfig> {
        Ok(self.config.clone())
    }
}

pub(crate) fn configured_settings() -> Arc<StaticSettings> {
    Arc::new(StaticSettings {
        config: RemoteConfig {
            api_url: "http://bridge.test/api.php".to_string(),
            host: "db.test".to_string(),
            port: 3306,
            user: "crew".to_string(),
            password: "secret".to_string(),
            database: "crewline".to_string(),
        },
    })
}

pub(crate) fn unconfigured_settings() -> Arc<StaticSettings> {
    Arc::new(StaticSettings {
        config: RemoteConfig::default(),
    })
}

/// Scripted behavior for `execute_script` calls.
#[derive(Debug, Clone)]
pub(crate) enum ExecuteBehavior {
    Ok,
    /// Succeed after a delay, to hold the single-flight guard open.
    Hang(Duration),
    RemoteFailure(String),
    Timeout(u64),
}

/// Scripted behavior for one table's `fetch_table` call.
#[derive(Debug, Clone)]
pub(crate) enum TableBehavior {
    Rows(Vec<RemoteRow>),
    MissingTable,
    RemoteFailure(String),
}

/// Fake remote store recording every call it receives.
pub(crate) struct ScriptedRemote {
    pub executed: Mutex<Vec<String>>,
    pub execute_behavior: Mutex<ExecuteBehavior>,
    pub tables: Mutex<HashMap<String, TableBehavior>>,
    pub fetch_count: AtomicUsize,
}

impl ScriptedRemote {
    pub(crate) fn new() -> Self {
        Self {
            executed: Mutex::new(Vec::new()),
            execute_behavior: Mutex::new(ExecuteBehavior::Ok),
            tables: Mutex::new(HashMap::new()),
            fetch_count: AtomicUsize::new(0),
        }
    }

    pub(crate) fn set_execute_behavior(&self, behavior: ExecuteBehavior) {
        *self.execute_behavior.lock().expect("behavior lock") = behavior;
    }

    pub(crate) fn set_table(&self, table: &str, behavior: TableBehavior) {
        self.tables
            .lock()
            .expect("tables lock")
            .insert(table.to_string(), behavior);
    }

    pub(crate) fn executed_scripts(&self) -> Vec<String> {
        self.executed.lock().expect("executed lock").clone()
    }

    /// Total remote calls issued, across scripts and table fetches.
    pub(crate) fn request_count(&self) -> usize {
        self.executed_scripts().len() + self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteStore for ScriptedRemote {
    async fn execute_script(&self, _config: &RemoteConfig, sql: &str) -> Result<(), BridgeError> {
        self.executed
            .lock()
            .expect("executed lock")
            .push(sql.to_string());
        let behavior = self.execute_behavior.lock().expect("behavior lock").clone();
        match behavior {
            ExecuteBehavior::Ok => Ok(()),
            ExecuteBehavior::Hang(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            ExecuteBehavior::RemoteFailure(message) => Err(BridgeError::remote(message, None)),
            ExecuteBehavior::Timeout(secs) => Err(BridgeError::Timeout(secs)),
        }
    }

    async fn fetch_table(
        &self,
        _config: &RemoteConfig,
        table: &str,
    ) -> Result<Vec<RemoteRow>, BridgeError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        let behavior = self
            .tables
            .lock()
            .expect("tables lock")
            .get(table)
            .cloned()
            .unwrap_or(TableBehavior::Rows(Vec::new()));
        match behavior {
            TableBehavior::Rows(rows) => Ok(rows),
            TableBehavior::MissingTable => Err(BridgeError::remote(
                format!("Table 'crewline.{}' doesn't exist", table),
                None,
            )),
            TableBehavior::RemoteFailure(message) => Err(BridgeError::remote(message, None)),
        }
    }

    async fn test_connection(
        &self,
        _config: &RemoteConfig,
    ) -> Result<ConnectionTest, BridgeError> {
        Ok(ConnectionTest::Ok)
    }
}
