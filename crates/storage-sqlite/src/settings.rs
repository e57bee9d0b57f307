//! Key/value settings repository backing the remote bridge configuration.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OptionalExtension};

use crewline_core::errors::{Result, StoreError};
use crewline_core::settings::{
    RemoteConfig, SettingsProvider, DEFAULT_BRIDGE_PORT, SETTING_BRIDGE_API_URL,
    SETTING_BRIDGE_DATABASE, SETTING_BRIDGE_HOST, SETTING_BRIDGE_PASSWORD, SETTING_BRIDGE_PORT,
    SETTING_BRIDGE_USER,
};

use crate::db::sql_err;

/// Settings stored as one row per key in the `settings` table.
pub struct SqliteSettingsRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSettingsRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::query("sqlite connection lock poisoned"))?;
        let value = conn
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .map_err(sql_err)?;
        Ok(value)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::query("sqlite connection lock poisoned"))?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )
        .map_err(sql_err)?;
        Ok(())
    }
}

impl SettingsProvider for SqliteSettingsRepository {
    /// Assemble a fresh config on every call so settings edits take effect
    /// on the next sync without a restart.
    fn remote_config(&self) -> Result<RemoteConfig> {
        let get = |key: &str| self.get(key);
        let port = get(SETTING_BRIDGE_PORT)?
            .and_then(|value| value.trim().parse::<u16>().ok())
            .unwrap_or(DEFAULT_BRIDGE_PORT);

        Ok(RemoteConfig {
            api_url: get(SETTING_BRIDGE_API_URL)?.unwrap_or_default(),
            host: get(SETTING_BRIDGE_HOST)?.unwrap_or_else(|| "localhost".to_string()),
            port,
            user: get(SETTING_BRIDGE_USER)?.unwrap_or_default(),
            password: get(SETTING_BRIDGE_PASSWORD)?.unwrap_or_default(),
            database: get(SETTING_BRIDGE_DATABASE)?.unwrap_or_default(),
        })
    }
}
