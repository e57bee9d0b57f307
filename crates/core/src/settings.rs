//! Remote bridge configuration and the settings contract.

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Settings keys consumed by the sync engine.
pub const SETTING_BRIDGE_API_URL: &str = "bridge_api_url";
pub const SETTING_BRIDGE_HOST: &str = "bridge_host";
pub const SETTING_BRIDGE_PORT: &str = "bridge_port";
pub const SETTING_BRIDGE_USER: &str = "bridge_user";
pub const SETTING_BRIDGE_PASSWORD: &str = "bridge_password";
pub const SETTING_BRIDGE_DATABASE: &str = "bridge_database";

/// Default remote database port when none is configured.
pub const DEFAULT_BRIDGE_PORT: u16 = 3306;

/// Connection parameters for the remote bridge, read from settings storage
/// before every sync call so edits take effect without a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfig {
    pub api_url: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            host: "localhost".to_string(),
            port: DEFAULT_BRIDGE_PORT,
            user: String::new(),
            password: String::new(),
            database: String::new(),
        }
    }
}

impl RemoteConfig {
    /// Whether a bridge URL has been configured at all.
    pub fn has_bridge_url(&self) -> bool {
        !self.api_url.trim().is_empty()
    }
}

/// Source of the remote configuration. Implementations must return current
/// values on every call; the engine never caches a config across syncs.
pub trait SettingsProvider: Send + Sync {
    fn remote_config(&self) -> Result<RemoteConfig>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_url_is_not_configured() {
        let config = RemoteConfig::default();
        assert!(!config.has_bridge_url());

        let config = RemoteConfig {
            api_url: "   ".to_string(),
            ..RemoteConfig::default()
        };
        assert!(!config.has_bridge_url());

        let config = RemoteConfig {
            api_url: "http://bridge.local/api.php".to_string(),
            ..RemoteConfig::default()
        };
        assert!(config.has_bridge_url());
    }
}
