//! Wire types for the bridge protocol.

use serde::{Deserialize, Serialize};

use crewline_core::settings::RemoteConfig;

/// One row as returned by a bridge `query` call.
pub type RemoteRow = serde_json::Map<String, serde_json::Value>;

/// Actions understood by the bridge endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeAction {
    Test,
    Query,
    ExecuteSql,
}

/// Request body for one bridge call. Connection parameters accompany every
/// action; `sql` is present for `query` and `execute_sql`.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeRequest<'a> {
    pub action: BridgeAction,
    pub host: &'a str,
    pub port: u16,
    pub user: &'a str,
    pub password: &'a str,
    pub database: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<&'a str>,
}

impl<'a> BridgeRequest<'a> {
    pub fn new(action: BridgeAction, config: &'a RemoteConfig, sql: Option<&'a str>) -> Self {
        Self {
            action,
            host: &config.host,
            port: config.port,
            user: &config.user,
            password: &config.password,
            database: &config.database,
            sql,
        }
    }
}

/// Response body for one bridge call. `data` is only present for `query`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BridgeResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<RemoteRow>>,
}

/// Outcome of a bridge connection test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum ConnectionTest {
    /// Server reachable and the configured database exists.
    Ok,
    /// Server reachable but the configured database is missing
    /// (bridge code `DB_NOT_FOUND`) — distinct from a connection failure.
    DatabaseMissing { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RemoteConfig {
        RemoteConfig {
            api_url: "http://bridge.local/api.php".to_string(),
            host: "db.local".to_string(),
            port: 3306,
            user: "crew".to_string(),
            password: "secret".to_string(),
            database: "crewline".to_string(),
        }
    }

    #[test]
    fn request_serialization_matches_bridge_contract() {
        let config = config();
        let request = BridgeRequest::new(BridgeAction::Query, &config, Some("SELECT 1"));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["action"], "query");
        assert_eq!(json["host"], "db.local");
        assert_eq!(json["port"], 3306);
        assert_eq!(json["sql"], "SELECT 1");
    }

    #[test]
    fn sql_is_omitted_when_absent() {
        let config = config();
        let request = BridgeRequest::new(BridgeAction::Test, &config, None);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["action"], "test");
        assert!(json.get("sql").is_none());
    }

    #[test]
    fn response_tolerates_missing_optional_fields() {
        let response: BridgeResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(response.success);
        assert!(response.message.is_none());
        assert!(response.data.is_none());

        let response: BridgeResponse = serde_json::from_str(
            r#"{"success":false,"message":"boom","code":"DB_NOT_FOUND"}"#,
        )
        .unwrap();
        assert!(!response.success);
        assert_eq!(response.code.as_deref(), Some("DB_NOT_FOUND"));
    }
}
