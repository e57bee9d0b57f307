//! Bridge API client.
//!
//! Every call POSTs one JSON body to the configured bridge URL and reads
//! one JSON body back. Each request carries its own timeout; dropping the
//! returned future cancels the request in flight.

use std::time::Duration;

use log::debug;

use crewline_core::settings::RemoteConfig;
use crewline_core::sync::TEST_TIMEOUT_SECS;

use crate::error::{BridgeError, Result};
use crate::types::{BridgeAction, BridgeRequest, BridgeResponse, ConnectionTest, RemoteRow};

const MAX_LOG_BODY_CHARS: usize = 512;

/// Client for the Crewline connectivity bridge.
///
/// The endpoint URL travels with the per-call `RemoteConfig` rather than
/// the client, so settings edits apply on the very next call.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    client: reqwest::Client,
}

impl BridgeClient {
    /// Create a new bridge client.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| BridgeError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("Bridge response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("Bridge response error ({}): {}", status, preview);
    }

    /// Issue one bridge call and parse the response envelope.
    async fn post(
        &self,
        config: &RemoteConfig,
        request: BridgeRequest<'_>,
        timeout: Duration,
    ) -> Result<BridgeResponse> {
        let api_url = config.api_url.trim().trim_end_matches('/');
        if api_url.is_empty() {
            return Err(BridgeError::config("bridge URL is not configured"));
        }

        let timeout_secs = timeout.as_secs();
        let response = self
            .client
            .post(api_url)
            .timeout(timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| BridgeError::from_transport(e, timeout_secs))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BridgeError::from_transport(e, timeout_secs))?;
        Self::log_response(status, &body);

        if !status.is_success() {
            return Err(BridgeError::Status {
                status: status.as_u16(),
                message: body.chars().take(MAX_LOG_BODY_CHARS).collect(),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    fn remote_failure(response: BridgeResponse) -> BridgeError {
        BridgeError::remote(
            response
                .message
                .unwrap_or_else(|| "bridge reported failure without a message".to_string()),
            response.code,
        )
    }

    /// Test connectivity to the remote store.
    ///
    /// `{action:"test", ...connection}` → `{success, message?, code?}`.
    /// A reachable server with a missing database answers with
    /// `code:"DB_NOT_FOUND"` and is reported as a distinct outcome.
    pub async fn test_connection(&self, config: &RemoteConfig) -> Result<ConnectionTest> {
        let request = BridgeRequest::new(BridgeAction::Test, config, None);
        let response = self
            .post(config, request, Duration::from_secs(TEST_TIMEOUT_SECS))
            .await?;

        if response.success {
            return Ok(ConnectionTest::Ok);
        }
        if response.code.as_deref() == Some("DB_NOT_FOUND") {
            return Ok(ConnectionTest::DatabaseMissing {
                message: response.message.unwrap_or_default(),
            });
        }
        Err(Self::remote_failure(response))
    }

    /// Run one read query against the remote store.
    ///
    /// `{action:"query", ...connection, sql}` → `{success, data, message?}`.
    pub async fn query(
        &self,
        config: &RemoteConfig,
        sql: &str,
        timeout: Duration,
    ) -> Result<Vec<RemoteRow>> {
        let request = BridgeRequest::new(BridgeAction::Query, config, Some(sql));
        let response = self.post(config, request, timeout).await?;

        if response.success {
            return Ok(response.data.unwrap_or_default());
        }
        Err(Self::remote_failure(response))
    }

    /// Execute a multi-statement script against the remote store.
    ///
    /// `{action:"execute_sql", ...connection, sql}` → `{success, message?}`.
    pub async fn execute_script(
        &self,
        config: &RemoteConfig,
        sql: &str,
        timeout: Duration,
    ) -> Result<()> {
        let request = BridgeRequest::new(BridgeAction::ExecuteSql, config, Some(sql));
        let response = self.post(config, request, timeout).await?;

        if response.success {
            return Ok(());
        }
        Err(Self::remote_failure(response))
    }
}
