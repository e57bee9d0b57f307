//! Sync session domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of one sync operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    Push,
    Pull,
}

/// Trigger source for sync operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTrigger {
    Manual,
    Interval,
    Reconnect,
}

/// Lifecycle state of one in-flight sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Running,
    Succeeded,
    Failed,
}

/// Transient description of one sync attempt. Created when an operation
/// acquires the single-flight guard, finalized when the guard is released;
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSession {
    pub direction: SyncDirection,
    pub trigger: SyncTrigger,
    pub started_at: DateTime<Utc>,
    pub state: SyncState,
    pub last_error: Option<String>,
}

impl SyncSession {
    /// Start a new running session.
    pub fn start(direction: SyncDirection, trigger: SyncTrigger) -> Self {
        Self {
            direction,
            trigger,
            started_at: Utc::now(),
            state: SyncState::Running,
            last_error: None,
        }
    }

    pub fn succeed(&mut self) {
        self.state = SyncState::Succeeded;
        self.last_error = None;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.state = SyncState::Failed;
        self.last_error = Some(message.into());
    }

    pub fn is_running(&self) -> bool {
        self.state == SyncState::Running
    }
}

/// Lightweight engine status for the settings screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub last_push_at: Option<DateTime<Utc>>,
    pub last_pull_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub is_syncing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_lifecycle_transitions() {
        let mut session = SyncSession::start(SyncDirection::Push, SyncTrigger::Manual);
        assert!(session.is_running());
        assert!(session.last_error.is_none());

        session.fail("bridge unreachable");
        assert_eq!(session.state, SyncState::Failed);
        assert_eq!(session.last_error.as_deref(), Some("bridge unreachable"));

        session.succeed();
        assert_eq!(session.state, SyncState::Succeeded);
        assert!(session.last_error.is_none());
    }

    #[test]
    fn trigger_serialization_is_snake_case() {
        assert_eq!(
            serde_json::to_string(&SyncTrigger::Reconnect).unwrap(),
            "\"reconnect\""
        );
    }
}
