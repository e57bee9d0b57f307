//! Scheduler constants for background bridge sync.

/// Silent push cadence in seconds.
pub const AUTO_SYNC_INTERVAL_SECS: u64 = 60;

/// Maximum jitter (seconds) added to periodic push intervals.
pub const AUTO_SYNC_INTERVAL_JITTER_SECS: u64 = 5;

/// Soft payload size threshold for push dumps, in bytes. Exceeding it is
/// advisory only; the bridge's own limits are unknown to the client.
pub const DUMP_SIZE_WARN_BYTES: usize = 4 * 1024 * 1024;

/// Timeout for one `execute_sql` push request, in seconds.
pub const PUSH_TIMEOUT_SECS: u64 = 60;

/// Timeout for one per-table pull query, in seconds.
pub const PULL_TABLE_TIMEOUT_SECS: u64 = 15;

/// Timeout for a bridge connection test, in seconds.
pub const TEST_TIMEOUT_SECS: u64 = 10;
