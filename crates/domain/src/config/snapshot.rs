use serde::{Deserialize, Serialize};

/// Local on-disk snapshot of the profile DB and the sync cadence that
/// refreshes it from the backend (§4.1).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_path")]
    pub path: String,

    /// How often the refresh job pulls a new snapshot from the backend.
    /// Default: 60 seconds.
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,

    /// How long a single sync attempt may run before it's treated as
    /// failed and the stale snapshot is kept in service.
    #[serde(default = "default_sync_timeout_secs")]
    pub sync_timeout_secs: u64,

    /// Capacity of the async mpsc channel that buffers query-log entries
    /// before the background flush task batches them for billing upload.
    #[serde(default = "default_query_log_channel_capacity")]
    pub query_log_channel_capacity: usize,

    /// Maximum number of entries committed in a single billing-upload batch.
    #[serde(default = "default_query_log_max_batch_size")]
    pub query_log_max_batch_size: usize,

    /// Interval in milliseconds between flush-timer ticks in the billing
    /// uploader. Controls the maximum latency before a logged query appears
    /// in the uploaded batch when the batch hasn't yet filled.
    #[serde(default = "default_query_log_flush_interval_ms")]
    pub query_log_flush_interval_ms: u64,

    /// Log 1 out of every N queries to the billing uploader (1 = all,
    /// 10 = 10%). Sampling is uniform so statistical accuracy is preserved.
    #[serde(default = "default_query_log_sample_rate")]
    pub query_log_sample_rate: u32,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            sync_interval_secs: default_sync_interval_secs(),
            sync_timeout_secs: default_sync_timeout_secs(),
            query_log_channel_capacity: default_query_log_channel_capacity(),
            query_log_max_batch_size: default_query_log_max_batch_size(),
            query_log_flush_interval_ms: default_query_log_flush_interval_ms(),
            query_log_sample_rate: default_query_log_sample_rate(),
        }
    }
}

fn default_path() -> String {
    "./meridian-dns-snapshot.bin".to_string()
}
fn default_sync_interval_secs() -> u64 {
    60
}
fn default_sync_timeout_secs() -> u64 {
    10
}
fn default_query_log_channel_capacity() -> usize {
    10_000
}
fn default_query_log_max_batch_size() -> usize {
    500
}
fn default_query_log_flush_interval_ms() -> u64 {
    100
}
fn default_query_log_sample_rate() -> u32 {
    1
}
