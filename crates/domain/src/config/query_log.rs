use serde::{Deserialize, Serialize};

/// Query-log retention and the billing-upload cadence (§4.11, §6).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryLogConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    #[serde(default = "default_billing_flush_interval_secs")]
    pub billing_flush_interval_secs: u64,
    #[serde(default = "default_billing_batch_size")]
    pub billing_batch_size: usize,
}

impl Default for QueryLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retention_days: default_retention_days(),
            billing_flush_interval_secs: default_billing_flush_interval_secs(),
            billing_batch_size: default_billing_batch_size(),
        }
    }
}

fn default_retention_days() -> u32 {
    90
}
fn default_billing_flush_interval_secs() -> u64 {
    60
}
fn default_billing_batch_size() -> usize {
    10_000
}
