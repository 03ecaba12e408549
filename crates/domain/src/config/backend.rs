use serde::{Deserialize, Serialize};

/// The opaque profile-backend RPC endpoint the snapshot syncer pulls from
/// (§1, §4.1 "assumed opaque wire format").
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    pub endpoint: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
}

fn default_timeout_ms() -> u64 {
    10_000
}
fn default_retry_attempts() -> u32 {
    3
}
