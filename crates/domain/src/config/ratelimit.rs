use serde::{Deserialize, Serialize};

/// Rate-limiting, back-off, and connection-limit policy (§4.4, §6).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests allowed per `interval_ms` per subnet bucket.
    #[serde(default = "default_count")]
    pub count: u32,

    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Prefix length the client address is masked to before bucketing, for
    /// IPv4 and IPv6 respectively.
    #[serde(default = "default_subnet_key_len_v4")]
    pub subnet_key_len_v4: u8,
    #[serde(default = "default_subnet_key_len_v6")]
    pub subnet_key_len_v6: u8,

    /// Responses larger than this many bytes cost more than one token.
    #[serde(default = "default_response_size_estimate")]
    pub response_size_estimate: u32,

    #[serde(default)]
    pub refuse_any: bool,

    #[serde(default = "default_backoff_count")]
    pub backoff_count: u32,
    #[serde(default = "default_backoff_period_ms")]
    pub backoff_period_ms: u64,
    #[serde(default = "default_backoff_duration_ms")]
    pub backoff_duration_ms: u64,

    /// CIDRs that bypass the bucket and back-off entirely.
    #[serde(default)]
    pub allowlist: Vec<String>,

    /// Maximum simultaneous TCP/TLS/QUIC connections per client subnet.
    #[serde(default = "default_max_connections_per_subnet")]
    pub max_connections_per_subnet: u32,
    /// Maximum simultaneous pipelined queries on one stream connection.
    #[serde(default = "default_max_pipeline_count")]
    pub max_pipeline_count: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            count: default_count(),
            interval_ms: default_interval_ms(),
            subnet_key_len_v4: default_subnet_key_len_v4(),
            subnet_key_len_v6: default_subnet_key_len_v6(),
            response_size_estimate: default_response_size_estimate(),
            refuse_any: false,
            backoff_count: default_backoff_count(),
            backoff_period_ms: default_backoff_period_ms(),
            backoff_duration_ms: default_backoff_duration_ms(),
            allowlist: Vec::new(),
            max_connections_per_subnet: default_max_connections_per_subnet(),
            max_pipeline_count: default_max_pipeline_count(),
        }
    }
}

fn default_count() -> u32 {
    30
}
fn default_interval_ms() -> u64 {
    1000
}
fn default_subnet_key_len_v4() -> u8 {
    24
}
fn default_subnet_key_len_v6() -> u8 {
    56
}
fn default_response_size_estimate() -> u32 {
    512
}
fn default_backoff_count() -> u32 {
    3
}
fn default_backoff_period_ms() -> u64 {
    5_000
}
fn default_backoff_duration_ms() -> u64 {
    30_000
}
fn default_max_connections_per_subnet() -> u32 {
    100
}
fn default_max_pipeline_count() -> u32 {
    64
}
