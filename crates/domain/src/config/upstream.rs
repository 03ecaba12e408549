use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Udp,
    Tcp,
    Any,
}

impl Default for NetworkType {
    fn default() -> Self {
        NetworkType::Any
    }
}

/// One upstream DNS server (§4.6).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamServer {
    pub address: String,
    #[serde(default)]
    pub network: NetworkType,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Healthcheck policy for the upstream forwarder (§4.6).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthCheckConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_probe_domain_template")]
    pub probe_domain_template: String,
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,
    #[serde(default = "default_backoff_duration_ms")]
    pub backoff_duration_ms: u64,
    #[serde(default = "default_init_duration_ms")]
    pub init_duration_ms: u64,
    #[serde(default)]
    pub probe_network: Option<NetworkType>,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probe_domain_template: default_probe_domain_template(),
            probe_interval_ms: default_probe_interval_ms(),
            backoff_duration_ms: default_backoff_duration_ms(),
            init_duration_ms: default_init_duration_ms(),
            probe_network: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    pub servers: Vec<UpstreamServer>,
    #[serde(default)]
    pub fallback: Vec<UpstreamServer>,
    #[serde(default)]
    pub health_check: HealthCheckConfig,
    #[serde(default = "default_handle_timeout_ms")]
    pub handle_timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    2_000
}
fn default_true() -> bool {
    true
}
fn default_probe_domain_template() -> String {
    "{ts}.probe.healthcheck.invalid".to_string()
}
fn default_probe_interval_ms() -> u64 {
    10_000
}
fn default_backoff_duration_ms() -> u64 {
    30_000
}
fn default_init_duration_ms() -> u64 {
    2_000
}
fn default_handle_timeout_ms() -> u64 {
    5_000
}
