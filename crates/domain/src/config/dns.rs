use serde::{Deserialize, Serialize};

/// DNS protocol-level timeouts and size limits (§6 "DNS timeouts & UDP max
/// size").
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnsTimeoutsConfig {
    #[serde(default = "default_udp_max_size")]
    pub udp_max_response_size: u16,
    #[serde(default = "default_tcp_idle_ms")]
    pub tcp_idle_ms: u64,
    #[serde(default = "default_read_ms")]
    pub read_ms: u64,
    #[serde(default = "default_write_ms")]
    pub write_ms: u64,
    #[serde(default = "default_handle_ms")]
    pub handle_ms: u64,
}

impl Default for DnsTimeoutsConfig {
    fn default() -> Self {
        Self {
            udp_max_response_size: default_udp_max_size(),
            tcp_idle_ms: default_tcp_idle_ms(),
            read_ms: default_read_ms(),
            write_ms: default_write_ms(),
            handle_ms: default_handle_ms(),
        }
    }
}

fn default_udp_max_size() -> u16 {
    4096
}
fn default_tcp_idle_ms() -> u64 {
    30_000
}
fn default_read_ms() -> u64 {
    2_000
}
fn default_write_ms() -> u64 {
    2_000
}
fn default_handle_ms() -> u64 {
    5_000
}
