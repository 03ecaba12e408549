use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerProtocol {
    Plain,
    Dot,
    Doh,
    Doq,
    DnsCrypt,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    pub cert_path: String,
    pub key_path: String,
    #[serde(default = "default_session_ticket_rotation_secs")]
    pub session_ticket_rotation_secs: u64,
}

/// One listener within a server group. Either `bind_address` (a fixed
/// `ip:port`) or `bind_interface` + `bind_subnet` must be set; the latter
/// enables dedicated-IP lookup on that listener (§4.3 step 6).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub name: String,
    pub protocol: ServerProtocol,
    #[serde(default)]
    pub bind_address: Option<String>,
    #[serde(default)]
    pub bind_interface: Option<String>,
    #[serde(default)]
    pub bind_subnet: Option<String>,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
    #[serde(default = "default_handle_timeout_ms")]
    pub handle_timeout_ms: u64,
    #[serde(default = "default_true")]
    pub linked_ip_enabled: bool,
    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DdrConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub tenant_domains: Vec<String>,
}

/// A named deployment unit: a set of listeners sharing a DDR identity, a
/// filtering group, and a default device-auth policy (§4.9).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerGroupConfig {
    pub name: String,
    #[serde(default)]
    pub servers: Vec<ServerConfig>,
    #[serde(default)]
    pub ddr: DdrConfig,
    pub filtering_group_id: String,
    #[serde(default = "default_true")]
    pub profiles_enabled: bool,
    #[serde(default)]
    pub device_domains: Vec<String>,
    /// Whether devices auto-created from an unrecognized linked IP start out
    /// authenticated. Defaults to false: unauthenticated until the profile
    /// owner claims the device explicitly.
    #[serde(default)]
    pub auto_device_auth_enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerGroupsConfig {
    #[serde(default)]
    pub groups: Vec<ServerGroupConfig>,
}

fn default_true() -> bool {
    true
}
fn default_read_timeout_ms() -> u64 {
    2_000
}
fn default_write_timeout_ms() -> u64 {
    2_000
}
fn default_handle_timeout_ms() -> u64 {
    5_000
}
fn default_session_ticket_rotation_secs() -> u64 {
    3_600
}
