use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// DNS-server-check interception: magic probe names that resolve to the
/// configured node's own address instead of being forwarded (§4.9 step 6).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerCheckConfig {
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub node_name: String,
    #[serde(default)]
    pub node_location: String,
    #[serde(default = "default_ttl")]
    pub ttl_secs: u32,
    #[serde(default)]
    pub ipv4: Vec<IpAddr>,
    #[serde(default)]
    pub ipv6: Vec<IpAddr>,
}

fn default_ttl() -> u32 {
    60
}
