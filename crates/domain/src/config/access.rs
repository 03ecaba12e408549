use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

/// Global allow/block lists applied before profile resolution, and the
/// rate-limit allowlist (§4.4, §4.9).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AccessConfig {
    #[serde(default)]
    pub allowed_nets: Vec<IpNetwork>,
    #[serde(default)]
    pub blocked_nets: Vec<IpNetwork>,
    #[serde(default)]
    pub blocked_domains: Vec<String>,
    #[serde(default)]
    pub rate_limit_allowlist: Vec<IpNetwork>,
}
