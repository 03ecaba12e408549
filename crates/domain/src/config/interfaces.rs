use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// A bind interface that can carry a dedicated-IP-to-profile mapping
/// (§4.2 "dedicated IP identification").
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InterfaceConfig {
    pub name: String,
    pub address: IpAddr,
    #[serde(default)]
    pub dedicated_profile_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InterfacesConfig {
    #[serde(default)]
    pub interfaces: Vec<InterfaceConfig>,
}
