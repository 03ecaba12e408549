use serde::{Deserialize, Serialize};

/// Memory-mapped GeoIP database locations and refresh cadence (§4.3, §6).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeoIpConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub country_db_path: Option<String>,
    #[serde(default)]
    pub asn_db_path: Option<String>,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl Default for GeoIpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            country_db_path: None,
            asn_db_path: None,
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

fn default_refresh_interval_secs() -> u64 {
    86_400
}
