use serde::{Deserialize, Serialize};

/// The DoH listener's inner HTTP surface: paths, max body size (§4.9 DoH).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebServiceConfig {
    #[serde(default = "default_dns_query_path")]
    pub dns_query_path: String,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    #[serde(default)]
    pub ddr_svcb_path: Option<String>,
}

impl Default for WebServiceConfig {
    fn default() -> Self {
        Self {
            dns_query_path: default_dns_query_path(),
            max_body_bytes: default_max_body_bytes(),
            ddr_svcb_path: None,
        }
    }
}

fn default_dns_query_path() -> String {
    "/dns-query".to_string()
}
fn default_max_body_bytes() -> usize {
    65_535
}
