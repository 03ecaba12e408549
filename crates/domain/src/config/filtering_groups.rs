use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// A single literal rewrite rule, applied before blocklists (§4.5 order:
/// allow > rewrite > blocklists > safe-search > hash-prefix).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RewriteRuleConfig {
    /// Exact domain or `*.domain` wildcard.
    pub pattern: String,
    #[serde(flatten)]
    pub target: RewriteTargetConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteTargetConfig {
    Ip(Vec<IpAddr>),
    Cname(String),
}

/// A named, reusable bundle of rule lists plus behavior toggles that
/// profiles and server groups reference by id (§4.5).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilteringGroupConfig {
    pub id: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub rule_list_ids: Vec<String>,
    #[serde(default)]
    pub rewrite_rules: Vec<RewriteRuleConfig>,
    #[serde(default)]
    pub parental_control_enabled: bool,
    #[serde(default)]
    pub safe_browsing_enabled: bool,
    #[serde(default)]
    pub adult_content_blocked: bool,
    #[serde(default)]
    pub newly_registered_domains_enabled: bool,
    #[serde(default)]
    pub safe_search_enabled: bool,
    #[serde(default)]
    pub block_chrome_prefetch: bool,
    #[serde(default)]
    pub block_firefox_canary: bool,
    #[serde(default)]
    pub block_private_relay: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FilteringGroupsConfig {
    #[serde(default)]
    pub groups: Vec<FilteringGroupConfig>,
}
