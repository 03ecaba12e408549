use serde::{Deserialize, Serialize};

/// Whether a downloaded rule list's entries block domains or allow them
/// through the rest of the group's blocklists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleListKind {
    Block,
    Allow,
}

/// One downloadable rule list, referenced by id from
/// `FilteringGroupConfig::rule_list_ids`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleListSource {
    pub id: String,
    pub url: String,
    #[serde(default = "default_rule_list_kind")]
    pub kind: RuleListKind,
}

fn default_rule_list_kind() -> RuleListKind {
    RuleListKind::Block
}

/// Filter storage tuning — rule-list cache sizes, refresh cadence, EDE/SDE
/// flags (§4.5, §4.8, §6).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FiltersConfig {
    /// Registry of fetchable rule lists, keyed by the ids filtering groups
    /// reference. A manual, always-on blocklist/allowlist pair may also be
    /// given literal `domains` instead of a `url`.
    #[serde(default)]
    pub rule_lists: Vec<RuleListSource>,
    #[serde(default = "default_custom_rules_cache_size")]
    pub custom_rules_cache_size: usize,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_refresh_timeout_secs")]
    pub refresh_timeout_secs: u64,
    #[serde(default = "default_max_download_size_bytes")]
    pub max_download_size_bytes: u64,
    #[serde(default = "default_true")]
    pub extended_dns_errors_enabled: bool,
    #[serde(default)]
    pub structured_dns_errors_enabled: bool,
    #[serde(default)]
    pub sde_contact: Option<String>,
    #[serde(default)]
    pub sde_justification_template: Option<String>,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            rule_lists: Vec::new(),
            custom_rules_cache_size: default_custom_rules_cache_size(),
            refresh_interval_secs: default_refresh_interval_secs(),
            refresh_timeout_secs: default_refresh_timeout_secs(),
            max_download_size_bytes: default_max_download_size_bytes(),
            extended_dns_errors_enabled: true,
            structured_dns_errors_enabled: false,
            sde_contact: None,
            sde_justification_template: None,
        }
    }
}

fn default_custom_rules_cache_size() -> usize {
    1_000
}
fn default_refresh_interval_secs() -> u64 {
    3_600
}
fn default_refresh_timeout_secs() -> u64 {
    60
}
fn default_max_download_size_bytes() -> u64 {
    64 * 1024 * 1024
}
fn default_true() -> bool {
    true
}
