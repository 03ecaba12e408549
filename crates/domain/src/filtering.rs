//! Filtering-group composition (§3 `FilteringGroup`, §4.5).

use serde::{Deserialize, Serialize};

/// Rule-list IDs and blanket category flags a filtering group is composed
/// from. Rebuilt by filter storage whenever rule lists refresh.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigGroup {
    pub rule_list_ids: Vec<u32>,
    pub parental_control_enabled: bool,
    pub safe_browsing_enabled: bool,
    pub adult_blocking_enabled: bool,
    pub newly_registered_domains_enabled: bool,
    pub safe_search_enabled: bool,
}

/// Per-group behavior flags that do not come from a downloaded rule list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BehaviorFlags {
    pub block_chrome_prefetch: bool,
    pub block_firefox_canary: bool,
    pub block_private_relay: bool,
}

#[derive(Debug, Clone)]
pub struct FilteringGroup {
    pub id: i64,
    pub config: ConfigGroup,
    pub behavior: BehaviorFlags,
}
