use serde::{Deserialize, Serialize};

/// One tenant-owned domain (or wildcard suffix) and the profiles permitted
/// to resolve under it (§4.3 step 8, optional channel).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CustomDomainEntry {
    pub suffix: String,
    pub allowed_profile_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CustomDomainConfig {
    #[serde(default)]
    pub entries: Vec<CustomDomainEntry>,
}
