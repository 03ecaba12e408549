use serde::{Deserialize, Serialize};

/// Which safe-browsing family a downloaded hostname list feeds (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HashPrefixFamily {
    AdultContent,
    GeneralDangerous,
    NewlyRegistered,
}

/// One downloadable plaintext-hostname list whose SHA-256 hashes are
/// compiled into `family`'s prefix storage.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HashPrefixSource {
    pub family: HashPrefixFamily,
    pub url: String,
}

/// Hash-prefix safe-browsing storage sources and refresh cadence (§4.5).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HashPrefixConfig {
    #[serde(default)]
    pub sources: Vec<HashPrefixSource>,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_refresh_timeout_secs")]
    pub refresh_timeout_secs: u64,
    #[serde(default = "default_max_download_size_bytes")]
    pub max_download_size_bytes: u64,
}

impl Default for HashPrefixConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            refresh_interval_secs: default_refresh_interval_secs(),
            refresh_timeout_secs: default_refresh_timeout_secs(),
            max_download_size_bytes: default_max_download_size_bytes(),
        }
    }
}

fn default_refresh_interval_secs() -> u64 {
    6 * 3_600
}
fn default_refresh_timeout_secs() -> u64 {
    60
}
fn default_max_download_size_bytes() -> u64 {
    32 * 1024 * 1024
}
