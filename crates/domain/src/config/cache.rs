use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    Simple,
    Ecs,
}

impl Default for CacheMode {
    fn default() -> Self {
        CacheMode::Simple
    }
}

/// DNS answer cache configuration (§4.7).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub mode: CacheMode,
    #[serde(default = "default_size")]
    pub size: usize,
    #[serde(default = "default_ecs_size")]
    pub ecs_size: usize,
    #[serde(default = "default_min_ttl")]
    pub min_ttl_secs: u32,
    #[serde(default = "default_max_ttl")]
    pub max_ttl_secs: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: CacheMode::default(),
            size: default_size(),
            ecs_size: default_ecs_size(),
            min_ttl_secs: default_min_ttl(),
            max_ttl_secs: default_max_ttl(),
        }
    }
}

fn default_size() -> usize {
    1_000_000
}
fn default_ecs_size() -> usize {
    4_000_000
}
fn default_min_ttl() -> u32 {
    10
}
fn default_max_ttl() -> u32 {
    86_400
}
