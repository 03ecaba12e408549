use std::fs;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use super::access::AccessConfig;
use super::backend::BackendConfig;
use super::cache::CacheConfig;
use super::custom_domain::CustomDomainConfig;
use super::dns::DnsTimeoutsConfig;
use super::errors::ConfigError;
use super::filtering_groups::FilteringGroupsConfig;
use super::filters::FiltersConfig;
use super::geoip::GeoIpConfig;
use super::hash_prefix::HashPrefixConfig;
use super::interfaces::InterfacesConfig;
use super::logging::LoggingConfig;
use super::query_log::QueryLogConfig;
use super::ratelimit::RateLimitConfig;
use super::server_check::ServerCheckConfig;
use super::server_groups::ServerGroupsConfig;
use super::snapshot::SnapshotConfig;
use super::upstream::UpstreamConfig;
use super::web_service::WebServiceConfig;

/// CLI-supplied overrides layered over the file-loaded configuration.
/// Fields left `None` leave the file value (or its default) untouched.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind_address: Option<IpAddr>,
    pub log_level: Option<String>,
    pub snapshot_path: Option<String>,
    pub backend_endpoint: Option<String>,
}

/// The full resolver configuration tree, assembled from a TOML file and
/// then layered with CLI overrides.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server_groups: ServerGroupsConfig,
    #[serde(default)]
    pub filtering_groups: FilteringGroupsConfig,
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub dns: DnsTimeoutsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub filters: FiltersConfig,
    #[serde(default)]
    pub interfaces: InterfacesConfig,
    #[serde(default)]
    pub access: AccessConfig,
    #[serde(default)]
    pub geoip: GeoIpConfig,
    #[serde(default)]
    pub hash_prefix: HashPrefixConfig,
    #[serde(default)]
    pub custom_domain: CustomDomainConfig,
    pub backend: BackendConfig,
    #[serde(default)]
    pub query_log: QueryLogConfig,
    #[serde(default)]
    pub web_service: WebServiceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub server_check: ServerCheckConfig,
}

impl Config {
    /// Load the config file at `path` (or the default `config.toml` in the
    /// current directory when `path` is `None`) and apply `overrides`.
    pub fn load(path: Option<&str>, overrides: CliOverrides) -> Result<Self, ConfigError> {
        let path = path.unwrap_or("config.toml");
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        let mut config: Config =
            toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_string(),
                source,
            })?;
        config.apply_overrides(overrides);
        Ok(config)
    }

    fn apply_overrides(&mut self, overrides: CliOverrides) {
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(path) = overrides.snapshot_path {
            self.snapshot.path = path;
        }
        if let Some(endpoint) = overrides.backend_endpoint {
            self.backend.endpoint = endpoint;
        }
        if let Some(bind) = overrides.bind_address {
            for group in &mut self.server_groups.groups {
                for server in &mut group.servers {
                    if server.bind_address.is_some() {
                        server.bind_address = Some(bind.to_string());
                    }
                }
            }
        }
    }

    /// Cross-field validation that `serde` defaults alone can't express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream.servers.is_empty() {
            return Err(ConfigError::Validation(
                "upstream.servers must not be empty".to_string(),
            ));
        }
        if self.backend.endpoint.is_empty() {
            return Err(ConfigError::Validation(
                "backend.endpoint must not be empty".to_string(),
            ));
        }
        for group in &self.server_groups.groups {
            if group.servers.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "server group '{}' has no servers",
                    group.name
                )));
            }
        }
        if self.cache.min_ttl_secs > self.cache.max_ttl_secs {
            return Err(ConfigError::Validation(
                "cache.min_ttl_secs must not exceed cache.max_ttl_secs".to_string(),
            ));
        }
        Ok(())
    }
}
