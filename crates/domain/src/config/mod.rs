//! Configuration module for the resolver
//!
//! This module contains all configuration structures organized by domain:
//! - `root`: the aggregate `Config` and `CliOverrides`
//! - `server_groups`: listener groups, protocols, DDR, device-auth policy
//! - `filtering_groups`: named rule-list + behavior bundles
//! - `upstream`: upstream server pools and health checks
//! - `dns`: protocol-level timeouts and size limits
//! - `cache`: answer cache sizing and TTL clamps
//! - `ratelimit`: token-bucket and back-off tuning
//! - `filters`: rule-list cache sizing, refresh cadence, EDE/SDE flags
//! - `interfaces`: bind interfaces used for dedicated-IP lookup
//! - `access`: global allow/block lists and the rate-limit allowlist
//! - `geoip`: memory-mapped GeoIP database locations
//! - `backend`: the opaque profile-backend RPC endpoint
//! - `query_log`: query-log retention and billing-upload cadence
//! - `web_service`: the DoH listener's inner HTTP surface
//! - `logging`: logging settings
//! - `snapshot`: local profile-DB snapshot path and sync tuning
//! - `server_check`: DNS-server-check probe domains
//! - `errors`: configuration errors

pub mod access;
pub mod backend;
pub mod cache;
pub mod custom_domain;
pub mod dns;
pub mod errors;
pub mod filtering_groups;
pub mod filters;
pub mod geoip;
pub mod hash_prefix;
pub mod interfaces;
pub mod logging;
pub mod query_log;
pub mod ratelimit;
pub mod root;
pub mod server_check;
pub mod server_groups;
pub mod snapshot;
pub mod upstream;
pub mod web_service;

pub use access::AccessConfig;
pub use backend::BackendConfig;
pub use cache::{CacheConfig, CacheMode};
pub use custom_domain::{CustomDomainConfig, CustomDomainEntry};
pub use dns::DnsTimeoutsConfig;
pub use errors::ConfigError;
pub use filtering_groups::{
    FilteringGroupConfig, FilteringGroupsConfig, RewriteRuleConfig, RewriteTargetConfig,
};
pub use filters::{FiltersConfig, RuleListKind, RuleListSource};
pub use geoip::GeoIpConfig;
pub use hash_prefix::{HashPrefixConfig, HashPrefixFamily, HashPrefixSource};
pub use interfaces::{InterfaceConfig, InterfacesConfig};
pub use logging::LoggingConfig;
pub use query_log::QueryLogConfig;
pub use ratelimit::RateLimitConfig;
pub use root::{CliOverrides, Config};
pub use server_check::ServerCheckConfig;
pub use server_groups::{
    DdrConfig, ServerConfig, ServerGroupConfig, ServerGroupsConfig, ServerProtocol, TlsConfig,
};
pub use snapshot::SnapshotConfig;
pub use upstream::{HealthCheckConfig, NetworkType, UpstreamConfig, UpstreamServer};
pub use web_service::WebServiceConfig;
