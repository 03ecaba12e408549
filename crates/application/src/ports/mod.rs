pub mod billing;
pub mod cache;
pub mod connection_limiter;
pub mod custom_domain;
pub mod error_collector;
pub mod filter_engine;
pub mod forwarder;
pub mod geoip;
pub mod hash_prefix;
pub mod message_constructor;
pub mod profile_db;
pub mod rate_limiter;
pub mod refresh;

pub use billing::BillingSinkPort;
pub use cache::{CacheEntry, CacheKey, CachePort};
pub use connection_limiter::ConnectionLimiterPort;
pub use custom_domain::{CustomDomainMatch, CustomDomainPort};
pub use error_collector::ErrorCollectorPort;
pub use filter_engine::FilterEnginePort;
pub use forwarder::{ForwardedResponse, ForwarderPort};
pub use geoip::{GeoIpInfo, GeoIpPort};
pub use hash_prefix::{HashFamily, HashPrefixMatcherPort};
pub use message_constructor::{MessageConstructorPort, SdeAnnotation};
pub use profile_db::{ProfileDbPort, ProfileDevice};
pub use rate_limiter::{RateLimitDecision, RateLimiterPort};
pub use refresh::{RefreshContext, Refresher};
