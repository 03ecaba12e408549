//! Domain layer: pure types and configuration for the multi-tenant
//! resolver. No I/O, no async — everything here is data and the rules
//! that govern it.

pub mod config;
pub mod device_result;
pub mod dns_query;
pub mod dns_record;
pub mod errors;
pub mod filter_verdict;
pub mod filtering;
pub mod ids;
pub mod profile;
pub mod query_log;
pub mod request;
pub mod server_group;
pub mod validators;

pub use config::{CliOverrides, Config, ConfigError};
pub use device_result::DeviceResult;
pub use dns_query::DnsQuery;
pub use dns_record::RecordType;
pub use errors::{AuthFailureCause, DeviceLookupCause, DomainError};
pub use filter_verdict::{FilterVerdict, MatchedRule, RewriteTarget};
pub use filtering::{BehaviorFlags, ConfigGroup, FilteringGroup};
pub use ids::{DeviceId, HumanId, HumanIdLower, ProfileId};
pub use profile::{AuthSettings, BlockingMode, Device, PasswordVerifier, Profile};
pub use query_log::{BillingToken, QueryLog, QueryStats, ResponseSizeClass};
pub use request::{RequestInfo, TransportMetadata, UserInfo};
pub use server_group::{BindData, Protocol, Server, ServerGroup};
