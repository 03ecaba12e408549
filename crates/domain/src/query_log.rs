use crate::dns_record::RecordType;
use crate::ids::{DeviceId, ProfileId};
use std::net::IpAddr;
use std::sync::Arc;

/// A single query's billing-relevant signal, produced by pipeline step 10
/// and queued for the billing uploader (§4.11).
#[derive(Debug, Clone)]
pub struct BillingToken {
    pub profile_id: ProfileId,
    pub device_id: DeviceId,
    pub timestamp_unix: u64,
    /// Coarse response-size bucket, cheaper to batch/aggregate than the
    /// exact byte count.
    pub size_class: ResponseSizeClass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSizeClass {
    Small,
    Medium,
    Large,
}

impl ResponseSizeClass {
    pub fn from_bytes(len: usize) -> Self {
        match len {
            0..=128 => ResponseSizeClass::Small,
            129..=1024 => ResponseSizeClass::Medium,
            _ => ResponseSizeClass::Large,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryLog {
    pub domain: Arc<str>,
    pub record_type: RecordType,
    pub client_ip: IpAddr,
    pub profile_id: Option<ProfileId>,
    pub device_id: Option<DeviceId>,
    pub blocked: bool,
    pub matched_rule_list_id: Option<u32>,
    pub response_time_ms: u64,
    pub cache_hit: bool,
    pub upstream_server: Option<String>,
    pub response_status: &'static str,
    pub timestamp_unix: u64,
}

#[derive(Debug, Clone, Default)]
pub struct QueryStats {
    pub queries_total: u64,
    pub queries_blocked: u64,
    pub cache_hit_rate: f64,
    pub avg_query_time_ms: f64,
    pub queries_by_type: std::collections::HashMap<RecordType, u64>,
}

impl QueryStats {
    pub fn type_count(&self, record_type: RecordType) -> u64 {
        *self.queries_by_type.get(&record_type).unwrap_or(&0)
    }
}
