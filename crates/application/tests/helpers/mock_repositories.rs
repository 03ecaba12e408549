#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use meridian_dns_application::{
    CacheEntry, CacheKey, CachePort, ConnectionLimiterPort, ErrorCollectorPort, FilterEnginePort,
    ForwardedResponse, ForwarderPort, MessageConstructorPort, ProfileDbPort, ProfileDevice,
    RateLimitDecision, RateLimiterPort, SdeAnnotation,
};
use meridian_dns_domain::{
    Device, DeviceId, DnsQuery, DomainError, FilterVerdict, HumanIdLower, MatchedRule, Profile,
    ProfileId, RewriteTarget, Server,
};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

/// In-memory `ProfileDbPort`, keyed by device id only — enough for pipeline
/// and device-finder integration tests without a real backend sync.
#[derive(Clone, Default)]
pub struct MockProfileDb {
    by_device: Arc<Mutex<HashMap<DeviceId, ProfileDevice>>>,
    by_linked_ip: Arc<Mutex<HashMap<IpAddr, ProfileDevice>>>,
    by_dedicated_ip: Arc<Mutex<HashMap<IpAddr, ProfileDevice>>>,
}

impl MockProfileDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, profile: Profile, device: Device) {
        self.by_device
            .lock()
            .unwrap()
            .insert(device.id.clone(), ProfileDevice { profile, device });
    }

    pub fn insert_linked_ip(&self, ip: IpAddr, profile: Profile, device: Device) {
        self.by_linked_ip
            .lock()
            .unwrap()
            .insert(ip, ProfileDevice { profile, device });
    }

    pub fn insert_dedicated_ip(&self, ip: IpAddr, profile: Profile, device: Device) {
        self.by_dedicated_ip
            .lock()
            .unwrap()
            .insert(ip, ProfileDevice { profile, device });
    }
}

impl ProfileDbPort for MockProfileDb {
    fn lookup_by_device_id(&self, device_id: &DeviceId) -> Result<ProfileDevice, DomainError> {
        self.by_device
            .lock()
            .unwrap()
            .get(device_id)
            .cloned()
            .ok_or(DomainError::DeviceNotFound)
    }

    fn lookup_by_human_id(
        &self,
        _profile_id: &ProfileId,
        _human_id: &HumanIdLower,
    ) -> Result<ProfileDevice, DomainError> {
        Err(DomainError::DeviceNotFound)
    }

    fn lookup_by_linked_ip(&self, ip: IpAddr) -> Result<ProfileDevice, DomainError> {
        self.by_linked_ip
            .lock()
            .unwrap()
            .get(&ip)
            .cloned()
            .ok_or(DomainError::ProfileNotFound)
    }

    fn lookup_by_dedicated_ip(&self, ip: IpAddr) -> Result<ProfileDevice, DomainError> {
        self.by_dedicated_ip
            .lock()
            .unwrap()
            .get(&ip)
            .cloned()
            .ok_or(DomainError::UnknownDedicated)
    }

    fn auto_create_device(
        &self,
        _profile_id: &ProfileId,
        _human_id: &HumanIdLower,
        _auto_auth_enabled: bool,
    ) -> Result<ProfileDevice, DomainError> {
        Err(DomainError::DeviceNotFound)
    }
}

/// Scripted `ForwarderPort`: returns a fixed answer for a given canonical
/// qname, or `NoHealthyUpstream` when unset.
#[derive(Clone, Default)]
pub struct MockForwarder {
    responses: Arc<Mutex<HashMap<String, ForwardedResponse>>>,
}

impl MockForwarder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_response(&self, qname: &str, response: ForwardedResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(qname.to_string(), response);
    }
}

#[async_trait]
impl ForwarderPort for MockForwarder {
    async fn forward(&self, query: &DnsQuery) -> Result<ForwardedResponse, DomainError> {
        self.responses
            .lock()
            .unwrap()
            .get(&query.canonical_name())
            .cloned()
            .ok_or(DomainError::NoHealthyUpstream)
    }
}

/// In-memory `CachePort` with no TTL partitioning by record type — enough
/// for pipeline cache-hit/miss assertions.
#[derive(Clone, Default)]
pub struct MockCache {
    entries: Arc<Mutex<HashMap<CacheKey, CacheEntry>>>,
}

impl MockCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CachePort for MockCache {
    fn key_for(&self, query: &DnsQuery, client_subnet: Option<IpAddr>) -> CacheKey {
        CacheKey {
            qname: query.canonical_name().into_boxed_str(),
            qtype: query.record_type as u16,
            qclass: query.class,
            client_subnet,
        }
    }

    fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn put(&self, key: CacheKey, entry: CacheEntry) {
        self.entries.lock().unwrap().insert(key, entry);
    }
}

/// `RateLimiterPort` that always allows, for tests that don't exercise
/// rate-limiting directly.
#[derive(Clone, Default)]
pub struct AllowAllRateLimiter;

impl RateLimiterPort for AllowAllRateLimiter {
    fn check(&self, _addr: IpAddr, _cost: u32) -> RateLimitDecision {
        RateLimitDecision::Allow
    }

    fn is_allowlisted(&self, _addr: IpAddr) -> bool {
        true
    }

    fn reload_allowlist(&self, _entries: Vec<ipnetwork::IpNetwork>) {}
}

/// `ConnectionLimiterPort` that never refuses.
#[derive(Clone, Default)]
pub struct AllowAllConnectionLimiter;

impl ConnectionLimiterPort for AllowAllConnectionLimiter {
    fn try_acquire(&self, _addr: IpAddr) -> bool {
        true
    }

    fn release(&self, _addr: IpAddr) {}
}

/// `FilterEnginePort` returning a single scripted verdict regardless of
/// input, for pipeline tests that drive the filter stage directly.
#[derive(Clone)]
pub struct ScriptedFilterEngine {
    verdict: Arc<Mutex<FilterVerdict>>,
}

impl ScriptedFilterEngine {
    pub fn new(verdict: FilterVerdict) -> Self {
        Self {
            verdict: Arc::new(Mutex::new(verdict)),
        }
    }

    pub fn set_verdict(&self, verdict: FilterVerdict) {
        *self.verdict.lock().unwrap() = verdict;
    }
}

#[async_trait]
impl FilterEnginePort for ScriptedFilterEngine {
    fn evaluate(&self, _query: &DnsQuery, _profile: &Profile) -> FilterVerdict {
        self.verdict.lock().unwrap().clone()
    }

    async fn reload(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

/// `ErrorCollectorPort` that records reported errors for assertions.
#[derive(Clone, Default)]
pub struct RecordingErrorCollector {
    reports: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<(String, String)> {
        self.reports.lock().unwrap().clone()
    }
}

impl ErrorCollectorPort for RecordingErrorCollector {
    fn report(&self, source: &str, err: &DomainError) {
        self.reports
            .lock()
            .unwrap()
            .push((source.to_string(), err.to_string()));
    }
}

/// Minimal `MessageConstructorPort`: synthesizes placeholder wire bytes that
/// encode just enough of the outcome for tests to assert on (a real
/// implementation produces actual DNS wire format via hickory-proto).
#[derive(Clone, Default)]
pub struct StubMessageConstructor;

impl MessageConstructorPort for StubMessageConstructor {
    fn build_block_response(
        &self,
        query: &DnsQuery,
        _profile: &Profile,
        rule: &MatchedRule,
        _ede_enabled: bool,
        _sde: Option<&SdeAnnotation>,
    ) -> Bytes {
        Bytes::from(format!("BLOCK:{}:{}", query.canonical_name(), rule.list_id))
    }

    fn build_rewrite_response(&self, query: &DnsQuery, target: &RewriteTarget) -> Bytes {
        match target {
            RewriteTarget::Ip(ips) => {
                Bytes::from(format!("REWRITE:{}:{:?}", query.canonical_name(), ips))
            }
            RewriteTarget::Cname(name) => {
                Bytes::from(format!("REWRITE:{}:{}", query.canonical_name(), name))
            }
        }
    }

    fn build_refused(&self, query: &DnsQuery) -> Bytes {
        Bytes::from(format!("REFUSED:{}", query.canonical_name()))
    }

    fn build_servfail(&self, query: &DnsQuery) -> Bytes {
        Bytes::from(format!("SERVFAIL:{}", query.canonical_name()))
    }

    fn build_ddr_response(&self, query: &DnsQuery, servers: &[Server]) -> Bytes {
        Bytes::from(format!("DDR:{}:{}", query.canonical_name(), servers.len()))
    }

    fn build_server_check_response(&self, query: &DnsQuery, node_name: &str) -> Bytes {
        Bytes::from(format!("CHECK:{}:{}", query.canonical_name(), node_name))
    }
}
