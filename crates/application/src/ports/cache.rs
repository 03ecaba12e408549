use bytes::Bytes;
use meridian_dns_domain::DnsQuery;
use std::net::IpAddr;
use std::time::SystemTime;

/// The cache key (§3 `CacheEntry`): question plus, in ECS mode, the client
/// subnet the answer was personalized for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub qname: Box<str>,
    pub qtype: u16,
    pub qclass: u16,
    pub client_subnet: Option<IpAddr>,
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub wire_data: Bytes,
    pub valid_until: SystemTime,
}

/// Application-layer port for the DNS answer cache (§4.7).
///
/// Synchronous and lock-light: implementations back this with an in-memory
/// LRU, so both methods are hot-path-safe.
pub trait CachePort: Send + Sync {
    fn key_for(&self, query: &DnsQuery, client_subnet: Option<IpAddr>) -> CacheKey;

    /// `None` on miss or when the stored entry is past `valid_until`.
    fn get(&self, key: &CacheKey) -> Option<CacheEntry>;

    fn put(&self, key: CacheKey, entry: CacheEntry);
}
