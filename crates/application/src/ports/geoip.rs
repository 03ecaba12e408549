use async_trait::async_trait;
use meridian_dns_domain::DomainError;
use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct GeoIpInfo {
    pub country_iso_code: Option<String>,
    pub asn: Option<u32>,
    pub asn_org: Option<String>,
}

/// Application-layer port for GeoIP lookups (§2 "GeoIP resolver"),
/// backed by memory-mapped databases refreshed periodically.
#[async_trait]
pub trait GeoIpPort: Send + Sync {
    fn lookup_ip(&self, ip: IpAddr) -> Option<GeoIpInfo>;

    /// Hostname → subnet lookup used by upstream/healthcheck selection that
    /// needs to reason about an upstream's network location.
    fn lookup_hostname_subnet(&self, hostname: &str) -> Option<ipnetwork::IpNetwork>;

    /// Re-open the memory-mapped databases from their configured paths.
    async fn reload(&self) -> Result<(), DomainError>;
}
