use async_trait::async_trait;
use bytes::Bytes;
use meridian_dns_domain::{DnsQuery, DomainError};
use std::sync::Arc;

/// Result of a successful upstream forward (§4.6).
#[derive(Debug, Clone)]
pub struct ForwardedResponse {
    /// Complete wire bytes of the upstream response, opaque to callers
    /// above the message constructor.
    pub wire_data: Bytes,
    pub min_ttl: Option<u32>,
    pub negative_soa_ttl: Option<u32>,
    pub upstream_server: Option<Arc<str>>,
}

/// Application-layer port for the upstream forwarder (§4.6).
#[async_trait]
pub trait ForwarderPort: Send + Sync {
    /// Forward `query`, honoring per-upstream timeouts and healthcheck-driven
    /// failover to the fallback pool. Returns `DomainError::NoHealthyUpstream`
    /// when every primary and fallback upstream is currently excluded.
    async fn forward(&self, query: &DnsQuery) -> Result<ForwardedResponse, DomainError>;
}
