//! Upstream forwarder (§4.6): two priority-ordered pools — primary and
//! fallback — each entry gated by a healthcheck that probes on a timer and
//! backs a server off for `backoff_duration_ms` after a failed probe.
//!
//! Pools are tried in priority order, skipping unhealthy entries within a
//! pool; a transport error tries the next server, a DNS-level error is
//! returned immediately rather than retried against a different upstream.

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use meridian_dns_application::ports::forwarder::{ForwardedResponse, ForwarderPort};
use meridian_dns_application::ports::refresh::{RefreshContext, Refresher};
use meridian_dns_domain::config::{HealthCheckConfig, NetworkType, UpstreamConfig, UpstreamServer};
use meridian_dns_domain::{DnsQuery, DomainError, RecordType};
use tracing::{debug, warn};

use crate::dns::forwarding::{MessageBuilder, ResponseParser};
use crate::dns::transport::{tcp::TcpTransport, udp::UdpTransport, Transport};

struct UpstreamEntry {
    addr: SocketAddr,
    display: Arc<str>,
    timeout: Duration,
    transport: Transport,
    healthy: AtomicBool,
}

impl UpstreamEntry {
    fn from_config(server: &UpstreamServer) -> Result<Self, DomainError> {
        let addr = resolve_addr(&server.address)?;
        let transport = match server.network {
            NetworkType::Udp => Transport::Udp(UdpTransport::new(addr)),
            NetworkType::Tcp => Transport::Tcp(TcpTransport::new(addr)),
            NetworkType::Any => Transport::Udp(UdpTransport::new(addr)),
        };
        Ok(Self {
            addr,
            display: Arc::from(server.address.as_str()),
            timeout: Duration::from_millis(server.timeout_ms),
            transport,
            healthy: AtomicBool::new(true),
        })
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }
}

fn resolve_addr(address: &str) -> Result<SocketAddr, DomainError> {
    SocketAddr::from_str(address)
        .map_err(|e| DomainError::InvalidConfig(format!("invalid upstream address '{address}': {e}")))
}

struct Pool {
    entries: Vec<UpstreamEntry>,
}

/// `ForwarderPort` + `Refresher` adapter driving two upstream pools.
pub struct UpstreamForwarder {
    primary: Pool,
    fallback: Pool,
    handle_timeout: Duration,
    health_check: HealthCheckConfig,
}

impl UpstreamForwarder {
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, DomainError> {
        let primary = Pool {
            entries: config
                .servers
                .iter()
                .map(UpstreamEntry::from_config)
                .collect::<Result<_, _>>()?,
        };
        let fallback = Pool {
            entries: config
                .fallback
                .iter()
                .map(UpstreamEntry::from_config)
                .collect::<Result<_, _>>()?,
        };
        if primary.entries.is_empty() {
            return Err(DomainError::InvalidConfig(
                "upstream config must list at least one primary server".into(),
            ));
        }
        Ok(Self {
            primary,
            fallback,
            handle_timeout: Duration::from_millis(config.handle_timeout_ms),
            health_check: config.health_check.clone(),
        })
    }

    async fn query_pool(
        &self,
        pool: &Pool,
        query_bytes: &[u8],
        record_type: RecordType,
    ) -> Option<Result<ForwardedResponse, DomainError>> {
        for entry in &pool.entries {
            if self.health_check.enabled && !entry.is_healthy() {
                continue;
            }
            match entry.transport.send(query_bytes, entry.timeout).await {
                Ok(resp) => {
                    let parsed = match ResponseParser::parse(&resp.bytes) {
                        Ok(p) => p,
                        Err(e) => return Some(Err(e)),
                    };
                    if parsed.truncated && matches!(entry.transport, Transport::Udp(_)) {
                        debug!(server = %entry.display, "UDP response truncated, retrying not implemented for this leg");
                    }
                    let _ = record_type;
                    return Some(Ok(ForwardedResponse {
                        wire_data: Bytes::copy_from_slice(&resp.bytes),
                        min_ttl: parsed.min_ttl,
                        negative_soa_ttl: parsed.negative_soa_ttl,
                        upstream_server: Some(Arc::clone(&entry.display)),
                    }));
                }
                Err(err) => {
                    if ResponseParser::is_transport_error(&err) {
                        warn!(server = %entry.display, error = %err, "upstream unreachable, trying next");
                        continue;
                    }
                    return Some(Err(err));
                }
            }
        }
        None
    }

    async fn probe_entry(&self, entry: &UpstreamEntry) -> bool {
        let probe_domain = self
            .health_check
            .probe_domain_template
            .replace("{ts}", &format!("{}", fastrand::u64(..)));
        let Ok(query_bytes) = MessageBuilder::build_query(&probe_domain, RecordType::A) else {
            return false;
        };
        let timeout = Duration::from_millis(self.health_check.init_duration_ms.max(1));
        entry.transport.send(&query_bytes, timeout).await.is_ok()
    }
}

#[async_trait]
impl ForwarderPort for UpstreamForwarder {
    async fn forward(&self, query: &DnsQuery) -> Result<ForwardedResponse, DomainError> {
        let domain = query.canonical_name();
        let query_bytes = MessageBuilder::build_query(&domain, query.record_type)?;

        let run = async {
            if let Some(result) = self
                .query_pool(&self.primary, &query_bytes, query.record_type)
                .await
            {
                return result;
            }
            if let Some(result) = self
                .query_pool(&self.fallback, &query_bytes, query.record_type)
                .await
            {
                return result;
            }
            Err(DomainError::NoHealthyUpstream)
        };

        tokio::time::timeout(self.handle_timeout, run)
            .await
            .unwrap_or(Err(DomainError::HandleTimeout))
    }
}

#[async_trait]
impl Refresher for UpstreamForwarder {
    /// Probe every configured upstream and flip its health bit. A failed
    /// probe backs a server off until the next tick; the scheduler decides
    /// the tick cadence from `health_check.probe_interval_ms`.
    async fn refresh(&self, ctx: &RefreshContext) -> Result<(), DomainError> {
        if !self.health_check.enabled {
            return Ok(());
        }
        for entry in self.primary.entries.iter().chain(self.fallback.entries.iter()) {
            if ctx.is_expired() {
                return Err(DomainError::HandleTimeout);
            }
            let healthy = self.probe_entry(entry).await;
            if entry.healthy.swap(healthy, Ordering::Relaxed) != healthy {
                debug!(server = %entry.display, healthy, "upstream health changed");
            }
        }
        Ok(())
    }
}
