//! The master per-query request pipeline (§4.9). Every DNS server transport
//! (plain, DoT, DoH, DoQ, DNSCrypt) decodes its framing into a `RequestInfo`
//! and calls [`RequestPipeline::handle`]; everything from device identity
//! through filtering, caching and upstream forwarding happens here, transport
//! agnostic.
//!
//! The pipeline does not itself enforce `server.handle_timeout` — callers
//! wrap `handle()` in `tokio::time::timeout` and answer with a `build_servfail`
//! on expiry, keeping deadline enforcement at the call site rather than
//! inside the worker.

use std::net::IpAddr;
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use ipnetwork::IpNetwork;
use thiserror::Error;
use tracing::{debug, warn};

use meridian_dns_domain::{
    BillingToken, DeviceResult, DnsQuery, DomainError, FilterVerdict, RequestInfo,
    ResponseSizeClass, ServerGroup,
};

use crate::ports::billing::BillingSinkPort;
use crate::ports::cache::{CacheEntry, CachePort};
use crate::ports::connection_limiter::ConnectionLimiterPort;
use crate::ports::error_collector::ErrorCollectorPort;
use crate::ports::filter_engine::FilterEnginePort;
use crate::ports::forwarder::ForwarderPort;
use crate::ports::message_constructor::{MessageConstructorPort, SdeAnnotation};
use crate::ports::profile_db::ProfileDbPort;
use crate::ports::rate_limiter::{RateLimitDecision, RateLimiterPort};
use crate::services::device_finder::DeviceFinder;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// How the transport layer should dispose of a query once the pipeline
/// returns (§4.9 step 11).
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// Write these wire bytes back to the client.
    Respond(Bytes),
    /// Refuse the connection/query outright (access denial, auth failure,
    /// connection-limit exhaustion): stream transports should close the
    /// connection rather than answer.
    Refuse,
    /// Silently drop the query (rate-limit back-off per §4.4): DNS
    /// rate-limiting relies on the client never seeing a response to retry
    /// against.
    Drop,
}

/// Access-list snapshot swapped in by the refresh scheduler (§4.1, `access`
/// config section). Held behind a lock rather than `ArcSwap` since it is
/// read at most once per query and written only on reload.
#[derive(Debug, Clone, Default)]
pub struct AccessSnapshot {
    pub blocked_nets: Vec<IpNetwork>,
    pub blocked_domains: Vec<String>,
}

/// Static tuning the pipeline needs beyond its ports (§4.8 server-check,
/// §4.5 EDE/SDE toggles).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub extended_dns_errors_enabled: bool,
    pub sde: Option<SdeAnnotation>,
    pub server_check_domains: Vec<String>,
    pub server_check_node_name: String,
    pub default_cache_ttl: Duration,
}

pub struct RequestPipeline {
    device_finder: DeviceFinder,
    profile_db: Arc<dyn ProfileDbPort>,
    filter_engine: Arc<dyn FilterEnginePort>,
    forwarder: Arc<dyn ForwarderPort>,
    cache: Arc<dyn CachePort>,
    rate_limiter: Arc<dyn RateLimiterPort>,
    connection_limiter: Arc<dyn ConnectionLimiterPort>,
    message_constructor: Arc<dyn MessageConstructorPort>,
    error_collector: Arc<dyn ErrorCollectorPort>,
    billing_sink: Option<Arc<dyn BillingSinkPort>>,
    access: RwLock<AccessSnapshot>,
    config: PipelineConfig,
}

impl RequestPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device_finder: DeviceFinder,
        profile_db: Arc<dyn ProfileDbPort>,
        filter_engine: Arc<dyn FilterEnginePort>,
        forwarder: Arc<dyn ForwarderPort>,
        cache: Arc<dyn CachePort>,
        rate_limiter: Arc<dyn RateLimiterPort>,
        connection_limiter: Arc<dyn ConnectionLimiterPort>,
        message_constructor: Arc<dyn MessageConstructorPort>,
        error_collector: Arc<dyn ErrorCollectorPort>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            device_finder,
            profile_db,
            filter_engine,
            forwarder,
            cache,
            rate_limiter,
            connection_limiter,
            message_constructor,
            error_collector,
            billing_sink: None,
            access: RwLock::new(AccessSnapshot::default()),
            config,
        }
    }

    pub fn with_billing_sink(mut self, sink: Arc<dyn BillingSinkPort>) -> Self {
        self.billing_sink = Some(sink);
        self
    }

    /// Swap in a new access-list snapshot (driven by the refresh scheduler).
    pub fn reload_access(&self, snapshot: AccessSnapshot) {
        *self.access.write().expect("access lock poisoned") = snapshot;
    }

    fn report(&self, source: &str, err: &DomainError) {
        if !err.is_client_caused() {
            self.error_collector.report(source, err);
        }
    }

    /// Run the full §4.9 pipeline for one decoded query. `is_stream` marks
    /// transports with a connection lifetime (DoT/DoH/DoQ) subject to the
    /// connection limiter; plain UDP/DNSCrypt pass `false`.
    pub async fn handle(&self, request: &RequestInfo, server_group: &ServerGroup, is_stream: bool) -> PipelineOutcome {
        // Step 1/2: device identity (§4.3).
        let (device, profile) = match self.device_finder.find(
            request,
            &server_group.device_domains,
            request.server.linked_ip_enabled,
            server_group.auto_device_auth_enabled,
            self.profile_db.as_ref(),
        ) {
            Some(DeviceResult::Error(cause)) => {
                let err = DomainError::DeviceResultError(cause);
                self.report("device_finder", &err);
                return PipelineOutcome::Respond(
                    self.message_constructor.build_servfail(&request.question),
                );
            }
            Some(DeviceResult::AuthenticationFailure(cause)) => {
                debug!(?cause, "device authentication failed");
                return PipelineOutcome::Refuse;
            }
            Some(DeviceResult::UnknownDedicated) => return PipelineOutcome::Refuse,
            Some(DeviceResult::Ok { device, profile }) => (Some(device), Some(profile)),
            None => (None, None),
        };

        // Step 3: global access control (§4.4 "Access control").
        if self.is_client_blocked(request.remote_addr.ip()) || self.is_domain_blocked(&request.question) {
            return PipelineOutcome::Refuse;
        }

        // Step 4: connection admission for stream transports.
        if is_stream && !self.connection_limiter.try_acquire(request.remote_addr.ip()) {
            return PipelineOutcome::Refuse;
        }

        // Step 5: rate-limit with back-off (§4.4).
        match self.rate_limiter.check(request.remote_addr.ip(), 1) {
            RateLimitDecision::BackedOff | RateLimitDecision::Drop => return PipelineOutcome::Drop,
            RateLimitDecision::Allow => {}
        }

        // Step 6: DNS-server-check interception (§4.8).
        if self.is_server_check_query(&request.question) {
            return PipelineOutcome::Respond(self.message_constructor.build_server_check_response(
                &request.question,
                &self.config.server_check_node_name,
            ));
        }

        // Step 7: DDR interception (§4.8, §6 "Discovery of Designated Resolvers").
        if self.is_ddr_query(&request.question, server_group) {
            return PipelineOutcome::Respond(
                self.message_constructor
                    .build_ddr_response(&request.question, &server_group.servers),
            );
        }

        // Step 8: cache lookup (§4.7). ECS-aware: partitioned by client subnet
        // when the transport carried one.
        let client_subnet = request.transport.client_subnet.map(|n| n.ip());
        let cache_key = self.cache.key_for(&request.question, client_subnet);
        if let Some(entry) = self.cache.get(&cache_key) {
            if entry.valid_until > SystemTime::now() {
                self.record_billing(&device, &profile, entry.wire_data.len());
                return PipelineOutcome::Respond(entry.wire_data);
            }
        }

        // Step 9: filter pipeline (§4.5), only meaningful for identified
        // profiles — anonymous queries skip straight to forwarding.
        let mut query = request.question.clone();
        if let Some(profile) = &profile {
            match self.filter_engine.evaluate(&query, profile) {
                FilterVerdict::Block(rule) => {
                    let wire = self.message_constructor.build_block_response(
                        &query,
                        profile,
                        &rule,
                        self.config.extended_dns_errors_enabled,
                        self.config.sde.as_ref(),
                    );
                    self.record_billing(&device, &Some(profile.clone()), wire.len());
                    return PipelineOutcome::Respond(wire);
                }
                FilterVerdict::Rewrite { target, .. } => {
                    let wire = self.message_constructor.build_rewrite_response(&query, &target);
                    self.record_billing(&device, &Some(profile.clone()), wire.len());
                    return PipelineOutcome::Respond(wire);
                }
                FilterVerdict::SafeSearch { rewritten_qname } => {
                    query = DnsQuery::new(rewritten_qname, query.record_type);
                }
                FilterVerdict::Allow(_) | FilterVerdict::None => {}
            }
        }

        // Step 10: forward upstream (§4.6).
        let outcome = match self.forwarder.forward(&query).await {
            Ok(resp) => {
                let ttl = resp
                    .min_ttl
                    .map(|secs| Duration::from_secs(secs as u64))
                    .unwrap_or(self.config.default_cache_ttl);
                self.cache.put(
                    cache_key,
                    CacheEntry {
                        wire_data: resp.wire_data.clone(),
                        valid_until: SystemTime::now() + ttl,
                    },
                );
                self.record_billing(&device, &profile, resp.wire_data.len());
                PipelineOutcome::Respond(resp.wire_data)
            }
            Err(err) => {
                warn!(error = %err, "upstream forward failed");
                self.report("forwarder", &err);
                PipelineOutcome::Respond(self.message_constructor.build_servfail(&query))
            }
        };

        // Step 11: connection bookkeeping.
        if is_stream {
            self.connection_limiter.release(request.remote_addr.ip());
        }

        outcome
    }

    fn is_client_blocked(&self, addr: IpAddr) -> bool {
        let access = self.access.read().expect("access lock poisoned");
        access.blocked_nets.iter().any(|net| net.contains(addr))
    }

    fn is_domain_blocked(&self, query: &DnsQuery) -> bool {
        let access = self.access.read().expect("access lock poisoned");
        let name = query.canonical_name();
        access
            .blocked_domains
            .iter()
            .any(|d| name == *d || name.ends_with(&format!(".{d}")))
    }

    fn is_server_check_query(&self, query: &DnsQuery) -> bool {
        let name = query.canonical_name();
        self.config.server_check_domains.iter().any(|d| name == *d)
    }

    fn is_ddr_query(&self, query: &DnsQuery, server_group: &ServerGroup) -> bool {
        if !server_group.ddr.enabled {
            return false;
        }
        let name = query.canonical_name();
        name == "_dns.resolver.arpa"
            || server_group
                .ddr
                .tenant_domains
                .iter()
                .any(|d| name == format!("_dns.resolver.arpa.{d}") || name == *d)
    }

    fn record_billing(
        &self,
        device: &Option<meridian_dns_domain::Device>,
        profile: &Option<meridian_dns_domain::Profile>,
        response_len: usize,
    ) {
        let (Some(sink), Some(device), Some(profile)) = (&self.billing_sink, device, profile) else {
            return;
        };
        let timestamp_unix = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        sink.record(BillingToken {
            profile_id: profile.id.clone(),
            device_id: device.id.clone(),
            timestamp_unix,
            size_class: ResponseSizeClass::from_bytes(response_len),
        });
    }
}
