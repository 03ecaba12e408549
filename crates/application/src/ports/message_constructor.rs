use bytes::Bytes;
use meridian_dns_domain::{DnsQuery, MatchedRule, Profile, RewriteTarget, Server};

/// Structured DNS Error contact/justification carried on a blocking
/// response when configured (§4.8, §GLOSSARY "SDE").
#[derive(Debug, Clone)]
pub struct SdeAnnotation {
    pub contact: String,
    pub justification: String,
}

/// Application-layer port for the message constructor (§4.8). Wire
/// encoding is delegated to infrastructure (hickory-proto); the pipeline
/// only needs these semantic builders.
pub trait MessageConstructorPort: Send + Sync {
    /// Build a blocking answer in `profile`'s configured blocking mode,
    /// optionally carrying an Extended DNS Error and/or SDE annotation.
    fn build_block_response(
        &self,
        query: &DnsQuery,
        profile: &Profile,
        rule: &MatchedRule,
        ede_enabled: bool,
        sde: Option<&SdeAnnotation>,
    ) -> Bytes;

    /// Synthesize an answer directly from a `Rewrite` filter verdict.
    fn build_rewrite_response(&self, query: &DnsQuery, target: &RewriteTarget) -> Bytes;

    fn build_refused(&self, query: &DnsQuery) -> Bytes;

    fn build_servfail(&self, query: &DnsQuery) -> Bytes;

    /// DDR SVCB templates for `_dns.resolver.arpa.` (and tenant wildcards),
    /// one record per enabled protocol/port, sorted by ascending priority
    /// in the fixed `{DoH,DoT,DoQ}` order (§6, §8 "DDR ordering").
    fn build_ddr_response(&self, query: &DnsQuery, servers: &[Server]) -> Bytes;

    /// DNS-server-check interception response (§4.9 step 6).
    fn build_server_check_response(&self, query: &DnsQuery, node_name: &str) -> Bytes;
}
