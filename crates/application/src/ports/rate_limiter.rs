use std::net::IpAddr;

/// Outcome of a rate-limit check (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allow,
    /// Bucket exhausted; drop the request (DNS response rate-limiting).
    Drop,
    /// Subnet is in back-off; refuse regardless of bucket state.
    BackedOff,
}

/// Application-layer port for the rate-limiter with back-off (§4.4, §8
/// "Rate-limit idempotence under allowlist", "Back-off monotonicity").
pub trait RateLimiterPort: Send + Sync {
    /// Check and charge the bucket for `addr` against a response costing
    /// `response_size_estimate_units` tokens (1 for the initial check before
    /// the response size is known; callers may re-check after forwarding).
    fn check(&self, addr: IpAddr, cost: u32) -> RateLimitDecision;

    /// Whether `addr` is in the rate-limit allowlist snapshot and bypasses
    /// both the bucket and back-off entirely.
    fn is_allowlisted(&self, addr: IpAddr) -> bool;

    /// Swap in a new allowlist snapshot (called by the refresh scheduler).
    fn reload_allowlist(&self, entries: Vec<ipnetwork::IpNetwork>);
}
