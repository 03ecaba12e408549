use std::net::IpAddr;

/// Gate for simultaneous stream connections per client subnet and
/// pipelined queries per connection (§4.9 step 4, `RateLimitConfig`'s
/// `max_connections_per_subnet`/`max_pipeline_count`).
pub trait ConnectionLimiterPort: Send + Sync {
    /// Attempt to admit one more connection from `addr`'s subnet. Returns
    /// `false` when the subnet is already at its connection cap.
    fn try_acquire(&self, addr: IpAddr) -> bool;

    fn release(&self, addr: IpAddr);
}
