//! Rate limiter with back-off (§4.4): one token bucket per masked client
//! subnet, IPv4 and IPv6 keyed independently by the configured prefix
//! lengths. Exhausting the bucket repeatedly inside `backoff_period_ms`
//! trips a back-off that refuses the subnet outright for
//! `backoff_duration_ms`, regardless of how many tokens later refill.
//!
//! Grounded on the token-bucket-with-lazy-refill pattern used for HTTP
//! gateway rate limiting in the wider example pack (`RateLimiter`/
//! `TokenBucket` in the API gateway crate), adapted to DNS's per-subnet,
//! per-query accounting and ported onto `DashMap` to match this crate's
//! other adapters.

use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use ipnetwork::IpNetwork;
use meridian_dns_application::ports::connection_limiter::ConnectionLimiterPort;
use meridian_dns_application::ports::rate_limiter::{RateLimitDecision, RateLimiterPort};
use meridian_dns_domain::config::RateLimitConfig;
use rustc_hash::FxBuildHasher;
use std::sync::atomic::{AtomicU32, Ordering};

type FxDashMap<K, V> = DashMap<K, V, FxBuildHasher>;

fn mask_addr(addr: IpAddr, config: &RateLimitConfig) -> IpAddr {
    let prefix = match addr {
        IpAddr::V4(_) => config.subnet_key_len_v4,
        IpAddr::V6(_) => config.subnet_key_len_v6,
    };
    match IpNetwork::new(addr, prefix) {
        Ok(net) => net.network(),
        Err(_) => addr,
    }
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
    strikes: u32,
    strike_window_start: Instant,
    backoff_until: Option<Instant>,
}

impl Bucket {
    fn new(capacity: u32, now: Instant) -> Self {
        Self {
            tokens: capacity as f64,
            last_refill: now,
            strikes: 0,
            strike_window_start: now,
            backoff_until: None,
        }
    }

    fn refill(&mut self, config: &RateLimitConfig, now: Instant) {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        let rate = config.count as f64 / (config.interval_ms as f64 / 1000.0);
        self.tokens = (self.tokens + elapsed * rate).min(config.count as f64);
        self.last_refill = now;
    }

    fn check(&mut self, config: &RateLimitConfig, cost: u32, now: Instant) -> RateLimitDecision {
        if let Some(until) = self.backoff_until {
            if now < until {
                return RateLimitDecision::BackedOff;
            }
            self.backoff_until = None;
            self.strikes = 0;
        }

        self.refill(config, now);

        if self.tokens >= cost as f64 {
            self.tokens -= cost as f64;
            return RateLimitDecision::Allow;
        }

        if now.duration_since(self.strike_window_start) > Duration::from_millis(config.backoff_period_ms) {
            self.strikes = 0;
            self.strike_window_start = now;
        }
        self.strikes += 1;
        if self.strikes >= config.backoff_count {
            self.backoff_until = Some(now + Duration::from_millis(config.backoff_duration_ms));
        }
        RateLimitDecision::Drop
    }
}

/// `RateLimiterPort` adapter: one lazily-refilled bucket per masked subnet.
pub struct SubnetRateLimiter {
    config: RateLimitConfig,
    buckets: FxDashMap<IpAddr, Mutex<Bucket>>,
    allowlist: Mutex<Vec<IpNetwork>>,
}

impl SubnetRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let allowlist = config
            .allowlist
            .iter()
            .filter_map(|cidr| cidr.parse::<IpNetwork>().ok())
            .collect();
        Self {
            config,
            buckets: FxDashMap::default(),
            allowlist: Mutex::new(allowlist),
        }
    }
}

impl RateLimiterPort for SubnetRateLimiter {
    fn check(&self, addr: IpAddr, cost: u32) -> RateLimitDecision {
        if self.is_allowlisted(addr) {
            return RateLimitDecision::Allow;
        }
        let key = mask_addr(addr, &self.config);
        let now = Instant::now();
        let entry = self
            .buckets
            .entry(key)
            .or_insert_with(|| Mutex::new(Bucket::new(self.config.count, now)));
        let mut bucket = entry.lock().expect("rate-limit bucket lock poisoned");
        bucket.check(&self.config, cost.max(1), now)
    }

    fn is_allowlisted(&self, addr: IpAddr) -> bool {
        self.allowlist
            .lock()
            .expect("allowlist lock poisoned")
            .iter()
            .any(|net| net.contains(addr))
    }

    fn reload_allowlist(&self, entries: Vec<IpNetwork>) {
        *self.allowlist.lock().expect("allowlist lock poisoned") = entries;
    }
}

/// `ConnectionLimiterPort` adapter: a live-connection counter per masked
/// subnet, capped at `max_connections_per_subnet`.
pub struct SubnetConnectionLimiter {
    config: RateLimitConfig,
    counts: FxDashMap<IpAddr, AtomicU32>,
}

impl SubnetConnectionLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            counts: FxDashMap::default(),
        }
    }
}

impl ConnectionLimiterPort for SubnetConnectionLimiter {
    fn try_acquire(&self, addr: IpAddr) -> bool {
        let key = mask_addr(addr, &self.config);
        let counter = self
            .counts
            .entry(key)
            .or_insert_with(|| AtomicU32::new(0));
        let mut current = counter.load(Ordering::Acquire);
        loop {
            if current >= self.config.max_connections_per_subnet {
                return false;
            }
            match counter.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    fn release(&self, addr: IpAddr) {
        let key = mask_addr(addr, &self.config);
        if let Some(counter) = self.counts.get(&key) {
            counter.fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| Some(v.saturating_sub(1))).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RateLimitConfig {
        RateLimitConfig {
            count: 2,
            interval_ms: 1000,
            subnet_key_len_v4: 32,
            subnet_key_len_v6: 128,
            response_size_estimate: 512,
            refuse_any: false,
            backoff_count: 2,
            backoff_period_ms: 1000,
            backoff_duration_ms: 60_000,
            allowlist: Vec::new(),
            max_connections_per_subnet: 2,
            max_pipeline_count: 64,
        }
    }

    #[test]
    fn exhausts_bucket_then_trips_backoff() {
        let limiter = SubnetRateLimiter::new(config());
        let addr: IpAddr = "10.0.0.1".parse().unwrap();
        assert_eq!(limiter.check(addr, 1), RateLimitDecision::Allow);
        assert_eq!(limiter.check(addr, 1), RateLimitDecision::Allow);
        assert_eq!(limiter.check(addr, 1), RateLimitDecision::Drop);
        assert_eq!(limiter.check(addr, 1), RateLimitDecision::BackedOff);
    }

    #[test]
    fn allowlisted_subnet_bypasses_bucket() {
        let mut cfg = config();
        cfg.allowlist = vec!["10.0.0.0/8".to_string()];
        let limiter = SubnetRateLimiter::new(cfg);
        let addr: IpAddr = "10.1.2.3".parse().unwrap();
        for _ in 0..10 {
            assert_eq!(limiter.check(addr, 1), RateLimitDecision::Allow);
        }
    }

    #[test]
    fn connection_limiter_caps_per_subnet() {
        let limiter = SubnetConnectionLimiter::new(config());
        let addr: IpAddr = "192.168.1.5".parse().unwrap();
        assert!(limiter.try_acquire(addr));
        assert!(limiter.try_acquire(addr));
        assert!(!limiter.try_acquire(addr));
        limiter.release(addr);
        assert!(limiter.try_acquire(addr));
    }
}
