//! Hash-prefix safe-browsing matcher (§4.5): per-family `{prefix -> [hash]}`
//! storage built from downloaded plaintext hostname lists, hashed with
//! SHA-256 and bucketed by their first two bytes so a safe-browsing TXT
//! probe can answer "which full hashes share this prefix?" in O(1).
//!
//! Grounded on the filter engine's `reqwest`-download-then-`ArcSwap`-swap
//! idiom (`dns/block_filter/engine.rs`); the storage itself is immutable
//! per generation, so lookups never take a lock.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use meridian_dns_application::ports::hash_prefix::{HashFamily, HashPrefixMatcherPort};
use meridian_dns_application::ports::refresh::{RefreshContext, Refresher};
use meridian_dns_domain::config::{HashPrefixConfig, HashPrefixFamily};
use meridian_dns_domain::DomainError;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

fn to_port_family(family: HashPrefixFamily) -> HashFamily {
    match family {
        HashPrefixFamily::AdultContent => HashFamily::AdultContent,
        HashPrefixFamily::GeneralDangerous => HashFamily::GeneralDangerous,
        HashPrefixFamily::NewlyRegistered => HashFamily::NewlyRegistered,
    }
}

fn sha256_hostname(hostname: &str) -> [u8; 32] {
    let canonical = hostname.trim_end_matches('.').to_ascii_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hasher.finalize().into()
}

#[derive(Default)]
struct FamilyStorage {
    by_prefix: HashMap<[u8; 2], Vec<[u8; 32]>>,
}

impl FamilyStorage {
    fn insert(&mut self, hash: [u8; 32]) {
        let prefix = [hash[0], hash[1]];
        let bucket = self.by_prefix.entry(prefix).or_default();
        if !bucket.contains(&hash) {
            bucket.push(hash);
        }
    }
}

#[derive(Default)]
struct Storage {
    adult_content: FamilyStorage,
    general_dangerous: FamilyStorage,
    newly_registered: FamilyStorage,
}

impl Storage {
    fn family(&self, family: HashFamily) -> &FamilyStorage {
        match family {
            HashFamily::AdultContent => &self.adult_content,
            HashFamily::GeneralDangerous => &self.general_dangerous,
            HashFamily::NewlyRegistered => &self.newly_registered,
        }
    }

    fn family_mut(&mut self, family: HashPrefixFamily) -> &mut FamilyStorage {
        match family {
            HashPrefixFamily::AdultContent => &mut self.adult_content,
            HashPrefixFamily::GeneralDangerous => &mut self.general_dangerous,
            HashPrefixFamily::NewlyRegistered => &mut self.newly_registered,
        }
    }
}

/// `HashPrefixMatcherPort` + `Refresher` adapter.
pub struct HashPrefixMatcher {
    storage: ArcSwap<Storage>,
    config: HashPrefixConfig,
    http_client: reqwest::Client,
}

impl HashPrefixMatcher {
    pub fn new(config: HashPrefixConfig) -> Result<Self, DomainError> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.refresh_timeout_secs))
            .build()
            .map_err(|e| DomainError::InvalidConfig(e.to_string()))?;
        Ok(Self {
            storage: ArcSwap::new(Arc::new(Storage::default())),
            config,
            http_client,
        })
    }

    async fn download_and_compile(&self) -> Result<Storage, DomainError> {
        let mut storage = Storage::default();
        for source in &self.config.sources {
            let resp = self
                .http_client
                .get(&source.url)
                .send()
                .await
                .map_err(|e| DomainError::SyncError(format!("download {}: {e}", source.url)))?;
            let resp = resp
                .error_for_status()
                .map_err(|e| DomainError::SyncError(format!("download {}: {e}", source.url)))?;
            let body = resp
                .text()
                .await
                .map_err(|e| DomainError::SyncError(format!("read {}: {e}", source.url)))?;
            if body.len() as u64 > self.config.max_download_size_bytes {
                return Err(DomainError::SyncError(format!(
                    "{} exceeded max_download_size_bytes",
                    source.url
                )));
            }
            let bucket = storage.family_mut(source.family);
            for line in body.lines() {
                let hostname = line.trim();
                if hostname.is_empty() || hostname.starts_with('#') {
                    continue;
                }
                bucket.insert(sha256_hostname(hostname));
            }
        }
        Ok(storage)
    }
}

#[async_trait]
impl HashPrefixMatcherPort for HashPrefixMatcher {
    fn hashes_for_prefix(&self, family: HashFamily, prefix: [u8; 2]) -> Vec<[u8; 32]> {
        self.storage
            .load()
            .family(family)
            .by_prefix
            .get(&prefix)
            .cloned()
            .unwrap_or_default()
    }

    fn contains_hostname(&self, family: HashFamily, hostname: &str) -> bool {
        let hash = sha256_hostname(hostname);
        let prefix = [hash[0], hash[1]];
        self.storage
            .load()
            .family(family)
            .by_prefix
            .get(&prefix)
            .is_some_and(|bucket| bucket.contains(&hash))
    }

    async fn reload(&self) -> Result<(), DomainError> {
        let storage = self.download_and_compile().await?;
        info!(sources = self.config.sources.len(), "hash-prefix storage recompiled");
        self.storage.store(Arc::new(storage));
        Ok(())
    }
}

#[async_trait]
impl Refresher for HashPrefixMatcher {
    async fn refresh(&self, ctx: &RefreshContext) -> Result<(), DomainError> {
        if ctx.is_expired() {
            return Err(DomainError::HandleTimeout);
        }
        tokio::select! {
            result = self.reload() => {
                if let Err(err) = &result {
                    warn!(error = %err, "hash-prefix storage refresh failed, keeping stale storage");
                }
                result
            }
            _ = ctx.shutdown.cancelled() => Ok(()),
        }
    }
}

/// Lowercase-hex encoding of a hash, for TXT-record safe-browsing answers.
pub fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}
