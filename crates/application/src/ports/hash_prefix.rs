use async_trait::async_trait;
use meridian_dns_domain::DomainError;

/// Which safe-browsing family a hash-prefix lookup targets (§4.5, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashFamily {
    AdultContent,
    GeneralDangerous,
    NewlyRegistered,
}

/// Application-layer port for the hash-prefix safe-browsing matcher (§4.5,
/// §8 "Hash-prefix round-trip").
///
/// Storage is an immutable `{prefix -> [hash]}` snapshot per refresh
/// generation (domain §3 `HashStorage`), so lookups are lock-free reads.
#[async_trait]
pub trait HashPrefixMatcherPort: Send + Sync {
    /// Full 32-byte SHA-256 hashes sharing `prefix` within `family`.
    fn hashes_for_prefix(&self, family: HashFamily, prefix: [u8; 2]) -> Vec<[u8; 32]>;

    /// Whether the SHA-256 of `hostname` (already canonicalized: lowercased,
    /// trailing dot stripped) is present in `family`'s storage.
    fn contains_hostname(&self, family: HashFamily, hostname: &str) -> bool;

    /// Re-download and recompile the hash storage, then atomically swap it.
    async fn reload(&self) -> Result<(), DomainError>;
}
