use async_trait::async_trait;
use meridian_dns_domain::{DnsQuery, DomainError, FilterVerdict, Profile};

/// Application-layer port for the composite filter pipeline (§4.5).
///
/// Hot-path evaluation is synchronous — compiled rule-list engines and the
/// hash-prefix storage are immutable snapshots swapped atomically by
/// `reload`. Only `reload` touches the network/filesystem.
#[async_trait]
pub trait FilterEnginePort: Send + Sync {
    /// Evaluate `query` against the filtering group assigned to `profile`,
    /// in the precedence order of §4.5: allow > rewrite > blocklists >
    /// safe-search > hash-prefix safe-browsing.
    fn evaluate(&self, query: &DnsQuery, profile: &Profile) -> FilterVerdict;

    /// Re-download and recompile rule lists, then atomically swap the
    /// active index.
    async fn reload(&self) -> Result<(), DomainError>;
}
