use super::RecordType;
use std::sync::Arc;

/// DNS query (domain + record type + class).
/// Uses `Arc<str>` for zero-cost cloning across pipeline stages.
#[derive(Debug, Clone)]
pub struct DnsQuery {
    pub domain: Arc<str>,
    pub record_type: RecordType,
    pub class: u16,
}

const DNS_CLASS_IN: u16 = 1;

impl DnsQuery {
    pub fn new(domain: impl Into<Arc<str>>, record_type: RecordType) -> Self {
        Self {
            domain: domain.into(),
            record_type,
            class: DNS_CLASS_IN,
        }
    }

    /// Domain with any trailing root dot stripped and lower-cased, the
    /// canonical form used for hashing and cache keys.
    pub fn canonical_name(&self) -> String {
        self.domain.trim_end_matches('.').to_ascii_lowercase()
    }
}
