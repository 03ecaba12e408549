use meridian_dns_domain::ProfileId;

/// Result of a customer-owned-domain match on client SNI (§4.3 step 8,
/// optional channel).
#[derive(Debug, Clone)]
pub struct CustomDomainMatch {
    /// Profiles permitted under this custom domain; the device finder must
    /// reject an identity that resolves outside this set.
    pub allowed_profiles: Vec<ProfileId>,
    /// The label preceding the matched custom suffix, still to be parsed as
    /// a DeviceID or extended human-ID triple.
    pub label: String,
}

/// Optional port for tenant-owned custom domains consulted ahead of the
/// configured device-domain suffixes (§4.3 step 8).
pub trait CustomDomainPort: Send + Sync {
    fn match_sni(&self, sni: &str) -> Option<CustomDomainMatch>;
}
