//! Tenant custom-domain matcher (§4.3 step 8, optional channel): matches
//! client SNI against configured suffixes, longest match wins, and reports
//! the profile set allowed under that suffix plus the label still to be
//! parsed as a device identity.
//!
//! Loaded once from config at construction, mirroring how `CustomDomainPort`
//! itself declares no reload method — the suffix list is operator-managed
//! configuration, not backend-synced state.

use meridian_dns_application::ports::custom_domain::{CustomDomainMatch, CustomDomainPort};
use meridian_dns_domain::config::CustomDomainConfig;
use meridian_dns_domain::ProfileId;

struct Entry {
    suffix: String,
    allowed_profiles: Vec<ProfileId>,
}

/// `CustomDomainPort` adapter backed by a static, config-loaded suffix list.
pub struct ConfigCustomDomainMatcher {
    entries: Vec<Entry>,
}

impl ConfigCustomDomainMatcher {
    pub fn new(config: CustomDomainConfig) -> Self {
        let mut entries: Vec<Entry> = config
            .entries
            .into_iter()
            .map(|e| Entry {
                suffix: e.suffix.trim_end_matches('.').to_ascii_lowercase(),
                allowed_profiles: e
                    .allowed_profile_ids
                    .iter()
                    .filter_map(|id| ProfileId::parse(id).ok())
                    .collect(),
            })
            .collect();
        // Longest suffix first so a more specific entry wins a tie.
        entries.sort_by(|a, b| b.suffix.len().cmp(&a.suffix.len()));
        Self { entries }
    }
}

impl CustomDomainPort for ConfigCustomDomainMatcher {
    fn match_sni(&self, sni: &str) -> Option<CustomDomainMatch> {
        let sni = sni.trim_end_matches('.').to_ascii_lowercase();
        for entry in &self.entries {
            let Some(label) = sni.strip_suffix(&entry.suffix) else {
                continue;
            };
            let label = label.strip_suffix('.').unwrap_or(label);
            if label.is_empty() {
                continue;
            }
            return Some(CustomDomainMatch {
                allowed_profiles: entry.allowed_profiles.clone(),
                label: label.to_string(),
            });
        }
        None
    }
}
