use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use compact_str::CompactString;
use meridian_dns_application::ports::filter_engine::FilterEnginePort;
use meridian_dns_application::ports::refresh::{RefreshContext, Refresher};
use meridian_dns_domain::config::{
    FilteringGroupsConfig, FiltersConfig, RewriteTargetConfig,
};
use meridian_dns_domain::{
    BehaviorFlags, ConfigGroup, DnsQuery, DomainError, FilterVerdict, FilteringGroup, MatchedRule,
    Profile, RewriteTarget,
};
use rustc_hash::FxHasher;
use tracing::{debug, warn};

use super::block_index::BlockIndex;
use super::compiler::compile_block_index;
use super::decision_cache::{decision_l0_clear, decision_l0_get, decision_l0_set};

/// Hostnames of well-known search engines rewritten to their safe-search
/// variant when a group has `safe_search_enabled`.
const SAFE_SEARCH_DOMAINS: &[(&str, &str)] = &[
    ("www.google.com", "forcesafesearch.google.com"),
    ("google.com", "forcesafesearch.google.com"),
    ("www.bing.com", "strict.bing.com"),
    ("bing.com", "strict.bing.com"),
    ("duckduckgo.com", "safe.duckduckgo.com"),
    ("www.youtube.com", "restrict.youtube.com"),
    ("youtube.com", "restrict.youtube.com"),
    ("m.youtube.com", "restrict.youtube.com"),
];

#[derive(Debug, Clone)]
struct RewriteEntry {
    pattern: CompactString,
    is_wildcard: bool,
    target: RewriteTarget,
    rule_text: Arc<str>,
}

/// Deterministically maps a config-file group id (string) to the `i64`
/// `FilteringGroup::id` / `Profile::filtering_group_id` carry on the wire.
/// Both the profile-db adapter and this engine derive ids the same way, so
/// neither needs to coordinate assignment with the other.
pub fn group_id_from_name(name: &str) -> i64 {
    let mut hasher = FxHasher::default();
    name.hash(&mut hasher);
    (hasher.finish() & 0x7fff_ffff_ffff_ffff) as i64
}

struct CompiledFilters {
    block_index: BlockIndex,
    groups: HashMap<i64, FilteringGroup>,
    rewrite_rules: HashMap<i64, Vec<RewriteEntry>>,
    default_group_id: i64,
}

/// Implements `FilterEnginePort` (§4.5) over the compiled rule-list index:
/// allow-rules, then literal rewrite rules, then blocklists, then
/// safe-search, in that precedence order. Hash-prefix
/// safe-browsing is a distinct port composed separately by the transport
/// layer for TXT probe queries; groups merely gate which families apply.
pub struct RuleListFilterEngine {
    compiled: ArcSwap<CompiledFilters>,
    groups_config: FilteringGroupsConfig,
    filters_config: FiltersConfig,
    http_client: reqwest::Client,
}

impl RuleListFilterEngine {
    pub async fn new(
        groups_config: FilteringGroupsConfig,
        filters_config: FiltersConfig,
    ) -> Result<Self, DomainError> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(
                filters_config.refresh_timeout_secs,
            ))
            .build()
            .map_err(|e| DomainError::InvalidConfig(e.to_string()))?;

        let compiled = compile(&groups_config, &filters_config, &http_client).await?;

        Ok(Self {
            compiled: ArcSwap::new(Arc::new(compiled)),
            groups_config,
            filters_config,
            http_client,
        })
    }

    fn runtime_group(&self, profile: &Profile) -> (i64, FilteringGroup) {
        let snapshot = self.compiled.load();
        match snapshot.groups.get(&profile.filtering_group_id) {
            Some(group) => (profile.filtering_group_id, group.clone()),
            None => {
                let default_id = snapshot.default_group_id;
                match snapshot.groups.get(&default_id) {
                    Some(group) => (default_id, group.clone()),
                    None => (
                        default_id,
                        FilteringGroup {
                            id: default_id,
                            config: ConfigGroup::default(),
                            behavior: BehaviorFlags::default(),
                        },
                    ),
                }
            }
        }
    }

    fn check_rewrite(&self, group_id: i64, domain: &str) -> Option<FilterVerdict> {
        let snapshot = self.compiled.load();
        let rules = snapshot.rewrite_rules.get(&group_id)?;
        for entry in rules {
            let matched = if entry.is_wildcard {
                domain.ends_with(entry.pattern.as_str())
            } else {
                domain == entry.pattern.as_str()
            };
            if matched {
                return Some(FilterVerdict::Rewrite {
                    rule: MatchedRule {
                        list_id: 0,
                        rule_text: Arc::clone(&entry.rule_text),
                    },
                    target: entry.target.clone(),
                });
            }
        }
        None
    }

    fn check_safe_search(&self, group: &FilteringGroup, domain: &str) -> Option<FilterVerdict> {
        if !group.config.safe_search_enabled {
            return None;
        }
        SAFE_SEARCH_DOMAINS
            .iter()
            .find(|(plain, _)| *plain == domain)
            .map(|(_, safe)| FilterVerdict::SafeSearch {
                rewritten_qname: (*safe).to_string(),
            })
    }
}

#[async_trait]
impl FilterEnginePort for RuleListFilterEngine {
    fn evaluate(&self, query: &DnsQuery, profile: &Profile) -> FilterVerdict {
        let domain = query.canonical_name();
        let (group_id, group) = self.runtime_group(profile);

        if let Some(blocked) = decision_l0_get(&domain, group_id) {
            if blocked {
                return FilterVerdict::Block(MatchedRule {
                    list_id: group_id as u32,
                    rule_text: Arc::from(domain.as_str()),
                });
            }
        } else if let Some(verdict) = self.check_rewrite(group_id, &domain) {
            return verdict;
        } else {
            let snapshot = self.compiled.load();
            let blocked = snapshot.block_index.is_blocked(&domain, group_id);
            decision_l0_set(&domain, group_id, blocked);
            if blocked {
                return FilterVerdict::Block(MatchedRule {
                    list_id: group_id as u32,
                    rule_text: Arc::from(domain.as_str()),
                });
            }
        }

        if let Some(verdict) = self.check_safe_search(&group, &domain) {
            return verdict;
        }

        FilterVerdict::None
    }

    async fn reload(&self) -> Result<(), DomainError> {
        let fresh = compile(&self.groups_config, &self.filters_config, &self.http_client).await?;
        self.compiled.store(Arc::new(fresh));
        decision_l0_clear();
        debug!("filter index reloaded");
        Ok(())
    }
}

#[async_trait]
impl Refresher for RuleListFilterEngine {
    async fn refresh(&self, ctx: &RefreshContext) -> Result<(), DomainError> {
        if ctx.is_expired() {
            return Err(DomainError::HandleTimeout);
        }
        tokio::select! {
            result = self.reload() => result,
            _ = ctx.shutdown.cancelled() => Ok(()),
        }
    }
}

async fn compile(
    groups_config: &FilteringGroupsConfig,
    filters_config: &FiltersConfig,
    http_client: &reqwest::Client,
) -> Result<CompiledFilters, DomainError> {
    let default_group_id = groups_config
        .groups
        .iter()
        .find(|g| g.is_default)
        .or_else(|| groups_config.groups.first())
        .map(|g| group_id_from_name(&g.id))
        .unwrap_or(0);

    let mut groups = HashMap::new();
    let mut rewrite_rules = HashMap::new();

    for group_config in &groups_config.groups {
        let id = group_id_from_name(&group_config.id);
        groups.insert(
            id,
            FilteringGroup {
                id,
                config: ConfigGroup {
                    rule_list_ids: Vec::new(),
                    parental_control_enabled: group_config.parental_control_enabled,
                    safe_browsing_enabled: group_config.safe_browsing_enabled,
                    adult_blocking_enabled: group_config.adult_content_blocked,
                    newly_registered_domains_enabled: group_config
                        .newly_registered_domains_enabled,
                    safe_search_enabled: group_config.safe_search_enabled,
                },
                behavior: BehaviorFlags {
                    block_chrome_prefetch: group_config.block_chrome_prefetch,
                    block_firefox_canary: group_config.block_firefox_canary,
                    block_private_relay: group_config.block_private_relay,
                },
            },
        );

        let entries: Vec<RewriteEntry> = group_config
            .rewrite_rules
            .iter()
            .map(|rule| {
                let (pattern, is_wildcard) = match rule.pattern.strip_prefix("*.") {
                    Some(suffix) => (suffix.to_ascii_lowercase(), true),
                    None => (rule.pattern.to_ascii_lowercase(), false),
                };
                let target = match &rule.target {
                    RewriteTargetConfig::Ip(addrs) => RewriteTarget::Ip(addrs.clone()),
                    RewriteTargetConfig::Cname(name) => RewriteTarget::Cname(name.clone()),
                };
                RewriteEntry {
                    pattern: CompactString::new(&pattern),
                    is_wildcard,
                    target,
                    rule_text: Arc::from(rule.pattern.as_str()),
                }
            })
            .collect();
        if !entries.is_empty() {
            rewrite_rules.insert(id, entries);
        }
    }

    if groups.is_empty() {
        warn!("no filtering groups configured; all queries fall back to an empty default group");
        groups.insert(
            default_group_id,
            FilteringGroup {
                id: default_group_id,
                config: ConfigGroup::default(),
                behavior: BehaviorFlags::default(),
            },
        );
    }

    let block_index =
        compile_block_index(groups_config, filters_config, http_client, default_group_id)
            .await?;

    Ok(CompiledFilters {
        block_index,
        groups,
        rewrite_rules,
        default_group_id,
    })
}
