use super::block_index::{AllowlistIndex, BlockIndex, SourceBitSet, SourceMeta};
use super::suffix_trie::SuffixTrie;
use crate::dns::cache::bloom::AtomicBloom;
use aho_corasick::AhoCorasick;
use compact_str::CompactString;
use dashmap::{DashMap, DashSet};
use futures::future::join_all;
use meridian_dns_domain::config::{FilteringGroupsConfig, FiltersConfig, RuleListKind};
use meridian_dns_domain::DomainError;
use rustc_hash::FxBuildHasher;
use std::collections::HashMap;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Line parsing
// ---------------------------------------------------------------------------

/// Intermediate entry type produced by the line parser.
#[derive(Debug)]
pub enum ParsedEntry {
    Exact(String),
    Wildcard(String),
    Pattern(String),
}

/// Parse one line from a blocklist / allowlist text.
///
/// Supported formats:
/// - `# comment` or blank  → None
/// - `0.0.0.0 domain`      → Exact
/// - `127.0.0.1 domain`    → Exact
/// - `:: domain`           → Exact
/// - `*.ads.com`           → Wildcard
/// - `/tracker/`           → Pattern (Aho-Corasick)
/// - `ads.com`             → Exact (plain token containing a dot)
pub fn parse_list_line(line: &str) -> Option<ParsedEntry> {
    let line = line.trim();

    if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
        return None;
    }

    // /pattern/ → Aho-Corasick substring
    if line.starts_with('/') && line.ends_with('/') && line.len() > 2 {
        return Some(ParsedEntry::Pattern(line[1..line.len() - 1].to_lowercase()));
    }

    // *.domain → Wildcard
    if line.starts_with("*.") {
        let pattern = line.to_ascii_lowercase();
        return Some(ParsedEntry::Wildcard(pattern));
    }

    let parts: Vec<&str> = line.split_whitespace().collect();

    // hosts file format: "addr domain [comment…]"
    if parts.len() >= 2 {
        let addr = parts[0];
        let domain = parts[1];

        let is_hosts_addr = matches!(addr, "0.0.0.0" | "127.0.0.1" | "::" | "::1");
        if is_hosts_addr {
            // Skip self-referential entries
            if matches!(
                domain,
                "localhost" | "0.0.0.0" | "broadcasthost" | "ip6-localhost" | "ip6-loopback"
            ) {
                return None;
            }
            // Skip lines with no dot (hostnames without TLD are rarely meaningful blocklist entries)
            if !domain.contains('.') {
                return None;
            }
            return Some(ParsedEntry::Exact(domain.to_ascii_lowercase()));
        }
    }

    // Single token with a dot → plain domain
    if parts.len() == 1 && parts[0].contains('.') {
        return Some(ParsedEntry::Exact(parts[0].to_ascii_lowercase()));
    }

    None
}

/// Parse an entire list text and collect `ParsedEntry` items.
pub fn parse_list_text(text: &str) -> Vec<ParsedEntry> {
    text.lines().filter_map(parse_list_line).collect()
}

// ---------------------------------------------------------------------------
// HTTP fetch helper
// ---------------------------------------------------------------------------

async fn fetch_url(url: &str, client: &reqwest::Client) -> Result<String, String> {
    let response = client
        .get(url)
        .timeout(std::time::Duration::from_secs(30))
        .send()
        .await
        .map_err(|e| format!("fetch error for {}: {}", url, e))?;

    if !response.status().is_success() {
        return Err(format!("HTTP {} for {}", response.status().as_u16(), url));
    }

    response
        .text()
        .await
        .map_err(|e| format!("read error for {}: {}", url, e))
}

// ---------------------------------------------------------------------------
// Main compiler
// ---------------------------------------------------------------------------

/// Compile a fresh `BlockIndex` from the configured rule-list registry.
///
/// Steps:
///   1. Assign bit positions to enabled `Block`-kind rule lists (max 63)
///   2. Compute per-group masks from each group's `rule_list_ids`
///   3. Fetch all list bodies over HTTP in parallel
///   4. Parse into exact / wildcard / pattern entries and build the index
///   5. Build the `AllowlistIndex` from `Allow`-kind rule lists
pub async fn compile_block_index(
    groups_config: &FilteringGroupsConfig,
    filters_config: &FiltersConfig,
    client: &reqwest::Client,
    default_group_id: i64,
) -> Result<BlockIndex, DomainError> {
    use super::engine::group_id_from_name;

    // ------------------------------------------------------------------
    // 1. Assign bits to block-kind sources
    // ------------------------------------------------------------------
    let block_sources: Vec<&meridian_dns_domain::config::RuleListSource> = filters_config
        .rule_lists
        .iter()
        .filter(|s| s.kind == RuleListKind::Block)
        .collect();

    if block_sources.len() > 63 {
        warn!(
            count = block_sources.len(),
            "More than 63 block-kind rule lists; only the first 63 will be used"
        );
    }

    let bit_of_id: HashMap<&str, u8> = block_sources
        .iter()
        .take(63)
        .enumerate()
        .map(|(idx, src)| (src.id.as_str(), idx as u8))
        .collect();

    let sources: Vec<SourceMeta> = block_sources
        .iter()
        .take(63)
        .enumerate()
        .map(|(idx, src)| SourceMeta {
            id: idx as i64,
            name: std::sync::Arc::from(src.id.as_str()),
            group_id: default_group_id,
            bit: idx as u8,
        })
        .collect();

    // ------------------------------------------------------------------
    // 2. Per-group masks from rule_list_ids membership
    // ------------------------------------------------------------------
    let mut group_masks: HashMap<i64, SourceBitSet> = HashMap::new();
    for group in &groups_config.groups {
        let group_id = group_id_from_name(&group.id);
        let mut mask: SourceBitSet = 0;
        for list_id in &group.rule_list_ids {
            if let Some(bit) = bit_of_id.get(list_id.as_str()) {
                mask |= 1u64 << bit;
            }
        }
        group_masks.insert(group_id, mask);
    }
    group_masks.entry(default_group_id).or_insert(0);

    // ------------------------------------------------------------------
    // 3. Parallel HTTP fetch
    // ------------------------------------------------------------------
    struct FetchResult {
        bit: u8,
        text: Option<String>,
    }

    let fetch_tasks: Vec<_> = block_sources
        .iter()
        .take(63)
        .enumerate()
        .map(|(idx, src)| {
            let url = src.url.clone();
            let client = client.clone();
            let bit = idx as u8;
            tokio::spawn(async move {
                let text = match fetch_url(&url, &client).await {
                    Ok(t) => {
                        info!(url = %url, "fetched blocklist source");
                        Some(t)
                    }
                    Err(e) => {
                        warn!(url = %url, error = %e, "failed to fetch blocklist source");
                        None
                    }
                };
                FetchResult { bit, text }
            })
        })
        .collect();

    let fetch_results = join_all(fetch_tasks).await;

    let mut source_entries: HashMap<u8, Vec<ParsedEntry>> = HashMap::new();
    for result in fetch_results {
        match result {
            Ok(fr) => {
                if let Some(text) = fr.text {
                    source_entries.insert(fr.bit, parse_list_text(&text));
                }
            }
            Err(e) => warn!(error = %e, "fetch task panicked"),
        }
    }

    // ------------------------------------------------------------------
    // 4. Build Bloom, exact DashMap, wildcard SuffixTrie, AC patterns
    // ------------------------------------------------------------------
    let exact_count: usize = source_entries
        .values()
        .flat_map(|entries| entries.iter())
        .filter(|e| matches!(e, ParsedEntry::Exact(_)))
        .count();

    let bloom_capacity = (exact_count + 100).max(1000);
    let bloom = AtomicBloom::new(bloom_capacity, 0.001);

    let exact: DashMap<CompactString, SourceBitSet, FxBuildHasher> =
        DashMap::with_capacity_and_hasher(exact_count, FxBuildHasher);

    let mut wildcard = SuffixTrie::new();
    let mut patterns_by_source: HashMap<u8, Vec<String>> = HashMap::new();

    for (bit, entries) in &source_entries {
        let source_bit: SourceBitSet = 1u64 << bit;
        for entry in entries {
            match entry {
                ParsedEntry::Exact(domain) => {
                    bloom.set(domain);
                    exact
                        .entry(CompactString::new(domain))
                        .and_modify(|bits| *bits |= source_bit)
                        .or_insert(source_bit);
                }
                ParsedEntry::Wildcard(pattern) => {
                    wildcard.insert_wildcard(pattern, source_bit);
                }
                ParsedEntry::Pattern(pat) => {
                    patterns_by_source.entry(*bit).or_default().push(pat.clone());
                }
            }
        }
    }

    let mut patterns: Vec<(AhoCorasick, SourceBitSet)> = Vec::new();
    for (bit, pats) in patterns_by_source {
        if pats.is_empty() {
            continue;
        }
        match AhoCorasick::builder().ascii_case_insensitive(true).build(&pats) {
            Ok(ac) => patterns.push((ac, 1u64 << bit)),
            Err(e) => warn!(source_bit = bit, error = %e, "failed to compile Aho-Corasick patterns"),
        }
    }

    let total_blocked_domains = exact.len();
    info!(
        exact = total_blocked_domains,
        pattern_automata = patterns.len(),
        "block index compiled"
    );

    // ------------------------------------------------------------------
    // 5. AllowlistIndex from Allow-kind rule lists
    // ------------------------------------------------------------------
    let allowlists = build_allowlist_index(groups_config, filters_config, client).await;

    Ok(BlockIndex {
        sources,
        group_masks,
        default_group_id,
        total_blocked_domains,
        exact,
        bloom,
        wildcard,
        patterns,
        allowlists,
    })
}

// ---------------------------------------------------------------------------
// AllowlistIndex builder
// ---------------------------------------------------------------------------

async fn build_allowlist_index(
    groups_config: &FilteringGroupsConfig,
    filters_config: &FiltersConfig,
    client: &reqwest::Client,
) -> AllowlistIndex {
    use super::engine::group_id_from_name;

    let mut allowlists = AllowlistIndex::new();

    let allow_sources: Vec<&meridian_dns_domain::config::RuleListSource> = filters_config
        .rule_lists
        .iter()
        .filter(|s| s.kind == RuleListKind::Allow)
        .collect();

    if allow_sources.is_empty() {
        return allowlists;
    }

    // Which groups reference each allow-list id; an id referenced by no
    // group is treated as a global allowlist.
    let mut referenced_by: HashMap<&str, Vec<i64>> = HashMap::new();
    for group in &groups_config.groups {
        let group_id = group_id_from_name(&group.id);
        for list_id in &group.rule_list_ids {
            referenced_by.entry(list_id.as_str()).or_default().push(group_id);
        }
    }

    struct FetchResult {
        list_id: String,
        text: Option<String>,
    }

    let tasks: Vec<_> = allow_sources
        .iter()
        .map(|src| {
            let url = src.url.clone();
            let list_id = src.id.clone();
            let client = client.clone();
            tokio::spawn(async move {
                let text = match fetch_url(&url, &client).await {
                    Ok(t) => Some(t),
                    Err(e) => {
                        warn!(url = %url, error = %e, "failed to fetch allowlist source");
                        None
                    }
                };
                FetchResult { list_id, text }
            })
        })
        .collect();

    for result in join_all(tasks).await {
        let Ok(fr) = result else {
            warn!("allowlist fetch task panicked");
            continue;
        };
        let Some(text) = fr.text else { continue };
        let entries = parse_list_text(&text);
        let groups = referenced_by.get(fr.list_id.as_str());

        for entry in &entries {
            match (entry, groups) {
                (ParsedEntry::Exact(domain), Some(group_ids)) => {
                    for group_id in group_ids {
                        allowlists
                            .group_exact
                            .entry(*group_id)
                            .or_insert_with(|| DashSet::with_hasher(FxBuildHasher))
                            .insert(CompactString::new(domain));
                    }
                }
                (ParsedEntry::Exact(domain), None) => {
                    allowlists.global_exact.insert(CompactString::new(domain));
                }
                (ParsedEntry::Wildcard(pattern), Some(group_ids)) => {
                    for group_id in group_ids {
                        allowlists
                            .group_wildcard
                            .entry(*group_id)
                            .or_insert_with(SuffixTrie::new)
                            .insert_wildcard(pattern, 1u64);
                    }
                }
                (ParsedEntry::Wildcard(pattern), None) => {
                    allowlists.global_wildcard.insert_wildcard(pattern, 1u64);
                }
                (ParsedEntry::Pattern(_), _) => {
                    // Patterns in allowlists are not currently supported.
                }
            }
        }
    }

    allowlists
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
