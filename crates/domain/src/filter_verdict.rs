//! The per-question verdict produced by the filter pipeline (§4.5).

use std::net::IpAddr;
use std::sync::Arc;

/// Which rule list (and exact rule text) produced a verdict, carried
/// through to query-log statistics (§4.9 step 10).
#[derive(Debug, Clone)]
pub struct MatchedRule {
    pub list_id: u32,
    pub rule_text: Arc<str>,
}

#[derive(Debug, Clone)]
pub enum RewriteTarget {
    Ip(Vec<IpAddr>),
    Cname(String),
}

#[derive(Debug, Clone)]
pub enum FilterVerdict {
    /// No rule in the group matched; continue to the next stage.
    None,
    /// Matched a blocklist rule; answer per the profile's blocking mode.
    Block(MatchedRule),
    /// Matched a rewrite rule; synthesize the answer directly.
    Rewrite { rule: MatchedRule, target: RewriteTarget },
    /// Matched a safe-search rule; qname is rewritten and resolution
    /// continues upstream.
    SafeSearch { rewritten_qname: String },
    /// Matched an allow rule; short-circuits remaining blocking filters but
    /// resolution still continues upstream.
    Allow(MatchedRule),
}

impl FilterVerdict {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FilterVerdict::Block(_) | FilterVerdict::Rewrite { .. })
    }
}
