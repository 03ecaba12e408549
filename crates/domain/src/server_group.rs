//! Server and server-group static configuration (§3 `Server`, `ServerGroup`).

use ipnetwork::IpNetwork;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Plain,
    Dot,
    Doh,
    Doq,
    DnsCrypt,
}

impl Protocol {
    /// Whether this protocol can carry a device-identity channel at all
    /// (§4.3 step 1 — DNSCrypt here does not).
    pub fn supports_device_channel(&self) -> bool {
        !matches!(self, Protocol::DnsCrypt)
    }

    pub fn supports_tls_sni(&self) -> bool {
        matches!(self, Protocol::Doh | Protocol::Dot | Protocol::Doq)
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Protocol::Plain => 53,
            Protocol::Dot => 853,
            Protocol::Doh => 443,
            Protocol::Doq => 853,
            Protocol::DnsCrypt => 443,
        }
    }

    /// Fixed ascending-priority order used when emitting DDR SVCB templates
    /// (§4.8, §8 "DDR ordering").
    pub const DDR_ORDER: [Protocol; 3] = [Protocol::Doh, Protocol::Dot, Protocol::Doq];
}

/// Where a server is bound: either a fixed set of addresses, or an
/// interface/subnet pair used to resolve dedicated IPs (§4.3 step 6).
#[derive(Debug, Clone)]
pub enum BindData {
    Addresses(Vec<SocketAddr>),
    Interface { interface_id: String, subnet: IpNetwork },
}

impl BindData {
    /// True when this server is bound to a set of interfaces rather than a
    /// single fixed address — required for dedicated-IP lookup.
    pub fn is_interface_bound(&self) -> bool {
        matches!(self, BindData::Interface { .. })
    }
}

#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub cert_path: String,
    pub key_path: String,
    pub session_ticket_rotation: Duration,
}

#[derive(Debug, Clone)]
pub struct Server {
    pub name: String,
    pub protocol: Protocol,
    pub bind: BindData,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub handle_timeout: Duration,
    pub linked_ip_enabled: bool,
    pub tls: Option<TlsConfig>,
}

#[derive(Debug, Clone, Default)]
pub struct DdrConfig {
    pub enabled: bool,
    /// Additional tenant-owned wildcard domains that should also answer DDR
    /// queries, beyond the well-known `_dns.resolver.arpa.`.
    pub tenant_domains: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ServerGroup {
    pub name: String,
    pub ddr: DdrConfig,
    pub filtering_group_id: i64,
    pub servers: Vec<Server>,
    pub profiles_enabled: bool,
    /// Device domains under which per-device SNI labels are formed
    /// (§4.3 step 4, §GLOSSARY "Device domain").
    pub device_domains: Vec<String>,
    /// Whether an auto-created device (§4.2 "Auto-device creation") begins
    /// with authentication enabled. See DESIGN.md Open Question decision —
    /// default is `false`.
    pub auto_device_auth_enabled: bool,
}

impl ServerGroup {
    /// The device domain that is an immediate parent of `sni`, if any
    /// (§4.3 step 4): returns the label preceding the matched domain.
    pub fn device_label_from_sni<'a>(&self, sni: &'a str) -> Option<&'a str> {
        for domain in &self.device_domains {
            let suffix = format!(".{domain}");
            if let Some(label) = sni.strip_suffix(&suffix) {
                if !label.is_empty() && !label.contains('.') {
                    return Some(label);
                }
                // Multi-label prefixes (extended human-id triples) are
                // still a single "label" from the dash-splitting
                // perspective — only reject if it still contains a dot,
                // which would mean `domain` matched a sub-suffix rather
                // than the immediate parent.
                if let Some(last_dot) = label.rfind('.') {
                    return Some(&label[last_dot + 1..]);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_label_from_sni_extracts_immediate_child_label() {
        let group = ServerGroup {
            name: "g".into(),
            ddr: DdrConfig::default(),
            filtering_group_id: 1,
            servers: vec![],
            profiles_enabled: true,
            device_domains: vec!["d.dns.example".into()],
            auto_device_auth_enabled: false,
        };
        assert_eq!(
            group.device_label_from_sni("abcd1234.d.dns.example"),
            Some("abcd1234")
        );
        assert_eq!(group.device_label_from_sni("d.dns.example"), None);
        assert_eq!(group.device_label_from_sni("other.example"), None);
    }
}
