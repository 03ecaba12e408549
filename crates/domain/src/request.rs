//! Per-query transport metadata handed to the pipeline by the DNS servers
//! (§3 `RequestInfo`, §6 "Transports").

use crate::dns_query::DnsQuery;
use crate::server_group::{Protocol, Server};
use std::net::SocketAddr;
use std::sync::Arc;

/// HTTP Basic-auth-style userinfo extracted from a DoH request, either from
/// the `Authorization` header or from the URL's `user:pass@` component.
#[derive(Debug, Clone)]
pub struct UserInfo {
    pub username: String,
    pub password: Option<String>,
}

/// Everything the decoding transport can tell us about one connection,
/// beyond the decoded DNS message itself. Transport decoding is assumed
/// provided by the DNS-server library (hickory-server/-proto); this struct
/// is the metadata contract the core consumes from it.
#[derive(Debug, Clone, Default)]
pub struct TransportMetadata {
    /// TLS SNI presented by the client, for DoH/DoT/DoQ.
    pub tls_server_name: Option<String>,
    /// HTTP request path, for DoH.
    pub http_path: Option<String>,
    /// HTTP Basic userinfo, for DoH.
    pub http_user_info: Option<UserInfo>,
    /// EDNS0 option 65074 (dnsmasq CPE-ID) payload, decoded as UTF-8, for
    /// plain DNS.
    pub edns0_cpe_id: Option<String>,
    /// EDNS Client Subnet, when present, used for cache partitioning.
    pub client_subnet: Option<ipnetwork::IpNetwork>,
}

#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub question: DnsQuery,
    pub transport: TransportMetadata,
    pub local_addr: SocketAddr,
    pub remote_addr: SocketAddr,
    pub server: Arc<Server>,
    pub server_group_name: String,
}

impl RequestInfo {
    pub fn protocol(&self) -> Protocol {
        self.server.protocol
    }
}
