//! Raw wire-format DNS transports used by the upstream forwarder (§4.6).
//! Only UDP and TCP are modeled — `UpstreamServer::network` (domain
//! `config::upstream`) only ever names `Udp`/`Tcp`/`Any`, so there is no
//! DoH/DoQ upstream leg to dispatch to here.

pub mod tcp;
pub mod udp;

use async_trait::async_trait;
use meridian_dns_domain::DomainError;
use std::time::Duration;

/// Result of a raw DNS transport operation.
#[derive(Debug)]
pub struct TransportResponse {
    pub bytes: Vec<u8>,
    pub protocol_used: &'static str,
}

/// Trait for sending a single wire-format DNS message and awaiting the
/// matching response.
#[async_trait]
pub trait DnsTransport: Send + Sync {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError>;

    fn protocol_name(&self) -> &'static str;
}

/// Enum-dispatched transport — stack-allocated, no `Box<dyn>` vtable
/// overhead on the per-query hot path.
pub enum Transport {
    Udp(udp::UdpTransport),
    Tcp(tcp::TcpTransport),
}

impl Transport {
    pub async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        match self {
            Self::Udp(t) => DnsTransport::send(t, message_bytes, timeout).await,
            Self::Tcp(t) => DnsTransport::send(t, message_bytes, timeout).await,
        }
    }

    pub fn protocol_name(&self) -> &'static str {
        match self {
            Self::Udp(_) => "UDP",
            Self::Tcp(_) => "TCP",
        }
    }
}
