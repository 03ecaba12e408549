use super::{DnsTransport, TransportResponse};
use async_trait::async_trait;
use meridian_dns_domain::DomainError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// DNS over TCP: each message is prefixed with its big-endian `u16` length
/// (RFC 1035 §4.2.2). Used for upstreams configured with
/// `NetworkType::Tcp`, and as the fallback when a UDP response truncates.
pub struct TcpTransport {
    server_addr: SocketAddr,
}

impl TcpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }
}

#[async_trait]
impl DnsTransport for TcpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        let connect = tokio::time::timeout(timeout, TcpStream::connect(self.server_addr));
        let mut stream = connect
            .await
            .map_err(|_| DomainError::UpstreamError(format!("timeout connecting to {}", self.server_addr)))?
            .map_err(|e| DomainError::UpstreamError(format!("connect to {}: {e}", self.server_addr)))?;

        let len = u16::try_from(message_bytes.len())
            .map_err(|_| DomainError::UpstreamError("query too large for TCP framing".into()))?;

        let write = async {
            stream.write_all(&len.to_be_bytes()).await?;
            stream.write_all(message_bytes).await?;
            stream.flush().await
        };
        tokio::time::timeout(timeout, write)
            .await
            .map_err(|_| DomainError::UpstreamError(format!("timeout sending TCP query to {}", self.server_addr)))?
            .map_err(|e| DomainError::UpstreamError(format!("send TCP query to {}: {e}", self.server_addr)))?;

        let mut len_buf = [0u8; 2];
        let read_len = async {
            stream.read_exact(&mut len_buf).await?;
            let response_len = u16::from_be_bytes(len_buf) as usize;
            let mut body = vec![0u8; response_len];
            stream.read_exact(&mut body).await?;
            Ok::<_, std::io::Error>(body)
        };
        let body = tokio::time::timeout(timeout, read_len)
            .await
            .map_err(|_| {
                DomainError::UpstreamError(format!("timeout waiting for TCP response from {}", self.server_addr))
            })?
            .map_err(|e| DomainError::UpstreamError(format!("read TCP response from {}: {e}", self.server_addr)))?;

        debug!(server = %self.server_addr, bytes_received = body.len(), "TCP response received");

        Ok(TransportResponse {
            bytes: body,
            protocol_used: "TCP",
        })
    }

    fn protocol_name(&self) -> &'static str {
        "TCP"
    }
}
