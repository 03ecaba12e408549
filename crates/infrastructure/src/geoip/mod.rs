//! GeoIP resolver (§2): memory-mapped MaxMind country/ASN databases,
//! re-opened on a timer so a rotated database file on disk is picked up
//! without a restart.
//!
//! Grounded on the same `ArcSwap`-published-snapshot idiom as the filter
//! engine and profile database, applied here to a pair of `maxminddb`
//! readers instead of a compiled rule index.

use std::net::IpAddr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use ipnetwork::IpNetwork;
use maxminddb::{geoip2, Reader};
use meridian_dns_application::ports::geoip::{GeoIpInfo, GeoIpPort};
use meridian_dns_application::ports::refresh::{RefreshContext, Refresher};
use meridian_dns_domain::config::GeoIpConfig;
use meridian_dns_domain::DomainError;
use tracing::{info, warn};

#[derive(Default)]
struct Databases {
    country: Option<Reader<Vec<u8>>>,
    asn: Option<Reader<Vec<u8>>>,
}

/// `GeoIpPort` + `Refresher` adapter.
pub struct MaxMindGeoIp {
    databases: ArcSwap<Databases>,
    config: GeoIpConfig,
}

impl MaxMindGeoIp {
    pub fn new(config: GeoIpConfig) -> Result<Self, DomainError> {
        let databases = if config.enabled {
            open_databases(&config)?
        } else {
            Databases::default()
        };
        Ok(Self {
            databases: ArcSwap::new(Arc::new(databases)),
            config,
        })
    }
}

fn open_databases(config: &GeoIpConfig) -> Result<Databases, DomainError> {
    let country = config
        .country_db_path
        .as_deref()
        .map(Reader::open_readfile)
        .transpose()
        .map_err(|e| DomainError::SyncError(format!("open country db: {e}")))?;
    let asn = config
        .asn_db_path
        .as_deref()
        .map(Reader::open_readfile)
        .transpose()
        .map_err(|e| DomainError::SyncError(format!("open asn db: {e}")))?;
    Ok(Databases { country, asn })
}

impl GeoIpPort for MaxMindGeoIp {
    fn lookup_ip(&self, ip: IpAddr) -> Option<GeoIpInfo> {
        if !self.config.enabled {
            return None;
        }
        let databases = self.databases.load();

        let country_iso_code = databases
            .country
            .as_ref()
            .and_then(|reader| reader.lookup::<geoip2::Country>(ip).ok().flatten())
            .and_then(|record| record.country)
            .and_then(|country| country.iso_code)
            .map(str::to_string);

        let asn_record = databases
            .asn
            .as_ref()
            .and_then(|reader| reader.lookup::<geoip2::Asn>(ip).ok().flatten());
        let asn = asn_record.as_ref().and_then(|r| r.autonomous_system_number);
        let asn_org = asn_record
            .as_ref()
            .and_then(|r| r.autonomous_system_organization)
            .map(str::to_string);

        if country_iso_code.is_none() && asn.is_none() && asn_org.is_none() {
            return None;
        }
        Some(GeoIpInfo {
            country_iso_code,
            asn,
            asn_org,
        })
    }

    /// Upstream server addresses throughout this config are literal IPs
    /// (`UpstreamServer::address`), never DNS names, so resolution here is
    /// just parse-then-mask; a bare hostname with no literal address
    /// returns `None` rather than blocking the hot path on a resolver call.
    fn lookup_hostname_subnet(&self, hostname: &str) -> Option<IpNetwork> {
        let addr: IpAddr = hostname.parse().ok()?;
        let prefix = match addr {
            IpAddr::V4(_) => 24,
            IpAddr::V6(_) => 48,
        };
        IpNetwork::new(addr, prefix).ok()
    }

    async fn reload(&self) -> Result<(), DomainError> {
        if !self.config.enabled {
            return Ok(());
        }
        let databases = open_databases(&self.config)?;
        info!(
            country = self.config.country_db_path.as_deref().unwrap_or(""),
            asn = self.config.asn_db_path.as_deref().unwrap_or(""),
            "geoip databases reopened"
        );
        self.databases.store(Arc::new(databases));
        Ok(())
    }
}

#[async_trait]
impl Refresher for MaxMindGeoIp {
    async fn refresh(&self, ctx: &RefreshContext) -> Result<(), DomainError> {
        if ctx.is_expired() {
            return Err(DomainError::HandleTimeout);
        }
        tokio::select! {
            result = self.reload() => {
                if let Err(err) = &result {
                    warn!(error = %err, "geoip reload failed, keeping stale databases");
                }
                result
            }
            _ = ctx.shutdown.cancelled() => Ok(()),
        }
    }
}
