//! Wire/disk representation of profile-DB records (§4.2). The backend RPC
//! format is assumed opaque JSON (§1); these types are the DTO boundary
//! that lets `AuthSettings::verifier` — a trait object, not serializable —
//! round-trip through a snapshot as a plain password hash string.

use std::net::IpAddr;
use std::sync::Arc;

use argon2::password_hash::PasswordHash;
use argon2::{Argon2, PasswordVerifier as Argon2Verify};
use meridian_dns_domain::{
    AuthSettings, BlockingMode, Device, DeviceId, HumanIdLower, PasswordVerifier, Profile,
    ProfileId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingModeDto {
    NullIp,
    CustomIp,
    NxDomain,
}

impl From<BlockingModeDto> for BlockingMode {
    fn from(v: BlockingModeDto) -> Self {
        match v {
            BlockingModeDto::NullIp => BlockingMode::NullIp,
            BlockingModeDto::CustomIp => BlockingMode::CustomIp,
            BlockingModeDto::NxDomain => BlockingMode::NxDomain,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceDto {
    pub id: String,
    #[serde(default)]
    pub human_id_lower: Option<String>,
    #[serde(default)]
    pub auth_enabled: bool,
    #[serde(default)]
    pub doh_auth_only: bool,
    /// PHC-format argon2 hash, verified lazily through [`Argon2PasswordVerifier`].
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub linked_ip: Option<IpAddr>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProfileDto {
    pub id: String,
    #[serde(default)]
    pub deleted: bool,
    pub device_ids: Vec<String>,
    pub filtering_group_id: i64,
    pub blocking_mode: BlockingModeDto,
    #[serde(default)]
    pub linked_ip: Option<IpAddr>,
    #[serde(default)]
    pub dedicated_ips: Vec<IpAddr>,
}

/// One incremental or full sync response from the backend, or the
/// structure persisted to the on-disk snapshot.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SyncBatch {
    pub cursor: String,
    #[serde(default)]
    pub profiles: Vec<ProfileDto>,
    #[serde(default)]
    pub devices: Vec<DeviceDto>,
    /// Profile ids the backend reports as hard-deleted since the last
    /// cursor (incremental sync only; ignored by a full sync).
    #[serde(default)]
    pub removed_profile_ids: Vec<String>,
}

pub struct Argon2PasswordVerifier {
    hash: String,
}

impl Argon2PasswordVerifier {
    pub fn new(hash: String) -> Self {
        Self { hash }
    }
}

impl PasswordVerifier for Argon2PasswordVerifier {
    fn verify(&self, candidate: &[u8]) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.hash) else {
            return false;
        };
        Argon2::default().verify_password(candidate, &parsed).is_ok()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DtoError {
    #[error("bad device id '{0}' in profile-db record")]
    BadDeviceId(String),
    #[error("bad profile id '{0}' in profile-db record")]
    BadProfileId(String),
}

pub fn device_from_dto(dto: &DeviceDto) -> Result<Device, DtoError> {
    let id = DeviceId::parse(&dto.id).map_err(|_| DtoError::BadDeviceId(dto.id.clone()))?;
    let human_id_lower = dto
        .human_id_lower
        .as_deref()
        .map(HumanIdLower::from_raw);
    let verifier: Option<Arc<dyn PasswordVerifier>> = dto
        .password_hash
        .as_ref()
        .map(|h| Arc::new(Argon2PasswordVerifier::new(h.clone())) as Arc<dyn PasswordVerifier>);
    let auth = if dto.auth_enabled {
        AuthSettings {
            enabled: true,
            doh_auth_only: dto.doh_auth_only,
            verifier,
        }
    } else {
        AuthSettings::disabled()
    };
    Ok(Device {
        id,
        human_id_lower,
        auth,
        linked_ip: dto.linked_ip,
    })
}

pub fn profile_from_dto(dto: &ProfileDto) -> Result<Profile, DtoError> {
    let id = ProfileId::parse(&dto.id).map_err(|_| DtoError::BadProfileId(dto.id.clone()))?;
    let device_ids = dto
        .device_ids
        .iter()
        .filter_map(|raw| DeviceId::parse(raw).ok())
        .collect();
    Ok(Profile {
        id,
        deleted: dto.deleted,
        device_ids,
        filtering_group_id: dto.filtering_group_id,
        blocking_mode: dto.blocking_mode.into(),
        linked_ip: dto.linked_ip,
        dedicated_ips: dto.dedicated_ips.clone(),
    })
}
