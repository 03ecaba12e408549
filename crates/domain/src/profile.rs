//! Profile and device records served by the profile database (§4.2).

use crate::ids::{DeviceId, HumanIdLower, ProfileId};
use std::net::IpAddr;
use std::sync::Arc;

/// How a blocked query should be answered for a given profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingMode {
    /// Answer with the unspecified address (0.0.0.0 / ::).
    NullIp,
    /// Answer with an explicit address taken from the matching rule.
    CustomIp,
    /// Answer NXDOMAIN, optionally carrying an Extended DNS Error.
    NxDomain,
}

/// Verifies a candidate password against a stored hash. Boxed so different
/// hashing schemes (argon2 in production, a constant-time literal compare in
/// tests) can be swapped without touching `Device`.
pub trait PasswordVerifier: Send + Sync {
    fn verify(&self, candidate: &[u8]) -> bool;
}

#[derive(Clone)]
pub struct AuthSettings {
    pub enabled: bool,
    pub doh_auth_only: bool,
    pub verifier: Option<Arc<dyn PasswordVerifier>>,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("enabled", &self.enabled)
            .field("doh_auth_only", &self.doh_auth_only)
            .field("verifier", &self.verifier.is_some())
            .finish()
    }
}

impl AuthSettings {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            doh_auth_only: false,
            verifier: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Device {
    pub id: DeviceId,
    pub human_id_lower: Option<HumanIdLower>,
    pub auth: AuthSettings,
    pub linked_ip: Option<IpAddr>,
}

#[derive(Debug, Clone)]
pub struct Profile {
    pub id: ProfileId,
    pub deleted: bool,
    pub device_ids: Vec<DeviceId>,
    pub filtering_group_id: i64,
    pub blocking_mode: BlockingMode,
    pub linked_ip: Option<IpAddr>,
    pub dedicated_ips: Vec<IpAddr>,
}

impl Profile {
    /// True when this profile should be treated as absent by readers
    /// (§4.2 "Deleted profiles").
    pub fn is_visible(&self) -> bool {
        !self.deleted
    }

    pub fn owns_device(&self, id: &DeviceId) -> bool {
        self.device_ids.iter().any(|d| d == id)
    }
}
