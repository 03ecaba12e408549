use std::net::IpAddr;

use meridian_dns_domain::{Device, DeviceId, DomainError, HumanIdLower, Profile, ProfileId};

/// A (Profile, Device) pair borrowed from the profile database for the
/// duration of one query.
#[derive(Debug, Clone)]
pub struct ProfileDevice {
    pub profile: Profile,
    pub device: Device,
}

/// Application-layer port for the profile database (§4.2).
///
/// All lookups are synchronous and must complete in O(1) average using only
/// in-memory indexes — implementations must never call the backend from
/// these methods. `sync_incremental`/`sync_full` are async because they
/// perform backend RPC and disk I/O; they are driven by the refresh
/// scheduler via the `Refresher` port, not called directly on the hot path.
pub trait ProfileDbPort: Send + Sync {
    /// Look up a device by its global ID, along with its owning profile.
    /// `Err(DomainError::ProfileNotFound | DeviceNotFound)` is a benign
    /// negative result, not a failure.
    fn lookup_by_device_id(&self, device_id: &DeviceId) -> Result<ProfileDevice, DomainError>;

    /// Look up a device by (ProfileID, HumanIDLower).
    fn lookup_by_human_id(
        &self,
        profile_id: &ProfileId,
        human_id: &HumanIdLower,
    ) -> Result<ProfileDevice, DomainError>;

    /// Look up the (Profile, Device) pair a linked IP currently maps to.
    fn lookup_by_linked_ip(&self, ip: IpAddr) -> Result<ProfileDevice, DomainError>;

    /// Look up the (Profile, Device) pair a dedicated IP currently maps to.
    fn lookup_by_dedicated_ip(&self, ip: IpAddr) -> Result<ProfileDevice, DomainError>;

    /// Create a device descriptor on the fly for a (ProfileID, HumanIDLower)
    /// lookup that found the profile but no device (§4.2 "Auto-device
    /// creation"). The descriptor is recorded in memory only; it is
    /// reconciled with the backend by the next sync.
    fn auto_create_device(
        &self,
        profile_id: &ProfileId,
        human_id: &HumanIdLower,
        auto_auth_enabled: bool,
    ) -> Result<ProfileDevice, DomainError>;
}
