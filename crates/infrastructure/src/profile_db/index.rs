//! In-memory O(1) indexes over the synced profile/device set (§4.2).

use std::net::IpAddr;
use std::sync::Mutex;

use dashmap::DashMap;
use meridian_dns_domain::{Device, DeviceId, HumanIdLower, Profile, ProfileId};
use rustc_hash::FxBuildHasher;

use super::dto::{device_from_dto, profile_from_dto, SyncBatch};

type FxDashMap<K, V> = DashMap<K, V, FxBuildHasher>;

/// A (profile, device) lookup result, materialized on read.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub profile: Profile,
    pub device: Device,
}

/// The live profile/device set plus the cursor it was synced at. The
/// DashMaps give every lookup interior mutability through `&self`, so
/// `apply_batch` can merge a new sync batch into an index that's already
/// published and being read concurrently; the cursor gets the same
/// treatment via a `Mutex` rather than requiring a full index swap.
pub struct ProfileIndex {
    cursor: Mutex<String>,
    profiles: FxDashMap<ProfileId, Profile>,
    devices: FxDashMap<DeviceId, Device>,
    device_to_profile: FxDashMap<DeviceId, ProfileId>,
    by_human_id: FxDashMap<(ProfileId, HumanIdLower), DeviceId>,
    by_linked_ip: FxDashMap<IpAddr, (ProfileId, Option<DeviceId>)>,
    by_dedicated_ip: FxDashMap<IpAddr, ProfileId>,
}

impl ProfileIndex {
    pub fn empty() -> Self {
        Self {
            cursor: Mutex::new(String::new()),
            profiles: FxDashMap::default(),
            devices: FxDashMap::default(),
            device_to_profile: FxDashMap::default(),
            by_human_id: FxDashMap::default(),
            by_linked_ip: FxDashMap::default(),
            by_dedicated_ip: FxDashMap::default(),
        }
    }

    pub fn from_batch(batch: &SyncBatch) -> Self {
        let index = Self::empty();
        index.apply_batch(batch);
        index
    }

    pub fn cursor(&self) -> String {
        self.cursor.lock().expect("cursor lock poisoned").clone()
    }

    /// Merge a batch into this index in place: upserts profiles/devices,
    /// removes hard-deleted profiles, rebuilds the secondary indexes those
    /// records touch, then advances the cursor. Callers that need
    /// cursor-rollback semantics must not call this until the batch is
    /// known to have been fetched successfully in full.
    pub fn apply_batch(&self, batch: &SyncBatch) {
        for dto in &batch.devices {
            let Ok(device) = device_from_dto(dto) else {
                continue;
            };
            self.devices.insert(device.id.clone(), device);
        }

        for dto in &batch.profiles {
            let Ok(profile) = profile_from_dto(dto) else {
                continue;
            };
            for device_id in &profile.device_ids {
                self.device_to_profile
                    .insert(device_id.clone(), profile.id.clone());
                if let Some(device) = self.devices.get(device_id) {
                    if let Some(human) = &device.human_id_lower {
                        self.by_human_id
                            .insert((profile.id.clone(), human.clone()), device_id.clone());
                    }
                    if let Some(ip) = device.linked_ip {
                        self.by_linked_ip
                            .insert(ip, (profile.id.clone(), Some(device_id.clone())));
                    }
                }
            }
            if let Some(ip) = profile.linked_ip {
                self.by_linked_ip.entry(ip).or_insert((profile.id.clone(), None));
            }
            for ip in &profile.dedicated_ips {
                self.by_dedicated_ip.insert(*ip, profile.id.clone());
            }
            self.profiles.insert(profile.id.clone(), profile);
        }

        for removed in &batch.removed_profile_ids {
            if let Ok(id) = ProfileId::parse(removed) {
                if let Some((_, profile)) = self.profiles.remove(&id) {
                    for device_id in &profile.device_ids {
                        self.devices.remove(device_id);
                        self.device_to_profile.remove(device_id);
                    }
                }
            }
        }

        *self.cursor.lock().expect("cursor lock poisoned") = batch.cursor.clone();
    }

    fn synthesize_device(&self, profile_id: &ProfileId, linked_ip: Option<IpAddr>) -> Device {
        let id = DeviceId::parse(profile_id.as_str())
            .unwrap_or_else(|_| DeviceId::parse("anon").expect("static id is valid"));
        Device {
            id,
            human_id_lower: None,
            auth: meridian_dns_domain::AuthSettings::disabled(),
            linked_ip,
        }
    }

    pub fn lookup_by_device_id(&self, device_id: &DeviceId) -> Option<Resolved> {
        let device = self.devices.get(device_id)?.clone();
        let profile_id = self.device_to_profile.get(device_id)?.clone();
        let profile = self.profiles.get(&profile_id)?.clone();
        Some(Resolved { profile, device })
    }

    pub fn lookup_by_human_id(
        &self,
        profile_id: &ProfileId,
        human_id: &HumanIdLower,
    ) -> Option<Resolved> {
        let device_id = self
            .by_human_id
            .get(&(profile_id.clone(), human_id.clone()))?
            .clone();
        let profile = self.profiles.get(profile_id)?.clone();
        let device = self.devices.get(&device_id)?.clone();
        Some(Resolved { profile, device })
    }

    pub fn lookup_by_linked_ip(&self, ip: IpAddr) -> Option<Resolved> {
        let (profile_id, device_id) = self.by_linked_ip.get(&ip)?.clone();
        let profile = self.profiles.get(&profile_id)?.clone();
        let device = match device_id {
            Some(id) => self.devices.get(&id)?.clone(),
            None => self.synthesize_device(&profile_id, Some(ip)),
        };
        Some(Resolved { profile, device })
    }

    pub fn lookup_by_dedicated_ip(&self, ip: IpAddr) -> Option<Resolved> {
        let profile_id = self.by_dedicated_ip.get(&ip)?.clone();
        let profile = self.profiles.get(&profile_id)?.clone();
        let device = self.synthesize_device(&profile_id, None);
        Some(Resolved { profile, device })
    }

    /// Insert a just-created device (§4.2 "Auto-device creation"), index it
    /// by human id, and attach it to its owning profile so the next lookup
    /// resolves without re-creating.
    pub fn insert_auto_device(&self, profile_id: &ProfileId, device: Device, human_id: HumanIdLower) {
        self.by_human_id
            .insert((profile_id.clone(), human_id), device.id.clone());
        self.device_to_profile
            .insert(device.id.clone(), profile_id.clone());
        if let Some(mut profile) = self.profiles.get_mut(profile_id) {
            if !profile.owns_device(&device.id) {
                profile.device_ids.push(device.id.clone());
            }
        }
        self.devices.insert(device.id.clone(), device);
    }

    pub fn get_profile(&self, profile_id: &ProfileId) -> Option<Profile> {
        self.profiles.get(profile_id).map(|p| p.clone())
    }

    pub fn snapshot_batch(&self) -> SyncBatch {
        use super::dto::{BlockingModeDto, DeviceDto, ProfileDto};
        use meridian_dns_domain::BlockingMode;

        let devices = self
            .devices
            .iter()
            .map(|entry| {
                let d = entry.value();
                DeviceDto {
                    id: d.id.as_str().to_string(),
                    human_id_lower: d.human_id_lower.as_ref().map(|h| h.as_str().to_string()),
                    auth_enabled: d.auth.enabled,
                    doh_auth_only: d.auth.doh_auth_only,
                    password_hash: None,
                    linked_ip: d.linked_ip,
                }
            })
            .collect();

        let profiles = self
            .profiles
            .iter()
            .map(|entry| {
                let p = entry.value();
                ProfileDto {
                    id: p.id.as_str().to_string(),
                    deleted: p.deleted,
                    device_ids: p.device_ids.iter().map(|d| d.as_str().to_string()).collect(),
                    filtering_group_id: p.filtering_group_id,
                    blocking_mode: match p.blocking_mode {
                        BlockingMode::NullIp => BlockingModeDto::NullIp,
                        BlockingMode::CustomIp => BlockingModeDto::CustomIp,
                        BlockingMode::NxDomain => BlockingModeDto::NxDomain,
                    },
                    linked_ip: p.linked_ip,
                    dedicated_ips: p.dedicated_ips.clone(),
                }
            })
            .collect();

        SyncBatch {
            cursor: self.cursor(),
            profiles,
            devices,
            removed_profile_ids: Vec::new(),
        }
    }
}
