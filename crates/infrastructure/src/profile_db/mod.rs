//! Profile database adapter (§4.2): O(1) in-memory indexes synced from an
//! opaque backend RPC endpoint, snapshotted to disk so a restart doesn't
//! need to wait on the backend before serving queries.

mod dto;
mod index;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use meridian_dns_application::ports::profile_db::{ProfileDbPort, ProfileDevice};
use meridian_dns_application::ports::refresh::{RefreshContext, Refresher};
use meridian_dns_domain::config::{BackendConfig, SnapshotConfig};
use meridian_dns_domain::{Device, DeviceId, DomainError, HumanIdLower, ProfileId};
use tracing::{debug, info, warn};

pub use dto::SyncBatch;
pub use index::ProfileIndex;

fn to_profile_device(r: index::Resolved) -> ProfileDevice {
    ProfileDevice {
        profile: r.profile,
        device: r.device,
    }
}

/// `ProfileDbPort` + `Refresher` adapter. Lookups are lock-light DashMap
/// reads through an `ArcSwap` snapshot; `refresh` performs the backend
/// sync (incremental, falling back to full on cursor loss) and the
/// periodic disk snapshot write.
pub struct BackendProfileDb {
    index: ArcSwap<ProfileIndex>,
    http_client: reqwest::Client,
    backend: BackendConfig,
    snapshot: SnapshotConfig,
}

impl BackendProfileDb {
    /// Load the on-disk snapshot if present (fast boot, stale data served
    /// until the first sync completes), otherwise start empty.
    pub fn new(backend: BackendConfig, snapshot: SnapshotConfig) -> Result<Self, DomainError> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(backend.timeout_ms))
            .build()
            .map_err(|e| DomainError::InvalidConfig(e.to_string()))?;

        let index = load_snapshot(Path::new(&snapshot.path))
            .unwrap_or_else(|| {
                info!(path = %snapshot.path, "no profile-db snapshot on disk, starting empty");
                ProfileIndex::empty()
            });

        Ok(Self {
            index: ArcSwap::new(Arc::new(index)),
            http_client,
            backend,
            snapshot,
        })
    }

    async fn fetch_batch(&self, cursor: Option<&str>) -> Result<SyncBatch, DomainError> {
        let mut req = self.http_client.get(&self.backend.endpoint);
        if let Some(key) = &self.backend.api_key {
            req = req.bearer_auth(key);
        }
        if let Some(cursor) = cursor {
            req = req.query(&[("cursor", cursor)]);
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = async {
                let resp = req
                    .try_clone()
                    .expect("request has no streaming body")
                    .send()
                    .await
                    .map_err(|e| DomainError::SyncError(e.to_string()))?;
                resp.error_for_status_ref()
                    .map_err(|e| DomainError::SyncError(e.to_string()))?;
                resp.json::<SyncBatch>()
                    .await
                    .map_err(|e| DomainError::SyncError(e.to_string()))
            }
            .await;

            match result {
                Ok(batch) => return Ok(batch),
                Err(err) if attempt >= self.backend.retry_attempts => return Err(err),
                Err(err) => {
                    warn!(attempt, error = %err, "profile-db backend sync attempt failed, retrying");
                }
            }
        }
    }

    /// Incremental sync against the currently held cursor. On fetch
    /// failure the call returns `Err` before touching the index at all —
    /// cursor rollback is free because the cursor only ever advances after
    /// `apply_batch` merges a batch that was fully received.
    async fn sync_incremental(&self) -> Result<(), DomainError> {
        let current = self.index.load_full();
        let cursor = current.cursor();
        let batch = self
            .fetch_batch(if cursor.is_empty() { None } else { Some(&cursor) })
            .await?;
        current.apply_batch(&batch);
        Ok(())
    }

    async fn sync_full(&self) -> Result<(), DomainError> {
        let batch = self.fetch_batch(None).await?;
        let new_index = ProfileIndex::from_batch(&batch);
        self.index.store(Arc::new(new_index));
        Ok(())
    }

    fn write_snapshot(&self) -> Result<(), DomainError> {
        write_snapshot_atomic(Path::new(&self.snapshot.path), &self.index.load().snapshot_batch())
    }
}

fn load_snapshot(path: &Path) -> Option<ProfileIndex> {
    let bytes = std::fs::read(path).ok()?;
    let batch: SyncBatch = serde_json::from_slice(&bytes).ok()?;
    Some(ProfileIndex::from_batch(&batch))
}

/// Write-then-rename: never leaves a torn snapshot on disk even if the
/// process dies mid-write.
fn write_snapshot_atomic(path: &Path, batch: &SyncBatch) -> Result<(), DomainError> {
    let tmp_path: PathBuf = path.with_extension("tmp");
    let bytes = serde_json::to_vec(batch)
        .map_err(|e| DomainError::SnapshotError(format!("serialize snapshot: {e}")))?;
    std::fs::write(&tmp_path, &bytes)
        .map_err(|e| DomainError::SnapshotError(format!("write {}: {e}", tmp_path.display())))?;
    std::fs::rename(&tmp_path, path)
        .map_err(|e| DomainError::SnapshotError(format!("rename into {}: {e}", path.display())))?;
    Ok(())
}

impl ProfileDbPort for BackendProfileDb {
    fn lookup_by_device_id(&self, device_id: &DeviceId) -> Result<ProfileDevice, DomainError> {
        self.index
            .load()
            .lookup_by_device_id(device_id)
            .map(to_profile_device)
            .ok_or(DomainError::DeviceNotFound)
    }

    fn lookup_by_human_id(
        &self,
        profile_id: &ProfileId,
        human_id: &HumanIdLower,
    ) -> Result<ProfileDevice, DomainError> {
        self.index
            .load()
            .lookup_by_human_id(profile_id, human_id)
            .map(to_profile_device)
            .ok_or(DomainError::DeviceNotFound)
    }

    fn lookup_by_linked_ip(&self, ip: std::net::IpAddr) -> Result<ProfileDevice, DomainError> {
        self.index
            .load()
            .lookup_by_linked_ip(ip)
            .map(to_profile_device)
            .ok_or(DomainError::ProfileNotFound)
    }

    fn lookup_by_dedicated_ip(&self, ip: std::net::IpAddr) -> Result<ProfileDevice, DomainError> {
        self.index
            .load()
            .lookup_by_dedicated_ip(ip)
            .map(to_profile_device)
            .ok_or(DomainError::UnknownDedicated)
    }

    fn auto_create_device(
        &self,
        profile_id: &ProfileId,
        human_id: &HumanIdLower,
        auto_auth_enabled: bool,
    ) -> Result<ProfileDevice, DomainError> {
        let index = self.index.load();
        let profile = index.get_profile(profile_id).ok_or(DomainError::ProfileNotFound)?;

        let device_id = DeviceId::parse(&format!("{profile_id}-{human_id}"))
            .unwrap_or_else(|_| DeviceId::parse(profile_id.as_str()).expect("profile id is a valid device id"));

        let device = Device {
            id: device_id,
            human_id_lower: Some(human_id.clone()),
            auth: if auto_auth_enabled {
                meridian_dns_domain::AuthSettings {
                    enabled: true,
                    doh_auth_only: false,
                    verifier: None,
                }
            } else {
                meridian_dns_domain::AuthSettings::disabled()
            },
            linked_ip: None,
        };

        index.insert_auto_device(profile_id, device.clone(), human_id.clone());

        let mut profile = profile;
        if !profile.owns_device(&device.id) {
            profile.device_ids.push(device.id.clone());
        }
        Ok(ProfileDevice { profile, device })
    }
}

#[async_trait]
impl Refresher for BackendProfileDb {
    async fn refresh(&self, ctx: &RefreshContext) -> Result<(), DomainError> {
        if ctx.is_expired() {
            return Err(DomainError::HandleTimeout);
        }

        let has_cursor = !self.index.load().cursor().is_empty();
        let sync_result = tokio::select! {
            result = async {
                if has_cursor {
                    self.sync_incremental().await
                } else {
                    self.sync_full().await
                }
            } => result,
            _ = ctx.shutdown.cancelled() => return Ok(()),
        };

        if let Err(err) = &sync_result {
            warn!(error = %err, "profile-db sync failed, serving stale data");
        }

        if let Err(err) = self.write_snapshot() {
            warn!(error = %err, "profile-db snapshot write failed");
        } else {
            debug!(path = %self.snapshot.path, "profile-db snapshot written");
        }

        sync_result
    }
}
