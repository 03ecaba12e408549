//! Device identity classification (§4.3). Inspects the channels carried on
//! `RequestInfo` in protocol-dependent precedence order and resolves them
//! against the profile database.

use std::sync::Arc;

use meridian_dns_domain::{
    AuthFailureCause, DeviceId, DeviceLookupCause, DeviceResult, HumanId, ProfileId, Protocol,
    RequestInfo,
};

use crate::ports::custom_domain::CustomDomainPort;
use crate::ports::profile_db::{ProfileDbPort, ProfileDevice};

/// Parsed device-identity candidate before it is resolved against the
/// profile database.
enum Candidate {
    ById(DeviceId),
    ByHuman { profile_id: ProfileId, human_id: HumanId },
}

fn parse_candidate(raw: &str) -> Result<Candidate, DeviceLookupCause> {
    if let Some((device_type, rest)) = raw.split_once('-') {
        if let Some((profile_part, human_part)) = rest.split_once('-') {
            if !device_type.is_empty() && device_type.chars().all(|c| c.is_ascii_alphanumeric()) {
                let profile_id = ProfileId::parse(profile_part);
                let human_id = HumanId::parse(human_part);
                if let (Ok(profile_id), Ok(human_id)) = (profile_id, human_id) {
                    return Ok(Candidate::ByHuman { profile_id, human_id });
                }
                return Err(DeviceLookupCause::MalformedExtendedId(raw.to_string()));
            }
        }
    }
    DeviceId::parse(raw).map(Candidate::ById)
}

/// Device finder: a pure function of (request, device domains, profile DB)
/// per §8 "Device-finder determinism".
pub struct DeviceFinder {
    custom_domain: Option<Arc<dyn CustomDomainPort>>,
}

impl DeviceFinder {
    pub fn new() -> Self {
        Self { custom_domain: None }
    }

    pub fn with_custom_domain(mut self, port: Arc<dyn CustomDomainPort>) -> Self {
        self.custom_domain = Some(port);
        self
    }

    /// Find the device for `request`. Returns `None` when no identity
    /// channel applies at all — the query is anonymous and proceeds with
    /// default (non-profile) policy. Returns `Some(result)` once a channel
    /// was consulted, with `result` one of the four `DeviceResult` variants.
    pub fn find(
        &self,
        request: &RequestInfo,
        device_domains: &[String],
        linked_ip_enabled: bool,
        auto_device_auth_enabled: bool,
        profile_db: &dyn ProfileDbPort,
    ) -> Option<DeviceResult> {
        let protocol = request.protocol();

        if !protocol.supports_device_channel() {
            return Some(DeviceResult::Error(
                DeviceLookupCause::ProtocolHasNoDeviceChannel,
            ));
        }

        if protocol == Protocol::Doh {
            if let Some(user_info) = &request.transport.http_user_info {
                return Some(self.resolve_candidate_then_auth(
                    parse_candidate(&user_info.username),
                    request,
                    auto_device_auth_enabled,
                    profile_db,
                ));
            }
            if let Some(path) = &request.transport.http_path {
                if let Some(segment) = path.rsplit('/').find(|s| !s.is_empty()) {
                    return Some(self.resolve_candidate_then_auth(
                        parse_candidate(segment),
                        request,
                        auto_device_auth_enabled,
                        profile_db,
                    ));
                }
            }
        }

        if protocol.supports_tls_sni() {
            if let Some(sni) = &request.transport.tls_server_name {
                if let Some(custom_domain) = &self.custom_domain {
                    if let Some(m) = custom_domain.match_sni(sni) {
                        let result = self.resolve_candidate_then_auth(
                            parse_candidate(&m.label),
                            request,
                            auto_device_auth_enabled,
                            profile_db,
                        );
                        return Some(restrict_to_profiles(result, &m.allowed_profiles));
                    }
                }
                if let Some(label) = device_label_from_sni(device_domains, sni) {
                    return Some(self.resolve_candidate_then_auth(
                        parse_candidate(label),
                        request,
                        auto_device_auth_enabled,
                        profile_db,
                    ));
                }
            }
        }

        if protocol == Protocol::Plain {
            if let Some(cpe_id) = &request.transport.edns0_cpe_id {
                return Some(self.resolve_candidate_then_auth(
                    parse_candidate(cpe_id),
                    request,
                    auto_device_auth_enabled,
                    profile_db,
                ));
            }

            if request.server.bind.is_interface_bound() {
                return Some(
                    match profile_db.lookup_by_dedicated_ip(request.local_addr.ip()) {
                        Ok(pd) => DeviceResult::Ok {
                            device: pd.device,
                            profile: pd.profile,
                        },
                        Err(_) => DeviceResult::UnknownDedicated,
                    },
                );
            }

            if linked_ip_enabled {
                if let Ok(pd) = profile_db.lookup_by_linked_ip(request.remote_addr.ip()) {
                    return Some(DeviceResult::Ok {
                        device: pd.device,
                        profile: pd.profile,
                    });
                }
            }
        }

        None
    }

    fn resolve_candidate_then_auth(
        &self,
        candidate: Result<Candidate, DeviceLookupCause>,
        request: &RequestInfo,
        auto_device_auth_enabled: bool,
        profile_db: &dyn ProfileDbPort,
    ) -> DeviceResult {
        let pd = match candidate {
            Err(cause) => return DeviceResult::Error(cause),
            Ok(Candidate::ById(device_id)) => profile_db.lookup_by_device_id(&device_id),
            Ok(Candidate::ByHuman { profile_id, human_id }) => {
                let human_lower = human_id.normalize();
                match profile_db.lookup_by_human_id(&profile_id, &human_lower) {
                    Ok(pd) => Ok(pd),
                    Err(_) => profile_db.auto_create_device(
                        &profile_id,
                        &human_lower,
                        auto_device_auth_enabled,
                    ),
                }
            }
        };

        let pd = match pd {
            Ok(pd) if pd.profile.is_visible() => pd,
            Ok(pd) => {
                return DeviceResult::Error(DeviceLookupCause::NotFound(format!(
                    "profile {} is deleted",
                    pd.profile.id
                )))
            }
            Err(err) => {
                return DeviceResult::Error(DeviceLookupCause::NotFound(err.to_string()))
            }
        };

        match authenticate(request, &pd) {
            Ok(()) => DeviceResult::Ok {
                device: pd.device,
                profile: pd.profile,
            },
            Err(cause) => DeviceResult::AuthenticationFailure(cause),
        }
    }
}

impl Default for DeviceFinder {
    fn default() -> Self {
        Self::new()
    }
}

/// §4.3 "Authentication".
fn authenticate(request: &RequestInfo, pd: &ProfileDevice) -> Result<(), AuthFailureCause> {
    let auth = &pd.device.auth;
    if !auth.enabled {
        return Ok(());
    }

    let is_doh = request.protocol() == Protocol::Doh;

    if !is_doh {
        if auth.doh_auth_only {
            return Err(AuthFailureCause::NotDoH);
        }
        return Ok(());
    }

    let user_info = match &request.transport.http_user_info {
        Some(u) => u,
        None => {
            if auth.doh_auth_only {
                return Err(AuthFailureCause::NoUserInfo);
            }
            return Ok(());
        }
    };

    let password = match &user_info.password {
        Some(p) => p,
        None => return Err(AuthFailureCause::NoPassword),
    };

    let verified = auth
        .verifier
        .as_ref()
        .map(|v| v.verify(password.as_bytes()))
        .unwrap_or(false);

    if verified {
        Ok(())
    } else {
        Err(AuthFailureCause::AuthenticationFailed)
    }
}

fn device_label_from_sni<'a>(device_domains: &[String], sni: &'a str) -> Option<&'a str> {
    for domain in device_domains {
        let suffix = format!(".{domain}");
        if let Some(label) = sni.strip_suffix(&suffix) {
            if !label.is_empty() {
                return Some(label);
            }
        }
    }
    None
}

fn restrict_to_profiles(result: DeviceResult, allowed: &[ProfileId]) -> DeviceResult {
    match result {
        DeviceResult::Ok { device, profile } if allowed.contains(&profile.id) => {
            DeviceResult::Ok { device, profile }
        }
        DeviceResult::Ok { .. } => DeviceResult::Error(DeviceLookupCause::InvalidProfileId(
            "profile not permitted under this custom domain".to_string(),
        )),
        other => other,
    }
}
