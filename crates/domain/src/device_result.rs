//! `DeviceResult`, the closed sum type produced by the device finder (§4.3,
//! §9 "Sum types").

use crate::errors::{AuthFailureCause, DeviceLookupCause};
use crate::profile::{Device, Profile};

/// Result of locating a device for one inbound query. Exactly one of four
/// variants — consumers must handle all of them (no default/wildcard arm
/// in the pipeline's match).
#[derive(Debug, Clone)]
pub enum DeviceResult {
    /// Device and owning profile were found and (if required) authenticated.
    Ok { device: Device, profile: Profile },
    /// A channel carried malformed or unrecognized device data. Client-caused;
    /// not reported to the error collector.
    Error(DeviceLookupCause),
    /// The device was found but failed authentication.
    AuthenticationFailure(AuthFailureCause),
    /// The query arrived on a dedicated IP with no matching profile.
    UnknownDedicated,
}

impl DeviceResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, DeviceResult::Ok { .. })
    }
}
