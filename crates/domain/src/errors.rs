use thiserror::Error;

/// Structured cause of a device-lookup failure, carried inside
/// [`DomainError::DeviceResultError`] so callers can match on it without
/// string-parsing. These are client-caused (malformed SNI, unknown device
/// triple, ...) and are therefore *not* Sentry-reportable by default.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceLookupCause {
    #[error("invalid device id: {0}")]
    InvalidDeviceId(String),
    #[error("invalid profile id: {0}")]
    InvalidProfileId(String),
    #[error("invalid human-readable device label: {0}")]
    InvalidHumanId(String),
    #[error("unrecognized device type: {0}")]
    UnknownDeviceType(String),
    #[error("malformed extended human-id triple: {0}")]
    MalformedExtendedId(String),
    #[error("SNI does not match any configured device domain")]
    NoMatchingDeviceDomain,
    #[error("server protocol does not carry device identity")]
    ProtocolHasNoDeviceChannel,
    #[error("no device or profile matches: {0}")]
    NotFound(String),
}

/// Cause of an authentication failure (`DeviceResult::AuthenticationFailure`).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailureCause {
    #[error("device requires DoH transport")]
    NotDoH,
    #[error("no HTTP Basic userinfo present")]
    NoUserInfo,
    #[error("userinfo carried no password")]
    NoPassword,
    #[error("password verification failed")]
    AuthenticationFailed,
}

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("invalid IP address: {0}")]
    InvalidIpAddress(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("profile not found")]
    ProfileNotFound,

    #[error("device not found")]
    DeviceNotFound,

    #[error("dedicated IP is not assigned to any profile")]
    UnknownDedicated,

    #[error("device lookup failed: {0}")]
    DeviceResultError(#[from] DeviceLookupCause),

    #[error("authentication failed: {0}")]
    AuthenticationFailure(AuthFailureCause),

    #[error("query rate-limited")]
    RateLimited,

    #[error("client subnet is in back-off")]
    BackedOff,

    #[error("access denied by policy")]
    AccessDenied,

    #[error("upstream forwarding failed: {0}")]
    UpstreamError(String),

    #[error("all upstreams excluded")]
    NoHealthyUpstream,

    #[error("query handling timed out")]
    HandleTimeout,

    #[error("backend sync failed: {0}")]
    SyncError(String),

    #[error("snapshot I/O error: {0}")]
    SnapshotError(String),

    #[error("malformed DNS message: {0}")]
    MalformedMessage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// True for errors that are client-caused (bad device data) and must
    /// not be routed to the error collector (§7).
    pub fn is_client_caused(&self) -> bool {
        matches!(
            self,
            DomainError::DeviceResultError(_)
                | DomainError::AuthenticationFailure(_)
                | DomainError::ProfileNotFound
                | DomainError::DeviceNotFound
                | DomainError::UnknownDedicated
        )
    }
}
