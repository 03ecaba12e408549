//! Identity value types: `ProfileId`, `DeviceId`, `HumanId` / `HumanIdLower`.
//!
//! All three are restricted-charset strings validated once at construction
//! and then passed around as cheap `Arc<str>`-backed values (teacher
//! convention, see `ClientSubnet::subnet_cidr` in the original domain crate).

use crate::errors::DeviceLookupCause;
use compact_str::CompactString;
use std::fmt;

fn is_profile_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn is_hostname_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

/// Opaque short identifier for a profile. Charset-restricted so it can be
/// embedded verbatim in a DNS label (SNI device domain, EDNS0 payload).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProfileId(CompactString);

impl ProfileId {
    pub fn parse(raw: &str) -> Result<Self, DeviceLookupCause> {
        if raw.is_empty() || raw.len() > 32 {
            return Err(DeviceLookupCause::InvalidProfileId(raw.to_string()));
        }
        if !raw.chars().all(is_profile_id_char) {
            return Err(DeviceLookupCause::InvalidProfileId(raw.to_string()));
        }
        Ok(Self(CompactString::from(raw)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hostname-label-safe device identifier (valid under a DNS label, e.g. as
/// an SNI prefix or a URL path segment).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(CompactString);

impl DeviceId {
    pub fn parse(raw: &str) -> Result<Self, DeviceLookupCause> {
        if raw.is_empty() || raw.len() > 63 {
            return Err(DeviceLookupCause::InvalidDeviceId(raw.to_string()));
        }
        if !raw.chars().all(is_hostname_label_char)
            || raw.starts_with('-')
            || raw.ends_with('-')
        {
            return Err(DeviceLookupCause::InvalidDeviceId(raw.to_string()));
        }
        Ok(Self(CompactString::from(raw)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User-visible device label, as originally typed by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HumanId(CompactString);

/// Normalized form of a [`HumanId`] used as a lookup key: lower-cased, with
/// runs of `_`/`.`/` ` collapsed to a single `-`. Two human-IDs that differ
/// only by case or separator style resolve to the same device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HumanIdLower(CompactString);

impl HumanId {
    pub fn parse(raw: &str) -> Result<Self, DeviceLookupCause> {
        if raw.is_empty() || raw.len() > 128 {
            return Err(DeviceLookupCause::InvalidHumanId(raw.to_string()));
        }
        Ok(Self(CompactString::from(raw)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn normalize(&self) -> HumanIdLower {
        HumanIdLower::from_raw(&self.0)
    }
}

impl HumanIdLower {
    pub fn from_raw(raw: &str) -> Self {
        let mut out = CompactString::with_capacity(raw.len());
        let mut last_was_sep = false;
        for c in raw.trim().chars() {
            let lower = c.to_ascii_lowercase();
            if lower == '_' || lower == '.' || lower == ' ' {
                if !last_was_sep && !out.is_empty() {
                    out.push('-');
                    last_was_sep = true;
                }
            } else {
                out.push(lower);
                last_was_sep = false;
            }
        }
        while out.ends_with('-') {
            out.pop();
        }
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HumanIdLower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
