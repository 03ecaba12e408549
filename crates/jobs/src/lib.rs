//! The refresh scheduler (§4.1): the single generic driver behind every
//! periodic maintenance component in the system (profile-DB sync, filter
//! reload, hash-prefix refresh, GeoIP reload, TLS ticket rotation, billing
//! upload). Components only need to implement
//! `meridian_dns_application::ports::refresh::Refresher`; this crate
//! supplies the scheduling, jitter, timeout, and failure-isolation policy
//! around that one method.

pub mod scheduler;

pub use scheduler::{ContextConstructor, RefreshJobSpec, RefreshScheduler};
