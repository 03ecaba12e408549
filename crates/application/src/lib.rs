//! Core request-handling logic: the device finder, the composite filter
//! pipeline orchestration, and the port traits infrastructure adapters
//! implement. Transport decoding, storage, and I/O all live below this
//! crate; nothing here touches a socket or a file directly.

pub mod ports;
pub mod services;

pub use ports::{
    BillingSinkPort, CacheEntry, CacheKey, CachePort, ConnectionLimiterPort, CustomDomainMatch,
    CustomDomainPort, ErrorCollectorPort, FilterEnginePort, ForwardedResponse, ForwarderPort,
    GeoIpInfo, GeoIpPort, HashFamily, HashPrefixMatcherPort, MessageConstructorPort,
    ProfileDbPort, ProfileDevice, RateLimitDecision, RateLimiterPort, RefreshContext, Refresher,
    SdeAnnotation,
};
pub use services::{AccessSnapshot, DeviceFinder, PipelineConfig, PipelineError, PipelineOutcome, RequestPipeline};
