mod helpers;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use meridian_dns_application::{
    AccessSnapshot, DeviceFinder, ForwardedResponse, PipelineConfig, PipelineOutcome,
    RequestPipeline,
};
use meridian_dns_domain::{
    AuthSettings, BindData, BlockingMode, Device, DnsQuery, DeviceId, FilterVerdict, MatchedRule,
    Profile, ProfileId, Protocol, RecordType, RequestInfo, Server, ServerGroup, DdrConfig,
    TransportMetadata,
};

use helpers::{
    AllowAllConnectionLimiter, AllowAllRateLimiter, MockCache, MockForwarder, MockProfileDb,
    RecordingErrorCollector, ScriptedFilterEngine, StubMessageConstructor,
};

fn plain_server_group() -> ServerGroup {
    ServerGroup {
        name: "public".into(),
        ddr: DdrConfig::default(),
        filtering_group_id: 1,
        servers: vec![],
        profiles_enabled: true,
        device_domains: vec![],
        auto_device_auth_enabled: false,
    }
}

fn plain_request() -> RequestInfo {
    RequestInfo {
        question: DnsQuery::new("example.com.", RecordType::A),
        transport: TransportMetadata::default(),
        local_addr: "198.51.100.1:53".parse().unwrap(),
        remote_addr: "192.0.2.10:4321".parse().unwrap(),
        server: Arc::new(Server {
            name: "plain".into(),
            protocol: Protocol::Plain,
            bind: BindData::Addresses(vec!["0.0.0.0:53".parse().unwrap()]),
            read_timeout: Duration::from_secs(2),
            write_timeout: Duration::from_secs(2),
            handle_timeout: Duration::from_secs(5),
            linked_ip_enabled: false,
            tls: None,
        }),
        server_group_name: "public".into(),
    }
}

fn sample_profile_device() -> (Profile, Device) {
    let device_id = DeviceId::parse("abcd1234").unwrap();
    let profile = Profile {
        id: ProfileId::parse("prof1234").unwrap(),
        deleted: false,
        device_ids: vec![device_id.clone()],
        filtering_group_id: 1,
        blocking_mode: BlockingMode::NullIp,
        linked_ip: None,
        dedicated_ips: vec![],
    };
    let device = Device {
        id: device_id,
        human_id_lower: None,
        auth: AuthSettings::disabled(),
        linked_ip: None,
    };
    (profile, device)
}

fn build_pipeline(
    profile_db: MockProfileDb,
    filter_engine: ScriptedFilterEngine,
    forwarder: MockForwarder,
) -> (RequestPipeline, RecordingErrorCollector) {
    let error_collector = RecordingErrorCollector::new();
    let pipeline = RequestPipeline::new(
        DeviceFinder::new(),
        Arc::new(profile_db),
        Arc::new(filter_engine),
        Arc::new(forwarder),
        Arc::new(MockCache::new()),
        Arc::new(AllowAllRateLimiter),
        Arc::new(AllowAllConnectionLimiter),
        Arc::new(StubMessageConstructor),
        Arc::new(error_collector.clone()),
        PipelineConfig {
            extended_dns_errors_enabled: true,
            sde: None,
            server_check_domains: vec!["check.example.net".to_string()],
            server_check_node_name: "node-1".to_string(),
            default_cache_ttl: Duration::from_secs(60),
        },
    );
    (pipeline, error_collector)
}

#[tokio::test]
async fn anonymous_query_forwards_upstream_on_cache_miss() {
    let forwarder = MockForwarder::new();
    forwarder.set_response(
        "example.com",
        ForwardedResponse {
            wire_data: Bytes::from_static(b"answer"),
            min_ttl: Some(30),
            negative_soa_ttl: None,
            upstream_server: Some("1.1.1.1".into()),
        },
    );
    let (pipeline, errors) = build_pipeline(
        MockProfileDb::new(),
        ScriptedFilterEngine::new(FilterVerdict::None),
        forwarder,
    );

    let request = plain_request();
    let outcome = pipeline.handle(&request, &plain_server_group(), false).await;

    match outcome {
        PipelineOutcome::Respond(bytes) => assert_eq!(bytes, Bytes::from_static(b"answer")),
        other => panic!("expected Respond, got {other:?}"),
    }
    assert!(errors.reports().is_empty());
}

#[tokio::test]
async fn identified_profile_block_verdict_short_circuits_forwarding() {
    let profile_db = MockProfileDb::new();
    let (profile, device) = sample_profile_device();
    profile_db.insert(profile, device);

    let mut request = plain_request();
    request.transport.edns0_cpe_id = Some("abcd1234".to_string());

    let rule = MatchedRule {
        list_id: 7,
        rule_text: "||example.com^".into(),
    };
    let (pipeline, _errors) = build_pipeline(
        profile_db,
        ScriptedFilterEngine::new(FilterVerdict::Block(rule)),
        MockForwarder::new(),
    );

    let outcome = pipeline.handle(&request, &plain_server_group(), false).await;
    match outcome {
        PipelineOutcome::Respond(bytes) => {
            let body = String::from_utf8(bytes.to_vec()).unwrap();
            assert!(body.starts_with("BLOCK:example.com"));
        }
        other => panic!("expected a block response, got {other:?}"),
    }
}

#[tokio::test]
async fn upstream_failure_reports_error_and_returns_servfail() {
    let (pipeline, errors) = build_pipeline(
        MockProfileDb::new(),
        ScriptedFilterEngine::new(FilterVerdict::None),
        MockForwarder::new(),
    );

    let request = plain_request();
    let outcome = pipeline.handle(&request, &plain_server_group(), false).await;

    match outcome {
        PipelineOutcome::Respond(bytes) => {
            assert!(String::from_utf8(bytes.to_vec()).unwrap().starts_with("SERVFAIL"));
        }
        other => panic!("expected SERVFAIL, got {other:?}"),
    }
    assert_eq!(errors.reports().len(), 1);
    assert_eq!(errors.reports()[0].0, "forwarder");
}

#[tokio::test]
async fn access_blocked_domain_is_refused_without_forwarding() {
    let (pipeline, _errors) = build_pipeline(
        MockProfileDb::new(),
        ScriptedFilterEngine::new(FilterVerdict::None),
        MockForwarder::new(),
    );
    pipeline.reload_access(AccessSnapshot {
        blocked_nets: vec![],
        blocked_domains: vec!["example.com".to_string()],
    });

    let request = plain_request();
    let outcome = pipeline.handle(&request, &plain_server_group(), false).await;
    assert!(matches!(outcome, PipelineOutcome::Refuse));
}

#[tokio::test]
async fn server_check_domain_is_answered_without_identity_or_forwarding() {
    let (pipeline, _errors) = build_pipeline(
        MockProfileDb::new(),
        ScriptedFilterEngine::new(FilterVerdict::None),
        MockForwarder::new(),
    );

    let mut request = plain_request();
    request.question = DnsQuery::new("check.example.net.", RecordType::TXT);

    let outcome = pipeline.handle(&request, &plain_server_group(), false).await;
    match outcome {
        PipelineOutcome::Respond(bytes) => {
            assert!(String::from_utf8(bytes.to_vec()).unwrap().starts_with("CHECK:check.example.net:node-1"));
        }
        other => panic!("expected server-check response, got {other:?}"),
    }
}
