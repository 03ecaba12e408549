//! Message constructor (§4.8): synthesizes DNS answers the pipeline needs
//! without a round trip upstream — blocking answers, rewrite targets,
//! REFUSED/SERVFAIL, DDR SVCB discovery records, and the server-check
//! interception answer.
//!
//! Wire encoding follows the same `hickory-proto` `Message`/`BinEncoder`
//! idiom as `dns/forwarding/message_builder.rs`.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use bytes::Bytes;
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::rdata::svcb::{Alpn, SvcParamKey, SvcParamValue, Unknown, SVCB};
use hickory_proto::rr::rdata::{A, AAAA, CNAME};
use hickory_proto::rr::{DNSClass, Name, RData, Record};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use meridian_dns_application::ports::message_constructor::{MessageConstructorPort, SdeAnnotation};
use meridian_dns_domain::{
    BlockingMode, DnsQuery, MatchedRule, Profile, RecordType, RewriteTarget, Server,
};

use crate::dns::forwarding::RecordTypeMapper;

/// IANA Extended DNS Error option code (RFC 8914).
const EDE_OPTION_CODE: u16 = 15;
/// Extended DNS Error info-code for "Blocked" (RFC 8914 §4.16).
const EDE_INFO_CODE_BLOCKED: u16 = 15;

const DOHPATH_SVCPARAM_KEY: u16 = 7;
const DEFAULT_DOH_PATH: &str = "/dns-query{?dns}";

pub struct HickoryMessageConstructor {
    answer_ttl: u32,
}

impl Default for HickoryMessageConstructor {
    fn default() -> Self {
        Self { answer_ttl: 60 }
    }
}

impl HickoryMessageConstructor {
    pub fn new(answer_ttl: u32) -> Self {
        Self { answer_ttl }
    }

    fn name_for(&self, query: &DnsQuery) -> Name {
        Name::from_str(&query.domain).unwrap_or_else(|_| Name::root())
    }

    fn base_message(&self, query: &DnsQuery, response_code: ResponseCode) -> Message {
        let mut message = Message::new(0, MessageType::Response, OpCode::Query);
        let mut q = Query::new();
        q.set_name(self.name_for(query));
        q.set_query_type(RecordTypeMapper::to_hickory(query.record_type));
        q.set_query_class(DNSClass::IN);
        message.add_query(q);
        message.set_response_code(response_code);
        message.set_recursion_desired(true);
        message.set_recursion_available(true);
        message
    }

    fn attach_ede(&self, message: &mut Message, info_code: u16, extra_text: &str) {
        let mut edns = hickory_proto::op::Edns::new();
        edns.set_max_payload(1232);
        edns.options_mut().insert(hickory_proto::rr::rdata::opt::EdnsOption::Unknown(
            EDE_OPTION_CODE,
            ede_option_bytes(info_code, extra_text),
        ));
        message.set_edns(edns);
    }

    fn serialize(&self, message: &Message) -> Bytes {
        let mut buf = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buf);
        if message.emit(&mut encoder).is_err() {
            return Bytes::new();
        }
        Bytes::from(buf)
    }

    fn ip_answer_record(&self, name: &Name, ip: IpAddr) -> Record {
        let rdata = match ip {
            IpAddr::V4(v4) => RData::A(A(v4)),
            IpAddr::V6(v6) => RData::AAAA(AAAA(v6)),
        };
        Record::from_rdata(name.clone(), self.answer_ttl, rdata)
    }

    fn blocking_answer(&self, message: &mut Message, name: &Name, record_type: RecordType, mode: BlockingMode, custom_ip: Option<IpAddr>) {
        match mode {
            BlockingMode::NxDomain => {
                message.set_response_code(ResponseCode::NXDomain);
            }
            BlockingMode::NullIp | BlockingMode::CustomIp => {
                let ip = match (mode, custom_ip) {
                    (BlockingMode::CustomIp, Some(ip)) => Some(ip),
                    _ => match record_type {
                        RecordType::A => Some(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
                        RecordType::AAAA => Some(IpAddr::V6(Ipv6Addr::UNSPECIFIED)),
                        _ => None,
                    },
                };
                if let Some(ip) = ip {
                    message.add_answer(self.ip_answer_record(name, ip));
                }
            }
        }
    }
}

/// `MatchedRule::rule_text` carries the raw blocklist line; a custom-IP
/// blocking mode rule is expected to end with the literal address to
/// answer with (e.g. `ads.example 0.0.0.0` or `ads.example::1`).
fn custom_ip_from_rule(rule: &MatchedRule) -> Option<IpAddr> {
    rule.rule_text
        .split_whitespace()
        .last()
        .and_then(|token| token.parse::<IpAddr>().ok())
}

fn ede_option_bytes(info_code: u16, extra_text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(2 + extra_text.len());
    bytes.extend_from_slice(&info_code.to_be_bytes());
    bytes.extend_from_slice(extra_text.as_bytes());
    bytes
}

fn sde_extra_text(sde: &SdeAnnotation) -> String {
    format!("{};{}", sde.contact, sde.justification)
}

impl MessageConstructorPort for HickoryMessageConstructor {
    fn build_block_response(
        &self,
        query: &DnsQuery,
        profile: &Profile,
        rule: &MatchedRule,
        ede_enabled: bool,
        sde: Option<&SdeAnnotation>,
    ) -> Bytes {
        let name = self.name_for(query);
        let mut message = self.base_message(query, ResponseCode::NoError);
        let custom_ip = custom_ip_from_rule(rule);
        self.blocking_answer(&mut message, &name, query.record_type, profile.blocking_mode, custom_ip);

        if ede_enabled {
            let extra = sde.map(sde_extra_text).unwrap_or_default();
            self.attach_ede(&mut message, EDE_INFO_CODE_BLOCKED, &extra);
        }
        self.serialize(&message)
    }

    fn build_rewrite_response(&self, query: &DnsQuery, target: &RewriteTarget) -> Bytes {
        let name = self.name_for(query);
        let mut message = self.base_message(query, ResponseCode::NoError);
        match target {
            RewriteTarget::Ip(ips) => {
                for ip in ips {
                    let matches_query = matches!(
                        (ip, query.record_type),
                        (IpAddr::V4(_), RecordType::A) | (IpAddr::V6(_), RecordType::AAAA)
                    );
                    if matches_query {
                        message.add_answer(self.ip_answer_record(&name, *ip));
                    }
                }
            }
            RewriteTarget::Cname(target_name) => {
                if let Ok(cname) = Name::from_str(target_name) {
                    message.add_answer(Record::from_rdata(
                        name,
                        self.answer_ttl,
                        RData::CNAME(CNAME(cname)),
                    ));
                }
            }
        }
        self.serialize(&message)
    }

    fn build_refused(&self, query: &DnsQuery) -> Bytes {
        self.serialize(&self.base_message(query, ResponseCode::Refused))
    }

    fn build_servfail(&self, query: &DnsQuery) -> Bytes {
        self.serialize(&self.base_message(query, ResponseCode::ServFail))
    }

    fn build_ddr_response(&self, query: &DnsQuery, servers: &[Server]) -> Bytes {
        let name = self.name_for(query);
        let mut message = self.base_message(query, ResponseCode::NoError);

        let mut priority: u16 = 1;
        for protocol in meridian_dns_domain::Protocol::DDR_ORDER {
            for server in servers.iter().filter(|s| s.protocol == protocol && s.tls.is_some()) {
                let alpn = match protocol {
                    meridian_dns_domain::Protocol::Doh => vec!["h2".to_string()],
                    meridian_dns_domain::Protocol::Dot => vec!["dot".to_string()],
                    meridian_dns_domain::Protocol::Doq => vec!["doq".to_string()],
                    _ => continue,
                };
                let port = protocol.default_port();
                let mut params = vec![
                    (SvcParamKey::Alpn, SvcParamValue::Alpn(Alpn(alpn))),
                    (SvcParamKey::Port, SvcParamValue::Port(port)),
                ];
                if protocol == meridian_dns_domain::Protocol::Doh {
                    params.push((
                        SvcParamKey::Unknown(DOHPATH_SVCPARAM_KEY),
                        SvcParamValue::Unknown(Unknown(DEFAULT_DOH_PATH.as_bytes().to_vec())),
                    ));
                }
                let target = Name::from_str(&server.name).unwrap_or_else(|_| name.clone());
                let svcb = SVCB::new(priority, target, params);
                message.add_answer(Record::from_rdata(name.clone(), self.answer_ttl, RData::SVCB(svcb)));
                priority += 1;
            }
        }
        self.serialize(&message)
    }

    fn build_server_check_response(&self, query: &DnsQuery, node_name: &str) -> Bytes {
        let name = self.name_for(query);
        let mut message = self.base_message(query, ResponseCode::NoError);
        if query.record_type == RecordType::TXT {
            if let Ok(rdata) = hickory_proto::rr::rdata::TXT::new(vec![node_name.to_string()])
                .map(RData::TXT)
            {
                message.add_answer(Record::from_rdata(name, self.answer_ttl, rdata));
            }
        }
        self.serialize(&message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_dns_domain::BlockingMode;

    fn profile(mode: BlockingMode) -> Profile {
        Profile {
            id: meridian_dns_domain::ProfileId::parse("prof1").unwrap(),
            deleted: false,
            device_ids: vec![],
            filtering_group_id: 1,
            blocking_mode: mode,
            linked_ip: None,
            dedicated_ips: vec![],
        }
    }

    fn rule(text: &str) -> MatchedRule {
        MatchedRule {
            list_id: 1,
            rule_text: std::sync::Arc::from(text),
        }
    }

    #[test]
    fn null_ip_block_answers_unspecified_address() {
        let constructor = HickoryMessageConstructor::default();
        let query = DnsQuery::new("ads.example.", RecordType::A);
        let bytes = constructor.build_block_response(&query, &profile(BlockingMode::NullIp), &rule("ads.example"), false, None);
        assert!(!bytes.is_empty());
    }

    #[test]
    fn nxdomain_block_sets_response_code() {
        let constructor = HickoryMessageConstructor::default();
        let query = DnsQuery::new("ads.example.", RecordType::A);
        let message = constructor.base_message(&query, ResponseCode::NoError);
        let mut message = message;
        constructor.blocking_answer(&mut message, &constructor.name_for(&query), RecordType::A, BlockingMode::NxDomain, None);
        assert_eq!(message.response_code(), ResponseCode::NXDomain);
    }

    #[test]
    fn custom_ip_block_parses_trailing_token() {
        let parsed = custom_ip_from_rule(&rule("ads.example 203.0.113.5"));
        assert_eq!(parsed, Some("203.0.113.5".parse().unwrap()));
    }

    #[test]
    fn refused_and_servfail_set_expected_codes() {
        let constructor = HickoryMessageConstructor::default();
        let query = DnsQuery::new("example.com.", RecordType::A);
        assert!(!constructor.build_refused(&query).is_empty());
        assert!(!constructor.build_servfail(&query).is_empty());
    }
}
