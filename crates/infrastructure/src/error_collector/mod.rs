//! Error collector (§7 "Propagation policy"): a `tracing`-based sink. Actual
//! alerting/aggregation is an external collaborator's concern (Sentry,
//! a log pipeline) wired up from whatever `tracing_subscriber` layer the
//! binary installs; this adapter only needs to emit a structured event.

use meridian_dns_application::ports::error_collector::ErrorCollectorPort;
use meridian_dns_domain::DomainError;
use tracing::error;

#[derive(Default)]
pub struct TracingErrorCollector;

impl ErrorCollectorPort for TracingErrorCollector {
    fn report(&self, source: &str, err: &DomainError) {
        error!(source, error = %err, client_caused = err.is_client_caused(), "reported error");
    }
}
