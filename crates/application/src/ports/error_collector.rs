use meridian_dns_domain::DomainError;

/// Sink for recoverable backend errors and panics (§7 "Propagation
/// policy"). The core only consumes this interface; registration with an
/// actual Sentry-style service is an external collaborator's concern.
pub trait ErrorCollectorPort: Send + Sync {
    /// Report `err` annotated with the name of the worker/stage that
    /// produced it. Implementations must not block the caller meaningfully
    /// — this is called from both background jobs and the per-query
    /// pipeline's panic-recovery path.
    fn report(&self, source: &str, err: &DomainError);
}
