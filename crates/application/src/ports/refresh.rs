use async_trait::async_trait;
use meridian_dns_domain::DomainError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// A fresh per-run context handed to a [`Refresher`] by the scheduler
/// (§4.1 step 2): carries the run's deadline and the process-wide shutdown
/// signal.
#[derive(Debug, Clone)]
pub struct RefreshContext {
    pub deadline: Instant,
    pub shutdown: CancellationToken,
}

impl RefreshContext {
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// The "refreshable thing" capability (§9 "Dynamic dispatch ... expressed
/// as a one-method capability; no inheritance"). Every periodic
/// maintenance component — filter storage, GeoIP, hash-prefix matcher,
/// profile-DB sync, allowlist, TLS ticket rotation, billing upload —
/// implements this one method.
#[async_trait]
pub trait Refresher: Send + Sync {
    /// Perform one refresh cycle. Errors are routed to the error collector
    /// by the scheduler, annotated with the job's registered name; a
    /// `Refresher` must never panic across this boundary for a condition it
    /// can anticipate (transient network failure, stale data) — those are
    /// `Err`, not a panic.
    async fn refresh(&self, ctx: &RefreshContext) -> Result<(), DomainError>;
}
