//! Refresh scheduler (§4.1): drives any registered [`Refresher`] on its own
//! interval, independent of every other registered job. Each job runs as
//! its own `tokio` task; the scheduler provides no mutual exclusion between
//! jobs and no shared state beyond the shutdown token.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use meridian_dns_application::ports::error_collector::ErrorCollectorPort;
use meridian_dns_application::ports::refresh::{RefreshContext, Refresher};
use meridian_dns_domain::DomainError;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// How a job's per-run [`RefreshContext`] is produced. A plain fixed
/// timeout is the common case; jobs that need request-specific state
/// (a backend client, a retry counter) can close over it here.
pub type ContextConstructor = Arc<dyn Fn(CancellationToken) -> RefreshContext + Send + Sync>;

/// One named job registration (§4.1 "Register `{name, refresher, interval,
/// refresh-on-shutdown?, randomize-start?, per-run context constructor}`").
pub struct RefreshJobSpec {
    pub name: String,
    pub refresher: Arc<dyn Refresher>,
    pub interval: Duration,
    pub refresh_on_shutdown: bool,
    pub randomize_start: bool,
    pub context_constructor: ContextConstructor,
}

impl RefreshJobSpec {
    /// Builds a spec whose per-run context times out after `run_timeout`,
    /// the common case for jobs with no extra per-run state.
    pub fn new(
        name: impl Into<String>,
        refresher: Arc<dyn Refresher>,
        interval: Duration,
        run_timeout: Duration,
    ) -> Self {
        let context_constructor: ContextConstructor = Arc::new(move |shutdown| RefreshContext {
            deadline: Instant::now() + run_timeout,
            shutdown,
        });
        Self {
            name: name.into(),
            refresher,
            interval,
            refresh_on_shutdown: false,
            randomize_start: false,
            context_constructor,
        }
    }

    pub fn refresh_on_shutdown(mut self, value: bool) -> Self {
        self.refresh_on_shutdown = value;
        self
    }

    pub fn randomize_start(mut self, value: bool) -> Self {
        self.randomize_start = value;
        self
    }
}

/// Runs the registered jobs until [`RefreshScheduler::shutdown`] is called.
/// Each `start()` spawns one independent task per job; the scheduler itself
/// owns no job state beyond the handles needed to await a clean shutdown.
pub struct RefreshScheduler {
    error_collector: Arc<dyn ErrorCollectorPort>,
    shutdown: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl RefreshScheduler {
    pub fn new(error_collector: Arc<dyn ErrorCollectorPort>) -> Self {
        Self {
            error_collector,
            shutdown: CancellationToken::new(),
            handles: Vec::new(),
        }
    }

    /// Spawns the worker task for one job. Safe to call repeatedly before
    /// or after other jobs have started; jobs are fully independent.
    pub fn start(&mut self, spec: RefreshJobSpec) {
        let shutdown = self.shutdown.clone();
        let error_collector = self.error_collector.clone();
        let handle = tokio::spawn(run_job(spec, shutdown, error_collector));
        self.handles.push(handle);
    }

    /// Cancels the shutdown token (each job's final refresh-on-shutdown, if
    /// configured, observes this) and awaits every spawned task.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for handle in self.handles {
            if let Err(err) = handle.await {
                warn!(?err, "refresh job task panicked or was cancelled during shutdown");
            }
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

async fn run_job(
    spec: RefreshJobSpec,
    shutdown: CancellationToken,
    error_collector: Arc<dyn ErrorCollectorPort>,
) {
    let RefreshJobSpec {
        name,
        refresher,
        interval,
        refresh_on_shutdown,
        randomize_start,
        context_constructor,
    } = spec;

    info!(job = %name, interval_secs = interval.as_secs(), "refresh job starting");

    loop {
        let sleep = if randomize_start {
            let jitter_max = interval / 10;
            let jitter = if jitter_max.is_zero() {
                Duration::ZERO
            } else {
                jitter_max.mul_f64(fastrand::f64())
            };
            interval + jitter
        } else {
            interval
        };

        tokio::select! {
            _ = tokio::time::sleep(sleep) => {}
            _ = shutdown.cancelled() => break,
        }

        run_one(&name, refresher.as_ref(), &context_constructor, &shutdown, &*error_collector).await;
    }

    if refresh_on_shutdown {
        run_one(&name, refresher.as_ref(), &context_constructor, &shutdown, &*error_collector).await;
    }

    info!(job = %name, "refresh job stopped");
}

async fn run_one(
    name: &str,
    refresher: &dyn Refresher,
    context_constructor: &ContextConstructor,
    shutdown: &CancellationToken,
    error_collector: &dyn ErrorCollectorPort,
) {
    let ctx = context_constructor(shutdown.clone());

    let result = AssertUnwindSafe(refresher.refresh(&ctx))
        .catch_unwind()
        .await;

    match result {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            error!(job = name, error = %err, "refresh job reported an error");
            error_collector.report(name, &err);
        }
        Err(panic) => {
            let message = panic_message(&panic);
            error!(job = name, panic = %message, "refresh job panicked, recovering");
            error_collector.report(name, &DomainError::Internal(format!("{name} panicked: {message}")));
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
