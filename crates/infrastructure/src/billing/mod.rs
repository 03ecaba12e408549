//! Billing uploader (§4.11): the pipeline enqueues a [`BillingToken`] per
//! sampled query onto a bounded mpsc channel; a background task drains it
//! into batches of up to `query_log_max_batch_size`, flushed whenever the
//! batch fills or `query_log_flush_interval_ms` elapses, whichever comes
//! first. Sampling (`query_log_sample_rate`) is applied by the caller of
//! [`BillingSinkPort::record`], not by this adapter.
//!
//! Grounded on the same bounded-channel-plus-periodic-flush shape the
//! teacher uses for its query-log writer, generalized from a single-file
//! sink to a pluggable [`BillingUploadSink`] so the actual upload transport
//! stays swappable.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use meridian_dns_application::ports::billing::BillingSinkPort;
use meridian_dns_application::ports::refresh::{RefreshContext, Refresher};
use meridian_dns_domain::config::SnapshotConfig;
use meridian_dns_domain::{BillingToken, DomainError};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Where flushed batches ultimately go. The default `LoggingUploadSink`
/// just logs the batch size; a real deployment supplies its own transport
/// (HTTP POST to a billing service, a Kafka producer, ...).
pub trait BillingUploadSink: Send + Sync {
    fn upload(&self, batch: &[BillingToken]);
}

#[derive(Default)]
pub struct LoggingUploadSink;

impl BillingUploadSink for LoggingUploadSink {
    fn upload(&self, batch: &[BillingToken]) {
        debug!(batch_len = batch.len(), "billing batch flushed");
    }
}

pub struct ChannelBillingSink {
    sender: mpsc::Sender<BillingToken>,
    dropped: Arc<AtomicU64>,
}

impl ChannelBillingSink {
    /// Spawns the background flush loop and returns the sink handle. The
    /// flush loop runs until `shutdown` is cancelled, at which point it
    /// drains and uploads whatever is left in the channel before exiting.
    pub fn spawn(
        config: &SnapshotConfig,
        upload_sink: Arc<dyn BillingUploadSink>,
        shutdown: tokio_util::sync::CancellationToken,
    ) -> Self {
        let (sender, mut receiver) = mpsc::channel(config.query_log_channel_capacity);
        let max_batch_size = config.query_log_max_batch_size;
        let flush_interval = Duration::from_millis(config.query_log_flush_interval_ms);
        let dropped = Arc::new(AtomicU64::new(0));

        tokio::spawn(async move {
            let mut batch = Vec::with_capacity(max_batch_size);
            let mut ticker = tokio::time::interval(flush_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => {
                        while let Ok(token) = receiver.try_recv() {
                            batch.push(token);
                        }
                        if !batch.is_empty() {
                            upload_sink.upload(&batch);
                        }
                        return;
                    }
                    maybe_token = receiver.recv() => {
                        match maybe_token {
                            Some(token) => {
                                batch.push(token);
                                if batch.len() >= max_batch_size {
                                    upload_sink.upload(&batch);
                                    batch.clear();
                                }
                            }
                            None => return,
                        }
                    }
                    _ = ticker.tick() => {
                        if !batch.is_empty() {
                            upload_sink.upload(&batch);
                            batch.clear();
                        }
                    }
                }
            }
        });

        Self { sender, dropped }
    }
}

impl BillingSinkPort for ChannelBillingSink {
    fn record(&self, token: BillingToken) {
        if let Err(mpsc::error::TrySendError::Full(_)) = self.sender.try_send(token) {
            let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            warn!(total_dropped = total, "billing channel full, dropping token");
        }
    }
}

/// A no-op [`Refresher`] so the billing sink can be registered with the
/// scheduler uniformly alongside refresh-driven adapters, even though its
/// own flush loop is already self-driven by the interval spawned in
/// [`ChannelBillingSink::spawn`].
pub struct BillingFlushNoop;

#[async_trait]
impl Refresher for BillingFlushNoop {
    async fn refresh(&self, _ctx: &RefreshContext) -> Result<(), DomainError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_dns_domain::ResponseSizeClass;
    use meridian_dns_domain::{DeviceId, ProfileId};
    use std::sync::Mutex;

    struct CollectingSink {
        batches: Mutex<Vec<usize>>,
    }

    impl BillingUploadSink for CollectingSink {
        fn upload(&self, batch: &[BillingToken]) {
            self.batches.lock().unwrap().push(batch.len());
        }
    }

    fn token() -> BillingToken {
        BillingToken {
            profile_id: ProfileId::parse("p1").unwrap(),
            device_id: DeviceId::parse("d1").unwrap(),
            timestamp_unix: 0,
            size_class: ResponseSizeClass::Small,
        }
    }

    #[tokio::test]
    async fn flushes_on_batch_fill() {
        let collecting = Arc::new(CollectingSink {
            batches: Mutex::new(Vec::new()),
        });
        let shutdown = tokio_util::sync::CancellationToken::new();
        let config = SnapshotConfig {
            query_log_max_batch_size: 2,
            query_log_flush_interval_ms: 60_000,
            ..SnapshotConfig::default()
        };
        let sink = ChannelBillingSink::spawn(&config, collecting.clone(), shutdown.clone());

        sink.record(token());
        sink.record(token());
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(collecting.batches.lock().unwrap().as_slice(), &[2]);
        shutdown.cancel();
    }

    #[tokio::test]
    async fn flushes_remainder_on_shutdown() {
        let collecting = Arc::new(CollectingSink {
            batches: Mutex::new(Vec::new()),
        });
        let shutdown = tokio_util::sync::CancellationToken::new();
        let config = SnapshotConfig {
            query_log_max_batch_size: 10,
            query_log_flush_interval_ms: 60_000,
            ..SnapshotConfig::default()
        };
        let sink = ChannelBillingSink::spawn(&config, collecting.clone(), shutdown.clone());

        sink.record(token());
        shutdown.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(collecting.batches.lock().unwrap().as_slice(), &[1]);
    }
}
