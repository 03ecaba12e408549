use meridian_dns_domain::BillingToken;

/// Sink for per-query billing signals (§4.11). The pipeline only enqueues;
/// batching and upload are the billing uploader's concern.
pub trait BillingSinkPort: Send + Sync {
    fn record(&self, token: BillingToken);
}
