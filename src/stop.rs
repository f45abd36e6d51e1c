//! Cooperative cancellation threaded through every bounded wait.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Shared stop signal for a run.
///
/// Stops are observed at sleep granularity: every delay races the token, so
/// the latency to notice a stop is bounded by one wait increment. An
/// in-flight bridge call is never abandoned mid-round-trip.
#[derive(Clone, Debug, Default)]
pub struct StopToken {
    inner: CancellationToken,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the run to stop. Idempotent.
    pub fn stop(&self) {
        self.inner.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Sleep for `dur` unless a stop arrives first.
    ///
    /// Returns `true` if the full duration elapsed, `false` if the stop
    /// signal cut the sleep short.
    pub async fn sleep(&self, dur: Duration) -> bool {
        tokio::select! {
            _ = self.inner.cancelled() => false,
            _ = tokio::time::sleep(dur) => true,
        }
    }
}
