//! Timeout reaping of requests that never reach quorum

use crate::common::audit::Outcome;
use crate::coordinator::Coordinator;

impl Coordinator {
    /// Fail every pending request older than the wait budget.
    ///
    /// Returns the number of requests reaped.
    pub fn reap(&mut self, now: u64) -> usize {
        let expired = self.pending.take_expired(now, self.wait_ticks);
        for (tx, request) in &expired {
            tracing::warn!(
                "tx {}: {} {:?} timed out after {} ticks ({} replies)",
                tx,
                request.operation,
                request.key,
                request.age(now),
                request.replies
            );
            self.metrics.timeouts.inc();
            let value = if request.operation.carries_value() {
                request.value.clone()
            } else {
                None
            };
            self.conclude(*tx, request, Outcome::Failure, value, now);
        }
        expired.len()
    }
}
