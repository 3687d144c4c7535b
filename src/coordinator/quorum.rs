//! Quorum aggregation of REPLY and READREPLY messages

use crate::common::audit::Outcome;
use crate::common::{Message, Operation};
use crate::coordinator::{Coordinator, Verdict};

impl Coordinator {
    /// Fold a write acknowledgement into its pending request
    pub fn handle_reply(&mut self, msg: &Message, now: u64) {
        self.aggregate(msg, now, false);
    }

    /// Fold a read result into its pending request
    pub fn handle_read_reply(&mut self, msg: &Message, now: u64) {
        self.aggregate(msg, now, true);
    }

    fn aggregate(&mut self, msg: &Message, now: u64, is_read: bool) {
        let tx = msg.transaction_id;
        let Some(request) = self.pending.get_mut(tx) else {
            self.metrics.stray_replies.inc();
            tracing::debug!("tx {}: stray reply from {} ignored", tx, msg.from);
            return;
        };
        if (request.operation == Operation::Read) != is_read {
            self.metrics.stray_replies.inc();
            tracing::debug!(
                "tx {}: {:?} from {} does not match pending {}",
                tx,
                msg.kind,
                msg.from,
                request.operation
            );
            return;
        }

        let verdict = if is_read {
            request.observe_read(msg.success, msg.value.clone())
        } else {
            request.observe_write(msg.success)
        };

        let (outcome, value) = match verdict {
            Verdict::Pending => return,
            Verdict::Succeeded(value) => (Outcome::Success, value),
            Verdict::Failed => (Outcome::Failure, None),
        };

        // Removed before reporting so a late reply can only find nothing
        let Some(request) = self.pending.remove(tx) else {
            return;
        };
        let value = match outcome {
            Outcome::Success => value,
            Outcome::Failure if request.operation.carries_value() => request.value.clone(),
            Outcome::Failure => None,
        };
        tracing::debug!("tx {}: {} {:?} -> {:?}", tx, request.operation, request.key, outcome);
        self.conclude(tx, &request, outcome, value, now);
    }
}
