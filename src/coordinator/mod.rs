//! Client-side request coordination
//!
//! The coordinator is responsible for:
//! - Fanning each client operation out to the key's three replicas
//! - Tracking in-flight operations by transaction id
//! - Deciding outcomes from a 2-of-3 quorum of replies
//! - Failing operations that exceed the wait budget

pub mod client;
pub mod pending;
pub mod quorum;
pub mod reaper;

use crate::common::audit::{self, AuditEvent, AuditSink, Origin, Outcome};
use crate::common::{Address, NodeMetrics, TransactionId, TransactionIds};
use crate::net::Transport;
use std::sync::Arc;

pub use pending::{PendingRequest, PendingRequests, Verdict};

/// Request Coordinator, Quorum Aggregator, and Timeout Reaper of one node.
///
/// Only this type creates, mutates, or removes pending requests.
pub struct Coordinator {
    address: Address,
    txids: TransactionIds,
    pending: PendingRequests,
    wait_ticks: u64,
    transport: Arc<dyn Transport>,
    audit: Arc<dyn AuditSink>,
    metrics: Arc<NodeMetrics>,
}

impl Coordinator {
    pub fn new(
        address: Address,
        txids: TransactionIds,
        wait_ticks: u64,
        transport: Arc<dyn Transport>,
        audit: Arc<dyn AuditSink>,
        metrics: Arc<NodeMetrics>,
    ) -> Self {
        Self {
            address,
            txids,
            pending: PendingRequests::new(),
            wait_ticks,
            transport,
            audit,
            metrics,
        }
    }

    pub fn pending(&self) -> &PendingRequests {
        &self.pending
    }

    /// Audit the terminal outcome of `request` and update metrics.
    /// The caller has already removed it from the pending table.
    fn conclude(
        &self,
        tx: TransactionId,
        request: &PendingRequest,
        outcome: Outcome,
        value: Option<String>,
        now: u64,
    ) {
        match outcome {
            Outcome::Success => self.metrics.quorum_successes.inc(),
            Outcome::Failure => self.metrics.quorum_failures.inc(),
        }
        self.metrics.resolution_ticks.observe(request.age(now));
        self.metrics.pending_requests.set(self.pending.len() as u64);

        audit::report(
            self.audit.as_ref(),
            AuditEvent::new(
                &self.address,
                Origin::Coordinator,
                request.operation,
                outcome,
                tx,
                &request.key,
                value,
            ),
        );
    }
}
