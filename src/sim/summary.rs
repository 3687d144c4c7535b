//! End-of-run outcome totals

use crate::common::{MemoryAudit, Operation, Origin, Outcome};
use crate::net::NetStats;
use serde::Serialize;
use std::fmt;

const OPERATIONS: [Operation; 4] = [
    Operation::Create,
    Operation::Read,
    Operation::Update,
    Operation::Delete,
];

/// Coordinator outcomes for one operation type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OpTotals {
    pub success: usize,
    pub failure: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub ticks: u64,
    pub live_nodes: usize,
    pub per_operation: Vec<(Operation, OpTotals)>,
    pub replica_events: usize,
    pub messages_sent: u64,
    pub messages_dropped: u64,
    pub messages_delivered: u64,
}

impl Summary {
    pub fn collect(ticks: u64, live_nodes: usize, audit: &MemoryAudit, net: NetStats) -> Self {
        let per_operation = OPERATIONS
            .iter()
            .map(|&op| {
                let totals = OpTotals {
                    success: audit.count(Origin::Coordinator, op, Outcome::Success),
                    failure: audit.count(Origin::Coordinator, op, Outcome::Failure),
                };
                (op, totals)
            })
            .collect();
        let replica_events = audit
            .events()
            .iter()
            .filter(|e| e.origin == Origin::Replica)
            .count();

        Self {
            ticks,
            live_nodes,
            per_operation,
            replica_events,
            messages_sent: net.sent,
            messages_dropped: net.dropped,
            messages_delivered: net.delivered,
        }
    }

    pub fn totals(&self, op: Operation) -> OpTotals {
        self.per_operation
            .iter()
            .find(|(o, _)| *o == op)
            .map(|(_, t)| *t)
            .unwrap_or_default()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ticks: {}  live nodes: {}", self.ticks, self.live_nodes)?;
        for (op, totals) in &self.per_operation {
            writeln!(
                f,
                "  {:<7} success {:>6}  failure {:>6}",
                op.to_string(),
                totals.success,
                totals.failure
            )?;
        }
        writeln!(f, "replica events: {}", self.replica_events)?;
        write!(
            f,
            "messages: {} sent, {} dropped, {} delivered",
            self.messages_sent, self.messages_dropped, self.messages_delivered
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Address, AuditEvent, AuditSink};

    #[test]
    fn test_collect_counts_coordinator_outcomes() {
        let audit = MemoryAudit::new();
        let node = Address::new("1:0");
        for (tx, outcome) in [(1, Outcome::Success), (2, Outcome::Failure), (3, Outcome::Success)] {
            audit.record(AuditEvent::new(
                &node,
                Origin::Coordinator,
                Operation::Read,
                outcome,
                tx,
                "k",
                None,
            ));
        }
        audit.record(AuditEvent::new(
            &node,
            Origin::Replica,
            Operation::Read,
            Outcome::Success,
            1,
            "k",
            None,
        ));

        let summary = Summary::collect(10, 3, &audit, NetStats::default());
        assert_eq!(
            summary.totals(Operation::Read),
            OpTotals {
                success: 2,
                failure: 1
            }
        );
        assert_eq!(summary.totals(Operation::Create), OpTotals::default());
        assert_eq!(summary.replica_events, 1);
        assert!(summary.to_string().contains("read"));
    }
}
