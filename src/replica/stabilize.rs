//! Re-replication of held keys after a ring change
//!
//! Best effort: no transaction is tracked and no reply is expected. Keys
//! whose replication messages are lost stay under-replicated until the next
//! membership change.

use crate::common::{Message, ReplicaRole, TransactionIds};
use crate::replica::ReplicaHandler;
use crate::ring::Ring;

impl ReplicaHandler {
    /// Send an internal-replication CREATE for every held key to each member
    /// of its current replica set, this node included.
    ///
    /// Returns the number of messages sent.
    pub fn stabilize(&self, ring: &Ring, txids: &TransactionIds) -> usize {
        let entries = self.store.entries();
        let mut sent = 0;

        for (key, value) in &entries {
            let replicas = ring.find_nodes(key);
            if replicas.is_empty() {
                continue;
            }
            let tx = txids.next_id();
            for (node, role) in replicas.iter().zip(ReplicaRole::ALL) {
                let message = Message::replication(tx, self.address.clone(), key, value, role);
                self.transport.send(&self.address, &node.address, &message);
                sent += 1;
            }
        }

        self.metrics.replication_sent.add(sent as u64);
        tracing::info!(
            "{}: stabilized {} keys with {} replication messages",
            self.address,
            entries.len(),
            sent
        );
        sent
    }
}
