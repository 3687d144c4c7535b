//! Client-side CREATE/READ/UPDATE/DELETE fan-out

use crate::common::{Error, Message, Operation, ReplicaRole, Result, TransactionId};
use crate::coordinator::{Coordinator, PendingRequest};
use crate::ring::{Ring, REPLICATION_FACTOR};

impl Coordinator {
    pub fn create(
        &mut self,
        ring: &Ring,
        key: &str,
        value: &str,
        now: u64,
    ) -> Result<TransactionId> {
        self.submit(ring, Operation::Create, key, Some(value.to_string()), now)
    }

    pub fn read(&mut self, ring: &Ring, key: &str, now: u64) -> Result<TransactionId> {
        self.submit(ring, Operation::Read, key, None, now)
    }

    pub fn update(
        &mut self,
        ring: &Ring,
        key: &str,
        value: &str,
        now: u64,
    ) -> Result<TransactionId> {
        self.submit(ring, Operation::Update, key, Some(value.to_string()), now)
    }

    pub fn delete(&mut self, ring: &Ring, key: &str, now: u64) -> Result<TransactionId> {
        self.submit(ring, Operation::Delete, key, None, now)
    }

    /// Send one request per replica and register the pending entry.
    ///
    /// Nothing is sent or registered when the ring cannot supply a full
    /// replica set.
    fn submit(
        &mut self,
        ring: &Ring,
        op: Operation,
        key: &str,
        value: Option<String>,
        now: u64,
    ) -> Result<TransactionId> {
        let replicas = ring.find_nodes(key);
        if replicas.len() < REPLICATION_FACTOR {
            self.metrics.requests_unavailable.inc();
            tracing::warn!(
                "{} {} {:?} abandoned: ring has {} of {} replicas",
                self.address,
                op,
                key,
                ring.len(),
                REPLICATION_FACTOR
            );
            return Err(Error::InsufficientReplicas {
                needed: REPLICATION_FACTOR,
                available: ring.len(),
            });
        }

        let tx = self.txids.next_id();
        for (node, role) in replicas.iter().zip(ReplicaRole::ALL) {
            tracing::debug!("tx {}: {} {:?} -> {} ({:?})", tx, op, key, node.address, role);
            let message = Message::request(tx, op, self.address.clone(), key, value.clone(), role);
            self.transport.send(&self.address, &node.address, &message);
        }

        self.pending
            .insert(tx, PendingRequest::new(op, key.to_string(), value, now));
        self.metrics.requests_issued.inc();
        self.metrics.pending_requests.set(self.pending.len() as u64);
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use crate::common::{Address, MemoryAudit, MessageType, NodeMetrics, TransactionIds};
    use crate::coordinator::Coordinator;
    use crate::net::{SimNetwork, Transport};
    use crate::ring::Ring;
    use std::sync::Arc;

    fn setup(members: usize) -> (Coordinator, Arc<SimNetwork>, Ring) {
        let net = Arc::new(SimNetwork::reliable());
        let coordinator = Coordinator::new(
            Address::new("1:0"),
            TransactionIds::new(),
            20,
            net.clone(),
            Arc::new(MemoryAudit::new()),
            Arc::new(NodeMetrics::new()),
        );
        let ring = Ring::from_members(
            (1..=members).map(|i| Address::new(format!("{}:0", i))),
            512,
        );
        (coordinator, net, ring)
    }

    #[test]
    fn test_create_fans_out_to_replica_set() {
        let (mut coordinator, net, ring) = setup(5);
        let tx = coordinator.create(&ring, "k", "v", 3).unwrap();

        let replicas = ring.find_nodes("k");
        for (i, node) in replicas.iter().enumerate() {
            let inbox = net.recv(&node.address);
            assert_eq!(inbox.len(), 1, "replica {}", node.address);
            let msg = &inbox[0];
            assert_eq!(msg.transaction_id, tx);
            assert_eq!(msg.kind, MessageType::Create);
            assert_eq!(msg.value.as_deref(), Some("v"));
            assert_eq!(msg.from, Address::new("1:0"));
            assert_eq!(Some(msg.role), crate::common::ReplicaRole::from_ordinal(i));
            assert!(!msg.internal);
        }

        let pending = coordinator.pending().get(tx).unwrap();
        assert_eq!(pending.replies, 0);
        assert_eq!(pending.created_at, 3);
    }

    #[test]
    fn test_fresh_transaction_ids() {
        let (mut coordinator, _net, ring) = setup(3);
        let a = coordinator.read(&ring, "k", 0).unwrap();
        let b = coordinator.delete(&ring, "k", 0).unwrap();
        assert_ne!(a, b);
        assert_eq!(coordinator.pending().len(), 2);
    }

    #[test]
    fn test_unavailable_ring_sends_nothing() {
        let (mut coordinator, net, ring) = setup(2);
        let err = coordinator.update(&ring, "k", "v", 0).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::InsufficientReplicas {
                needed: 3,
                available: 2
            }
        ));
        assert!(coordinator.pending().is_empty());
        assert_eq!(net.stats().sent, 0);
    }

    #[test]
    fn test_read_and_delete_carry_no_value() {
        let (mut coordinator, net, ring) = setup(3);
        coordinator.read(&ring, "k", 0).unwrap();
        coordinator.delete(&ring, "k", 0).unwrap();
        for node in ring.nodes() {
            assert!(net.recv(&node.address).iter().all(|m| m.value.is_none()));
        }
    }
}
