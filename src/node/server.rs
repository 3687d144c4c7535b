//! Per-node event loop

use crate::common::{
    Address, AuditSink, LocalStore, Message, MessageType, NodeConfig, NodeMetrics, Result,
    TransactionId, TransactionIds,
};
use crate::coordinator::{Coordinator, PendingRequests};
use crate::net::{Membership, Transport};
use crate::replica::ReplicaHandler;
use crate::ring::{Ring, RingManager};
use std::sync::Arc;

/// One member of the ring.
///
/// Single-threaded: every mutation goes through `&mut self`, so a node
/// needs no internal locking. Collaborators shared with other nodes are
/// held behind `Arc`.
pub struct Node {
    address: Address,
    clock: u64,
    ring: RingManager,
    coordinator: Coordinator,
    replica: ReplicaHandler,
    membership: Arc<dyn Membership>,
    transport: Arc<dyn Transport>,
    txids: TransactionIds,
    metrics: Arc<NodeMetrics>,
}

impl Node {
    /// Build a node and take its first ring snapshot
    pub fn new(
        address: Address,
        config: &NodeConfig,
        txids: TransactionIds,
        transport: Arc<dyn Transport>,
        membership: Arc<dyn Membership>,
        audit: Arc<dyn AuditSink>,
        store: Box<dyn LocalStore>,
    ) -> Self {
        let metrics = Arc::new(NodeMetrics::new());
        let coordinator = Coordinator::new(
            address.clone(),
            txids.clone(),
            config.wait_ticks,
            transport.clone(),
            audit.clone(),
            metrics.clone(),
        );
        let replica = ReplicaHandler::new(
            address.clone(),
            store,
            transport.clone(),
            audit,
            metrics.clone(),
        );

        let mut node = Self {
            address,
            clock: 0,
            ring: RingManager::new(config.ring_size),
            coordinator,
            replica,
            membership,
            transport,
            txids,
            metrics,
        };
        node.refresh_ring();
        tracing::info!("Node {} started with {} ring members", node.address, node.ring().len());
        node
    }

    /// Advance one logical tick.
    ///
    /// Order: clock, ring refresh (with stabilization on change), inbound
    /// messages in arrival order, then the timeout reaper. Returns the
    /// number of messages processed.
    pub fn tick(&mut self) -> usize {
        self.clock += 1;
        self.refresh_ring();

        let inbox = self.transport.recv(&self.address);
        let processed = inbox.len();
        for msg in &inbox {
            self.dispatch(msg);
        }

        let reaped = self.coordinator.reap(self.clock);
        if reaped > 0 {
            tracing::debug!("{}: tick {} reaped {} requests", self.address, self.clock, reaped);
        }
        processed
    }

    /// Pull the current membership and rebuild the ring.
    ///
    /// Returns `true` if the ring changed, after stabilizing local keys
    /// onto their new replica sets.
    pub fn refresh_ring(&mut self) -> bool {
        let snapshot = self.membership.current_members();
        if !self.ring.update(snapshot) {
            return false;
        }
        self.metrics.ring_changes.inc();
        if !self.replica.store().is_empty() {
            self.replica.stabilize(self.ring.ring(), &self.txids);
        }
        true
    }

    /// Route one inbound message by type
    pub fn dispatch(&mut self, msg: &Message) {
        match msg.kind {
            MessageType::Reply => self.coordinator.handle_reply(msg, self.clock),
            MessageType::ReadReply => self.coordinator.handle_read_reply(msg, self.clock),
            MessageType::Create | MessageType::Read | MessageType::Update | MessageType::Delete => {
                self.replica.handle(msg)
            }
        }
    }

    pub fn create(&mut self, key: &str, value: &str) -> Result<TransactionId> {
        self.coordinator.create(self.ring.ring(), key, value, self.clock)
    }

    pub fn read(&mut self, key: &str) -> Result<TransactionId> {
        self.coordinator.read(self.ring.ring(), key, self.clock)
    }

    pub fn update(&mut self, key: &str, value: &str) -> Result<TransactionId> {
        self.coordinator.update(self.ring.ring(), key, value, self.clock)
    }

    pub fn delete(&mut self, key: &str) -> Result<TransactionId> {
        self.coordinator.delete(self.ring.ring(), key, self.clock)
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Current logical time
    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn ring(&self) -> &Ring {
        self.ring.ring()
    }

    pub fn pending(&self) -> &PendingRequests {
        self.coordinator.pending()
    }

    pub fn store(&self) -> &dyn LocalStore {
        self.replica.store()
    }

    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }
}
