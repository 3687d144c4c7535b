//! Application of CREATE/READ/UPDATE/DELETE requests to the local store

use crate::common::audit::{self, AuditEvent, AuditSink, Origin, Outcome};
use crate::common::{Address, LocalStore, Message, MessageType, NodeMetrics, Operation};
use crate::net::Transport;
use std::sync::Arc;

/// Replica Handler and Stabilization Engine of one node; owns its store
pub struct ReplicaHandler {
    pub(super) address: Address,
    pub(super) store: Box<dyn LocalStore>,
    pub(super) transport: Arc<dyn Transport>,
    pub(super) audit: Arc<dyn AuditSink>,
    pub(super) metrics: Arc<NodeMetrics>,
}

impl ReplicaHandler {
    pub fn new(
        address: Address,
        store: Box<dyn LocalStore>,
        transport: Arc<dyn Transport>,
        audit: Arc<dyn AuditSink>,
        metrics: Arc<NodeMetrics>,
    ) -> Self {
        Self {
            address,
            store,
            transport,
            audit,
            metrics,
        }
    }

    pub fn store(&self) -> &dyn LocalStore {
        self.store.as_ref()
    }

    /// Dispatch a request-type message. Replies are ignored here.
    pub fn handle(&mut self, msg: &Message) {
        match msg.kind {
            MessageType::Create => self.handle_create(msg),
            MessageType::Read => self.handle_read(msg),
            MessageType::Update => self.handle_update(msg),
            MessageType::Delete => self.handle_delete(msg),
            MessageType::Reply | MessageType::ReadReply => {
                tracing::debug!(
                    "{}: reply tx {} routed to replica handler",
                    self.address,
                    msg.transaction_id
                );
            }
        }
    }

    fn handle_create(&mut self, msg: &Message) {
        // Duplicate delivery or a replica that already holds the key:
        // stay silent so the coordinator never double-counts
        if self.store.read(&msg.key).is_some() {
            tracing::debug!("{}: create {:?} already held, ignoring", self.address, msg.key);
            return;
        }

        let value = msg.value.clone().unwrap_or_default();
        if msg.internal {
            self.store.create(&msg.key, &value);
            tracing::debug!("{}: replicated {:?} from {}", self.address, msg.key, msg.from);
            return;
        }

        let ok = self.store.create(&msg.key, &value);
        self.record(msg, Operation::Create, ok, Some(value.clone()));
        self.respond(msg, MessageType::Reply, ok, Some(value));
    }

    fn handle_read(&mut self, msg: &Message) {
        let value = self.store.read(&msg.key);
        let ok = value.is_some();
        self.record(msg, Operation::Read, ok, value.clone());
        self.respond(msg, MessageType::ReadReply, ok, value);
    }

    fn handle_update(&mut self, msg: &Message) {
        let value = msg.value.clone().unwrap_or_default();
        let ok = self.store.update(&msg.key, &value);
        self.record(msg, Operation::Update, ok, Some(value.clone()));
        self.respond(msg, MessageType::Reply, ok, Some(value));
    }

    fn handle_delete(&mut self, msg: &Message) {
        let ok = self.store.delete(&msg.key);
        self.record(msg, Operation::Delete, ok, None);
        self.respond(msg, MessageType::Reply, ok, None);
    }

    fn record(&self, msg: &Message, op: Operation, ok: bool, value: Option<String>) {
        self.metrics.replica_ops.inc();
        let outcome = if ok { Outcome::Success } else { Outcome::Failure };
        audit::report(
            self.audit.as_ref(),
            AuditEvent::new(
                &self.address,
                Origin::Replica,
                op,
                outcome,
                msg.transaction_id,
                &msg.key,
                value,
            ),
        );
    }

    fn respond(&self, msg: &Message, kind: MessageType, ok: bool, value: Option<String>) {
        let reply = Message::reply_to(msg, kind, self.address.clone(), ok, value);
        self.transport.send(&self.address, &msg.from, &reply);
    }
}
