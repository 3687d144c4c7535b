//! Wire messages exchanged between ring nodes
//!
//! Messages are plain serde structs encoded with bincode for transport.
//! Request/reply correlation relies only on the transaction id carried in
//! every message.

use crate::common::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Opaque address of a ring participant
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

pub type TransactionId = u64;

/// Allocator of transaction ids.
///
/// Clones share one counter. Nodes built from clones of the same handle get
/// process-wide unique ids; nodes built from separate handles count
/// independently.
#[derive(Debug, Clone, Default)]
pub struct TransactionIds {
    next: Arc<AtomicU64>,
}

impl TransactionIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id. Ids are never handed out twice.
    pub fn next_id(&self) -> TransactionId {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}

/// Client-visible operation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    /// Does this operation carry a value to the replicas?
    pub fn carries_value(&self) -> bool {
        matches!(self, Operation::Create | Operation::Update)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    Create,
    Read,
    Update,
    Delete,
    Reply,
    ReadReply,
}

impl From<Operation> for MessageType {
    fn from(op: Operation) -> Self {
        match op {
            Operation::Create => MessageType::Create,
            Operation::Read => MessageType::Read,
            Operation::Update => MessageType::Update,
            Operation::Delete => MessageType::Delete,
        }
    }
}

/// Ordinal position of the destination within a key's replica set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplicaRole {
    Primary,
    Secondary,
    Tertiary,
}

impl ReplicaRole {
    pub const ALL: [ReplicaRole; 3] = [
        ReplicaRole::Primary,
        ReplicaRole::Secondary,
        ReplicaRole::Tertiary,
    ];

    /// Role for the `i`-th (zero-based) member of a replica set
    pub fn from_ordinal(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub transaction_id: TransactionId,
    pub kind: MessageType,
    pub from: Address,
    pub key: String,
    pub value: Option<String>,
    pub role: ReplicaRole,
    /// Outcome flag, meaningful on replies only
    pub success: bool,
    /// Set on stabilization traffic, which expects no reply
    pub internal: bool,
}

impl Message {
    /// Client-originated request addressed to one replica
    pub fn request(
        transaction_id: TransactionId,
        op: Operation,
        from: Address,
        key: impl Into<String>,
        value: Option<String>,
        role: ReplicaRole,
    ) -> Self {
        Self {
            transaction_id,
            kind: op.into(),
            from,
            key: key.into(),
            value,
            role,
            success: false,
            internal: false,
        }
    }

    /// Internal-replication CREATE sent by stabilization
    pub fn replication(
        transaction_id: TransactionId,
        from: Address,
        key: impl Into<String>,
        value: impl Into<String>,
        role: ReplicaRole,
    ) -> Self {
        Self {
            transaction_id,
            kind: MessageType::Create,
            from,
            key: key.into(),
            value: Some(value.into()),
            role,
            success: false,
            internal: true,
        }
    }

    /// Reply to `request`, echoing its transaction id, key, and role
    pub fn reply_to(
        request: &Message,
        kind: MessageType,
        from: Address,
        success: bool,
        value: Option<String>,
    ) -> Self {
        Self {
            transaction_id: request.transaction_id,
            kind,
            from,
            key: request.key.clone(),
            value,
            role: request.role,
            success,
            internal: false,
        }
    }

    pub fn is_reply(&self) -> bool {
        matches!(self.kind, MessageType::Reply | MessageType::ReadReply)
    }

    /// Encode for the wire
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a frame produced by [`Message::encode`]
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_ids_unique() {
        let ids = TransactionIds::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_transaction_ids_shared_between_clones() {
        let ids = TransactionIds::new();
        let other = ids.clone();
        let a = ids.next_id();
        let b = other.next_id();
        assert_eq!(b, a + 1);
    }

    #[test]
    fn test_transaction_ids_independent_handles() {
        let first = TransactionIds::new();
        let second = TransactionIds::new();
        assert_eq!(first.next_id(), second.next_id());
    }

    #[test]
    fn test_reply_echoes_request() {
        let req = Message::request(
            9,
            Operation::Update,
            Address::new("1:0"),
            "k",
            Some("v".into()),
            ReplicaRole::Tertiary,
        );
        let reply = Message::reply_to(
            &req,
            MessageType::Reply,
            Address::new("2:0"),
            true,
            req.value.clone(),
        );
        assert_eq!(reply.transaction_id, 9);
        assert_eq!(reply.role, ReplicaRole::Tertiary);
        assert_eq!(reply.key, "k");
        assert!(reply.is_reply());
        assert!(!req.is_reply());
    }

    #[test]
    fn test_replication_marker_survives_wire() {
        let msg = Message::replication(3, Address::new("1:0"), "k", "v", ReplicaRole::Primary);
        let decoded = Message::decode(&msg.encode().unwrap()).unwrap();
        assert!(decoded.internal);
        assert_eq!(decoded.kind, MessageType::Create);
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(Message::decode(&[0xff, 0x01]).is_err());
    }

    #[test]
    fn test_role_ordinals() {
        assert_eq!(ReplicaRole::from_ordinal(0), Some(ReplicaRole::Primary));
        assert_eq!(ReplicaRole::from_ordinal(2), Some(ReplicaRole::Tertiary));
        assert_eq!(ReplicaRole::from_ordinal(3), None);
    }
}
