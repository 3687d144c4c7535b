//! Common utilities and types shared across ringkv

pub mod audit;
pub mod config;
pub mod error;
pub mod hash;
pub mod message;
pub mod metrics;
pub mod storage;

pub use audit::{AuditEvent, AuditLogger, AuditSink, MemoryAudit, Origin, Outcome};
pub use config::{AuditConfig, Config, NodeConfig, SimConfig};
pub use error::{Error, Result};
pub use hash::ring_position;
pub use message::{
    Address, Message, MessageType, Operation, ReplicaRole, TransactionId, TransactionIds,
};
pub use metrics::NodeMetrics;
pub use storage::{LocalStore, MemStore};
