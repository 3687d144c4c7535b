//! Audit logging of operation outcomes
//!
//! Every terminal outcome (success or failure of create, read, update,
//! delete) is reported once by the coordinator that issued it and once per
//! replica that served it. The core only writes into a sink; it never reads
//! audit state back.

use crate::common::message::{Address, Operation, TransactionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Which side of the protocol observed the outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Client-observed outcome, decided by quorum or timeout
    Coordinator,
    /// Server-observed outcome of a local store operation
    Replica,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub node: Address,
    pub origin: Origin,
    pub operation: Operation,
    pub outcome: Outcome,
    pub transaction_id: TransactionId,
    pub key: String,
    pub value: Option<String>,
}

impl AuditEvent {
    pub fn new(
        node: &Address,
        origin: Origin,
        operation: Operation,
        outcome: Outcome,
        transaction_id: TransactionId,
        key: &str,
        value: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            node: node.clone(),
            origin,
            operation,
            outcome,
            transaction_id,
            key: key.to_string(),
            value,
        }
    }
}

/// Destination of audit events
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Emit `event` as a tracing event, then hand it to `sink`.
pub fn report(sink: &dyn AuditSink, event: AuditEvent) {
    tracing::debug!(
        node = %event.node,
        origin = ?event.origin,
        op = %event.operation,
        outcome = ?event.outcome,
        tx = event.transaction_id,
        key = %event.key,
        "audit"
    );
    sink.record(event);
}

/// JSON-lines audit logger writing to a file and/or stdout
pub struct AuditLogger {
    file: Option<Mutex<File>>,
    to_stdout: bool,
}

impl AuditLogger {
    /// Create a new audit logger. An unopenable path disables file output.
    pub fn new(path: Option<&Path>, to_stdout: bool) -> Self {
        let file = path.and_then(|path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| tracing::warn!("Cannot open audit log {}: {}", path.display(), e))
                .ok()
                .map(Mutex::new)
        });
        Self { file, to_stdout }
    }
}

impl AuditSink for AuditLogger {
    fn record(&self, event: AuditEvent) {
        let line = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
        if let Some(file) = &self.file {
            if let Ok(mut f) = file.lock() {
                let _ = writeln!(f, "{}", line);
            }
        }
        if self.to_stdout {
            println!("[AUDIT] {}", line);
        }
    }
}

/// In-memory audit sink, queried by tests and the simulation summary
#[derive(Debug, Default)]
pub struct MemoryAudit {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.lock().clone()
    }

    /// Coordinator-side outcomes recorded for `tx`
    pub fn coordinator_outcomes(&self, tx: TransactionId) -> Vec<AuditEvent> {
        self.lock()
            .iter()
            .filter(|e| e.origin == Origin::Coordinator && e.transaction_id == tx)
            .cloned()
            .collect()
    }

    /// Replica-side outcomes recorded for `tx`
    pub fn replica_outcomes(&self, tx: TransactionId) -> Vec<AuditEvent> {
        self.lock()
            .iter()
            .filter(|e| e.origin == Origin::Replica && e.transaction_id == tx)
            .cloned()
            .collect()
    }

    pub fn count(&self, origin: Origin, operation: Operation, outcome: Outcome) -> usize {
        self.lock()
            .iter()
            .filter(|e| e.origin == origin && e.operation == operation && e.outcome == outcome)
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<AuditEvent>> {
        // A poisoned log is still a valid log
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl AuditSink for MemoryAudit {
    fn record(&self, event: AuditEvent) {
        self.lock().push(event);
    }
}
