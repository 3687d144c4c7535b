//! In-flight client operations awaiting quorum
//!
//! With three replicas and a quorum of two, a second failure proves quorum
//! is unreachable and a second agreeing success proves it was reached.
//! Reads additionally keep one conflicting candidate so a single divergent
//! replica can be outvoted by the third reply.

use crate::common::{Operation, TransactionId};
use crate::ring::QUORUM;
use std::collections::HashMap;

/// Result of feeding one reply into a pending request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Quorum not yet decided
    Pending,
    /// Quorum reached; reads carry the agreed value
    Succeeded(Option<String>),
    /// Quorum unreachable or replicas disagree
    Failed,
}

#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub operation: Operation,
    pub key: String,
    /// Value written, or the tentative value of a read
    pub value: Option<String>,
    /// Successful replies counted so far
    pub replies: u8,
    /// Second distinct value seen by a read
    pub conflicting: Option<String>,
    pub saw_failure: bool,
    /// Tick at which the request was fanned out
    pub created_at: u64,
}

impl PendingRequest {
    pub fn new(operation: Operation, key: String, value: Option<String>, created_at: u64) -> Self {
        Self {
            operation,
            key,
            value,
            replies: 0,
            conflicting: None,
            saw_failure: false,
            created_at,
        }
    }

    fn observe_failure(&mut self) -> Verdict {
        if self.saw_failure {
            Verdict::Failed
        } else {
            self.saw_failure = true;
            Verdict::Pending
        }
    }

    /// Apply a REPLY to a create, update, or delete
    pub fn observe_write(&mut self, success: bool) -> Verdict {
        if !success {
            return self.observe_failure();
        }
        self.replies += 1;
        if usize::from(self.replies) < QUORUM {
            return Verdict::Pending;
        }
        Verdict::Succeeded(self.value.clone())
    }

    /// Apply a READREPLY, reconciling the returned value
    pub fn observe_read(&mut self, success: bool, value: Option<String>) -> Verdict {
        if !success {
            return self.observe_failure();
        }

        match self.replies {
            0 => {
                self.replies = 1;
                self.value = value;
                Verdict::Pending
            }
            1 if !self.saw_failure => {
                self.replies = 2;
                if self.value == value {
                    Verdict::Succeeded(self.value.clone())
                } else {
                    self.conflicting = value;
                    Verdict::Pending
                }
            }
            // Final possible reply: it must side with an earlier value
            _ => {
                self.replies += 1;
                if self.value == value {
                    Verdict::Succeeded(self.value.clone())
                } else if self.conflicting.is_some() && self.conflicting == value {
                    Verdict::Succeeded(self.conflicting.clone())
                } else {
                    Verdict::Failed
                }
            }
        }
    }

    /// Ticks elapsed since fan-out
    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.created_at)
    }
}

/// Pending requests keyed by transaction id
#[derive(Debug, Default)]
pub struct PendingRequests {
    entries: HashMap<TransactionId, PendingRequest>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tx: TransactionId, request: PendingRequest) {
        let previous = self.entries.insert(tx, request);
        debug_assert!(previous.is_none(), "transaction id {} reused", tx);
    }

    pub fn get(&self, tx: TransactionId) -> Option<&PendingRequest> {
        self.entries.get(&tx)
    }

    pub fn get_mut(&mut self, tx: TransactionId) -> Option<&mut PendingRequest> {
        self.entries.get_mut(&tx)
    }

    pub fn remove(&mut self, tx: TransactionId) -> Option<PendingRequest> {
        self.entries.remove(&tx)
    }

    pub fn contains(&self, tx: TransactionId) -> bool {
        self.entries.contains_key(&tx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return every request older than `wait_ticks`, oldest first
    pub fn take_expired(&mut self, now: u64, wait_ticks: u64) -> Vec<(TransactionId, PendingRequest)> {
        let expired: Vec<TransactionId> = self
            .entries
            .iter()
            .filter(|(_, req)| req.age(now) > wait_ticks)
            .map(|(tx, _)| *tx)
            .collect();

        let mut taken: Vec<(TransactionId, PendingRequest)> = expired
            .into_iter()
            .filter_map(|tx| self.entries.remove(&tx).map(|req| (tx, req)))
            .collect();
        taken.sort_by_key(|(tx, _)| *tx);
        taken
    }
}
