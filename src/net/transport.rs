//! Message transport between ring nodes
//!
//! The core only needs best-effort, unacknowledged delivery: `send` never
//! blocks or reports failure, and each node drains its inbox once per tick.
//! `SimNetwork` is an in-process implementation with configurable loss,
//! reordering, and crash-stop node failures.

use crate::common::{Address, Message};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// Point-to-point, possibly lossy message delivery
pub trait Transport: Send + Sync {
    /// Fire-and-forget send
    fn send(&self, from: &Address, to: &Address, message: &Message);

    /// Drain every message currently queued for `address`
    fn recv(&self, address: &Address) -> Vec<Message>;
}

/// Delivery counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetStats {
    pub sent: u64,
    pub dropped: u64,
    pub delivered: u64,
    pub malformed: u64,
}

struct NetState {
    inboxes: HashMap<Address, VecDeque<Vec<u8>>>,
    failed: HashSet<Address>,
    rng: StdRng,
    stats: NetStats,
}

/// In-process network carrying bincode frames
pub struct SimNetwork {
    state: Mutex<NetState>,
    drop_rate: f64,
    reorder: bool,
}

impl SimNetwork {
    /// Lossless, in-order network
    pub fn reliable() -> Self {
        Self::new(0.0, false, 0)
    }

    /// `drop_rate` is clamped into `[0, 1]`
    pub fn new(drop_rate: f64, reorder: bool, seed: u64) -> Self {
        Self {
            state: Mutex::new(NetState {
                inboxes: HashMap::new(),
                failed: HashSet::new(),
                rng: StdRng::seed_from_u64(seed),
                stats: NetStats::default(),
            }),
            drop_rate: drop_rate.clamp(0.0, 1.0),
            reorder,
        }
    }

    /// Crash-stop `address`: it neither sends nor receives from now on
    pub fn fail(&self, address: &Address) {
        let mut state = self.lock();
        state.failed.insert(address.clone());
        state.inboxes.remove(address);
    }

    pub fn is_failed(&self, address: &Address) -> bool {
        self.lock().failed.contains(address)
    }

    pub fn stats(&self) -> NetStats {
        self.lock().stats
    }

    /// Frames waiting in `address`'s inbox
    pub fn queued(&self, address: &Address) -> usize {
        self.lock().inboxes.get(address).map_or(0, VecDeque::len)
    }

    /// Queue an arbitrary frame, bypassing encoding and loss
    pub fn inject_raw(&self, to: &Address, frame: Vec<u8>) {
        self.lock()
            .inboxes
            .entry(to.clone())
            .or_default()
            .push_back(frame);
    }

    fn lock(&self) -> MutexGuard<'_, NetState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Transport for SimNetwork {
    fn send(&self, from: &Address, to: &Address, message: &Message) {
        let frame = match message.encode() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Dropping unencodable message from {}: {}", from, e);
                return;
            }
        };

        let mut state = self.lock();
        state.stats.sent += 1;
        if state.failed.contains(from) || state.failed.contains(to) {
            state.stats.dropped += 1;
            return;
        }
        if self.drop_rate > 0.0 && state.rng.gen_bool(self.drop_rate) {
            state.stats.dropped += 1;
            return;
        }
        state.inboxes.entry(to.clone()).or_default().push_back(frame);
    }

    fn recv(&self, address: &Address) -> Vec<Message> {
        let mut state = self.lock();
        if state.failed.contains(address) {
            return Vec::new();
        }
        let frames: Vec<Vec<u8>> = match state.inboxes.get_mut(address) {
            Some(inbox) => inbox.drain(..).collect(),
            None => return Vec::new(),
        };

        let mut messages = Vec::with_capacity(frames.len());
        for frame in frames {
            match Message::decode(&frame) {
                Ok(message) => messages.push(message),
                Err(e) => {
                    state.stats.malformed += 1;
                    tracing::warn!("Dropping malformed frame for {}: {}", address, e);
                }
            }
        }
        if self.reorder {
            messages.shuffle(&mut state.rng);
        }
        state.stats.delivered += messages.len() as u64;
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Operation, ReplicaRole};

    fn msg(tx: u64) -> Message {
        Message::request(
            tx,
            Operation::Read,
            Address::new("1:0"),
            "k",
            None,
            ReplicaRole::Primary,
        )
    }

    #[test]
    fn test_reliable_delivery_in_order() {
        let net = SimNetwork::reliable();
        let (a, b) = (Address::new("1:0"), Address::new("2:0"));
        for tx in 0..5 {
            net.send(&a, &b, &msg(tx));
        }
        let received: Vec<u64> = net.recv(&b).iter().map(|m| m.transaction_id).collect();
        assert_eq!(received, vec![0, 1, 2, 3, 4]);
        assert!(net.recv(&b).is_empty());
        assert_eq!(net.stats().delivered, 5);
    }

    #[test]
    fn test_total_loss() {
        let net = SimNetwork::new(1.0, false, 7);
        let (a, b) = (Address::new("1:0"), Address::new("2:0"));
        net.send(&a, &b, &msg(1));
        assert!(net.recv(&b).is_empty());
        assert_eq!(net.stats().dropped, 1);
    }

    #[test]
    fn test_failed_node_isolated() {
        let net = SimNetwork::reliable();
        let (a, b) = (Address::new("1:0"), Address::new("2:0"));
        net.send(&a, &b, &msg(1));
        net.fail(&b);
        assert_eq!(net.queued(&b), 0);
        net.send(&a, &b, &msg(2));
        net.send(&b, &a, &msg(3));
        assert!(net.recv(&b).is_empty());
        assert!(net.recv(&a).is_empty());
        assert!(net.is_failed(&b));
    }

    #[test]
    fn test_reorder_keeps_every_message() {
        let net = SimNetwork::new(0.0, true, 3);
        let (a, b) = (Address::new("1:0"), Address::new("2:0"));
        for tx in 0..20 {
            net.send(&a, &b, &msg(tx));
        }
        let mut received: Vec<u64> = net.recv(&b).iter().map(|m| m.transaction_id).collect();
        received.sort();
        assert_eq!(received, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_malformed_frame_dropped() {
        let net = SimNetwork::reliable();
        let b = Address::new("2:0");
        net.inject_raw(&b, vec![1, 2, 3]);
        net.send(&Address::new("1:0"), &b, &msg(9));
        let received = net.recv(&b);
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].transaction_id, 9);
        assert_eq!(net.stats().malformed, 1);
    }
}
