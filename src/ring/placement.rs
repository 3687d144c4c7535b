//! Replica placement on the consistent hash ring
//!
//! Nodes sit on the ring at the hash of their address. A key belongs to the
//! first node at or after its own position (wrapping to the lowest node),
//! and is replicated on that node and its next two successors.

use crate::common::{ring_position, Address};

/// Number of replicas held for every key
pub const REPLICATION_FACTOR: usize = 3;

/// Replies needed to resolve an operation
pub const QUORUM: usize = 2;

/// A ring participant and its position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingNode {
    pub address: Address,
    pub position: u64,
}

impl RingNode {
    pub fn new(address: Address, ring_size: u64) -> Self {
        let position = ring_position(address.as_str(), ring_size);
        Self { address, position }
    }
}

/// Nodes sorted ascending by ring position
#[derive(Debug, Clone)]
pub struct Ring {
    nodes: Vec<RingNode>,
    ring_size: u64,
}

impl Ring {
    pub fn empty(ring_size: u64) -> Self {
        Self {
            nodes: Vec::new(),
            ring_size,
        }
    }

    /// Place every member and sort. Equal positions are ordered by address
    /// so all nodes derive the same ring from an unordered snapshot.
    pub fn from_members(members: impl IntoIterator<Item = Address>, ring_size: u64) -> Self {
        let mut nodes: Vec<RingNode> = members
            .into_iter()
            .map(|address| RingNode::new(address, ring_size))
            .collect();
        nodes.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| a.address.cmp(&b.address))
        });
        Self { nodes, ring_size }
    }

    pub fn nodes(&self) -> &[RingNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ring_size(&self) -> u64 {
        self.ring_size
    }

    /// Same members in the same ring order
    pub fn same_layout(&self, other: &Ring) -> bool {
        self.nodes.len() == other.nodes.len()
            && self
                .nodes
                .iter()
                .zip(&other.nodes)
                .all(|(a, b)| a.address == b.address)
    }

    /// Replica set for `key`, primary first. Empty when fewer than
    /// [`REPLICATION_FACTOR`] nodes are on the ring.
    pub fn find_nodes(&self, key: &str) -> Vec<RingNode> {
        let n = self.nodes.len();
        if n < REPLICATION_FACTOR {
            return Vec::new();
        }

        let pos = ring_position(key, self.ring_size);
        // First node at or after `pos`; past the last node wraps to the first
        let primary = match self.nodes.partition_point(|node| node.position < pos) {
            idx if idx == n => 0,
            idx => idx,
        };

        (0..REPLICATION_FACTOR)
            .map(|i| self.nodes[(primary + i) % n].clone())
            .collect()
    }
}
