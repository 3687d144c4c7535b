//! Ring membership tracking

use crate::common::Address;
use crate::ring::placement::Ring;

/// Holds the current ring and detects membership changes
#[derive(Debug)]
pub struct RingManager {
    ring: Ring,
}

impl RingManager {
    pub fn new(ring_size: u64) -> Self {
        Self {
            ring: Ring::empty(ring_size),
        }
    }

    pub fn ring(&self) -> &Ring {
        &self.ring
    }

    /// Rebuild the ring from a membership snapshot.
    ///
    /// Returns `true` when the member count or the ring order differs from
    /// the stored ring, in which case the stored ring is replaced. The caller
    /// is expected to stabilize on `true`.
    pub fn update(&mut self, snapshot: Vec<Address>) -> bool {
        let candidate = Ring::from_members(snapshot, self.ring.ring_size());
        if candidate.same_layout(&self.ring) {
            return false;
        }

        tracing::info!(
            "Ring changed: {} -> {} members",
            self.ring.len(),
            candidate.len()
        );
        self.ring = candidate;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addrs(ids: &[u32]) -> Vec<Address> {
        ids.iter().map(|i| Address::new(format!("{}:0", i))).collect()
    }

    #[test]
    fn test_first_snapshot_is_change() {
        let mut manager = RingManager::new(512);
        assert!(manager.update(addrs(&[1, 2, 3])));
        assert_eq!(manager.ring().len(), 3);
    }

    #[test]
    fn test_unchanged_membership_is_noop() {
        let mut manager = RingManager::new(512);
        manager.update(addrs(&[1, 2, 3, 4]));
        assert!(!manager.update(addrs(&[4, 3, 2, 1])));
        assert!(!manager.update(addrs(&[1, 2, 3, 4])));
    }

    #[test]
    fn test_member_left() {
        let mut manager = RingManager::new(512);
        manager.update(addrs(&[1, 2, 3, 4]));
        assert!(manager.update(addrs(&[1, 2, 3])));
        assert_eq!(manager.ring().len(), 3);
    }

    #[test]
    fn test_member_replaced_same_size() {
        let mut manager = RingManager::new(512);
        manager.update(addrs(&[1, 2, 3, 4]));
        assert!(manager.update(addrs(&[1, 2, 3, 5])));
        assert!(manager
            .ring()
            .nodes()
            .iter()
            .any(|n| n.address == Address::new("5:0")));
    }

    #[test]
    fn test_empty_snapshot_on_empty_ring() {
        let mut manager = RingManager::new(512);
        assert!(!manager.update(Vec::new()));
    }
}
