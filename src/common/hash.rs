//! Hashing utilities for ringkv
//!
//! Every node must map the same key to the same ring position, so the hash
//! is BLAKE3 (stable across platforms and releases) rather than the
//! process-seeded `std` hasher.

/// Map a key (or a node address) onto the ring coordinate space `[0, ring_size)`.
pub fn ring_position(key: &str, ring_size: u64) -> u64 {
    let hash = blake3::hash(key.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(prefix) % ring_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_position_deterministic() {
        let key = "test-key";
        assert_eq!(ring_position(key, 512), ring_position(key, 512));
    }

    #[test]
    fn test_ring_position_in_range() {
        for i in 0..1_000 {
            assert!(ring_position(&format!("key_{}", i), 512) < 512);
        }
    }

    #[test]
    fn test_ring_position_spreads_keys() {
        let mut seen = std::collections::HashSet::new();
        for i in 0..100 {
            seen.insert(ring_position(&format!("key_{}", i), 512));
        }
        // 100 keys over 512 slots should rarely collide
        assert!(seen.len() > 80);
    }

    #[test]
    fn test_ring_size_one_collapses() {
        assert_eq!(ring_position("anything", 1), 0);
    }
}
