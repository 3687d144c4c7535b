/// Local single-node storage for ringkv
///
/// Each node keeps its replicas in a plain key→value map. The map is owned
/// by the node's event loop, so the trait takes `&mut self` and needs no
/// internal locking.
use std::collections::BTreeMap;

/// Trait for a node's local key-value store.
///
/// `create` on an existing key and `update`/`delete` on an absent key report
/// failure by returning `false`.
pub trait LocalStore: Send {
    fn create(&mut self, key: &str, value: &str) -> bool;
    fn read(&self, key: &str) -> Option<String>;
    fn update(&mut self, key: &str, value: &str) -> bool;
    fn delete(&mut self, key: &str) -> bool;
    /// Snapshot of every held record
    fn entries(&self) -> Vec<(String, String)>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory store (default)
///
/// Ordered so stabilization walks keys in the same order on every run.
#[derive(Debug, Default)]
pub struct MemStore {
    map: BTreeMap<String, String>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemStore {
    fn create(&mut self, key: &str, value: &str) -> bool {
        if self.map.contains_key(key) {
            return false;
        }
        self.map.insert(key.to_string(), value.to_string());
        true
    }

    fn read(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn update(&mut self, key: &str, value: &str) -> bool {
        match self.map.get_mut(key) {
            Some(slot) => {
                *slot = value.to_string();
                true
            }
            None => false,
        }
    }

    fn delete(&mut self, key: &str) -> bool {
        self.map.remove(key).is_some()
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.map
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}
