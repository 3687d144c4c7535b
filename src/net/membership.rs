//! Membership source consumed by the ring manager

use crate::common::Address;
use std::sync::Mutex;

/// Supplier of the currently-alive member list (unordered)
pub trait Membership: Send + Sync {
    fn current_members(&self) -> Vec<Address>;
}

/// Perfect failure detector over a shared member list
#[derive(Debug, Default)]
pub struct SharedMembership {
    members: Mutex<Vec<Address>>,
}

impl SharedMembership {
    pub fn new(members: impl IntoIterator<Item = Address>) -> Self {
        Self {
            members: Mutex::new(members.into_iter().collect()),
        }
    }

    /// Add `address`; returns `false` if it was already a member
    pub fn join(&self, address: Address) -> bool {
        let mut members = self.lock();
        if members.contains(&address) {
            return false;
        }
        members.push(address);
        true
    }

    /// Remove `address`; returns `false` if it was not a member
    pub fn leave(&self, address: &Address) -> bool {
        let mut members = self.lock();
        let before = members.len();
        members.retain(|m| m != address);
        members.len() != before
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.lock().contains(address)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Address>> {
        self.members.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Membership for SharedMembership {
    fn current_members(&self) -> Vec<Address> {
        self.lock().clone()
    }
}
