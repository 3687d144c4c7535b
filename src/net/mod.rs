//! Collaborators at the node boundary: transport and membership

pub mod membership;
pub mod transport;

pub use membership::{Membership, SharedMembership};
pub use transport::{NetStats, SimNetwork, Transport};
