//! Consistent hash ring
//!
//! - Placement: key → replica set of three successive ring nodes
//! - Manager: membership snapshot → ring, with change detection

pub mod manager;
pub mod placement;

pub use manager::RingManager;
pub use placement::{Ring, RingNode, QUORUM, REPLICATION_FACTOR};
