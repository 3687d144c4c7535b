//! In-process cluster simulation
//!
//! Runs many [`Node`](crate::node::Node)s over one simulated network and a
//! shared membership list, advancing them in lockstep ticks. Used by the
//! `ringkv-sim` binary and the integration tests.

pub mod cluster;
pub mod summary;

pub use cluster::{Cluster, Issued};
pub use summary::Summary;
