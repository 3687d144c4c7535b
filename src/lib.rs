//! # ringkv
//!
//! Replica coordination for a peer-to-peer key-value store built on a
//! consistent-hashing ring:
//! - Keys hash onto a ring of nodes and live on three consecutive members
//! - Any node coordinates client CREATE/READ/UPDATE/DELETE operations
//! - Outcomes are decided by a 2-of-3 quorum of replica replies
//! - Requests that never reach quorum are failed after a tick budget
//! - Held keys are re-replicated whenever membership changes
//!
//! ## Architecture
//!
//! ```text
//!          client op                     inbound messages
//!              │                                │
//! ┌────────────▼────────────┐     ┌─────────────▼─────────────┐
//! │       Coordinator       │◄────┤   Node::dispatch by type  │
//! │  fan-out · quorum ·     │     └─────────────┬─────────────┘
//! │  reaper                 │                   │ requests
//! └────────────┬────────────┘     ┌─────────────▼─────────────┐
//!              │                  │      ReplicaHandler       │
//!       ┌──────▼──────┐           │  local store · stabilize  │
//!       │ RingManager │──────────►└───────────────────────────┘
//!       └─────────────┘  ring change
//! ```
//!
//! Nodes advance in logical ticks. Each tick refreshes the ring from the
//! membership source, drains the node's inbox, and reaps expired requests.
//!
//! ## Usage
//!
//! ```bash
//! # Ten nodes, 5% message loss, one node failing mid-run
//! ringkv-sim run --nodes 10 --drop-rate 0.05 --ticks 300 --fail-at 150
//!
//! # Effective configuration (file, then RINGKV__* env, then defaults)
//! ringkv-sim --config ringkv.toml config
//! ```

pub mod common;
pub mod coordinator;
pub mod net;
pub mod node;
pub mod replica;
pub mod ring;
pub mod sim;

// Re-export commonly used types
pub use common::{Address, Config, Error, Message, Result};
pub use coordinator::Coordinator;
pub use node::Node;
pub use replica::ReplicaHandler;
pub use ring::{Ring, RingManager};

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build info
pub const BUILD_INFO: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CARGO_PKG_NAME"), ")");
