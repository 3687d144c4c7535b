//! Server-side replica logic
//!
//! Handles request messages addressed to a replica holder, and re-sends
//! held keys to their current replica sets when the ring changes.

pub mod handler;
pub mod stabilize;

pub use handler::ReplicaHandler;
