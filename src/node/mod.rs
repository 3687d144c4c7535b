//! A single ring member
//!
//! [`Node`] owns one node's ring view, coordinator state, and replica store,
//! and advances them one logical tick at a time.

pub mod server;

pub use server::Node;
