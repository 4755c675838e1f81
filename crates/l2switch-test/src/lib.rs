//! Integration test infrastructure for l2switchd
//!
//! Provides:
//! - Switch, frame and topology fixtures
//! - A deterministic multi-switch simulator wired with virtual cables
//! - An in-memory link layer for driving the daemon runtime
//! - Verification helpers for spanning tree outcomes

mod channel_link;
pub mod fixtures;
mod topology;
mod verification;

pub use channel_link::{ChannelLink, LinkHandle};
pub use fixtures::*;
pub use topology::{Topology, DEFAULT_DELIVERY_LIMIT};
pub use verification::*;
