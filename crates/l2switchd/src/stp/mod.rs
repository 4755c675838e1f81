//! Simplified spanning tree.
//!
//! Two port states (blocking, listening), root election by lowest bridge id,
//! a fixed cost of 10 per hop, and a once-per-second advertisement from the
//! root. There are no aging timers or topology change notifications:
//! convergence relies on the periodic advertisement and on reacting to every
//! BPDU as it arrives.

mod engine;
mod types;

pub use engine::{StpEngine, PATH_COST_INCREMENT};
pub use types::{BridgeSnapshot, BridgeState, PortSnapshot, PortStatus, StpStats};
