//! Common types for the software L2 switch.
//!
//! This crate provides type-safe representations of the primitives shared by
//! the switching engine, the STP engine and the configuration loader:
//!
//! - [`MacAddress`]: 48-bit Ethernet MAC addresses
//! - [`VlanId`]: VLAN identifiers assigned to access ports
//! - [`BridgeId`]: bridge priority used in root election
//! - [`PortId`]: numeric switch port index
//! - [`PortAssignment`]: access VLAN or trunk membership of a port

mod bridge;
mod mac;
mod port;
mod vlan;

pub use bridge::BridgeId;
pub use mac::MacAddress;
pub use port::{PortAssignment, PortId};
pub use vlan::VlanId;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid VLAN ID: {0} (must be 1-4094)")]
    InvalidVlanId(String),

    #[error("invalid bridge id: {0}")]
    InvalidBridgeId(String),

    #[error("invalid port assignment: {0} (expected a VLAN id or \"T\")")]
    InvalidPortAssignment(String),
}
