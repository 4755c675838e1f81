//! Port identifiers and VLAN membership.

use crate::{ParseError, VlanId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric index of a switch port, as handed out by the link layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortId(usize);

impl PortId {
    /// Creates a port id from its index.
    pub const fn new(index: usize) -> Self {
        PortId(index)
    }

    /// Returns the index of this port.
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for PortId {
    fn from(index: usize) -> Self {
        PortId(index)
    }
}

/// VLAN membership of a port.
///
/// Set once from configuration and never changed at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortAssignment {
    /// Untagged port carrying exactly one VLAN.
    Access(VlanId),
    /// Tagged port carrying every VLAN; takes part in spanning tree.
    Trunk,
}

impl PortAssignment {
    /// Configuration token marking a trunk port.
    pub const TRUNK_TOKEN: &'static str = "T";

    /// Returns true if this is a trunk port.
    pub const fn is_trunk(&self) -> bool {
        matches!(self, PortAssignment::Trunk)
    }

    /// Returns true if this is an access port.
    pub const fn is_access(&self) -> bool {
        matches!(self, PortAssignment::Access(_))
    }

    /// Returns the access VLAN, or `None` for a trunk.
    pub const fn access_vlan(&self) -> Option<VlanId> {
        match self {
            PortAssignment::Access(vlan) => Some(*vlan),
            PortAssignment::Trunk => None,
        }
    }
}

impl fmt::Display for PortAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortAssignment::Access(vlan) => write!(f, "{}", vlan),
            PortAssignment::Trunk => f.write_str(Self::TRUNK_TOKEN),
        }
    }
}

impl FromStr for PortAssignment {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::TRUNK_TOKEN {
            return Ok(PortAssignment::Trunk);
        }
        s.parse::<VlanId>()
            .map(PortAssignment::Access)
            .map_err(|_| ParseError::InvalidPortAssignment(s.to_string()))
    }
}
