//! STP types and structures.

use serde::Serialize;
use std::fmt;

use l2switch_types::{BridgeId, PortAssignment, PortId};

use crate::vlan_table::VlanTable;

/// Loop-prevention status of a port.
///
/// Only two states exist: `Listening` is the forwarding-capable one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PortStatus {
    Blocking,
    Listening,
}

impl PortStatus {
    /// Initial status for a port with the given assignment.
    pub const fn initial(assignment: PortAssignment) -> Self {
        match assignment {
            PortAssignment::Trunk => PortStatus::Blocking,
            PortAssignment::Access(_) => PortStatus::Listening,
        }
    }

    pub const fn is_blocking(&self) -> bool {
        matches!(self, PortStatus::Blocking)
    }

    /// Converts to string representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PortStatus::Blocking => "blocking",
            PortStatus::Listening => "listening",
        }
    }
}

impl fmt::Display for PortStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// STP counters, kept under the bridge lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StpStats {
    pub bpdus_received: u64,
    pub bpdus_sent: u64,
    pub root_changes: u64,
    pub port_transitions: u64,
}

/// The switch's working belief about the spanning tree.
///
/// Only [`super::StpEngine`] mutates it, and only while holding its lock.
#[derive(Debug, Clone)]
pub struct BridgeState {
    pub(super) own_id: BridgeId,
    pub(super) root_id: BridgeId,
    pub(super) root_cost: u32,
    pub(super) root_port: Option<PortId>,
    pub(super) status: Vec<PortStatus>,
    pub(super) stats: StpStats,
    /// Bumped on every root or status change.
    pub(super) generation: u64,
}

impl BridgeState {
    /// Initial state: this bridge is root, trunks block, access ports listen.
    pub fn new(own_id: BridgeId, vlans: &VlanTable) -> Self {
        Self {
            own_id,
            root_id: own_id,
            root_cost: 0,
            root_port: None,
            status: vlans
                .ports()
                .map(|port| PortStatus::initial(vlans.assignment_of(port)))
                .collect(),
            stats: StpStats::default(),
            generation: 0,
        }
    }

    pub fn own_id(&self) -> BridgeId {
        self.own_id
    }

    pub fn root_id(&self) -> BridgeId {
        self.root_id
    }

    pub fn root_cost(&self) -> u32 {
        self.root_cost
    }

    pub fn root_port(&self) -> Option<PortId> {
        self.root_port
    }

    /// True while this bridge believes it is the root.
    pub fn is_root(&self) -> bool {
        self.root_id == self.own_id
    }

    pub fn status(&self, port: PortId) -> PortStatus {
        self.status[port.index()]
    }

    pub fn stats(&self) -> StpStats {
        self.stats
    }
}

/// Serializable view of one port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortSnapshot {
    pub name: String,
    pub assignment: String,
    pub status: PortStatus,
}

/// Serializable copy of the bridge state, taken under the lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeSnapshot {
    pub own_id: BridgeId,
    pub root_id: BridgeId,
    pub root_cost: u32,
    pub root_port: Option<String>,
    pub is_root: bool,
    pub ports: Vec<PortSnapshot>,
    pub stats: StpStats,
}

impl BridgeSnapshot {
    pub(super) fn capture(state: &BridgeState, vlans: &VlanTable) -> Self {
        Self {
            own_id: state.own_id,
            root_id: state.root_id,
            root_cost: state.root_cost,
            root_port: state.root_port.map(|port| vlans.name_of(port).to_string()),
            is_root: state.is_root(),
            ports: vlans
                .ports()
                .map(|port| PortSnapshot {
                    name: vlans.name_of(port).to_string(),
                    assignment: vlans.assignment_of(port).to_string(),
                    status: state.status(port),
                })
                .collect(),
            stats: state.stats,
        }
    }

    /// Status of the named port, if it exists.
    pub fn status_of(&self, name: &str) -> Option<PortStatus> {
        self.ports
            .iter()
            .find(|port| port.name == name)
            .map(|port| port.status)
    }
}
