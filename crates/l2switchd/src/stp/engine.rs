//! STP engine: root election and port status transitions.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

use l2switch_types::{BridgeId, MacAddress, PortId};

use super::types::{BridgeSnapshot, BridgeState, PortStatus, StpStats};
use crate::frame::Bpdu;
use crate::switch::Egress;
use crate::vlan_table::VlanTable;

/// Cost added per hop toward the root.
pub const PATH_COST_INCREMENT: u32 = 10;

/// Owns the bridge state and applies the spanning tree rules to it.
///
/// Shared between the receive loop and the periodic advertiser. Every public
/// operation runs as a single critical section; the frames it returns are
/// sent by the caller after the lock is released.
pub struct StpEngine {
    own_id: BridgeId,
    own_mac: MacAddress,
    vlans: Arc<VlanTable>,
    state: Mutex<BridgeState>,
}

impl StpEngine {
    pub fn new(own_id: BridgeId, own_mac: MacAddress, vlans: Arc<VlanTable>) -> Self {
        let state = BridgeState::new(own_id, &vlans);
        Self {
            own_id,
            own_mac,
            vlans,
            state: Mutex::new(state),
        }
    }

    pub fn own_id(&self) -> BridgeId {
        self.own_id
    }

    /// Periodic advertisement.
    ///
    /// While this bridge believes it is root, sends a BPDU on every trunk port
    /// whatever its status and keeps every port listening.
    pub fn tick(&self) -> Vec<Egress> {
        let mut state = self.state.lock();
        if !state.is_root() {
            return Vec::new();
        }

        let frame = self.advertisement(&state).encode(self.own_mac);
        let egress: Vec<Egress> = self
            .vlans
            .trunk_ports()
            .map(|port| Egress::new(port, frame.clone()))
            .collect();
        state.stats.bpdus_sent += egress.len() as u64;

        self.unblock_all(&mut state);
        egress
    }

    /// Applies a BPDU received on `ingress` and returns the BPDUs to relay.
    ///
    /// # Panics
    ///
    /// Panics if `ingress` is not a port of this switch.
    pub fn handle_bpdu(&self, ingress: PortId, bpdu: &Bpdu) -> Vec<Egress> {
        assert!(
            self.vlans.contains(ingress),
            "BPDU received on unknown port {}",
            ingress
        );

        if self.vlans.assignment_of(ingress).is_access() {
            debug!(
                port = self.vlans.name_of(ingress),
                "Ignoring BPDU received on access port"
            );
            return Vec::new();
        }

        let mut state = self.state.lock();
        state.stats.bpdus_received += 1;
        let was_root = state.is_root();
        let mut egress = Vec::new();

        if bpdu.root < state.root_id {
            state.root_id = bpdu.root;
            state.root_cost = bpdu.cost.saturating_add(PATH_COST_INCREMENT);
            state.root_port = Some(ingress);
            state.stats.root_changes += 1;
            state.generation += 1;
            info!(
                root = %state.root_id,
                cost = state.root_cost,
                port = self.vlans.name_of(ingress),
                "Adopted new root bridge"
            );

            if was_root {
                let others: Vec<PortId> = self
                    .vlans
                    .trunk_ports()
                    .filter(|port| *port != ingress)
                    .collect();
                for port in others {
                    self.transition(&mut state, port, PortStatus::Blocking);
                }
            }

            if state.status(ingress).is_blocking() {
                self.transition(&mut state, ingress, PortStatus::Listening);
            }

            let frame = self.advertisement(&state).encode(self.own_mac);
            egress = self
                .vlans
                .trunk_ports()
                .filter(|port| *port != ingress && !state.status(*port).is_blocking())
                .map(|port| Egress::new(port, frame.clone()))
                .collect();
            state.stats.bpdus_sent += egress.len() as u64;
        } else if bpdu.root == state.root_id {
            if state.root_port == Some(ingress) {
                let offered = bpdu.cost.saturating_add(PATH_COST_INCREMENT);
                if offered < state.root_cost {
                    debug!(from = state.root_cost, to = offered, "Lowered root path cost");
                    state.root_cost = offered;
                    state.generation += 1;
                }
            } else if bpdu.cost > state.root_cost
                && state.status(ingress) != PortStatus::Listening
            {
                // Peer is farther from the root: we are designated on this segment.
                self.transition(&mut state, ingress, PortStatus::Listening);
            }
        } else if bpdu.sender == self.own_id {
            self.transition(&mut state, ingress, PortStatus::Blocking);
        }

        if state.is_root() {
            self.unblock_all(&mut state);
        }

        egress
    }

    /// Current status of `port`.
    pub fn port_status(&self, port: PortId) -> PortStatus {
        self.state.lock().status(port)
    }

    pub fn is_blocking(&self, port: PortId) -> bool {
        self.port_status(port).is_blocking()
    }

    /// Status of every port, indexed by port id, read under one lock.
    pub fn port_statuses(&self) -> Vec<PortStatus> {
        self.state.lock().status.clone()
    }

    /// True while this bridge believes it is the root.
    pub fn is_root(&self) -> bool {
        self.state.lock().is_root()
    }

    /// Counter that changes whenever the root or a port status changes.
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    pub fn stats(&self) -> StpStats {
        self.state.lock().stats()
    }

    /// Consistent copy of the bridge state.
    pub fn snapshot(&self) -> BridgeSnapshot {
        let state = self.state.lock();
        BridgeSnapshot::capture(&state, &self.vlans)
    }

    fn advertisement(&self, state: &BridgeState) -> Bpdu {
        Bpdu {
            sender: self.own_id,
            root: state.root_id,
            cost: state.root_cost,
        }
    }

    fn unblock_all(&self, state: &mut BridgeState) {
        for port in self.vlans.ports() {
            self.transition(state, port, PortStatus::Listening);
        }
    }

    fn transition(&self, state: &mut BridgeState, port: PortId, to: PortStatus) {
        let from = state.status[port.index()];
        if from == to {
            return;
        }
        state.status[port.index()] = to;
        state.stats.port_transitions += 1;
        state.generation += 1;
        info!(
            port = self.vlans.name_of(port),
            %from,
            %to,
            "Port status changed"
        );
    }
}
