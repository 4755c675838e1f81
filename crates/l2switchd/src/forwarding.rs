//! Forwarding engine: MAC learning, flooding, and VLAN tag rewriting.
//!
//! Per egress port the decision depends on the ingress/egress assignments:
//!
//! | ingress | egress | action                                          |
//! |---------|--------|-------------------------------------------------|
//! | access  | access | deliver if both ports share the VLAN            |
//! | access  | trunk  | drop if egress blocking, else tag with ingress VLAN |
//! | trunk   | access | deliver untagged if the tag matches the egress VLAN |
//! | trunk   | trunk  | drop if egress blocking, else deliver unchanged |

use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, trace};

use l2switch_types::{PortAssignment, PortId};

use crate::fdb::{FdbTable, LearnOutcome};
use crate::frame::{self, DestinationClass, EthernetHeader};
use crate::stp::StpEngine;
use crate::switch::Egress;
use crate::vlan_table::VlanTable;

/// Why a candidate egress was not used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Ingress and egress are in different VLANs.
    VlanMismatch,
    /// Egress trunk is blocking.
    Blocked,
    /// Tagged frame on an access port, or untagged frame on a trunk.
    IngressTagging,
}

/// Forwarding counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ForwardingStats {
    pub frames_received: u64,
    pub known_unicast: u64,
    pub flooded: u64,
    pub transmitted: u64,
    pub dropped_vlan: u64,
    pub dropped_blocked: u64,
    pub dropped_ingress: u64,
    pub station_moves: u64,
}

impl ForwardingStats {
    fn record_drop(&mut self, reason: DropReason) {
        match reason {
            DropReason::VlanMismatch => self.dropped_vlan += 1,
            DropReason::Blocked => self.dropped_blocked += 1,
            DropReason::IngressTagging => self.dropped_ingress += 1,
        }
    }
}

/// Decides egress ports for data frames.
///
/// Owns the learning table; reads port status from the STP engine.
pub struct ForwardingEngine {
    fdb: FdbTable,
    vlans: Arc<VlanTable>,
    stp: Arc<StpEngine>,
    stats: ForwardingStats,
}

impl ForwardingEngine {
    pub fn new(vlans: Arc<VlanTable>, stp: Arc<StpEngine>) -> Self {
        Self {
            fdb: FdbTable::new(),
            vlans,
            stp,
            stats: ForwardingStats::default(),
        }
    }

    /// Learns the source of a data frame and returns its copies to send.
    ///
    /// Frames arriving on a blocking port are neither learned nor forwarded.
    /// Port status is read once per frame, so a flood sees one consistent view
    /// even if the advertiser changes a port midway.
    pub fn process(
        &mut self,
        ingress: PortId,
        frame: &Bytes,
        header: &EthernetHeader,
    ) -> Vec<Egress> {
        self.stats.frames_received += 1;
        let statuses = self.stp.port_statuses();

        if statuses[ingress.index()].is_blocking() {
            self.stats.record_drop(DropReason::Blocked);
            trace!(port = self.vlans.name_of(ingress), "Discarding frame from blocking port");
            return Vec::new();
        }

        match self.fdb.learn(header.src, ingress) {
            LearnOutcome::New => {
                debug!(mac = %header.src, port = self.vlans.name_of(ingress), "Learned address")
            }
            LearnOutcome::Moved { from } => {
                self.stats.station_moves += 1;
                debug!(
                    mac = %header.src,
                    from = self.vlans.name_of(from),
                    to = self.vlans.name_of(ingress),
                    "Address moved"
                );
            }
            LearnOutcome::Refreshed => {}
        }

        if let Err(reason) = Self::check_ingress(self.vlans.assignment_of(ingress), header.vlan_id)
        {
            self.stats.record_drop(reason);
            debug!(
                port = self.vlans.name_of(ingress),
                vlan = ?header.vlan_id,
                "Dropping frame with unexpected tagging"
            );
            return Vec::new();
        }

        let known = match DestinationClass::of(&header.dst) {
            DestinationClass::Unicast => self.fdb.lookup(&header.dst),
            DestinationClass::Flood => None,
            DestinationClass::Stp => {
                debug!("BPDU handed to the forwarding engine; ignoring");
                return Vec::new();
            }
        };

        let candidates: Vec<PortId> = match known {
            Some(egress) => {
                self.stats.known_unicast += 1;
                vec![egress]
            }
            None => {
                self.stats.flooded += 1;
                self.vlans.ports().filter(|port| *port != ingress).collect()
            }
        };
        candidates
            .into_iter()
            .filter_map(|egress| {
                let blocking = statuses[egress.index()].is_blocking();
                let decision = self.decide(egress, ingress, frame, header.vlan_id, blocking);
                self.record(egress, ingress, decision)
            })
            .collect()
    }

    /// Applies the per-port rule for one candidate egress.
    ///
    /// `vlan_id` is the tag read at ingress (`None` if untagged). Returns the
    /// frame as it must leave `egress`, or `None` if it must not.
    pub fn forward_to(
        &mut self,
        egress: PortId,
        ingress: PortId,
        frame: &Bytes,
        vlan_id: Option<u16>,
    ) -> Option<Egress> {
        let decision = Self::check_ingress(self.vlans.assignment_of(ingress), vlan_id)
            .and_then(|()| {
                let blocking = self.stp.is_blocking(egress);
                self.decide(egress, ingress, frame, vlan_id, blocking)
            });
        self.record(egress, ingress, decision)
    }

    fn record(
        &mut self,
        egress: PortId,
        ingress: PortId,
        decision: Result<Bytes, DropReason>,
    ) -> Option<Egress> {
        match decision {
            Ok(out) => {
                self.stats.transmitted += 1;
                trace!(
                    from = self.vlans.name_of(ingress),
                    to = self.vlans.name_of(egress),
                    len = out.len(),
                    "Forwarding frame"
                );
                Some(Egress::new(egress, out))
            }
            Err(reason) => {
                self.stats.record_drop(reason);
                trace!(
                    from = self.vlans.name_of(ingress),
                    to = self.vlans.name_of(egress),
                    ?reason,
                    "Dropping frame"
                );
                None
            }
        }
    }

    /// Egress decision for a frame whose ingress tagging is already valid.
    fn decide(
        &self,
        egress: PortId,
        ingress: PortId,
        frame: &Bytes,
        vlan_id: Option<u16>,
        egress_blocking: bool,
    ) -> Result<Bytes, DropReason> {
        match (self.vlans.assignment_of(ingress), self.vlans.assignment_of(egress)) {
            (PortAssignment::Access(in_vlan), PortAssignment::Access(out_vlan)) => {
                if in_vlan == out_vlan {
                    Ok(frame.clone())
                } else {
                    Err(DropReason::VlanMismatch)
                }
            }
            (PortAssignment::Access(in_vlan), PortAssignment::Trunk) => {
                if egress_blocking {
                    Err(DropReason::Blocked)
                } else {
                    Ok(frame::add_tag(frame, in_vlan))
                }
            }
            (PortAssignment::Trunk, PortAssignment::Access(out_vlan)) => match vlan_id {
                Some(tag) if out_vlan.matches(tag) => Ok(frame::strip_tag(frame)),
                _ => Err(DropReason::VlanMismatch),
            },
            (PortAssignment::Trunk, PortAssignment::Trunk) => {
                if egress_blocking {
                    Err(DropReason::Blocked)
                } else {
                    Ok(frame.clone())
                }
            }
        }
    }

    fn check_ingress(from: PortAssignment, vlan_id: Option<u16>) -> Result<(), DropReason> {
        match (from, vlan_id) {
            (PortAssignment::Access(_), None) | (PortAssignment::Trunk, Some(_)) => Ok(()),
            _ => Err(DropReason::IngressTagging),
        }
    }

    pub fn fdb(&self) -> &FdbTable {
        &self.fdb
    }

    pub fn stats(&self) -> ForwardingStats {
        self.stats
    }
}
