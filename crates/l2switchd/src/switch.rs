//! Per-frame dispatch: BPDUs to the STP engine, everything else to the
//! forwarding engine.

use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

use l2switch_types::{BridgeId, MacAddress, PortId};

use crate::fdb::FdbTable;
use crate::forwarding::{ForwardingEngine, ForwardingStats};
use crate::frame::{Bpdu, DestinationClass, EthernetHeader};
use crate::stp::StpEngine;
use crate::vlan_table::VlanTable;

/// A frame to transmit on one port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Egress {
    pub port: PortId,
    pub frame: Bytes,
}

impl Egress {
    pub fn new(port: PortId, frame: Bytes) -> Self {
        Self { port, frame }
    }
}

/// One switch instance: shared STP engine plus the forwarding engine.
///
/// `handle_frame` is driven by the single receive loop. The STP engine is
/// also shared with the periodic advertiser through [`Switch::stp`].
pub struct Switch {
    vlans: Arc<VlanTable>,
    stp: Arc<StpEngine>,
    forwarding: ForwardingEngine,
    malformed: u64,
}

impl Switch {
    pub fn new(own_id: BridgeId, own_mac: MacAddress, vlans: Arc<VlanTable>) -> Self {
        let stp = Arc::new(StpEngine::new(own_id, own_mac, Arc::clone(&vlans)));
        let forwarding = ForwardingEngine::new(Arc::clone(&vlans), Arc::clone(&stp));
        Self {
            vlans,
            stp,
            forwarding,
            malformed: 0,
        }
    }

    /// Handles one frame received on `ingress` and returns what to send.
    ///
    /// Malformed frames are counted and dropped.
    pub fn handle_frame(&mut self, ingress: PortId, frame: &Bytes) -> Vec<Egress> {
        let header = match EthernetHeader::parse(frame) {
            Ok(header) => header,
            Err(e) => {
                self.malformed += 1;
                debug!(port = self.vlans.name_of(ingress), error = %e, "Dropping malformed frame");
                return Vec::new();
            }
        };

        match DestinationClass::of(&header.dst) {
            DestinationClass::Stp => match Bpdu::decode(frame) {
                Ok(bpdu) => self.stp.handle_bpdu(ingress, &bpdu),
                Err(e) => {
                    self.malformed += 1;
                    debug!(port = self.vlans.name_of(ingress), error = %e, "Dropping short BPDU");
                    Vec::new()
                }
            },
            DestinationClass::Unicast | DestinationClass::Flood => {
                self.forwarding.process(ingress, frame, &header)
            }
        }
    }

    pub fn stp(&self) -> &Arc<StpEngine> {
        &self.stp
    }

    pub fn vlans(&self) -> &Arc<VlanTable> {
        &self.vlans
    }

    pub fn fdb(&self) -> &FdbTable {
        self.forwarding.fdb()
    }

    pub fn forwarding_stats(&self) -> ForwardingStats {
        self.forwarding.stats()
    }

    /// Frames dropped because they could not be parsed.
    pub fn malformed(&self) -> u64 {
        self.malformed
    }
}
