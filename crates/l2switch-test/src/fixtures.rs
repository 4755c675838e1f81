//! Test fixtures for switches, frames and topologies

use bytes::Bytes;
use std::sync::Arc;

use l2switch_types::{BridgeId, MacAddress, PortAssignment, VlanId};
use l2switchd::{Switch, SwitchConfig, VlanTable};

/// Declarative description of one switch.
#[derive(Debug, Clone)]
pub struct SwitchFixture {
    /// Bridge priority.
    pub priority: u32,
    /// Ports in link order.
    pub ports: Vec<(String, PortAssignment)>,
}

impl SwitchFixture {
    pub fn new(priority: u32) -> Self {
        Self {
            priority,
            ports: Vec::new(),
        }
    }

    /// Adds an access port in `vlan`.
    ///
    /// # Panics
    ///
    /// Panics if `vlan` is outside 1..=4094.
    pub fn access(mut self, name: impl Into<String>, vlan: u16) -> Self {
        let vlan = VlanId::new(vlan).unwrap_or_else(|e| panic!("fixture VLAN: {e}"));
        self.ports.push((name.into(), PortAssignment::Access(vlan)));
        self
    }

    pub fn trunk(mut self, name: impl Into<String>) -> Self {
        self.ports.push((name.into(), PortAssignment::Trunk));
        self
    }

    pub fn port_names(&self) -> Vec<String> {
        self.ports.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Source address used for this switch's BPDUs.
    pub fn mac(&self) -> MacAddress {
        let id = self.priority.to_be_bytes();
        MacAddress::new([0x02, 0x00, id[0], id[1], id[2], id[3]])
    }

    /// The configuration file this fixture corresponds to.
    pub fn config_text(&self) -> String {
        let mut text = format!("{}\n", self.priority);
        for (name, assignment) in &self.ports {
            text.push_str(&format!("{} {}\n", name, assignment));
        }
        text
    }

    pub fn vlan_table(&self) -> VlanTable {
        VlanTable::new(self.ports.iter().cloned())
    }

    /// Builds the switch by round-tripping through the configuration parser.
    ///
    /// # Panics
    ///
    /// Panics if the fixture does not produce a valid configuration.
    pub fn build(&self) -> Switch {
        let config: SwitchConfig = self
            .config_text()
            .parse()
            .unwrap_or_else(|e| panic!("fixture config: {e}"));
        let vlans = VlanTable::bind(&config, self.port_names())
            .unwrap_or_else(|e| panic!("fixture ports: {e}"));
        assert_eq!(config.priority, BridgeId::new(self.priority));
        Switch::new(config.priority, self.mac(), Arc::new(vlans))
    }
}

/// Common frame fixtures
pub mod frame_fixtures {
    use super::*;

    /// Unicast host address `aa:aa:aa:aa:aa:<n>`.
    pub fn host(n: u8) -> MacAddress {
        MacAddress::new([0xaa, 0xaa, 0xaa, 0xaa, 0xaa, n])
    }

    /// Untagged IPv4 frame from `src` to `dst` with a minimum-size payload.
    pub fn data_frame(dst: MacAddress, src: MacAddress) -> Bytes {
        let mut raw = Vec::with_capacity(60);
        raw.extend_from_slice(dst.as_bytes());
        raw.extend_from_slice(src.as_bytes());
        raw.extend_from_slice(&[0x08, 0x00]);
        raw.resize(60, 0x5a);
        Bytes::from(raw)
    }

    pub fn broadcast_from(src: MacAddress) -> Bytes {
        data_frame(MacAddress::BROADCAST, src)
    }
}

/// Common topologies. Switches are named `A`, `B`, `C` and bridge priority
/// follows the letter, so `A` always wins the election.
pub mod topology_fixtures {
    use super::*;
    use crate::Topology;

    /// A switch with two access ports in VLAN 10 and one trunk.
    pub fn lone_switch() -> SwitchFixture {
        SwitchFixture::new(100)
            .access("e0", 10)
            .access("e1", 10)
            .trunk("t0")
    }

    /// Edge switch: access port `e0` in VLAN 10 plus the given trunks.
    pub fn edge_switch(priority: u32, trunks: &[&str]) -> SwitchFixture {
        trunks
            .iter()
            .fold(SwitchFixture::new(priority).access("e0", 10), |fixture, name| {
                fixture.trunk(*name)
            })
    }

    /// `B -- A -- C`
    pub fn line() -> Topology {
        let mut topo = Topology::new();
        topo.add_switch("A", edge_switch(1, &["t0", "t1"]).build());
        topo.add_switch("B", edge_switch(2, &["t0"]).build());
        topo.add_switch("C", edge_switch(3, &["t0"]).build());
        topo.connect(("A", "t0"), ("B", "t0")).unwrap_or_else(|e| panic!("{e}"));
        topo.connect(("A", "t1"), ("C", "t0")).unwrap_or_else(|e| panic!("{e}"));
        topo
    }

    /// `A`, `B` and `C` cabled in a ring; `t0` of `B` and `C` faces `A`.
    pub fn triangle() -> Topology {
        let mut topo = Topology::new();
        topo.add_switch("A", edge_switch(1, &["t0", "t1"]).build());
        topo.add_switch("B", edge_switch(2, &["t0", "t1"]).build());
        topo.add_switch("C", edge_switch(3, &["t0", "t1"]).build());
        topo.connect(("A", "t0"), ("B", "t0")).unwrap_or_else(|e| panic!("{e}"));
        topo.connect(("A", "t1"), ("C", "t0")).unwrap_or_else(|e| panic!("{e}"));
        topo.connect(("B", "t1"), ("C", "t1")).unwrap_or_else(|e| panic!("{e}"));
        topo
    }

    /// `A` and `C` joined by two parallel cables.
    pub fn parallel_links() -> Topology {
        let mut topo = Topology::new();
        topo.add_switch("A", edge_switch(1, &["t0", "t1"]).build());
        topo.add_switch("C", edge_switch(3, &["t0", "t1"]).build());
        topo.connect(("A", "t0"), ("C", "t0")).unwrap_or_else(|e| panic!("{e}"));
        topo.connect(("A", "t1"), ("C", "t1")).unwrap_or_else(|e| panic!("{e}"));
        topo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_text() {
        let fixture = SwitchFixture::new(14).access("r-0", 1).trunk("rr-0-1");
        assert_eq!(fixture.config_text(), "14\nr-0 1\nrr-0-1 T\n");
    }

    #[test]
    fn test_build_matches_fixture() {
        let sw = topology_fixtures::lone_switch().build();
        assert_eq!(sw.vlans().len(), 3);
        assert_eq!(sw.stp().own_id(), BridgeId::new(100));
    }

    #[test]
    fn test_mac_is_locally_administered_unicast() {
        let mac = SwitchFixture::new(3).mac();
        assert!(mac.is_unicast());
        assert_eq!(mac.to_string(), "02:00:00:00:00:03");
    }
}
