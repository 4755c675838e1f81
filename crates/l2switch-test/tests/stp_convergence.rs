//! Spanning tree convergence across simulated topologies
//!
//! Every scenario runs rounds until no bridge state changes and then checks
//! the elected root, the path costs and which redundant links are blocked.

use pretty_assertions::assert_eq;

use l2switch_test::{
    fixtures::{frame_fixtures, topology_fixtures, SwitchFixture},
    assert_frame_count, StpVerifier, Topology,
};
use l2switch_types::BridgeId;
use l2switchd::PortStatus;

const MAX_ROUNDS: usize = 10;

/// Scenario: `B -- A -- C`, A has the lowest id.
#[test]
fn test_line_converges_on_lowest_id() {
    let mut topo = topology_fixtures::line();
    topo.settle(MAX_ROUNDS).expect("line did not settle");

    let verifier = StpVerifier::new(&topo);
    verifier.assert_root_everywhere(BridgeId::new(1)).unwrap();
    verifier.assert_root_cost("A", 0).unwrap();
    for switch in ["B", "C"] {
        verifier.assert_root_cost(switch, 10).unwrap();
        verifier.assert_root_port(switch, "t0").unwrap();
    }
    verifier.assert_status("A", "t0", PortStatus::Listening).unwrap();
    verifier.assert_status("A", "t1", PortStatus::Listening).unwrap();
}

/// Scenario: three switches in a ring. Each non-root reaches A directly and
/// the B-C link must stop forwarding.
#[test]
fn test_triangle_breaks_the_loop() {
    let mut topo = topology_fixtures::triangle();
    topo.settle(MAX_ROUNDS).expect("triangle did not settle");

    let verifier = StpVerifier::new(&topo);
    verifier.assert_root_everywhere(BridgeId::new(1)).unwrap();
    verifier.assert_root_port("B", "t0").unwrap();
    verifier.assert_root_port("C", "t0").unwrap();
    verifier.assert_root_cost("B", 10).unwrap();
    verifier.assert_root_cost("C", 10).unwrap();
    verifier.assert_cable_blocked(("B", "t1"), ("C", "t1")).unwrap();

    // The root blocks nothing.
    for port in ["e0", "t0", "t1"] {
        verifier.assert_status("A", port, PortStatus::Listening).unwrap();
    }
}

/// Scenario: two parallel cables between A and C.
#[test]
fn test_parallel_link_is_blocked() {
    let mut topo = topology_fixtures::parallel_links();
    topo.settle(MAX_ROUNDS).expect("parallel links did not settle");

    let verifier = StpVerifier::new(&topo);
    verifier.assert_root("C", BridgeId::new(1)).unwrap();
    verifier.assert_root_port("C", "t0").unwrap();
    verifier.assert_status("C", "t1", PortStatus::Blocking).unwrap();
    verifier.assert_cable_blocked(("A", "t1"), ("C", "t1")).unwrap();
}

/// Scenario: S has two of its own trunks cabled together and hears a better
/// root on a third.
#[test]
fn test_self_looped_ports_are_blocked() {
    let mut topo = Topology::new();
    topo.add_switch("A", topology_fixtures::edge_switch(1, &["t0"]).build());
    topo.add_switch("S", topology_fixtures::edge_switch(5, &["t0", "t1", "t2"]).build());
    topo.connect(("A", "t0"), ("S", "t0")).unwrap();
    topo.connect(("S", "t1"), ("S", "t2")).unwrap();
    topo.settle(MAX_ROUNDS).expect("self loop did not settle");

    let verifier = StpVerifier::new(&topo);
    verifier.assert_root("S", BridgeId::new(1)).unwrap();
    verifier.assert_root_port("S", "t0").unwrap();
    verifier.assert_status("S", "t1", PortStatus::Blocking).unwrap();
    verifier.assert_status("S", "t2", PortStatus::Blocking).unwrap();

    // A broadcast reaches S's host once and dies out.
    topo.clear_captured();
    let frame = frame_fixtures::broadcast_from(frame_fixtures::host(1));
    topo.inject("A", "e0", frame.clone()).unwrap();
    let received = assert_frame_count(&mut topo, "S", "e0", 1).unwrap();
    assert_eq!(received[0], frame);
}

/// Scenario: a lone switch (e0, e1 access VLAN 10; t0 trunk; priority 100).
#[test]
fn test_lone_switch_stays_root() {
    let mut topo = Topology::new();
    topo.add_switch("S", topology_fixtures::lone_switch().build());

    let before = topo.snapshot("S").unwrap();
    assert_eq!(before.status_of("t0"), Some(PortStatus::Blocking));

    topo.round().unwrap();

    let verifier = StpVerifier::new(&topo);
    verifier.assert_root("S", BridgeId::new(100)).unwrap();
    for port in ["e0", "e1", "t0"] {
        verifier.assert_status("S", port, PortStatus::Listening).unwrap();
    }
    assert_eq!(topo.snapshot("S").unwrap().stats.bpdus_sent, 1);
}

/// Scenario: `C -- B -- A` with A best. B is still root when it first hears
/// A, so it re-blocks its other trunk and relays nothing; C keeps the root it
/// learned from B. Two-state STP has no topology change propagation.
#[test]
fn test_former_root_does_not_relay_better_root() {
    let mut topo = Topology::new();
    topo.add_switch("C", topology_fixtures::edge_switch(9, &["t0"]).build());
    topo.add_switch("B", topology_fixtures::edge_switch(5, &["t0", "t1"]).build());
    topo.add_switch("A", topology_fixtures::edge_switch(1, &["t0"]).build());
    topo.connect(("C", "t0"), ("B", "t1")).unwrap();
    topo.connect(("B", "t0"), ("A", "t0")).unwrap();
    topo.settle(MAX_ROUNDS).expect("chain did not settle");

    let verifier = StpVerifier::new(&topo);
    verifier.assert_root("B", BridgeId::new(1)).unwrap();
    verifier.assert_root_port("B", "t0").unwrap();
    verifier.assert_status("B", "t1", PortStatus::Blocking).unwrap();

    verifier.assert_root("C", BridgeId::new(5)).unwrap();
    verifier.assert_root_cost("C", 10).unwrap();
    verifier.assert_root_port("C", "t0").unwrap();
}

#[test]
fn test_access_port_bpdus_are_ignored() {
    // A's trunk is cabled to an access port on B: neither side adopts the
    // other's root.
    let mut topo = Topology::new();
    topo.add_switch("A", SwitchFixture::new(1).trunk("t0").build());
    topo.add_switch("B", SwitchFixture::new(2).access("e0", 10).build());
    topo.connect(("A", "t0"), ("B", "e0")).unwrap();
    topo.run_rounds(3).unwrap();

    let verifier = StpVerifier::new(&topo);
    verifier.assert_root("B", BridgeId::new(2)).unwrap();
    assert_eq!(topo.snapshot("B").unwrap().stats.bpdus_received, 0);
}
