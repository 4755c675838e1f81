//! Deterministic multi-switch simulator.
//!
//! Switches are wired with virtual cables between trunk or access ports.
//! Time advances in rounds: every switch ticks once in insertion order, then
//! queued frames are delivered first-in first-out until nothing is in flight.
//! Frames leaving a port without a cable are captured as if a host were
//! attached there.

use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use tracing::trace;

use l2switch_types::PortId;
use l2switchd::{BridgeSnapshot, Egress, Switch};

use crate::verification::{VerificationError, VerifyResult};

/// Upper bound on deliveries per drain before the network is declared to be
/// storming.
pub const DEFAULT_DELIVERY_LIMIT: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Endpoint {
    node: usize,
    port: PortId,
}

struct Node {
    name: String,
    switch: Switch,
}

/// A set of switches joined by virtual cables.
pub struct Topology {
    nodes: Vec<Node>,
    by_name: HashMap<String, usize>,
    cables: HashMap<Endpoint, Endpoint>,
    in_flight: VecDeque<(Endpoint, Bytes)>,
    captured: HashMap<Endpoint, Vec<Bytes>>,
    delivery_limit: usize,
    rounds: usize,
}

impl Default for Topology {
    fn default() -> Self {
        Self::new()
    }
}

impl Topology {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            by_name: HashMap::new(),
            cables: HashMap::new(),
            in_flight: VecDeque::new(),
            captured: HashMap::new(),
            delivery_limit: DEFAULT_DELIVERY_LIMIT,
            rounds: 0,
        }
    }

    pub fn with_delivery_limit(mut self, limit: usize) -> Self {
        self.delivery_limit = limit;
        self
    }

    /// Adds a switch. Names must be unique.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already taken.
    pub fn add_switch(&mut self, name: &str, switch: Switch) {
        assert!(
            !self.by_name.contains_key(name),
            "switch {name} added twice"
        );
        self.by_name.insert(name.to_string(), self.nodes.len());
        self.nodes.push(Node {
            name: name.to_string(),
            switch,
        });
    }

    /// Cables `(switch, port)` to `(switch, port)`.
    pub fn connect(&mut self, a: (&str, &str), b: (&str, &str)) -> VerifyResult<()> {
        let a = self.endpoint(a.0, a.1)?;
        let b = self.endpoint(b.0, b.1)?;
        for end in [a, b] {
            if self.cables.contains_key(&end) {
                return Err(VerificationError::AlreadyCabled {
                    switch: self.nodes[end.node].name.clone(),
                    port: self.port_name(end).to_string(),
                });
            }
        }
        self.cables.insert(a, b);
        self.cables.insert(b, a);
        Ok(())
    }

    /// Ticks every switch once, then delivers until quiet.
    pub fn round(&mut self) -> VerifyResult<()> {
        self.rounds += 1;
        for node in 0..self.nodes.len() {
            let egress = self.nodes[node].switch.stp().tick();
            self.enqueue(node, egress);
        }
        self.drain()?;
        Ok(())
    }

    pub fn run_rounds(&mut self, rounds: usize) -> VerifyResult<()> {
        for _ in 0..rounds {
            self.round()?;
        }
        Ok(())
    }

    /// Runs rounds until a full round leaves every bridge state unchanged.
    ///
    /// Returns the number of rounds run.
    pub fn settle(&mut self, max_rounds: usize) -> VerifyResult<usize> {
        for run in 1..=max_rounds {
            let before = self.generations();
            self.round()?;
            if self.generations() == before {
                return Ok(run);
            }
        }
        Err(VerificationError::NotConverged { rounds: max_rounds })
    }

    /// Hands `frame` to `switch` as if received on `port`, then delivers
    /// everything it causes.
    ///
    /// Returns the number of frames delivered over cables.
    pub fn inject(&mut self, switch: &str, port: &str, frame: Bytes) -> VerifyResult<usize> {
        let at = self.endpoint(switch, port)?;
        self.receive(at, frame);
        self.drain()
    }

    /// Frames captured on an uncabled port since the last call.
    pub fn take_captured(&mut self, switch: &str, port: &str) -> VerifyResult<Vec<Bytes>> {
        let at = self.endpoint(switch, port)?;
        Ok(self.captured.remove(&at).unwrap_or_default())
    }

    /// Drops every captured frame.
    pub fn clear_captured(&mut self) {
        self.captured.clear();
    }

    pub fn switch(&self, name: &str) -> VerifyResult<&Switch> {
        self.by_name
            .get(name)
            .map(|idx| &self.nodes[*idx].switch)
            .ok_or_else(|| VerificationError::UnknownSwitch(name.to_string()))
    }

    pub fn snapshot(&self, name: &str) -> VerifyResult<BridgeSnapshot> {
        Ok(self.switch(name)?.stp().snapshot())
    }

    pub fn switch_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|node| node.name.as_str())
    }

    /// Cables as `((switch, port), (switch, port))`, each listed once.
    pub fn cables(&self) -> Vec<((&str, &str), (&str, &str))> {
        let mut cables: Vec<_> = self
            .cables
            .iter()
            .filter(|(a, b)| (a.node, a.port) < (b.node, b.port))
            .map(|(a, b)| {
                (
                    (self.nodes[a.node].name.as_str(), self.port_name(*a)),
                    (self.nodes[b.node].name.as_str(), self.port_name(*b)),
                )
            })
            .collect();
        cables.sort();
        cables
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    fn endpoint(&self, switch: &str, port: &str) -> VerifyResult<Endpoint> {
        let node = *self
            .by_name
            .get(switch)
            .ok_or_else(|| VerificationError::UnknownSwitch(switch.to_string()))?;
        let port = self.nodes[node]
            .switch
            .vlans()
            .port_by_name(port)
            .ok_or_else(|| VerificationError::UnknownPort {
                switch: switch.to_string(),
                port: port.to_string(),
            })?;
        Ok(Endpoint { node, port })
    }

    fn port_name(&self, at: Endpoint) -> &str {
        self.nodes[at.node].switch.vlans().name_of(at.port)
    }

    fn generations(&self) -> Vec<u64> {
        self.nodes
            .iter()
            .map(|node| node.switch.stp().generation())
            .collect()
    }

    fn enqueue(&mut self, node: usize, egress: Vec<Egress>) {
        for out in egress {
            let from = Endpoint {
                node,
                port: out.port,
            };
            match self.cables.get(&from) {
                Some(_) => self.in_flight.push_back((from, out.frame)),
                None => self.captured.entry(from).or_default().push(out.frame),
            }
        }
    }

    fn receive(&mut self, at: Endpoint, frame: Bytes) {
        let egress = self.nodes[at.node].switch.handle_frame(at.port, &frame);
        self.enqueue(at.node, egress);
    }

    fn drain(&mut self) -> VerifyResult<usize> {
        let mut delivered = 0;
        while let Some((from, frame)) = self.in_flight.pop_front() {
            delivered += 1;
            if delivered > self.delivery_limit {
                self.in_flight.clear();
                return Err(VerificationError::Storm {
                    deliveries: self.delivery_limit,
                });
            }
            if let Some(to) = self.cables.get(&from).copied() {
                trace!(
                    from = %format!("{}/{}", self.nodes[from.node].name, self.port_name(from)),
                    to = %format!("{}/{}", self.nodes[to.node].name, self.port_name(to)),
                    "Delivering frame"
                );
                self.receive(to, frame);
            }
        }
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{frame_fixtures, topology_fixtures, SwitchFixture};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unknown_names_are_errors() {
        let mut topo = topology_fixtures::line();
        assert!(matches!(
            topo.connect(("Z", "t0"), ("A", "t0")),
            Err(VerificationError::UnknownSwitch(_))
        ));
        assert!(matches!(
            topo.take_captured("A", "nope"),
            Err(VerificationError::UnknownPort { .. })
        ));
    }

    #[test]
    fn test_port_cabled_twice_is_rejected() {
        let mut topo = topology_fixtures::line();
        assert!(matches!(
            topo.connect(("A", "t0"), ("C", "e0")),
            Err(VerificationError::AlreadyCabled { .. })
        ));
    }

    #[test]
    fn test_cables_listed_once() {
        let topo = topology_fixtures::line();
        assert_eq!(
            topo.cables(),
            vec![(("A", "t0"), ("B", "t0")), (("A", "t1"), ("C", "t0"))]
        );
    }

    #[test]
    fn test_uncabled_port_captures() {
        let mut topo = Topology::new();
        topo.add_switch("S", topology_fixtures::lone_switch().build());
        topo.round().unwrap();

        // The lone root advertised on its uncabled trunk.
        assert_eq!(topo.take_captured("S", "t0").unwrap().len(), 1);

        let frame = frame_fixtures::broadcast_from(frame_fixtures::host(1));
        topo.inject("S", "e0", frame.clone()).unwrap();
        assert_eq!(topo.take_captured("S", "e1").unwrap(), vec![frame]);
        assert!(topo.take_captured("S", "e1").unwrap().is_empty());
    }

    #[test]
    fn test_unmanaged_loop_storms() {
        // Two access ports in the same VLAN cabled to each other: nothing
        // blocks them.
        let mut topo = Topology::new().with_delivery_limit(100);
        topo.add_switch(
            "S",
            SwitchFixture::new(1)
                .access("e0", 10)
                .access("e1", 10)
                .access("e2", 10)
                .build(),
        );
        topo.connect(("S", "e0"), ("S", "e1")).unwrap();

        let frame = frame_fixtures::broadcast_from(frame_fixtures::host(1));
        assert!(matches!(
            topo.inject("S", "e2", frame),
            Err(VerificationError::Storm { deliveries: 100 })
        ));
    }
}
