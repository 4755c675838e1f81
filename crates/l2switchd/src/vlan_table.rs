//! VLAN Port Table: immutable port -> assignment map.

use std::collections::HashMap;

use l2switch_types::{PortAssignment, PortId};

use crate::config::SwitchConfig;
use crate::error::ConfigError;

#[derive(Debug, Clone)]
struct PortEntry {
    name: String,
    assignment: PortAssignment,
}

/// Port names and VLAN assignments, indexed by [`PortId`].
///
/// Built once before the engines start and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct VlanTable {
    ports: Vec<PortEntry>,
    by_name: HashMap<String, PortId>,
}

impl VlanTable {
    /// Builds the table from `(name, assignment)` pairs; the position of a
    /// pair is its port id.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, PortAssignment)>,
        S: Into<String>,
    {
        let ports: Vec<PortEntry> = entries
            .into_iter()
            .map(|(name, assignment)| PortEntry {
                name: name.into(),
                assignment,
            })
            .collect();
        let by_name = ports
            .iter()
            .enumerate()
            .map(|(idx, entry)| (entry.name.clone(), PortId::new(idx)))
            .collect();

        Self { ports, by_name }
    }

    /// Binds a parsed configuration to the link layer's port names.
    ///
    /// `port_names` is indexed by port id. Every configured name must exist on
    /// the link and every link port must be configured.
    pub fn bind<I, S>(config: &SwitchConfig, port_names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = port_names
            .into_iter()
            .map(|name| name.as_ref().to_string())
            .collect();

        if let Some(unknown) = config
            .ports
            .iter()
            .find(|port| !names.iter().any(|name| *name == port.name))
        {
            return Err(ConfigError::UnknownPort(unknown.name.clone()));
        }

        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            let assignment = config
                .assignment(&name)
                .ok_or_else(|| ConfigError::MissingPort(name.clone()))?;
            entries.push((name, assignment));
        }

        Ok(Self::new(entries))
    }

    /// VLAN assignment of `port`.
    ///
    /// # Panics
    ///
    /// Panics if `port` is not part of this table.
    pub fn assignment_of(&self, port: PortId) -> PortAssignment {
        self.ports[port.index()].assignment
    }

    /// Configured name of `port`.
    pub fn name_of(&self, port: PortId) -> &str {
        &self.ports[port.index()].name
    }

    pub fn port_by_name(&self, name: &str) -> Option<PortId> {
        self.by_name.get(name).copied()
    }

    pub fn contains(&self, port: PortId) -> bool {
        port.index() < self.ports.len()
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// All ports in id order.
    pub fn ports(&self) -> impl Iterator<Item = PortId> + '_ {
        (0..self.ports.len()).map(PortId::new)
    }

    /// Trunk ports in id order.
    pub fn trunk_ports(&self) -> impl Iterator<Item = PortId> + '_ {
        self.ports
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.assignment.is_trunk())
            .map(|(idx, _)| PortId::new(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use l2switch_types::VlanId;
    use pretty_assertions::assert_eq;

    fn config() -> SwitchConfig {
        "100\ne0 10\ne1 10\nt0 T\n".parse().unwrap()
    }

    #[test]
    fn test_bind_follows_link_order() {
        let table = VlanTable::bind(&config(), ["t0", "e0", "e1"]).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.name_of(PortId::new(0)), "t0");
        assert_eq!(table.assignment_of(PortId::new(0)), PortAssignment::Trunk);
        assert_eq!(
            table.assignment_of(PortId::new(2)),
            PortAssignment::Access(VlanId::new(10).unwrap())
        );
        assert_eq!(table.port_by_name("e1"), Some(PortId::new(2)));
        assert_eq!(table.trunk_ports().collect::<Vec<_>>(), vec![PortId::new(0)]);
    }

    #[test]
    fn test_bind_rejects_unknown_port() {
        let err = VlanTable::bind(&config(), ["e0", "e1"]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPort(name) if name == "t0"));
    }

    #[test]
    fn test_bind_rejects_unconfigured_port() {
        let err = VlanTable::bind(&config(), ["e0", "e1", "t0", "t1"]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingPort(name) if name == "t1"));
    }

    #[test]
    fn test_contains() {
        let table = VlanTable::new([("e0", PortAssignment::Trunk)]);
        assert!(table.contains(PortId::new(0)));
        assert!(!table.contains(PortId::new(1)));
        assert!(!table.is_empty());
    }
}
