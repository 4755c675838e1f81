//! MAC learning table (FDB).
//!
//! Maps a source address to the port it was last seen on. Entries are
//! overwritten on every frame and never expire, so the table grows with the
//! number of distinct source addresses observed.

use std::collections::HashMap;

use l2switch_types::{MacAddress, PortId};

/// Result of recording a source address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnOutcome {
    /// First frame from this address.
    New,
    /// Address was bound to another port.
    Moved { from: PortId },
    /// Address was already bound to this port.
    Refreshed,
}

/// Forwarding database owned by the forwarding engine.
#[derive(Debug, Default, Clone)]
pub struct FdbTable {
    entries: HashMap<MacAddress, PortId>,
}

impl FdbTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `mac` to `port`, replacing any previous binding.
    pub fn learn(&mut self, mac: MacAddress, port: PortId) -> LearnOutcome {
        match self.entries.insert(mac, port) {
            None => LearnOutcome::New,
            Some(previous) if previous == port => LearnOutcome::Refreshed,
            Some(previous) => LearnOutcome::Moved { from: previous },
        }
    }

    /// Port `mac` was last seen on.
    pub fn lookup(&self, mac: &MacAddress) -> Option<PortId> {
        self.entries.get(mac).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
