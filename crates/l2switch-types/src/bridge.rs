//! Bridge identifier used in root election.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bridge priority; the lowest value in a topology becomes root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BridgeId(u32);

impl BridgeId {
    /// Creates a bridge id from its priority value.
    pub const fn new(priority: u32) -> Self {
        BridgeId(priority)
    }

    /// Returns the priority value.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for BridgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BridgeId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>()
            .map(BridgeId)
            .map_err(|_| ParseError::InvalidBridgeId(s.to_string()))
    }
}

impl From<u32> for BridgeId {
    fn from(priority: u32) -> Self {
        BridgeId(priority)
    }
}
