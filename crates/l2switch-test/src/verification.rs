//! Verification helpers for simulated topologies
//!
//! Provides assertion helpers that report which switch and port disagreed
//! with the expectation instead of a bare `assert!` failure.

use bytes::Bytes;
use thiserror::Error;

use l2switch_types::BridgeId;
use l2switchd::PortStatus;

use crate::Topology;

/// Verification error types
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("no switch named '{0}'")]
    UnknownSwitch(String),

    #[error("switch '{switch}' has no port '{port}'")]
    UnknownPort { switch: String, port: String },

    #[error("port {switch}/{port} is already cabled")]
    AlreadyCabled { switch: String, port: String },

    #[error("more than {deliveries} frames delivered without the network going quiet")]
    Storm { deliveries: usize },

    #[error("bridge state still changing after {rounds} rounds")]
    NotConverged { rounds: usize },

    #[error("switch '{switch}' believes root is {actual}, expected {expected}")]
    RootMismatch {
        switch: String,
        expected: BridgeId,
        actual: BridgeId,
    },

    #[error("switch '{switch}' has root cost {actual}, expected {expected}")]
    CostMismatch {
        switch: String,
        expected: u32,
        actual: u32,
    },

    #[error("switch '{switch}' uses {actual:?} as root port, expected {expected}")]
    RootPortMismatch {
        switch: String,
        expected: String,
        actual: Option<String>,
    },

    #[error("port {switch}/{port} is {actual}, expected {expected}")]
    StatusMismatch {
        switch: String,
        port: String,
        expected: PortStatus,
        actual: PortStatus,
    },

    #[error("cable {a} <-> {b} forwards in both directions")]
    LoopNotBroken { a: String, b: String },

    #[error("expected {expected} frames on {switch}/{port}, got {actual}")]
    FrameCountMismatch {
        switch: String,
        port: String,
        expected: usize,
        actual: usize,
    },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Spanning tree verification helper
pub struct StpVerifier<'a> {
    topology: &'a Topology,
}

impl<'a> StpVerifier<'a> {
    /// Create a new verifier over `topology`
    pub fn new(topology: &'a Topology) -> Self {
        Self { topology }
    }

    /// Verify that every switch agrees `root` is the root bridge
    pub fn assert_root_everywhere(&self, root: BridgeId) -> VerifyResult<()> {
        for name in self.topology.switch_names() {
            self.assert_root(name, root)?;
        }
        Ok(())
    }

    /// Verify that `switch` believes `root` is the root bridge
    pub fn assert_root(&self, switch: &str, root: BridgeId) -> VerifyResult<()> {
        let snapshot = self.topology.snapshot(switch)?;
        if snapshot.root_id != root {
            return Err(VerificationError::RootMismatch {
                switch: switch.to_string(),
                expected: root,
                actual: snapshot.root_id,
            });
        }
        Ok(())
    }

    /// Verify the path cost `switch` recorded toward the root
    pub fn assert_root_cost(&self, switch: &str, cost: u32) -> VerifyResult<()> {
        let snapshot = self.topology.snapshot(switch)?;
        if snapshot.root_cost != cost {
            return Err(VerificationError::CostMismatch {
                switch: switch.to_string(),
                expected: cost,
                actual: snapshot.root_cost,
            });
        }
        Ok(())
    }

    /// Verify the status of one port
    pub fn assert_status(&self, switch: &str, port: &str, expected: PortStatus) -> VerifyResult<()> {
        let snapshot = self.topology.snapshot(switch)?;
        let actual = snapshot
            .status_of(port)
            .ok_or_else(|| VerificationError::UnknownPort {
                switch: switch.to_string(),
                port: port.to_string(),
            })?;
        if actual != expected {
            return Err(VerificationError::StatusMismatch {
                switch: switch.to_string(),
                port: port.to_string(),
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Verify that `switch`'s root port is `port` and is listening
    pub fn assert_root_port(&self, switch: &str, port: &str) -> VerifyResult<()> {
        let snapshot = self.topology.snapshot(switch)?;
        if snapshot.root_port.as_deref() != Some(port) {
            return Err(VerificationError::RootPortMismatch {
                switch: switch.to_string(),
                expected: port.to_string(),
                actual: snapshot.root_port,
            });
        }
        self.assert_status(switch, port, PortStatus::Listening)
    }

    /// Verify that the cable between two ports has at least one blocking end
    pub fn assert_cable_blocked(&self, a: (&str, &str), b: (&str, &str)) -> VerifyResult<()> {
        let blocked = |(switch, port): (&str, &str)| -> VerifyResult<bool> {
            let snapshot = self.topology.snapshot(switch)?;
            snapshot
                .status_of(port)
                .map(|status| status.is_blocking())
                .ok_or_else(|| VerificationError::UnknownPort {
                    switch: switch.to_string(),
                    port: port.to_string(),
                })
        };
        if blocked(a)? || blocked(b)? {
            Ok(())
        } else {
            Err(VerificationError::LoopNotBroken {
                a: format!("{}/{}", a.0, a.1),
                b: format!("{}/{}", b.0, b.1),
            })
        }
    }
}

/// Check how many frames a host-facing port captured
pub fn assert_frame_count(
    topology: &mut Topology,
    switch: &str,
    port: &str,
    expected: usize,
) -> VerifyResult<Vec<Bytes>> {
    let frames = topology.take_captured(switch, port)?;
    if frames.len() != expected {
        return Err(VerificationError::FrameCountMismatch {
            switch: switch.to_string(),
            port: port.to_string(),
            expected,
            actual: frames.len(),
        });
    }
    Ok(frames)
}
