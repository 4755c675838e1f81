//! In-memory link layer for driving the daemon runtime from tests.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{mpsc, Mutex};
use tracing::trace;

use l2switch_types::{MacAddress, PortId};
use l2switchd::{LinkLayer, Result, SwitchError};

/// Link whose ports are channel endpoints held by a [`LinkHandle`].
pub struct ChannelLink {
    names: Vec<String>,
    hardware_address: MacAddress,
    inbound: Mutex<mpsc::UnboundedReceiver<(PortId, Bytes)>>,
    outbound: mpsc::UnboundedSender<(PortId, Bytes)>,
}

/// Test side of a [`ChannelLink`]. Dropping it closes the link.
pub struct LinkHandle {
    inbound: mpsc::UnboundedSender<(PortId, Bytes)>,
    outbound: mpsc::UnboundedReceiver<(PortId, Bytes)>,
}

impl ChannelLink {
    pub fn new<I, S>(names: I, hardware_address: MacAddress) -> (Self, LinkHandle)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let link = Self {
            names: names.into_iter().map(Into::into).collect(),
            hardware_address,
            inbound: Mutex::new(in_rx),
            outbound: out_tx,
        };
        let handle = LinkHandle {
            inbound: in_tx,
            outbound: out_rx,
        };
        (link, handle)
    }
}

impl LinkHandle {
    /// Delivers `frame` to the switch as if received on `port`.
    pub fn inject(&self, port: usize, frame: Bytes) {
        // The switch may already be gone; tests notice through its result.
        let _ = self.inbound.send((PortId::new(port), frame));
    }

    /// Waits for the next frame the switch sends.
    pub async fn next_sent(&mut self) -> Option<(PortId, Bytes)> {
        self.outbound.recv().await
    }

    /// Everything sent so far that has not been read yet.
    pub fn drain_sent(&mut self) -> Vec<(PortId, Bytes)> {
        let mut sent = Vec::new();
        while let Ok(frame) = self.outbound.try_recv() {
            sent.push(frame);
        }
        sent
    }
}

#[async_trait]
impl LinkLayer for ChannelLink {
    async fn recv_any(&self) -> Result<(PortId, Bytes)> {
        self.inbound
            .lock()
            .await
            .recv()
            .await
            .ok_or(SwitchError::LinkClosed)
    }

    fn send(&self, port: PortId, frame: &[u8]) {
        if self
            .outbound
            .send((port, Bytes::copy_from_slice(frame)))
            .is_err()
        {
            trace!(%port, "Test handle gone, frame dropped");
        }
    }

    fn port_name(&self, port: PortId) -> &str {
        &self.names[port.index()]
    }

    fn port_count(&self) -> usize {
        self.names.len()
    }

    fn hardware_address(&self) -> MacAddress {
        self.hardware_address
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_round_trip() {
        let (link, mut handle) = ChannelLink::new(["e0", "t0"], MacAddress::ZERO);
        assert_eq!(link.port_names(), vec!["e0".to_string(), "t0".to_string()]);

        handle.inject(1, Bytes::from_static(b"in"));
        assert_eq!(
            link.recv_any().await.unwrap(),
            (PortId::new(1), Bytes::from_static(b"in"))
        );

        link.send(PortId::new(0), b"out");
        assert_eq!(
            handle.drain_sent(),
            vec![(PortId::new(0), Bytes::from_static(b"out"))]
        );
    }

    #[tokio::test]
    async fn test_dropping_handle_closes_link() {
        let (link, handle) = ChannelLink::new(["e0"], MacAddress::ZERO);
        drop(handle);
        assert!(matches!(link.recv_any().await, Err(SwitchError::LinkClosed)));
    }
}
