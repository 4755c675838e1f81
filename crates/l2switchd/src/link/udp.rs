//! UDP-backed ports.
//!
//! Each port is a UDP socket exchanging raw Ethernet frames with exactly one
//! peer socket, which plays the role of the cable. One reader task per port
//! feeds a shared channel consumed by [`LinkLayer::recv_any`].

use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use l2switch_types::{MacAddress, PortId};

use super::LinkLayer;
use crate::error::{Result, SwitchError};

/// Largest frame exchanged with a peer (1518 plus one inserted tag).
///
/// Longer datagrams are dropped in both directions, never truncated.
pub const MAX_FRAME_LEN: usize = 1522;

const RX_QUEUE_DEPTH: usize = 1024;

/// Port definition from the command line: `<name>=<local-addr>,<peer-addr>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSpec {
    pub name: String,
    pub local: SocketAddr,
    pub peer: SocketAddr,
}

impl FromStr for PortSpec {
    type Err = SwitchError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |why: &str| SwitchError::InvalidArgument(format!("port '{}': {}", s, why));

        let (name, addrs) = s
            .split_once('=')
            .ok_or_else(|| invalid("expected <name>=<local-addr>,<peer-addr>"))?;
        let name = name.trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(invalid("port name must be a single non-empty word"));
        }
        let (local, peer) = addrs
            .split_once(',')
            .ok_or_else(|| invalid("expected <local-addr>,<peer-addr>"))?;

        Ok(Self {
            name: name.to_string(),
            local: local
                .trim()
                .parse()
                .map_err(|_| invalid("bad local address"))?,
            peer: peer
                .trim()
                .parse()
                .map_err(|_| invalid("bad peer address"))?,
        })
    }
}

struct UdpPort {
    name: String,
    socket: Arc<UdpSocket>,
    peer: SocketAddr,
}

/// Link layer whose ports are UDP sockets.
pub struct UdpLink {
    ports: Vec<UdpPort>,
    rx: Mutex<mpsc::Receiver<(PortId, Bytes)>>,
    readers: Vec<JoinHandle<()>>,
    hardware_address: MacAddress,
}

impl UdpLink {
    /// Binds one socket per port definition and starts the reader tasks.
    pub async fn bind(specs: &[PortSpec], hardware_address: MacAddress) -> Result<Self> {
        if specs.is_empty() {
            return Err(SwitchError::InvalidArgument(
                "at least one port is required".to_string(),
            ));
        }
        if let Some(dup) = specs
            .iter()
            .enumerate()
            .find(|(idx, spec)| specs[..*idx].iter().any(|other| other.name == spec.name))
            .map(|(_, spec)| spec)
        {
            return Err(SwitchError::InvalidArgument(format!(
                "port '{}' given twice",
                dup.name
            )));
        }

        let (tx, rx) = mpsc::channel(RX_QUEUE_DEPTH);
        let mut ports = Vec::with_capacity(specs.len());
        let mut readers = Vec::with_capacity(specs.len());

        for (idx, spec) in specs.iter().enumerate() {
            let socket = UdpSocket::bind(spec.local)
                .await
                .map_err(|e| SwitchError::link(&spec.name, e))?;
            let socket = Arc::new(socket);
            info!(
                port = %spec.name,
                local = %spec.local,
                peer = %spec.peer,
                "Port up"
            );

            readers.push(tokio::spawn(read_port(
                PortId::new(idx),
                spec.name.clone(),
                Arc::clone(&socket),
                spec.peer,
                tx.clone(),
            )));
            ports.push(UdpPort {
                name: spec.name.clone(),
                socket,
                peer: spec.peer,
            });
        }

        Ok(Self {
            ports,
            rx: Mutex::new(rx),
            readers,
            hardware_address,
        })
    }

    /// Address the socket behind `port` is bound to.
    pub fn local_addr(&self, port: PortId) -> io::Result<SocketAddr> {
        self.ports[port.index()].socket.local_addr()
    }
}

impl Drop for UdpLink {
    fn drop(&mut self) {
        for reader in &self.readers {
            reader.abort();
        }
    }
}

async fn read_port(
    port: PortId,
    name: String,
    socket: Arc<UdpSocket>,
    peer: SocketAddr,
    tx: mpsc::Sender<(PortId, Bytes)>,
) {
    // One spare byte tells an oversized datagram from a full-size frame.
    let mut buf = vec![0u8; MAX_FRAME_LEN + 1];
    loop {
        match socket.recv_from(&mut buf).await {
            Ok((len, from)) if from == peer && len > MAX_FRAME_LEN => {
                debug!(port = %name, max = MAX_FRAME_LEN, "Dropping oversized datagram");
            }
            Ok((len, from)) if from == peer => {
                trace!(port = %name, len, "Frame received");
                if tx
                    .send((port, Bytes::copy_from_slice(&buf[..len])))
                    .await
                    .is_err()
                {
                    debug!(port = %name, "Receiver gone, stopping reader");
                    return;
                }
            }
            Ok((_, from)) => {
                trace!(port = %name, %from, "Ignoring datagram from unexpected sender");
            }
            // ICMP unreachable from a peer that is not up yet.
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::ConnectionRefused | io::ErrorKind::ConnectionReset
                ) =>
            {
                trace!(port = %name, error = %e, "Peer unreachable");
            }
            Err(e) => {
                error!(port = %name, error = %e, "Receive failed, port is down");
                return;
            }
        }
    }
}

#[async_trait]
impl LinkLayer for UdpLink {
    async fn recv_any(&self) -> Result<(PortId, Bytes)> {
        self.rx.lock().await.recv().await.ok_or(SwitchError::LinkClosed)
    }

    fn send(&self, port: PortId, frame: &[u8]) {
        let udp = &self.ports[port.index()];
        if frame.len() > MAX_FRAME_LEN {
            debug!(port = %udp.name, len = frame.len(), "Dropping oversized frame");
            return;
        }
        if let Err(e) = udp.socket.try_send_to(frame, udp.peer) {
            warn!(port = %udp.name, len = frame.len(), error = %e, "Send failed, frame dropped");
        }
    }

    fn port_name(&self, port: PortId) -> &str {
        &self.ports[port.index()].name
    }

    fn port_count(&self) -> usize {
        self.ports.len()
    }

    fn hardware_address(&self) -> MacAddress {
        self.hardware_address
    }
}
