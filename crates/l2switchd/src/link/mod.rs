//! Link layer: raw frame exchange with the outside world.
//!
//! The switch core only sees [`LinkLayer`]. Ports are numbered densely from
//! zero in the order the link was created; the VLAN table is bound to those
//! numbers by name at startup.

mod udp;

pub use udp::{PortSpec, UdpLink, MAX_FRAME_LEN};

use async_trait::async_trait;
use bytes::Bytes;

use l2switch_types::{MacAddress, PortId};

use crate::error::Result;

/// Frame transport consumed by the switch runtime.
#[async_trait]
pub trait LinkLayer: Send + Sync {
    /// Waits for the next frame from any port.
    ///
    /// Returns [`crate::SwitchError::LinkClosed`] once no port can deliver
    /// frames anymore.
    async fn recv_any(&self) -> Result<(PortId, Bytes)>;

    /// Queues `frame` on `port` without waiting.
    ///
    /// Best effort: failures are logged by the implementation and the frame
    /// is lost.
    fn send(&self, port: PortId, frame: &[u8]);

    /// Name of `port`, as used in the configuration file.
    fn port_name(&self, port: PortId) -> &str;

    fn port_count(&self) -> usize;

    /// Source address for frames this switch originates.
    fn hardware_address(&self) -> MacAddress;

    /// Port names in id order.
    fn port_names(&self) -> Vec<String> {
        (0..self.port_count())
            .map(|idx| self.port_name(PortId::new(idx)).to_string())
            .collect()
    }
}
