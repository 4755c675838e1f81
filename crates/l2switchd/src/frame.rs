//! Ethernet frame codec.
//!
//! Parses and rewrites the parts of a frame the switch cares about: the
//! address pair, the optional VLAN tag, and the BPDU payload. Tagged frames
//! use the marker [`VLAN_TPID`] (`0x8200`), which is what cooperating switches
//! of this kind emit; conventional 802.1Q `0x8100` frames are treated as
//! untagged.
//!
//! ```text
//! data:  | dst[6] | src[6] | type[2] | payload ...
//! tagged | dst[6] | src[6] | 0x8200 | tci[2] | type[2] | payload ...
//! bpdu:  | 01:80:c2:00:00:00 | src[6] | own_id[4] | root_id[4] | root_cost[4] |
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};

use l2switch_types::{BridgeId, MacAddress, VlanId};

use crate::error::FrameError;

/// Tag marker distinguishing tagged frames.
pub const VLAN_TPID: u16 = 0x8200;

/// Destination plus source address.
pub const ADDRESS_LEN: usize = 2 * MacAddress::LEN;

/// Untagged Ethernet header.
pub const ETH_HEADER_LEN: usize = ADDRESS_LEN + 2;

/// Size of the inserted tag (marker + tag control field).
pub const VLAN_TAG_LEN: usize = 4;

/// Tagged Ethernet header.
pub const TAGGED_HEADER_LEN: usize = ETH_HEADER_LEN + VLAN_TAG_LEN;

/// Fixed BPDU frame length: address pair plus three 32-bit fields.
pub const BPDU_LEN: usize = ADDRESS_LEN + 3 * 4;

/// Decoded Ethernet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    pub dst: MacAddress,
    pub src: MacAddress,
    /// The real EtherType, read after the tag when one is present.
    pub ether_type: u16,
    /// Low 12 bits of the tag control field, `None` for untagged frames.
    pub vlan_id: Option<u16>,
}

impl EthernetHeader {
    /// Parses the header at the start of `frame`.
    pub fn parse(frame: &[u8]) -> Result<Self, FrameError> {
        if frame.len() < ETH_HEADER_LEN {
            return Err(FrameError::Truncated {
                needed: ETH_HEADER_LEN,
                actual: frame.len(),
            });
        }

        let mut buf = frame;
        let mut dst = [0u8; 6];
        let mut src = [0u8; 6];
        buf.copy_to_slice(&mut dst);
        buf.copy_to_slice(&mut src);

        let mut ether_type = buf.get_u16();
        let mut vlan_id = None;
        if ether_type == VLAN_TPID {
            if buf.remaining() < VLAN_TAG_LEN {
                return Err(FrameError::Truncated {
                    needed: TAGGED_HEADER_LEN,
                    actual: frame.len(),
                });
            }
            vlan_id = Some(buf.get_u16() & VlanId::MASK);
            ether_type = buf.get_u16();
        }

        Ok(Self {
            dst: MacAddress::new(dst),
            src: MacAddress::new(src),
            ether_type,
            vlan_id,
        })
    }

    /// Returns true if the frame carried a tag.
    pub fn is_tagged(&self) -> bool {
        self.vlan_id.is_some()
    }
}

/// Inserts a tag for `vlan` right after the address pair.
///
/// `frame` must hold at least the address pair.
pub fn add_tag(frame: &[u8], vlan: VlanId) -> Bytes {
    let mut out = BytesMut::with_capacity(frame.len() + VLAN_TAG_LEN);
    out.put_slice(&frame[..ADDRESS_LEN]);
    out.put_u16(VLAN_TPID);
    out.put_u16(vlan.as_u16() & VlanId::MASK);
    out.put_slice(&frame[ADDRESS_LEN..]);
    out.freeze()
}

/// Removes the tag inserted by [`add_tag`].
///
/// Only valid on frames known to carry a tag.
pub fn strip_tag(frame: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(frame.len() - VLAN_TAG_LEN);
    out.put_slice(&frame[..ADDRESS_LEN]);
    out.put_slice(&frame[ADDRESS_LEN + VLAN_TAG_LEN..]);
    out.freeze()
}

/// Destination address classes used for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationClass {
    /// Individual address; looked up in the learning table.
    Unicast,
    /// Reserved BPDU address; handed to the STP engine, never forwarded.
    Stp,
    /// Broadcast or any other group address; flooded.
    Flood,
}

impl DestinationClass {
    pub fn of(dst: &MacAddress) -> Self {
        if dst.is_unicast() {
            DestinationClass::Unicast
        } else if dst.is_stp_multicast() {
            DestinationClass::Stp
        } else {
            DestinationClass::Flood
        }
    }
}

/// Spanning tree advertisement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bpdu {
    /// Bridge that sent this BPDU.
    pub sender: BridgeId,
    /// Root the sender believes in.
    pub root: BridgeId,
    /// Sender's path cost to that root.
    pub cost: u32,
}

impl Bpdu {
    /// Builds the fixed-length BPDU frame sourced from `src`.
    pub fn encode(&self, src: MacAddress) -> Bytes {
        let mut out = BytesMut::with_capacity(BPDU_LEN);
        out.put_slice(MacAddress::STP_MULTICAST.as_bytes());
        out.put_slice(src.as_bytes());
        out.put_u32(self.sender.as_u32());
        out.put_u32(self.root.as_u32());
        out.put_u32(self.cost);
        out.freeze()
    }

    /// Decodes a frame already classified as a BPDU by its destination.
    pub fn decode(frame: &[u8]) -> Result<Self, FrameError> {
        if frame.len() < BPDU_LEN {
            return Err(FrameError::Truncated {
                needed: BPDU_LEN,
                actual: frame.len(),
            });
        }

        let mut payload = &frame[ADDRESS_LEN..];
        Ok(Self {
            sender: BridgeId::new(payload.get_u32()),
            root: BridgeId::new(payload.get_u32()),
            cost: payload.get_u32(),
        })
    }
}
