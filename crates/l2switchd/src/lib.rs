//! Software Ethernet switch.
//!
//! Forwards frames between ports with MAC learning, keeps access-port VLANs
//! apart, carries them across trunk ports with a tag, and runs a simplified
//! spanning tree over the trunks so redundant links do not loop.
//!
//! The receive loop owns the forwarding engine; the STP engine is shared with
//! the periodic advertiser behind a single lock (see [`daemon::run`]).

pub mod config;
pub mod daemon;
pub mod error;
pub mod fdb;
pub mod forwarding;
pub mod frame;
pub mod link;
pub mod stp;
pub mod switch;
pub mod vlan_table;

pub use config::{PortConfig, SwitchConfig, DEFAULT_CONFIG_DIR};
pub use error::{ConfigError, FrameError, Result, SwitchError};
pub use fdb::FdbTable;
pub use forwarding::{ForwardingEngine, ForwardingStats};
pub use frame::{Bpdu, DestinationClass, EthernetHeader};
pub use link::{LinkLayer, PortSpec, UdpLink};
pub use stp::{BridgeSnapshot, PortStatus, StpEngine, StpStats};
pub use switch::{Egress, Switch};
pub use vlan_table::VlanTable;
