//! Single-switch behaviour driven through the public API.

use bytes::Bytes;
use pretty_assertions::assert_eq;
use std::sync::Arc;

use l2switch_types::{BridgeId, MacAddress, PortId, VlanId};
use l2switchd::frame::add_tag;
use l2switchd::{EthernetHeader, PortStatus, Switch, SwitchConfig, VlanTable};

const CONFIG: &str = "100\ne0 10\ne1 10\nt0 T\n";
const HOST_A: MacAddress = MacAddress::new([0xaa; 6]);
const UNKNOWN: MacAddress = MacAddress::new([0x00, 0x12, 0x34, 0x56, 0x78, 0x9a]);

fn build() -> Switch {
    let config: SwitchConfig = CONFIG.parse().unwrap();
    let vlans = VlanTable::bind(&config, ["e0", "e1", "t0"]).unwrap();
    Switch::new(
        config.priority,
        MacAddress::new([0x02, 0, 0, 0, 0, 100]),
        Arc::new(vlans),
    )
}

fn frame(dst: MacAddress, src: MacAddress) -> Bytes {
    let mut raw = Vec::new();
    raw.extend_from_slice(dst.as_bytes());
    raw.extend_from_slice(src.as_bytes());
    raw.extend_from_slice(&[0x08, 0x00]);
    raw.extend_from_slice(&[0x45; 46]);
    Bytes::from(raw)
}

fn statuses(switch: &Switch) -> Vec<(String, PortStatus)> {
    switch
        .stp()
        .snapshot()
        .ports
        .into_iter()
        .map(|port| (port.name, port.status))
        .collect()
}

#[test]
fn test_lone_switch_unblocks_after_first_tick() {
    let sw = build();
    assert_eq!(
        statuses(&sw),
        vec![
            ("e0".to_string(), PortStatus::Listening),
            ("e1".to_string(), PortStatus::Listening),
            ("t0".to_string(), PortStatus::Blocking),
        ]
    );

    let bpdus = sw.stp().tick();
    assert_eq!(bpdus.len(), 1);
    assert_eq!(bpdus[0].port, PortId::new(2));

    assert!(statuses(&sw)
        .iter()
        .all(|(_, status)| *status == PortStatus::Listening));
    assert_eq!(sw.stp().own_id(), BridgeId::new(100));
    assert!(sw.stp().is_root());
}

#[test]
fn test_unknown_unicast_is_flooded_and_source_learned() {
    let mut sw = build();
    sw.stp().tick();

    let data = frame(UNKNOWN, HOST_A);
    let out = sw.handle_frame(PortId::new(0), &data);

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].port, PortId::new(1));
    assert_eq!(out[0].frame, data);

    assert_eq!(out[1].port, PortId::new(2));
    assert_eq!(out[1].frame, add_tag(&data, VlanId::new(10).unwrap()));
    let header = EthernetHeader::parse(&out[1].frame).unwrap();
    assert_eq!(header.vlan_id, Some(10));
    assert_eq!(header.src, HOST_A);

    assert_eq!(sw.fdb().lookup(&HOST_A), Some(PortId::new(0)));
    assert_eq!(sw.fdb().len(), 1);
}

#[test]
fn test_reply_is_unicast_back_to_learned_port() {
    let mut sw = build();
    sw.stp().tick();
    sw.handle_frame(PortId::new(0), &frame(UNKNOWN, HOST_A));

    // The reply comes over the trunk, tagged.
    let reply = add_tag(&frame(HOST_A, UNKNOWN), VlanId::new(10).unwrap());
    let out = sw.handle_frame(PortId::new(2), &reply);

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].port, PortId::new(0));
    assert_eq!(out[0].frame, frame(HOST_A, UNKNOWN));
    assert_eq!(sw.fdb().lookup(&UNKNOWN), Some(PortId::new(2)));
}

#[test]
fn test_other_vlan_on_trunk_stays_off_access_ports() {
    let mut sw = build();
    sw.stp().tick();

    let foreign = add_tag(&frame(MacAddress::BROADCAST, UNKNOWN), VlanId::new(20).unwrap());
    assert!(sw.handle_frame(PortId::new(2), &foreign).is_empty());
    assert_eq!(sw.forwarding_stats().dropped_vlan, 2);
}

#[test]
fn test_stats_account_for_every_frame() {
    let mut sw = build();
    sw.stp().tick();

    for _ in 0..3 {
        sw.handle_frame(PortId::new(0), &frame(UNKNOWN, HOST_A));
    }
    sw.handle_frame(PortId::new(1), &Bytes::from_static(b"runt"));

    let stats = sw.forwarding_stats();
    assert_eq!(stats.frames_received, 3);
    assert_eq!(stats.flooded, 3);
    assert_eq!(stats.transmitted, 6);
    assert_eq!(sw.malformed(), 1);
    assert_eq!(sw.fdb().len(), 1);
}
