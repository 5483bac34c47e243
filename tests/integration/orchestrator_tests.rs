//! Bring-up, connection state and status text, end to end.

use core::net::Ipv4Addr;

use serde_json::json;

use nodelink::adapters::settings_store::MemorySettingsStore;
use nodelink::adapters::sim::{ManualClock, SimBroker, SimListener, SimWifiDriver};
use nodelink::adapters::system_info::EspSystemInfo;
use nodelink::app::service::{ConnectionState, Orchestrator};
use nodelink::network::wifi::WifiLink;
use nodelink::pins;
use nodelink::session::SessionEvent;
use nodelink::session::reason::DisconnectReason;

use crate::harness::{CLIENT_ID, FIRMWARE, Rig};

// ── Ethernet bring-up ────────────────────────────────────────

#[test]
fn begin_runs_reset_pulse_and_dhcp_with_offset_mac() {
    let mut rig = Rig::new();
    assert!(rig.begin());

    assert_eq!(rig.ethernet.cs_gpio(), Some(pins::ETHERNET_CS_GPIO));
    assert_eq!(rig.reset.levels(), [true, false, true]);
    assert_eq!(rig.delay.elapsed_ms(), 250 + 50 + 350);
    assert_eq!(
        rig.ethernet.dhcp_mac(),
        Some([0x24, 0x0A, 0xC4, 0x5E, 0x71, 0x01])
    );
    assert_eq!(rig.ethernet.dhcp_requests(), 1);
}

#[test]
fn status_text_before_begin() {
    let rig = Rig::new();
    assert_eq!(rig.node.connection_state(), ConnectionState::None);
    assert_eq!(rig.node.ip_address_txt().as_str(), "---.---.---.---");
    assert_eq!(rig.node.mac_address_txt().as_str(), "--:--:--:--:--:--");
    assert_eq!(rig.node.session_topic_txt().as_str(), "-/------");
}

#[test]
fn ip_only_until_the_first_tick() {
    let mut rig = Rig::new();
    rig.begin();
    assert_eq!(rig.node.connection_state(), ConnectionState::IpOnly);
    assert_eq!(rig.node.ip_address_txt().as_str(), "192.168.001.050");
    assert_eq!(rig.node.mac_address_txt().as_str(), "24:0A:C4:5E:71:01");
    assert_eq!(rig.node.session_topic_txt().as_str(), "-/------");
    assert_eq!(rig.broker.connects(), 0);
}

#[test]
fn session_active_after_connect() {
    let rig = Rig::online();
    assert_eq!(rig.node.connection_state(), ConnectionState::SessionActive);
    assert_eq!(rig.node.session_topic_txt().as_str(), "+/5e7101");

    let connect = rig.broker.last_connect().unwrap();
    assert_eq!(connect.broker, "broker.test");
    assert_eq!(connect.client_id, CLIENT_ID);
    assert_eq!(connect.will_topic, "lwt/5e7101");
}

#[test]
fn link_loss_drops_to_none_and_stops_ticking() {
    let mut rig = Rig::online();
    rig.ethernet.set_cable(false);

    assert_eq!(rig.node.connection_state(), ConnectionState::None);
    assert_eq!(rig.node.ip_address_txt().as_str(), "---.---.---.---");
    assert_eq!(rig.node.session_topic_txt().as_str(), "-/------");

    let calls = rig.broker.publish_calls();
    assert_eq!(rig.tick_after(100), None);
    assert_eq!(rig.broker.publish_calls(), calls);
}

#[test]
fn replugged_cable_restores_ip_and_session() {
    let mut rig = Rig::online();
    rig.ethernet.set_cable(false);
    rig.tick_after(100);
    rig.broker.drop_session(DisconnectReason::ConnectionLost);

    rig.ethernet.set_cable(true);
    assert_eq!(
        rig.tick_after(100),
        Some(SessionEvent::Disconnected(DisconnectReason::ConnectionLost))
    );
    assert_eq!(rig.node.ip_address_txt().as_str(), "192.168.001.050");
    assert_eq!(rig.node.connection_state(), ConnectionState::IpOnly);

    assert_eq!(rig.tick_after(10), Some(SessionEvent::Connected));
    assert_eq!(rig.node.connection_state(), ConnectionState::SessionActive);
}

#[test]
fn missing_hardware_leaves_node_offline() {
    let mut rig = Rig::new();
    rig.ethernet.set_hardware_present(false);
    assert!(!rig.begin());
    assert_eq!(rig.node.connection_state(), ConnectionState::None);

    rig.tick_after(5_000);
    assert_eq!(rig.broker.connects(), 0);
    // Identity is resolved even when bring-up fails.
    assert_eq!(rig.node.mac_address_txt().as_str(), "24:0A:C4:5E:71:01");
}

#[test]
fn dhcp_timeout_is_not_retried_by_begin() {
    let mut rig = Rig::new();
    rig.ethernet.set_dhcp_server(None);
    assert!(!rig.begin());
    assert_eq!(rig.ethernet.dhcp_requests(), 1);
    assert_eq!(rig.node.connection_state(), ConnectionState::None);
    assert_eq!(rig.node.ip_address_txt().as_str(), "---.---.---.---");
}

#[test]
fn dhcp_timeout_with_cable_plugged_stays_offline() {
    let mut rig = Rig::new();
    rig.ethernet.set_dhcp_server(None);
    rig.begin();

    assert_eq!(rig.tick_after(10), None);
    assert_eq!(rig.tick_after(5_000), None);
    assert_eq!(rig.node.connection_state(), ConnectionState::None);
    assert_eq!(rig.node.session_topic_txt().as_str(), "-/------");
    assert_eq!(rig.broker.connects(), 0);
}

#[test]
fn replug_after_failed_dhcp_recovers_through_lease_renewal() {
    let mut rig = Rig::new();
    rig.ethernet.set_dhcp_server(None);
    rig.begin();
    rig.ethernet.set_cable(false);
    assert_eq!(rig.tick_after(10), None);

    rig.ethernet.set_dhcp_server(Some(Ipv4Addr::new(192, 168, 1, 50)));
    rig.ethernet.set_cable(true);
    assert_eq!(rig.node.connection_state(), ConnectionState::None);

    rig.broker.refuse_with(Some(DisconnectReason::Unavailable));
    assert_eq!(
        rig.tick_after(10),
        Some(SessionEvent::Disconnected(DisconnectReason::Unavailable))
    );
    assert_eq!(rig.node.connection_state(), ConnectionState::IpOnly);
    assert_eq!(rig.node.ip_address_txt().as_str(), "192.168.001.050");
    assert_eq!(rig.ethernet.dhcp_requests(), 1);
}

// ── Publishing ───────────────────────────────────────────────

#[test]
fn publish_fails_closed_without_network() {
    let mut rig = Rig::online();
    rig.ethernet.set_cable(false);

    let calls = rig.broker.publish_calls();
    assert!(!rig.node.publish_status(&json!({"relay": true})));
    assert!(!rig.node.publish_telemetry(&json!({"temp": 20.5})));
    assert_eq!(rig.broker.publish_calls(), calls);
}

#[test]
fn publish_reaches_status_and_telemetry_topics() {
    let mut rig = Rig::online();
    assert!(rig.node.publish_status(&json!({"relay": true})));
    assert!(rig.node.publish_telemetry(&json!({"temp": 20})));

    let stat = rig.broker.published_on("stat/5e7101");
    assert_eq!(stat.len(), 1);
    assert_eq!(stat[0].payload, br#"{"relay":true}"#);
    assert!(!stat[0].retained);
    assert_eq!(rig.broker.published_on("tele/5e7101").len(), 1);
}

#[test]
fn publish_without_session_is_refused() {
    let mut rig = Rig::new();
    rig.begin();
    assert!(!rig.node.publish_status(&json!({"relay": true})));
}

// ── Settings precedence ──────────────────────────────────────

#[test]
fn stored_settings_override_code_and_hardware_defaults() {
    let store = MemorySettingsStore::new();
    let mut stored = nodelink::config::PersistedSession::default();
    stored.client_id = Some("kitchen".try_into().unwrap());
    stored.topic_prefix = Some("home".try_into().unwrap());
    store.save(&stored).unwrap();

    let mut rig = Rig::new();
    rig.node.set_session_topic_prefix("code").unwrap();
    assert!(rig.begin_with(&store));
    rig.tick_after(10);

    assert_eq!(rig.broker.last_connect().unwrap().client_id, "kitchen");
    assert_eq!(rig.broker.subscriptions(), ["home/conf/kitchen", "home/cmnd/kitchen"]);
    assert_eq!(rig.node.session_topic_txt().as_str(), "home/+/kitchen");
}

#[test]
fn stored_wildcard_prefix_is_ignored() {
    let store = MemorySettingsStore::new();
    let mut stored = nodelink::config::PersistedSession::default();
    stored.topic_prefix = Some("home/#".try_into().unwrap());
    stored.client_id = Some("porch/+".try_into().unwrap());
    store.save(&stored).unwrap();

    let mut rig = Rig::new();
    assert!(rig.begin_with(&store));
    rig.tick_after(10);

    assert_eq!(rig.broker.last_connect().unwrap().client_id, CLIENT_ID);
    assert_eq!(rig.broker.subscriptions(), ["conf/5e7101", "cmnd/5e7101"]);
    assert_eq!(rig.node.session_topic_txt().as_str(), "+/5e7101");
}

#[test]
fn corrupted_store_falls_back_to_defaults() {
    let store = MemorySettingsStore::from_bytes(vec![0xFF; 4]);
    let mut rig = Rig::new();
    rig.begin_with(&store);
    rig.tick_after(10);
    assert_eq!(rig.broker.last_connect().unwrap().client_id, CLIENT_ID);
}

#[test]
fn settings_setters_reject_invalid_values() {
    let mut rig = Rig::new();
    assert!(rig.node.set_session_client_id("a/b").is_err());
    assert!(rig.node.set_session_topic_suffix("#").is_err());
    assert!(rig.node.set_session_broker(&"h".repeat(100), 1883).is_err());
    assert!(rig.node.set_session_auth("user", "pass").is_ok());
}

// ── WiFi ─────────────────────────────────────────────────────

type WifiNode = Orchestrator<WifiLink<SimWifiDriver>, SimBroker, SimListener, EspSystemInfo, ManualClock>;

fn wifi_node(stored_credentials: bool) -> (WifiNode, SimWifiDriver, SimBroker) {
    let wifi = SimWifiDriver::new(stored_credentials);
    let broker = SimBroker::new();
    let mut node = Orchestrator::new(
        FIRMWARE,
        WifiLink::new(wifi.clone()),
        broker.clone(),
        SimListener::new(),
        EspSystemInfo::new(),
        ManualClock::new(),
    );
    node.set_session_broker("broker.test", 1883).unwrap();
    (node, wifi, broker)
}

#[test]
fn wifi_uses_base_mac_verbatim() {
    let (mut node, wifi, _) = wifi_node(true);
    assert!(node.begin(None, None, &MemorySettingsStore::new()));
    assert!(wifi.station_mode());
    assert_eq!(node.mac_address_txt().as_str(), "24:0A:C4:5E:71:FE");
    assert_eq!(node.ip_address_txt().as_str(), "192.168.004.020");
    assert_eq!(node.tick(), Some(SessionEvent::Connected));
    assert_eq!(node.session_topic_txt().as_str(), "+/5e71fe");
}

#[test]
fn wifi_portal_closed_leaves_node_offline() {
    let (mut node, wifi, broker) = wifi_node(false);
    assert!(!node.begin(None, None, &MemorySettingsStore::new()));
    assert!(wifi.portal_opened().is_some());
    assert_eq!(node.connection_state(), ConnectionState::None);
    assert_eq!(node.tick(), None);
    assert_eq!(broker.connects(), 0);
}

#[test]
fn adoption_reports_wifi_network() {
    let (mut node, _, _) = wifi_node(true);
    node.begin(None, None, &MemorySettingsStore::new());
    let doc = node.adoption_document().unwrap();
    assert_eq!(doc.value()["network"]["mode"], "wifi");
    assert_eq!(doc.value()["network"]["ip"], Ipv4Addr::new(192, 168, 4, 20).to_string());
}
