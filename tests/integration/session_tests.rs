//! Broker session: announcements, inbound routing, reconnects.

use serde_json::{Value, json};

use nodelink::session::SessionEvent;
use nodelink::session::reason::DisconnectReason;

use crate::harness::{CLIENT_ID, Rig};

fn retained_json(rig: &Rig, topic: &str) -> Value {
    let bytes = rig.broker.retained(topic).expect("nothing retained");
    serde_json::from_slice(&bytes).unwrap()
}

// ── Announcements ────────────────────────────────────────────

#[test]
fn connect_presents_client_id_and_offline_will() {
    let mut rig = Rig::new();
    rig.node.set_session_auth("node", "secret").unwrap();
    rig.begin();
    rig.tick_after(10);

    let connect = rig.broker.last_connect().unwrap();
    assert_eq!(connect.port, 1883);
    assert_eq!(connect.client_id, CLIENT_ID);
    assert_eq!(connect.username.as_deref(), Some("node"));
    assert_eq!(connect.will_payload, br#"{"online":false}"#);
    assert!(connect.will_retained);
}

#[test]
fn connect_subscribes_to_config_and_command() {
    let rig = Rig::online();
    assert_eq!(rig.broker.subscriptions(), ["conf/5e7101", "cmnd/5e7101"]);
}

#[test]
fn online_flag_and_adoption_are_retained() {
    let rig = Rig::online();
    assert_eq!(retained_json(&rig, "lwt/5e7101"), json!({"online": true}));

    let adopt = retained_json(&rig, "adopt/5e7101");
    assert_eq!(adopt["firmware"]["name"], "Rig Firmware");
    assert_eq!(adopt["firmware"]["githubUrl"], "https://example.com/rig");
    assert_eq!(adopt["network"]["mode"], "ethernet");
    assert_eq!(adopt["network"]["ip"], "192.168.1.50");
    assert_eq!(adopt["network"]["mac"], "24:0A:C4:5E:71:01");
    assert_eq!(adopt["configSchema"]["title"], "rig");
}

#[test]
fn adoption_carries_firmware_schemas() {
    let mut rig = Rig::new();
    rig.node
        .set_config_schema(&json!({"pulseMs": {"type": "integer"}}))
        .unwrap();
    rig.node
        .set_command_schema(&json!({"relay": {"type": "boolean"}}))
        .unwrap();
    rig.begin();
    rig.tick_after(10);

    let adopt = retained_json(&rig, "adopt/5e7101");
    assert_eq!(
        adopt["configSchema"]["properties"]["pulseMs"]["type"],
        "integer"
    );
    assert_eq!(
        adopt["commandSchema"]["properties"]["relay"]["type"],
        "boolean"
    );
}

#[test]
fn dropped_session_leaves_offline_will() {
    let rig = Rig::online();
    rig.broker.drop_session(DisconnectReason::ConnectionLost);
    assert_eq!(retained_json(&rig, "lwt/5e7101"), json!({"online": false}));
}

#[test]
fn prefix_and_suffix_shape_every_topic() {
    let mut rig = Rig::new();
    rig.node.set_session_topic_prefix("site").unwrap();
    rig.node.set_session_topic_suffix("relay").unwrap();
    rig.begin();
    rig.tick_after(10);

    assert_eq!(
        rig.broker.subscriptions(),
        ["site/conf/5e7101/relay", "site/cmnd/5e7101/relay"]
    );
    assert_eq!(rig.broker.last_connect().unwrap().will_topic, "site/lwt/5e7101/relay");
    assert!(rig.broker.retained("site/adopt/5e7101/relay").is_some());
    assert_eq!(rig.node.session_topic_txt().as_str(), "site/+/5e7101/relay");
}

// ── Inbound ──────────────────────────────────────────────────

#[test]
fn config_message_reaches_config_handler() {
    let mut rig = Rig::online();
    assert!(rig.broker.inject("conf/5e7101", br#"{"pulseMs":100}"#));
    rig.tick_after(10);

    assert_eq!(*rig.configs.borrow(), [json!({"pulseMs": 100})]);
    assert!(rig.commands.borrow().is_empty());
}

#[test]
fn command_message_reaches_command_handler() {
    let mut rig = Rig::online();
    rig.broker.inject("cmnd/5e7101", br#"{"relay":true}"#);
    rig.tick_after(10);

    assert_eq!(*rig.commands.borrow(), [json!({"relay": true})]);
    assert!(rig.configs.borrow().is_empty());
}

#[test]
fn malformed_and_empty_payloads_are_dropped() {
    let mut rig = Rig::online();
    rig.broker.inject("conf/5e7101", b"{not json");
    rig.broker.inject("cmnd/5e7101", b"");
    rig.broker.inject("cmnd/5e7101", br#"{"relay":false}"#);
    rig.tick_after(10);

    assert!(rig.configs.borrow().is_empty());
    assert_eq!(*rig.commands.borrow(), [json!({"relay": false})]);
}

#[test]
fn inbound_is_drained_a_few_messages_per_tick() {
    let mut rig = Rig::online();
    for n in 0..6 {
        rig.broker.inject("conf/5e7101", json!({"n": n}).to_string().as_bytes());
    }
    rig.tick_after(10);
    assert_eq!(rig.configs.borrow().len(), 4);
    rig.tick_after(10);
    assert_eq!(rig.configs.borrow().len(), 6);
    assert_eq!(rig.configs.borrow()[5], json!({"n": 5}));
}

#[test]
fn nothing_is_delivered_while_the_link_is_down() {
    let mut rig = Rig::online();
    rig.broker.inject("conf/5e7101", br#"{"pulseMs":1}"#);
    rig.ethernet.set_cable(false);
    rig.tick_after(10);
    assert!(rig.configs.borrow().is_empty());
}

// ── Reconnect ────────────────────────────────────────────────

#[test]
fn lost_session_reconnects_on_the_next_tick() {
    let mut rig = Rig::online();
    rig.broker.drop_session(DisconnectReason::Timeout);

    assert_eq!(
        rig.tick_after(10),
        Some(SessionEvent::Disconnected(DisconnectReason::Timeout))
    );
    assert_eq!(rig.tick_after(10), Some(SessionEvent::Connected));
    assert_eq!(rig.broker.connects(), 2);
    assert_eq!(rig.broker.subscriptions(), ["conf/5e7101", "cmnd/5e7101"]);
    assert_eq!(retained_json(&rig, "lwt/5e7101"), json!({"online": true}));
}

#[test]
fn connected_fires_once_per_connection() {
    let mut rig = Rig::online();
    assert_eq!(rig.tick_after(10), None);
    assert_eq!(rig.tick_after(10), None);
    assert_eq!(rig.broker.connects(), 1);
}

#[test]
fn refused_connects_back_off_until_accepted() {
    let mut rig = Rig::new();
    rig.broker.refuse_with(Some(DisconnectReason::BadCredentials));
    rig.begin();

    let refused = Some(SessionEvent::Disconnected(DisconnectReason::BadCredentials));
    assert_eq!(rig.tick_after(0), refused);
    assert_eq!(rig.tick_after(1_999), None);
    assert_eq!(rig.tick_after(1), refused);
    assert_eq!(rig.tick_after(3_999), None);
    assert_eq!(rig.tick_after(1), refused);
    assert_eq!(rig.broker.connects(), 3);

    rig.broker.refuse_with(None);
    assert_eq!(rig.tick_after(7_999), None);
    assert_eq!(rig.tick_after(1), Some(SessionEvent::Connected));
    assert_eq!(rig.broker.connects(), 4);
}

#[test]
fn backoff_restarts_after_a_successful_connect() {
    let mut rig = Rig::new();
    rig.broker.refuse_with(Some(DisconnectReason::Unavailable));
    rig.begin();
    rig.tick_after(0);
    rig.tick_after(2_000);
    rig.broker.refuse_with(None);
    assert_eq!(rig.tick_after(4_000), Some(SessionEvent::Connected));

    rig.broker.drop_session(DisconnectReason::ConnectionLost);
    rig.broker.refuse_with(Some(DisconnectReason::Unavailable));
    rig.tick_after(10);
    rig.tick_after(0);
    let connects = rig.broker.connects();
    rig.broker.refuse_with(None);
    assert_eq!(rig.tick_after(1_999), None);
    assert_eq!(rig.tick_after(1), Some(SessionEvent::Connected));
    assert_eq!(rig.broker.connects(), connects + 1);
}

#[test]
fn no_broker_means_no_connect_attempts() {
    let mut rig = Rig::new();
    rig.node.set_session_broker("", 1883).unwrap();
    rig.begin();
    assert_eq!(rig.tick_after(120_000), None);
    assert_eq!(rig.broker.connects(), 0);
}
