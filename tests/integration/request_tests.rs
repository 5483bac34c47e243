//! Request interface served from the tick loop.

use serde_json::{Value, json};

use nodelink::api::{Request, Response};

use crate::harness::Rig;

fn body_json(response: &Response) -> Value {
    serde_json::from_slice(&response.body).unwrap()
}

#[test]
fn listens_on_port_80_after_begin() {
    let mut rig = Rig::new();
    assert_eq!(rig.listener.port(), None);
    rig.begin();
    assert_eq!(rig.listener.port(), Some(80));
}

#[test]
fn adopt_returns_the_adoption_document() {
    let mut rig = Rig::online();
    rig.listener.send(Request::get("/adopt"));
    rig.tick_after(10);

    let response = rig.listener.last_response().unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.content_type, "application/json");

    let doc = body_json(&response);
    assert_eq!(doc["network"]["ip"], "192.168.1.50");
    assert_eq!(doc["network"]["mac"], "24:0A:C4:5E:71:01");
    assert_eq!(doc["firmware"]["version"], "9.9.9");
    assert!(doc["system"].is_object());
}

#[test]
fn adopt_matches_the_published_document() {
    let mut rig = Rig::online();
    rig.listener.send(Request::get("/adopt"));
    rig.tick_after(10);

    let served = body_json(&rig.listener.last_response().unwrap());
    let retained: Value =
        serde_json::from_slice(&rig.broker.retained("adopt/5e7101").unwrap()).unwrap();
    assert_eq!(served, retained);
}

#[test]
fn adopt_is_served_without_a_broker_session() {
    let mut rig = Rig::new();
    rig.broker
        .refuse_with(Some(nodelink::session::reason::DisconnectReason::Unavailable));
    rig.begin();
    rig.listener.send(Request::get("/adopt"));
    rig.tick_after(10);
    assert_eq!(rig.listener.last_response().unwrap().status, 200);
}

#[test]
fn unknown_path_is_404_and_wrong_method_is_405() {
    let mut rig = Rig::online();
    rig.listener.send(Request::get("/missing"));
    rig.tick_after(10);
    assert_eq!(rig.listener.last_response().unwrap().status, 404);

    rig.listener.send(Request::post("/adopt", b"{}"));
    rig.tick_after(10);
    assert_eq!(rig.listener.last_response().unwrap().status, 405);
}

#[test]
fn firmware_extensions_are_routed_by_exact_path() {
    let mut rig = Rig::new();
    assert!(rig.node.api_get(
        "/relay",
        Box::new(|_: &Request| Response::json_value(200, &json!({"relay": true}))),
    ));
    assert!(rig.node.api_post(
        "/relay",
        Box::new(|req: &Request| match req.json() {
            Some(body) if body["relay"].is_boolean() => Response::ok(),
            _ => Response::text(400, "expected relay"),
        }),
    ));
    rig.begin();

    rig.listener.send(Request::get("/relay"));
    rig.tick_after(10);
    assert_eq!(body_json(&rig.listener.last_response().unwrap()), json!({"relay": true}));

    rig.listener.send(Request::post("/relay", br#"{"relay":false}"#));
    rig.tick_after(10);
    assert_eq!(rig.listener.last_response().unwrap().status, 200);

    rig.listener.send(Request::post("/relay", b"nope"));
    rig.tick_after(10);
    assert_eq!(rig.listener.last_response().unwrap().status, 400);

    rig.listener.send(Request::get("/relay/"));
    rig.tick_after(10);
    assert_eq!(rig.listener.last_response().unwrap().status, 404);
}

#[test]
fn adopt_path_cannot_be_overridden() {
    let mut rig = Rig::new();
    assert!(!rig.node.api_get(
        "/adopt",
        Box::new(|_: &Request| Response::text(200, "shadow")),
    ));
}

#[test]
fn one_request_per_tick() {
    let mut rig = Rig::online();
    rig.listener.send(Request::get("/adopt"));
    rig.listener.send(Request::get("/missing"));

    rig.tick_after(10);
    assert_eq!(rig.listener.responses().len(), 1);
    assert_eq!(rig.listener.pending(), 1);

    rig.tick_after(10);
    assert_eq!(rig.listener.responses().len(), 2);
    assert_eq!(rig.listener.pending(), 0);
}

#[test]
fn requests_wait_while_the_network_is_down() {
    let mut rig = Rig::online();
    rig.ethernet.set_cable(false);
    rig.listener.send(Request::get("/adopt"));

    rig.tick_after(10);
    assert!(rig.listener.responses().is_empty());

    rig.ethernet.set_cable(true);
    rig.tick_after(10);
    assert_eq!(rig.listener.last_response().unwrap().status, 200);
}
