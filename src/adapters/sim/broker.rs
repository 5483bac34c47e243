//! In-process pub/sub broker.
//!
//! Accepts or refuses connections on demand, records subscriptions and
//! publishes, keeps retained messages (including the last will once a
//! session drops) and delivers injected messages on subscribed topics.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use crate::app::ports::{
    ConnectRequest, INBOUND_PAYLOAD_MAX, InboundMessage, SessionTransport, TopicString,
    TransportState,
};
use crate::session::reason::DisconnectReason;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: Vec<u8>,
    pub retained: bool,
}

/// What the client presented in its last connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRecord {
    pub broker: String,
    pub port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub will_topic: String,
    pub will_payload: Vec<u8>,
    pub will_retained: bool,
}

#[derive(Debug, Default)]
struct BrokerSim {
    refuse: Option<DisconnectReason>,
    connected: bool,
    drop_reason: Option<DisconnectReason>,
    connects: u32,
    last_connect: Option<ConnectRecord>,
    subscriptions: Vec<String>,
    published: Vec<Published>,
    publish_calls: u32,
    retained: BTreeMap<String, Vec<u8>>,
    inbound: VecDeque<InboundMessage>,
}

#[derive(Debug, Clone, Default)]
pub struct SimBroker {
    inner: Rc<RefCell<BrokerSim>>,
}

impl SimBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every following connect with `reason`; `None` accepts again.
    pub fn refuse_with(&self, reason: Option<DisconnectReason>) {
        self.inner.borrow_mut().refuse = reason;
    }

    /// Drop the live session.  The client's will is published retained.
    pub fn drop_session(&self, reason: DisconnectReason) {
        let mut sim = self.inner.borrow_mut();
        if !sim.connected {
            return;
        }
        sim.connected = false;
        sim.drop_reason = Some(reason);
        sim.subscriptions.clear();
        if let Some(will) = sim.last_connect.clone() {
            if will.will_retained {
                sim.retained.insert(will.will_topic, will.will_payload);
            }
        }
    }

    /// Queue a message from another client.  Only delivered if the
    /// session is subscribed to `topic` when it is polled.
    pub fn inject(&self, topic: &str, payload: &[u8]) -> bool {
        let (Ok(topic), Ok(payload)) = (
            TopicString::try_from(topic),
            heapless::Vec::<u8, INBOUND_PAYLOAD_MAX>::from_slice(payload),
        ) else {
            return false;
        };
        self.inner
            .borrow_mut()
            .inbound
            .push_back(InboundMessage { topic, payload });
        true
    }

    pub fn is_connected(&self) -> bool {
        self.inner.borrow().connected
    }

    pub fn connects(&self) -> u32 {
        self.inner.borrow().connects
    }

    pub fn last_connect(&self) -> Option<ConnectRecord> {
        self.inner.borrow().last_connect.clone()
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.inner.borrow().subscriptions.clone()
    }

    /// Every accepted publish, oldest first.
    pub fn published(&self) -> Vec<Published> {
        self.inner.borrow().published.clone()
    }

    pub fn published_on(&self, topic: &str) -> Vec<Published> {
        self.inner
            .borrow()
            .published
            .iter()
            .filter(|p| p.topic == topic)
            .cloned()
            .collect()
    }

    /// Every `publish()` call, accepted or not.
    pub fn publish_calls(&self) -> u32 {
        self.inner.borrow().publish_calls
    }

    pub fn retained(&self, topic: &str) -> Option<Vec<u8>> {
        self.inner.borrow().retained.get(topic).cloned()
    }
}

impl SessionTransport for SimBroker {
    fn connect(&mut self, request: &ConnectRequest<'_>) -> Result<(), DisconnectReason> {
        let mut sim = self.inner.borrow_mut();
        sim.connects += 1;
        sim.last_connect = Some(ConnectRecord {
            broker: request.broker.into(),
            port: request.port,
            client_id: request.client_id.into(),
            username: request.username.map(Into::into),
            will_topic: request.will_topic.into(),
            will_payload: request.will_payload.to_vec(),
            will_retained: request.will_retained,
        });
        if let Some(reason) = sim.refuse {
            sim.connected = false;
            sim.drop_reason = Some(reason);
            return Err(reason);
        }
        sim.connected = true;
        sim.drop_reason = None;
        Ok(())
    }

    fn state(&self) -> TransportState {
        let sim = self.inner.borrow();
        if sim.connected {
            TransportState::Connected
        } else {
            TransportState::Down(sim.drop_reason.unwrap_or(DisconnectReason::Disconnected))
        }
    }

    fn subscribe(&mut self, topic: &str) -> bool {
        let mut sim = self.inner.borrow_mut();
        if !sim.connected {
            return false;
        }
        sim.subscriptions.push(topic.into());
        true
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retained: bool) -> bool {
        let mut sim = self.inner.borrow_mut();
        sim.publish_calls += 1;
        if !sim.connected {
            return false;
        }
        if retained {
            sim.retained.insert(topic.into(), payload.to_vec());
        }
        sim.published.push(Published {
            topic: topic.into(),
            payload: payload.to_vec(),
            retained,
        });
        true
    }

    fn poll(&mut self) -> Option<InboundMessage> {
        let mut sim = self.inner.borrow_mut();
        if !sim.connected {
            return None;
        }
        while let Some(msg) = sim.inbound.pop_front() {
            if sim.subscriptions.iter().any(|s| s == msg.topic.as_str()) {
                return Some(msg);
            }
        }
        None
    }
}
