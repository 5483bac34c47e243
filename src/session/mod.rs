//! Session supervisor.
//!
//! Keeps the publish/subscribe session to the broker alive:
//!
//! ```text
//!   Disconnected ──deadline passed──▶ Connecting ──ok──▶ Connected
//!        ▲                                 │                 │
//!        └──── failed (backoff grows) ─────┘◀── lost ────────┘ (retry now)
//! ```
//!
//! Everything here is non-blocking; [`SessionSupervisor::poll`] is called
//! once per tick and only while the network is up.
//!
//! Settings precedence: values set from code are defaults, persisted values
//! loaded at startup override them field by field, regardless of the order
//! the two arrive in.

pub mod reason;
pub mod topics;

use log::{debug, info, warn};
use serde_json::Value;

use crate::adapters::log_sink;
use crate::adoption::AdoptionBuilder;
use crate::app::ports::{ConnectRequest, SessionTransport, TopicString, TransportState};
use crate::config::{
    PersistedSession, RECONNECT_BACKOFF_INITIAL_MS, RECONNECT_BACKOFF_MAX_MS, SessionSettings,
};
use crate::error::DispatchError;

use self::reason::DisconnectReason;
use self::topics::TopicKind;

/// Inbound messages handled per tick; the rest wait for the next one.
pub const MAX_INBOUND_PER_TICK: usize = 4;
/// Queued log lines published per tick.
pub const MAX_LOG_LINES_PER_TICK: usize = 4;

const ONLINE_PAYLOAD: &[u8] = br#"{"online":true}"#;
const OFFLINE_PAYLOAD: &[u8] = br#"{"online":false}"#;

/// Firmware callback for inbound config or command payloads.
pub type JsonHandler = Box<dyn FnMut(&Value)>;

#[derive(Default)]
pub struct CallbackRegistry {
    config: Option<JsonHandler>,
    command: Option<JsonHandler>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Emitted by [`SessionSupervisor::poll`] once per transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Connected,
    Disconnected(DisconnectReason),
}

/// Which handler an inbound message was delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Config,
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishKind {
    Status,
    Telemetry,
}

impl PublishKind {
    fn topic_kind(self) -> TopicKind {
        match self {
            Self::Status => TopicKind::Status,
            Self::Telemetry => TopicKind::Telemetry,
        }
    }
}

pub struct SessionSupervisor<M: SessionTransport> {
    transport: M,
    defaults: SessionSettings,
    persisted: PersistedSession,
    /// `defaults` overlaid with `persisted`.
    effective: SessionSettings,
    callbacks: CallbackRegistry,
    state: SessionState,
    next_attempt_ms: u64,
    backoff_ms: u64,
}

impl<M: SessionTransport> SessionSupervisor<M> {
    pub fn new(transport: M) -> Self {
        Self {
            transport,
            defaults: SessionSettings::default(),
            persisted: PersistedSession::default(),
            effective: SessionSettings::default(),
            callbacks: CallbackRegistry::default(),
            state: SessionState::Disconnected,
            next_attempt_ms: 0,
            backoff_ms: RECONNECT_BACKOFF_INITIAL_MS,
        }
    }

    // ── Settings ────────────────────────────────────────────────

    /// Replace the code-set defaults.
    pub fn configure(&mut self, settings: SessionSettings) {
        self.defaults = settings;
        self.refresh_effective();
    }

    pub fn defaults(&self) -> &SessionSettings {
        &self.defaults
    }

    /// Hardware-derived client id, used only when code has not set one.
    pub fn set_client_id_default(&mut self, client_id: &str) {
        if !self.defaults.client_id.is_empty() {
            return;
        }
        if let Err(e) = self.defaults.set_client_id(client_id) {
            warn!("session: {}", e);
        }
        self.refresh_effective();
    }

    /// Install values loaded from persistent storage.
    pub fn apply_persisted(&mut self, persisted: &PersistedSession) {
        self.persisted = persisted.clone();
        self.refresh_effective();
    }

    pub fn effective_settings(&self) -> &SessionSettings {
        &self.effective
    }

    fn refresh_effective(&mut self) {
        self.effective = self.defaults.overlay(&self.persisted);
    }

    // ── Callbacks ───────────────────────────────────────────────

    pub fn on_config(&mut self, handler: JsonHandler) {
        self.callbacks.config = Some(handler);
    }

    pub fn on_command(&mut self, handler: JsonHandler) {
        self.callbacks.command = Some(handler);
    }

    // ── State ───────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Connected as far as both the supervisor and the transport know.
    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
            && self.transport.state() == TransportState::Connected
    }

    pub fn transport(&self) -> &M {
        &self.transport
    }

    pub fn wildcard_topic(&self) -> TopicString {
        topics::wildcard(&self.effective)
    }

    // ── Tick ────────────────────────────────────────────────────

    pub fn poll(&mut self, now_ms: u64, adoption: &AdoptionBuilder<'_>) -> Option<SessionEvent> {
        if self.state == SessionState::Connected {
            if let TransportState::Down(reason) = self.transport.state() {
                return Some(self.connection_lost(now_ms, reason));
            }
            self.drain_inbound();
            self.forward_log_lines();
            return None;
        }

        if now_ms < self.next_attempt_ms || self.effective.broker.is_empty() {
            return None;
        }
        Some(self.attempt_connect(now_ms, adoption))
    }

    fn attempt_connect(&mut self, now_ms: u64, adoption: &AdoptionBuilder<'_>) -> SessionEvent {
        self.state = SessionState::Connecting;
        debug!(
            "session: connecting to {}:{}",
            self.effective.broker, self.effective.port
        );

        let will_topic = topics::topic(&self.effective, TopicKind::Lwt);
        let request = ConnectRequest {
            broker: &self.effective.broker,
            port: self.effective.port,
            client_id: &self.effective.client_id,
            username: self.effective.username.as_deref(),
            password: self.effective.password.as_deref(),
            will_topic: &will_topic,
            will_payload: OFFLINE_PAYLOAD,
            will_retained: true,
        };

        match self.transport.connect(&request) {
            Ok(()) => {
                self.connected(adoption);
                SessionEvent::Connected
            }
            Err(reason) => {
                self.state = SessionState::Disconnected;
                warn!("session: {}", reason);
                log_sink::route_to_serial();
                self.next_attempt_ms = now_ms.saturating_add(self.backoff_ms);
                self.backoff_ms = (self.backoff_ms * 2).min(RECONNECT_BACKOFF_MAX_MS);
                SessionEvent::Disconnected(reason)
            }
        }
    }

    fn connected(&mut self, adoption: &AdoptionBuilder<'_>) {
        self.state = SessionState::Connected;
        self.backoff_ms = RECONNECT_BACKOFF_INITIAL_MS;

        for kind in [TopicKind::Config, TopicKind::Command] {
            let topic = topics::topic(&self.effective, kind);
            if !self.transport.subscribe(&topic) {
                warn!("session: failed to subscribe to {}", topic);
            }
        }

        let lwt = topics::topic(&self.effective, TopicKind::Lwt);
        if !self.transport.publish(&lwt, ONLINE_PAYLOAD, true) {
            warn!("session: failed to publish online status to {}", lwt);
        }

        match adoption.build().and_then(|doc| doc.encode()) {
            Ok(bytes) => {
                let topic = topics::topic(&self.effective, TopicKind::Adopt);
                if !self.transport.publish(&topic, &bytes, true) {
                    warn!("session: failed to publish adoption to {}", topic);
                }
            }
            Err(e) => warn!("session: adoption not published: {}", e),
        }

        log_sink::route_to_session();
        info!("session: connected");
    }

    fn connection_lost(&mut self, now_ms: u64, reason: DisconnectReason) -> SessionEvent {
        self.state = SessionState::Disconnected;
        log_sink::route_to_serial();
        warn!("session: {}", reason);
        self.next_attempt_ms = now_ms;
        self.backoff_ms = RECONNECT_BACKOFF_INITIAL_MS;
        SessionEvent::Disconnected(reason)
    }

    fn drain_inbound(&mut self) {
        for _ in 0..MAX_INBOUND_PER_TICK {
            let Some(msg) = self.transport.poll() else {
                break;
            };
            // Outcome already logged.
            let _ = self.dispatch(&msg.topic, &msg.payload);
        }
    }

    fn forward_log_lines(&mut self) {
        let topic = topics::topic(&self.effective, TopicKind::Log);
        let transport = &mut self.transport;
        log_sink::drain(MAX_LOG_LINES_PER_TICK, |line| {
            transport.publish(&topic, line.as_bytes(), false);
        });
    }

    // ── Messages ────────────────────────────────────────────────

    /// Route one inbound message to the matching handler.  Failures are
    /// logged and the message is dropped; no handler runs on error.
    pub fn dispatch(&mut self, topic: &str, payload: &[u8]) -> Result<MessageKind, DispatchError> {
        let result = self.route(topic, payload);
        match result {
            Ok(kind) => debug!("session: {:?} message on {}", kind, topic),
            Err(e) => warn!("session: {} ({})", e, topic),
        }
        result
    }

    fn route(&mut self, topic: &str, payload: &[u8]) -> Result<MessageKind, DispatchError> {
        let kind = match topics::classify(&self.effective, topic) {
            Some(TopicKind::Config) => MessageKind::Config,
            Some(TopicKind::Command) => MessageKind::Command,
            _ => return Err(DispatchError::UnknownTopic),
        };
        if payload.is_empty() {
            return Err(DispatchError::EmptyPayload);
        }
        let value: Value =
            serde_json::from_slice(payload).map_err(|_| DispatchError::MalformedJson)?;

        let handler = match kind {
            MessageKind::Config => self
                .callbacks
                .config
                .as_mut()
                .ok_or(DispatchError::NoConfigHandler)?,
            MessageKind::Command => self
                .callbacks
                .command
                .as_mut()
                .ok_or(DispatchError::NoCommandHandler)?,
        };
        handler(&value);
        Ok(kind)
    }

    /// Publish to the status or telemetry topic.  `false` when there is no
    /// session or the payload cannot be encoded.
    pub fn publish(&mut self, kind: PublishKind, payload: &Value) -> bool {
        if !self.is_connected() {
            return false;
        }
        let Ok(bytes) = serde_json::to_vec(payload) else {
            return false;
        };
        let topic = topics::topic(&self.effective, kind.topic_kind());
        self.transport.publish(&topic, &bytes, false)
    }
}
