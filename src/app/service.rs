//! Orchestrator, the single owner of every connectivity component.
//!
//! [`Orchestrator`] wires the identity, network bring-up, session
//! supervisor, request interface and schema registry together behind one
//! facade the firmware talks to.  All I/O flows through the port traits
//! it is constructed with.
//!
//! ```text
//!                    ┌──────────────────────────────┐
//!  PhysicalTransport │         Orchestrator         │ SessionTransport
//!  ────────────────▶ │  NetworkBringUp ─┬─ Session ─│ ────────────────▶
//!                    │                  └─ Api ─────│ RequestListener
//!  SystemInfoPort ─▶ │  SchemaRegistry · Identity   │
//!                    └──────────────────────────────┘
//! ```
//!
//! Call [`Orchestrator::begin`] once, then [`Orchestrator::tick`] from the
//! main loop.  Every tick is gated on the network being up.

use log::{info, warn};
use serde_json::Value;

use crate::adoption::{AdoptionBuilder, AdoptionDocument, NetworkInfo};
use crate::api::{RequestInterface, RouteHandler};
use crate::config::{FirmwareInfo, REQUEST_PORT, SessionSettings};
use crate::error::{DocumentError, SettingsError};
use crate::identity::{self, HardwareIdentity, MacDisplayString};
use crate::network::{NetworkBringUp, ip_text};
use crate::schema::SchemaRegistry;
use crate::session::topics::{self, TopicText};
use crate::session::{JsonHandler, PublishKind, SessionEvent, SessionSupervisor};

use super::ports::{
    Clock, PhysicalTransport, RequestListener, SessionTransport, SettingsPort, SystemInfoPort,
};

/// Shown by [`Orchestrator::session_topic_txt`] without an active session.
pub const NO_SESSION_TOPIC_TXT: &str = "-/------";
/// Shown by [`Orchestrator::mac_address_txt`] before `begin()`.
pub const NO_MAC_TXT: &str = "--:--:--:--:--:--";

/// Overall connectivity, derived from live component state on every query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No network.
    None,
    /// Address acquired, no broker session.
    IpOnly,
    SessionActive,
}

pub struct Orchestrator<T, M, L, S, C>
where
    T: PhysicalTransport,
    M: SessionTransport,
    L: RequestListener,
    S: SystemInfoPort,
    C: Clock,
{
    firmware: FirmwareInfo,
    identity: Option<HardwareIdentity>,
    network: NetworkBringUp<T>,
    session: SessionSupervisor<M>,
    api: RequestInterface<L>,
    schemas: SchemaRegistry,
    system: S,
    clock: C,
}

impl<T, M, L, S, C> Orchestrator<T, M, L, S, C>
where
    T: PhysicalTransport,
    M: SessionTransport,
    L: RequestListener,
    S: SystemInfoPort,
    C: Clock,
{
    pub fn new(
        firmware: FirmwareInfo,
        transport: T,
        session_transport: M,
        listener: L,
        system: S,
        clock: C,
    ) -> Self {
        Self {
            firmware,
            identity: None,
            network: NetworkBringUp::new(transport),
            session: SessionSupervisor::new(session_transport),
            api: RequestInterface::new(listener),
            schemas: SchemaRegistry::new(),
            system,
            clock,
        }
    }

    // ── Session settings (code defaults) ──────────────────────

    pub fn set_session_broker(&mut self, broker: &str, port: u16) -> Result<(), SettingsError> {
        self.update_session(|s| s.set_broker(broker, port))
    }

    pub fn set_session_client_id(&mut self, client_id: &str) -> Result<(), SettingsError> {
        self.update_session(|s| s.set_client_id(client_id))
    }

    pub fn set_session_auth(&mut self, username: &str, password: &str) -> Result<(), SettingsError> {
        self.update_session(|s| s.set_auth(username, password))
    }

    pub fn set_session_topic_prefix(&mut self, prefix: &str) -> Result<(), SettingsError> {
        self.update_session(|s| s.set_topic_prefix(prefix))
    }

    pub fn set_session_topic_suffix(&mut self, suffix: &str) -> Result<(), SettingsError> {
        self.update_session(|s| s.set_topic_suffix(suffix))
    }

    fn update_session(
        &mut self,
        f: impl FnOnce(&mut SessionSettings) -> Result<(), SettingsError>,
    ) -> Result<(), SettingsError> {
        let mut settings = self.session.defaults().clone();
        f(&mut settings)?;
        self.session.configure(settings);
        Ok(())
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Bring everything up once.  Returns whether the network came up;
    /// the request interface is started either way.
    pub fn begin(
        &mut self,
        on_config: Option<JsonHandler>,
        on_command: Option<JsonHandler>,
        settings: &impl SettingsPort,
    ) -> bool {
        match serde_json::to_string(&self.firmware) {
            Ok(json) => info!("firmware: {}", json),
            Err(_) => warn!("firmware: identity could not be encoded"),
        }

        if let Some(handler) = on_config {
            self.session.on_config(handler);
        }
        if let Some(handler) = on_command {
            self.session.on_command(handler);
        }

        let identity = identity::resolve(self.network.transport().base_mac(), self.network.mode());
        let up = self.network.begin(&identity);
        self.session.set_client_id_default(identity.client_id());
        self.identity = Some(identity);

        self.api.begin(REQUEST_PORT, settings, &mut self.session);
        up
    }

    /// One cooperative step: session, then at most one request.  Does
    /// nothing while the network is down.
    pub fn tick(&mut self) -> Option<SessionEvent> {
        if !self.network.poll() {
            return None;
        }
        let now = self.clock.now_ms();
        let adoption = AdoptionBuilder {
            firmware: &self.firmware,
            system: &self.system,
            network: self.network_info(),
            schemas: &self.schemas,
        };
        let event = self.session.poll(now, &adoption);
        self.api.poll(&adoption);
        event
    }

    // ── Schemas and extensions ────────────────────────────────

    pub fn set_config_schema(&mut self, fragment: &Value) -> Result<(), DocumentError> {
        self.schemas.config.set(fragment).inspect_err(|e| {
            warn!("schema: config schema rejected: {}", e);
        })
    }

    pub fn set_command_schema(&mut self, fragment: &Value) -> Result<(), DocumentError> {
        self.schemas.command.set(fragment).inspect_err(|e| {
            warn!("schema: command schema rejected: {}", e);
        })
    }

    pub fn api_get(&mut self, path: &str, handler: RouteHandler) -> bool {
        self.api.register_get(path, handler)
    }

    pub fn api_post(&mut self, path: &str, handler: RouteHandler) -> bool {
        self.api.register_post(path, handler)
    }

    // ── Publishing ────────────────────────────────────────────

    /// `false` without touching the session when the network is down.
    pub fn publish_status(&mut self, payload: &Value) -> bool {
        self.publish(PublishKind::Status, payload)
    }

    /// `false` without touching the session when the network is down.
    pub fn publish_telemetry(&mut self, payload: &Value) -> bool {
        self.publish(PublishKind::Telemetry, payload)
    }

    fn publish(&mut self, kind: PublishKind, payload: &Value) -> bool {
        if !self.network.is_up() {
            return false;
        }
        self.session.publish(kind, payload)
    }

    // ── Status ────────────────────────────────────────────────

    pub fn connection_state(&self) -> ConnectionState {
        if !self.network.is_up() {
            ConnectionState::None
        } else if self.session.is_connected() {
            ConnectionState::SessionActive
        } else {
            ConnectionState::IpOnly
        }
    }

    pub fn ip_address_txt(&self) -> heapless::String<15> {
        ip_text(self.network.local_ip())
    }

    pub fn mac_address_txt(&self) -> MacDisplayString {
        let mut s = MacDisplayString::new();
        let _ = s.push_str(self.identity.as_ref().map_or(NO_MAC_TXT, HardwareIdentity::display));
        s
    }

    pub fn session_topic_txt(&self) -> TopicText {
        if self.connection_state() != ConnectionState::SessionActive {
            let mut s = TopicText::new();
            let _ = s.push_str(NO_SESSION_TOPIC_TXT);
            return s;
        }
        topics::topic_text(self.session.effective_settings())
    }

    /// Build the adoption document as it would be served right now.
    pub fn adoption_document(&self) -> Result<AdoptionDocument, DocumentError> {
        AdoptionBuilder {
            firmware: &self.firmware,
            system: &self.system,
            network: self.network_info(),
            schemas: &self.schemas,
        }
        .build()
    }

    fn network_info(&self) -> NetworkInfo {
        let mac = self.identity.as_ref().map_or("", HardwareIdentity::display);
        NetworkInfo::new(self.network.mode(), self.network.local_ip(), mac)
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn identity(&self) -> Option<&HardwareIdentity> {
        self.identity.as_ref()
    }

    pub fn firmware(&self) -> &FirmwareInfo {
        &self.firmware
    }

    pub fn network(&self) -> &NetworkBringUp<T> {
        &self.network
    }

    pub fn session(&self) -> &SessionSupervisor<M> {
        &self.session
    }

    pub fn api(&self) -> &RequestInterface<L> {
        &self.api
    }
}
