//! Port traits: the boundary between the connectivity core and the
//! collaborators it orchestrates.
//!
//! ```text
//!   Driver / client adapter ──▶ Port trait ──▶ Orchestrator (core)
//! ```
//!
//! The physical transport drivers, the pub/sub client, the request
//! server, system introspection and persisted settings storage all sit
//! behind these traits.  The core never talks to hardware directly, so the
//! whole orchestrator runs on the host against the simulated adapters in
//! [`crate::adapters::sim`].

use core::net::Ipv4Addr;

use crate::adoption::SystemSnapshot;
use crate::api::{Request, Response};
use crate::config::PersistedSession;
use crate::error::{BringUpError, SettingsError};
use crate::identity::{HardwareIdentity, MacAddress};
use crate::network::NetworkMode;
use crate::session::reason::DisconnectReason;

// ───────────────────────────────────────────────────────────────
// Physical transport
// ───────────────────────────────────────────────────────────────

/// One physical interface variant (wired or wireless).
pub trait PhysicalTransport {
    fn mode(&self) -> NetworkMode;

    /// Base MAC reported by the driver, before any per-interface offset.
    fn base_mac(&self) -> MacAddress;

    /// Single bounded attempt to acquire an address.  Never retries.
    fn bring_up(&mut self, identity: &HardwareIdentity) -> Result<Ipv4Addr, BringUpError>;

    /// Cheap, non-blocking link predicate.
    fn link_up(&self) -> bool;

    fn local_ip(&self) -> Ipv4Addr;

    /// Housekeeping while the link is up (e.g. DHCP lease renewal).
    fn maintain(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareStatus {
    Present,
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Unknown,
    On,
    Off,
}

/// SPI Ethernet controller driver.
pub trait EthernetDriver {
    fn base_mac(&self) -> MacAddress;
    fn init(&mut self, cs_gpio: i32);
    /// Blocking DHCP bounded by the two timeouts.  `true` on lease.
    fn begin_dhcp(&mut self, mac: &MacAddress, timeout_ms: u32, response_timeout_ms: u32) -> bool;
    fn hardware_status(&self) -> HardwareStatus;
    fn link_status(&self) -> LinkStatus;
    fn local_ip(&self) -> Ipv4Addr;
    fn maintain(&mut self);
}

/// WiFi station driver with captive-portal provisioning.
pub trait WifiDriver {
    fn base_mac(&self) -> MacAddress;
    fn set_station_mode(&mut self);
    /// Connect with stored credentials or run the provisioning portal.
    /// Blocks until connected or the portal closes.
    fn auto_connect(&mut self, portal_ssid: &str, portal_password: &str) -> bool;
    fn is_connected(&self) -> bool;
    fn local_ip(&self) -> Ipv4Addr;
}

// ───────────────────────────────────────────────────────────────
// Pub/sub transport
// ───────────────────────────────────────────────────────────────

/// Upper bound on a single inbound payload.
pub const INBOUND_PAYLOAD_MAX: usize = 1024;

pub type TopicString = heapless::String<128>;

/// Everything a transport needs to open a session.
#[derive(Debug, Clone, Copy)]
pub struct ConnectRequest<'a> {
    pub broker: &'a str,
    pub port: u16,
    pub client_id: &'a str,
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
    pub will_topic: &'a str,
    pub will_payload: &'a [u8],
    pub will_retained: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Connected,
    Down(DisconnectReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: TopicString,
    pub payload: heapless::Vec<u8, INBOUND_PAYLOAD_MAX>,
}

/// The publish/subscribe client.  Wire protocol lives behind this trait.
pub trait SessionTransport {
    fn connect(&mut self, request: &ConnectRequest<'_>) -> Result<(), DisconnectReason>;
    fn state(&self) -> TransportState;
    fn subscribe(&mut self, topic: &str) -> bool;
    fn publish(&mut self, topic: &str, payload: &[u8], retained: bool) -> bool;
    /// Next received message, if any.  Non-blocking.
    fn poll(&mut self) -> Option<InboundMessage>;
}

// ───────────────────────────────────────────────────────────────
// Request server
// ───────────────────────────────────────────────────────────────

/// One accepted client connection carrying a parsed request.
pub trait HttpConnection {
    fn read_request(&mut self) -> Option<Request>;
    fn respond(&mut self, response: &Response);
}

pub trait RequestListener {
    type Connection: HttpConnection;
    fn begin(&mut self, port: u16);
    /// Next pending connection, if any.  Non-blocking.
    fn accept(&mut self) -> Option<Self::Connection>;
}

// ───────────────────────────────────────────────────────────────
// Platform services
// ───────────────────────────────────────────────────────────────

/// Live resource figures for the `system` adoption section.
pub trait SystemInfoPort {
    fn snapshot(&self) -> SystemSnapshot;
}

/// Load side of the persisted settings store.
pub trait SettingsPort {
    /// `Ok(None)` on first boot.
    fn load(&self) -> Result<Option<PersistedSession>, SettingsError>;
}

/// Monotonic milliseconds since boot.
pub trait Clock {
    fn now_ms(&self) -> u64;
}
