//! Network bring-up.
//!
//! [`NetworkBringUp`] drives one [`PhysicalTransport`] through
//!
//! ```text
//!   Down ──begin()──▶ Acquiring ──ok──▶ Up
//!    ▲                    │               │
//!    └────── failure ─────┘◀── link lost ─┘   (observed by poll())
//! ```
//!
//! `begin()` makes exactly one bounded acquisition attempt and never
//! retries.  [`NetworkBringUp::is_up`] is the cheap predicate that gates the
//! session supervisor and request interface on every tick.
//!
//! The wired and wireless variants live in [`ethernet`] and [`wifi`].

pub mod ethernet;
pub mod wifi;

use core::fmt;
use core::net::Ipv4Addr;

use log::{error, info, warn};
use serde::Serialize;

use crate::app::ports::PhysicalTransport;
use crate::identity::HardwareIdentity;

/// Which physical interface carries traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    Ethernet,
    Wifi,
}

impl NetworkMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ethernet => "ethernet",
            Self::Wifi => "wifi",
        }
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Down,
    Acquiring,
    Up,
}

/// Owns the physical transport and tracks its link state.
pub struct NetworkBringUp<T: PhysicalTransport> {
    transport: T,
    state: LinkState,
    attempted: bool,
}

impl<T: PhysicalTransport> NetworkBringUp<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: LinkState::Down,
            attempted: false,
        }
    }

    pub fn mode(&self) -> NetworkMode {
        self.transport.mode()
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Attempt address acquisition once.  Returns `true` when the
    /// interface came up; on failure the cause is logged and the state
    /// stays `Down`.
    pub fn begin(&mut self, identity: &HardwareIdentity) -> bool {
        info!("network: {} mac address: {}", self.mode(), identity.display());
        self.state = LinkState::Acquiring;
        self.attempted = true;

        match self.transport.bring_up(identity) {
            Ok(ip) => {
                self.state = LinkState::Up;
                info!("network: ip address: {}", ip);
                true
            }
            Err(e) => {
                self.state = LinkState::Down;
                error!("network: {}", e);
                false
            }
        }
    }

    /// Cheap, non-blocking liveness predicate: bring-up succeeded (or the
    /// link recovered with an address) and the link is still there.
    pub fn is_up(&self) -> bool {
        self.state == LinkState::Up && self.transport.link_up()
    }

    /// Per-tick liveness check.  Keeps the address lease alive while up,
    /// demotes on link loss, and promotes a down interface back to up only
    /// once `begin()` has run and the transport holds an address again.
    /// Returns [`Self::is_up`].
    pub fn poll(&mut self) -> bool {
        let link = self.transport.link_up();
        match self.state {
            LinkState::Up if !link => {
                warn!("network: link lost");
                self.state = LinkState::Down;
            }
            LinkState::Up => self.transport.maintain(),
            LinkState::Down if link && self.attempted => {
                self.transport.maintain();
                let ip = self.transport.local_ip();
                if ip != Ipv4Addr::UNSPECIFIED {
                    info!("network: link up, ip address: {}", ip);
                    self.state = LinkState::Up;
                }
            }
            _ => {}
        }
        self.is_up()
    }

    /// Current local address, or `0.0.0.0` while the link is down.
    pub fn local_ip(&self) -> Ipv4Addr {
        if self.is_up() {
            self.transport.local_ip()
        } else {
            Ipv4Addr::UNSPECIFIED
        }
    }
}

/// Fixed-width status text: `192.168.001.010`, or `---.---.---.---`
/// when the address is unknown (first octet zero).
pub fn ip_text(ip: Ipv4Addr) -> heapless::String<15> {
    use core::fmt::Write;

    let mut s = heapless::String::new();
    let [a, b, c, d] = ip.octets();
    if a == 0 {
        let _ = s.push_str("---.---.---.---");
    } else {
        let _ = write!(s, "{:03}.{:03}.{:03}.{:03}", a, b, c, d);
    }
    s
}
