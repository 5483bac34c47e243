//! Hardware identity derived from the base MAC address.
//!
//! The base (WiFi station) MAC is read once at startup.  When the wired
//! interface is in use its MAC is the base MAC with the final octet offset
//! by [`ETHERNET_MAC_OFFSET`], following the ESP32 MAC allocation scheme.
//! The resulting identity provides:
//! - the session client id default (last 3 bytes, lowercase hex)
//! - the uppercase `AA:BB:CC:DD:EE:FF` display form used in adoption and status text

use core::fmt::Write;

use crate::network::NetworkMode;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Added to the final octet of the base MAC to obtain the Ethernet MAC.
pub const ETHERNET_MAC_OFFSET: u8 = 3;

/// `ddeeff`: 6 lowercase hex chars.
pub type ClientIdString = heapless::String<6>;
/// `AA:BB:CC:DD:EE:FF`: 17 chars.
pub type MacDisplayString = heapless::String<17>;

/// Immutable device identity, resolved exactly once per boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareIdentity {
    mac: MacAddress,
    client_id: ClientIdString,
    display: MacDisplayString,
}

impl HardwareIdentity {
    pub fn from_mac(mac: MacAddress) -> Self {
        Self {
            mac,
            client_id: client_id(&mac),
            display: mac_display(&mac),
        }
    }

    pub fn mac(&self) -> &MacAddress {
        &self.mac
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn display(&self) -> &str {
        &self.display
    }
}

/// Derive the identity of the active interface from the base MAC.
///
/// An all-zero base address is passed through unchanged.
pub fn resolve(base: MacAddress, mode: NetworkMode) -> HardwareIdentity {
    let mut mac = base;
    if mode == NetworkMode::Ethernet {
        mac[5] = mac[5].wrapping_add(ETHERNET_MAC_OFFSET);
    }
    HardwareIdentity::from_mac(mac)
}

/// Last 3 MAC bytes in lowercase hex.
pub fn client_id(mac: &MacAddress) -> ClientIdString {
    let mut id = ClientIdString::new();
    let _ = write!(id, "{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    id
}

/// Uppercase colon-separated MAC.
pub fn mac_display(mac: &MacAddress) -> MacDisplayString {
    let mut s = MacDisplayString::new();
    let _ = write!(
        s,
        "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    );
    s
}
