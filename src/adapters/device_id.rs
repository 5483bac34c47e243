//! Base MAC address of the chip.
//!
//! On ESP-IDF this is the factory MAC burned into eFuse (the WiFi station
//! address).  The per-interface offset is applied later by
//! [`crate::identity::resolve`].

use crate::identity::MacAddress;

/// Deterministic base MAC used by the simulated drivers.
pub const SIM_BASE_MAC: MacAddress = [0x24, 0x0A, 0xC4, 0x5E, 0x71, 0xFE];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_base_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: `mac` is a valid 6-byte buffer for the duration of the call.
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns [`SIM_BASE_MAC`].
#[cfg(not(target_os = "espidf"))]
pub fn read_base_mac() -> MacAddress {
    SIM_BASE_MAC
}
