//! Wireless station bring-up.
//!
//! Connects with stored credentials, or opens a provisioning access point
//! and blocks until credentials are entered or the portal times out.  This
//! is the only blocking call in the crate and it happens once, inside
//! `begin()`.

use core::net::Ipv4Addr;

use log::info;

use crate::app::ports::{PhysicalTransport, WifiDriver};
use crate::error::BringUpError;
use crate::identity::{HardwareIdentity, MacAddress};

use super::NetworkMode;

/// Access point the provisioning portal is served on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalCredentials {
    pub ssid: &'static str,
    /// WPA2 needs 8-64 bytes.
    pub password: &'static str,
}

impl Default for PortalCredentials {
    fn default() -> Self {
        Self {
            ssid: "NodeLink_Setup",
            password: "nodelink",
        }
    }
}

/// [`PhysicalTransport`] over the WiFi station interface.
pub struct WifiLink<W> {
    driver: W,
    portal: PortalCredentials,
}

impl<W: WifiDriver> WifiLink<W> {
    pub fn new(driver: W) -> Self {
        Self::with_portal(driver, PortalCredentials::default())
    }

    pub fn with_portal(driver: W, portal: PortalCredentials) -> Self {
        Self { driver, portal }
    }

    pub fn driver(&self) -> &W {
        &self.driver
    }
}

impl<W: WifiDriver> PhysicalTransport for WifiLink<W> {
    fn mode(&self) -> NetworkMode {
        NetworkMode::Wifi
    }

    fn base_mac(&self) -> MacAddress {
        self.driver.base_mac()
    }

    fn bring_up(&mut self, _identity: &HardwareIdentity) -> Result<Ipv4Addr, BringUpError> {
        self.driver.set_station_mode();

        info!("wifi: connecting (portal '{}' opens if no credentials are stored)", self.portal.ssid);
        if !self.driver.auto_connect(self.portal.ssid, self.portal.password) {
            return Err(BringUpError::PortalClosed);
        }
        Ok(self.driver.local_ip())
    }

    fn link_up(&self) -> bool {
        self.driver.is_connected()
    }

    fn local_ip(&self) -> Ipv4Addr {
        self.driver.local_ip()
    }
}
