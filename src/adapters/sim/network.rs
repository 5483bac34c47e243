//! Simulated physical interfaces.

use core::convert::Infallible;
use core::net::Ipv4Addr;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use log::debug;

use crate::adapters::device_id;
use crate::app::ports::{EthernetDriver, HardwareStatus, LinkStatus, WifiDriver};
use crate::identity::MacAddress;

const SIM_LEASE: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 50);

// ───────────────────────────────────────────────────────────────
// Ethernet
// ───────────────────────────────────────────────────────────────

#[derive(Debug)]
struct EthernetSim {
    base_mac: MacAddress,
    hardware_present: bool,
    cable: bool,
    dhcp_server: Option<Ipv4Addr>,
    leased: Option<Ipv4Addr>,
    cs_gpio: Option<i32>,
    dhcp_mac: Option<MacAddress>,
    dhcp_requests: u32,
    maintain_calls: u32,
}

/// SPI Ethernet controller with a cable and a DHCP server behind it.
#[derive(Debug, Clone)]
pub struct SimEthernetDriver {
    inner: Rc<RefCell<EthernetSim>>,
}

impl Default for SimEthernetDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimEthernetDriver {
    /// Controller present, cable plugged, DHCP server answering.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(EthernetSim {
                base_mac: device_id::read_base_mac(),
                hardware_present: true,
                cable: true,
                dhcp_server: Some(SIM_LEASE),
                leased: None,
                cs_gpio: None,
                dhcp_mac: None,
                dhcp_requests: 0,
                maintain_calls: 0,
            })),
        }
    }

    pub fn set_hardware_present(&self, present: bool) {
        self.inner.borrow_mut().hardware_present = present;
    }

    /// Plug or unplug the cable.  Unplugging drops the lease.
    pub fn set_cable(&self, plugged: bool) {
        let mut sim = self.inner.borrow_mut();
        sim.cable = plugged;
        if !plugged {
            sim.leased = None;
        }
    }

    /// Address the DHCP server hands out, or `None` for no answer.
    pub fn set_dhcp_server(&self, lease: Option<Ipv4Addr>) {
        self.inner.borrow_mut().dhcp_server = lease;
    }

    pub fn cs_gpio(&self) -> Option<i32> {
        self.inner.borrow().cs_gpio
    }

    /// MAC presented in the last DHCP request.
    pub fn dhcp_mac(&self) -> Option<MacAddress> {
        self.inner.borrow().dhcp_mac
    }

    pub fn dhcp_requests(&self) -> u32 {
        self.inner.borrow().dhcp_requests
    }

    pub fn maintain_calls(&self) -> u32 {
        self.inner.borrow().maintain_calls
    }
}

impl EthernetDriver for SimEthernetDriver {
    fn base_mac(&self) -> MacAddress {
        self.inner.borrow().base_mac
    }

    fn init(&mut self, cs_gpio: i32) {
        self.inner.borrow_mut().cs_gpio = Some(cs_gpio);
    }

    fn begin_dhcp(&mut self, mac: &MacAddress, timeout_ms: u32, _response_timeout_ms: u32) -> bool {
        let mut sim = self.inner.borrow_mut();
        sim.dhcp_requests += 1;
        sim.dhcp_mac = Some(*mac);
        sim.leased = if sim.hardware_present && sim.cable {
            sim.dhcp_server
        } else {
            None
        };
        debug!("sim: dhcp (timeout {} ms) -> {:?}", timeout_ms, sim.leased);
        sim.leased.is_some()
    }

    fn hardware_status(&self) -> HardwareStatus {
        if self.inner.borrow().hardware_present {
            HardwareStatus::Present
        } else {
            HardwareStatus::Absent
        }
    }

    fn link_status(&self) -> LinkStatus {
        let sim = self.inner.borrow();
        match (sim.hardware_present, sim.cable) {
            (false, _) => LinkStatus::Unknown,
            (true, true) => LinkStatus::On,
            (true, false) => LinkStatus::Off,
        }
    }

    fn local_ip(&self) -> Ipv4Addr {
        self.inner.borrow().leased.unwrap_or(Ipv4Addr::UNSPECIFIED)
    }

    /// Renews the lease, re-acquiring it after the cable was replugged.
    fn maintain(&mut self) {
        let mut sim = self.inner.borrow_mut();
        sim.maintain_calls += 1;
        if sim.leased.is_none() && sim.hardware_present && sim.cable {
            sim.leased = sim.dhcp_server;
        }
    }
}

// ───────────────────────────────────────────────────────────────
// WiFi
// ───────────────────────────────────────────────────────────────

#[derive(Debug)]
struct WifiSim {
    base_mac: MacAddress,
    station_mode: bool,
    stored_credentials: bool,
    connected: bool,
    portal_opened: Option<String>,
}

/// WiFi station with optional stored credentials.  Without them the
/// provisioning portal "opens" and closes again unanswered.
#[derive(Debug, Clone)]
pub struct SimWifiDriver {
    inner: Rc<RefCell<WifiSim>>,
}

impl SimWifiDriver {
    pub fn new(stored_credentials: bool) -> Self {
        Self {
            inner: Rc::new(RefCell::new(WifiSim {
                base_mac: device_id::read_base_mac(),
                station_mode: false,
                stored_credentials,
                connected: false,
                portal_opened: None,
            })),
        }
    }

    /// Simulate the access point going away or coming back.
    pub fn set_connected(&self, connected: bool) {
        self.inner.borrow_mut().connected = connected;
    }

    pub fn station_mode(&self) -> bool {
        self.inner.borrow().station_mode
    }

    /// SSID of the portal if one was opened.
    pub fn portal_opened(&self) -> Option<String> {
        self.inner.borrow().portal_opened.clone()
    }
}

impl WifiDriver for SimWifiDriver {
    fn base_mac(&self) -> MacAddress {
        self.inner.borrow().base_mac
    }

    fn set_station_mode(&mut self) {
        self.inner.borrow_mut().station_mode = true;
    }

    fn auto_connect(&mut self, portal_ssid: &str, _portal_password: &str) -> bool {
        let mut sim = self.inner.borrow_mut();
        if !sim.stored_credentials {
            sim.portal_opened = Some(portal_ssid.into());
        }
        sim.connected = sim.stored_credentials;
        sim.connected
    }

    fn is_connected(&self) -> bool {
        self.inner.borrow().connected
    }

    fn local_ip(&self) -> Ipv4Addr {
        if self.inner.borrow().connected {
            Ipv4Addr::new(192, 168, 4, 20)
        } else {
            Ipv4Addr::UNSPECIFIED
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Reset line and delay
// ───────────────────────────────────────────────────────────────

/// Output pin that records every level it is driven to.
#[derive(Debug, Clone, Default)]
pub struct SimResetPin {
    levels: Rc<RefCell<Vec<bool>>>,
}

impl SimResetPin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Levels driven so far, `true` = high.
    pub fn levels(&self) -> Vec<bool> {
        self.levels.borrow().clone()
    }
}

impl ErrorType for SimResetPin {
    type Error = Infallible;
}

impl OutputPin for SimResetPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.levels.borrow_mut().push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.levels.borrow_mut().push(true);
        Ok(())
    }
}

/// Delay that returns immediately and adds up the time it would have taken.
#[derive(Debug, Clone, Default)]
pub struct SimDelay {
    elapsed_ns: Rc<Cell<u64>>,
}

impl SimDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ns.get() / 1_000_000
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns.set(self.elapsed_ns.get() + u64::from(ns));
    }
}
