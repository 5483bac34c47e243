//! Wired interface bring-up (SPI Ethernet controller).
//!
//! Sequence: driver init with the chip-select pin, hardware reset pulse,
//! then DHCP.  The reset timings are fixed; shortening them leaves the
//! controller stalled after power-up.

use core::net::Ipv4Addr;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{debug, info};

use crate::app::ports::{EthernetDriver, HardwareStatus, LinkStatus, PhysicalTransport};
use crate::config::{DHCP_RESPONSE_TIMEOUT_MS, DHCP_TIMEOUT_MS};
use crate::error::BringUpError;
use crate::identity::{HardwareIdentity, MacAddress};
use crate::pins;

use super::NetworkMode;

/// Reset line held high before the pulse.
pub const RESET_ASSERT_MS: u32 = 250;
/// Reset line held low (chip in reset).
pub const RESET_LOW_MS: u32 = 50;
/// Settle time after releasing reset.
pub const RESET_SETTLE_MS: u32 = 350;

/// Drive the controller's reset line: high 250 ms, low 50 ms, high + 350 ms settle.
pub fn reset_pulse<P, D>(pin: &mut P, delay: &mut D) -> Result<(), P::Error>
where
    P: OutputPin,
    D: DelayNs,
{
    pin.set_high()?;
    delay.delay_ms(RESET_ASSERT_MS);
    pin.set_low()?;
    delay.delay_ms(RESET_LOW_MS);
    pin.set_high()?;
    delay.delay_ms(RESET_SETTLE_MS);
    Ok(())
}

/// [`PhysicalTransport`] over an SPI Ethernet controller.
pub struct EthernetLink<E, P, D> {
    driver: E,
    reset: P,
    delay: D,
    cs_gpio: i32,
}

impl<E, P, D> EthernetLink<E, P, D>
where
    E: EthernetDriver,
    P: OutputPin,
    D: DelayNs,
{
    pub fn new(driver: E, reset: P, delay: D) -> Self {
        Self {
            driver,
            reset,
            delay,
            cs_gpio: pins::ETHERNET_CS_GPIO,
        }
    }

    pub fn with_cs_gpio(mut self, gpio: i32) -> Self {
        self.cs_gpio = gpio;
        self
    }

    pub fn driver(&self) -> &E {
        &self.driver
    }

    /// Classify a failed DHCP attempt: hardware, then link, then timeout.
    fn failure_cause(&self) -> BringUpError {
        if self.driver.hardware_status() == HardwareStatus::Absent {
            BringUpError::HardwareAbsent
        } else if self.driver.link_status() == LinkStatus::Off {
            BringUpError::LinkDown
        } else {
            BringUpError::DhcpTimeout
        }
    }
}

impl<E, P, D> PhysicalTransport for EthernetLink<E, P, D>
where
    E: EthernetDriver,
    P: OutputPin,
    D: DelayNs,
{
    fn mode(&self) -> NetworkMode {
        NetworkMode::Ethernet
    }

    fn base_mac(&self) -> MacAddress {
        self.driver.base_mac()
    }

    fn bring_up(&mut self, identity: &HardwareIdentity) -> Result<Ipv4Addr, BringUpError> {
        self.driver.init(self.cs_gpio);

        debug!("ethernet: resetting controller");
        reset_pulse(&mut self.reset, &mut self.delay).map_err(|_| BringUpError::ResetFailed)?;

        info!("ethernet: requesting address via DHCP");
        if !self
            .driver
            .begin_dhcp(identity.mac(), DHCP_TIMEOUT_MS, DHCP_RESPONSE_TIMEOUT_MS)
        {
            return Err(self.failure_cause());
        }
        Ok(self.driver.local_ip())
    }

    fn link_up(&self) -> bool {
        self.driver.link_status() == LinkStatus::On
    }

    fn local_ip(&self) -> Ipv4Addr {
        self.driver.local_ip()
    }

    fn maintain(&mut self) {
        self.driver.maintain();
    }
}
