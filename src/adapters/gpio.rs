//! Push-pull GPIO output for the Ethernet controller's reset line.
//!
//! Configured once with raw ESP-IDF sys calls, then driven through the
//! embedded-hal [`OutputPin`] trait by the bring-up sequence.  On the host
//! the level is only remembered.

use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
use log::debug;

use crate::error::BringUpError;

#[derive(Debug)]
pub struct GpioOutput {
    gpio: i32,
    high: bool,
}

impl GpioOutput {
    /// Configure `gpio` as an output, initially low.
    #[cfg(target_os = "espidf")]
    pub fn new(gpio: i32) -> Result<Self, BringUpError> {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << gpio,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        // SAFETY: `cfg` outlives the call; gpio_config copies it.
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(BringUpError::ResetFailed);
        }
        debug!("gpio: {} configured as output", gpio);
        let mut pin = Self { gpio, high: true };
        pin.write(false).map_err(|_| BringUpError::ResetFailed)?;
        Ok(pin)
    }

    /// Simulation: no hardware, the level is tracked only.
    #[cfg(not(target_os = "espidf"))]
    pub fn new(gpio: i32) -> Result<Self, BringUpError> {
        debug!("gpio: {} (simulated output)", gpio);
        Ok(Self { gpio, high: false })
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    pub fn is_high(&self) -> bool {
        self.high
    }

    #[cfg(target_os = "espidf")]
    fn write(&mut self, high: bool) -> Result<(), ErrorKind> {
        // SAFETY: the pin was configured as an output in `new`.
        let ret = unsafe { gpio_set_level(self.gpio, u32::from(high)) };
        if ret != ESP_OK as i32 {
            return Err(ErrorKind::Other);
        }
        self.high = high;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn write(&mut self, high: bool) -> Result<(), ErrorKind> {
        self.high = high;
        Ok(())
    }
}

impl ErrorType for GpioOutput {
    type Error = ErrorKind;
}

impl OutputPin for GpioOutput {
    fn set_low(&mut self) -> Result<(), ErrorKind> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), ErrorKind> {
        self.write(true)
    }
}
