//! GPIO assignments for the controller board.
//!
//! Single source of truth for the wired interface chip wiring; the
//! Ethernet bring-up path references these rather than hard-coding pins.

// ---------------------------------------------------------------------------
// Wired interface chip (SPI)
// ---------------------------------------------------------------------------

/// SPI chip-select for the Ethernet controller.
pub const ETHERNET_CS_GPIO: i32 = 26;
/// Hardware reset line of the Ethernet controller (active LOW).
pub const ETHERNET_RST_GPIO: i32 = 13;
