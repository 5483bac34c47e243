//! Error types for the connectivity core.
//!
//! Every failure in this crate is local and non-fatal: callers observe it
//! through one of these small `Copy` enums (or a plain `bool`) and a log line.
//! Nothing here is allowed to halt the device.

use core::fmt;

// ---------------------------------------------------------------------------
// Network bring-up
// ---------------------------------------------------------------------------

/// Why a physical interface failed to acquire an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BringUpError {
    /// The interface chip did not respond on its bus.
    HardwareAbsent,
    /// The chip is present but reports no link (cable unplugged).
    LinkDown,
    /// DHCP negotiation did not complete within the timeout.
    DhcpTimeout,
    /// The provisioning portal closed without credentials being entered.
    PortalClosed,
    /// The chip reset line could not be driven.
    ResetFailed,
}

impl fmt::Display for BringUpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HardwareAbsent => write!(f, "ethernet hardware not found"),
            Self::LinkDown => write!(f, "ethernet cable not connected"),
            Self::DhcpTimeout => write!(f, "failed to obtain an address via DHCP"),
            Self::PortalClosed => write!(f, "failed to connect to wifi access point"),
            Self::ResetFailed => write!(f, "failed to drive interface reset line"),
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound message dispatch
// ---------------------------------------------------------------------------

/// Outcome of an inbound session message that could not be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// The message carried no payload bytes.
    EmptyPayload,
    /// The payload was not valid JSON.
    MalformedJson,
    /// A config message arrived but no config handler is registered.
    NoConfigHandler,
    /// A command message arrived but no command handler is registered.
    NoCommandHandler,
    /// The topic is neither this device's config nor command topic.
    UnknownTopic,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "empty payload received"),
            Self::MalformedJson => write!(f, "failed to deserialise json payload"),
            Self::NoConfigHandler => write!(f, "no config handler"),
            Self::NoCommandHandler => write!(f, "no command handler"),
            Self::UnknownTopic => write!(f, "message on unrecognised topic"),
        }
    }
}

// ---------------------------------------------------------------------------
// Bounded JSON documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentError {
    /// The serialized document does not fit its fixed capacity.
    Overflow { needed: usize, capacity: usize },
    /// The document could not be serialized at all.
    Encode,
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overflow { needed, capacity } => {
                write!(f, "document needs {} bytes, capacity is {}", needed, capacity)
            }
            Self::Encode => write!(f, "document could not be encoded"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsError {
    /// A value does not fit the fixed-capacity field named here.
    TooLong(&'static str),
    /// A topic segment contains a wildcard or separator.
    InvalidTopicSegment(&'static str),
    /// Stored settings failed to decode.
    Corrupted,
    /// The storage backend failed.
    IoError,
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLong(field) => write!(f, "{} is too long", field),
            Self::InvalidTopicSegment(field) => {
                write!(f, "{} must not contain '+', '#' or control characters", field)
            }
            Self::Corrupted => write!(f, "stored settings corrupted"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::error::Error for BringUpError {}
impl core::error::Error for DispatchError {}
impl core::error::Error for DocumentError {}
impl core::error::Error for SettingsError {}
