//! Why a session is not (or no longer) connected.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Keep-alive expired without a response from the broker.
    Timeout,
    /// The network connection dropped.
    ConnectionLost,
    /// The network connection could not be opened.
    ConnectFailed,
    /// Clean disconnect.
    Disconnected,
    /// Broker rejected the protocol version.
    BadProtocol,
    BadClientId,
    /// Broker refused the connection (server unavailable).
    Unavailable,
    BadCredentials,
    Unauthorized,
}

impl DisconnectReason {
    /// Map the conventional pub/sub client status codes (-4..=5, where 0
    /// means connected) onto a reason.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -4 => Some(Self::Timeout),
            -3 => Some(Self::ConnectionLost),
            -2 => Some(Self::ConnectFailed),
            -1 => Some(Self::Disconnected),
            1 => Some(Self::BadProtocol),
            2 => Some(Self::BadClientId),
            3 => Some(Self::Unavailable),
            4 => Some(Self::BadCredentials),
            5 => Some(Self::Unauthorized),
            _ => None,
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "connection timeout"),
            Self::ConnectionLost => write!(f, "connection lost"),
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::BadProtocol => write!(f, "bad protocol"),
            Self::BadClientId => write!(f, "bad client id"),
            Self::Unavailable => write!(f, "broker unavailable"),
            Self::BadCredentials => write!(f, "bad credentials"),
            Self::Unauthorized => write!(f, "unauthorised"),
        }
    }
}
