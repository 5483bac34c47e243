//! Configuration parameters.
//!
//! Compile-time limits and timeouts, the firmware identity block, and the
//! session settings.  Session settings set from code are only defaults:
//! values loaded from persistent storage ([`PersistedSession`]) always win.

use heapless::String;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

// --- Network ---
/// Overall DHCP negotiation timeout on the wired interface.
pub const DHCP_TIMEOUT_MS: u32 = 15_000;
/// Per-response DHCP timeout on the wired interface.
pub const DHCP_RESPONSE_TIMEOUT_MS: u32 = 4_000;

// --- Request interface ---
pub const REQUEST_PORT: u16 = 80;

// --- Session ---
pub const DEFAULT_BROKER_PORT: u16 = 1883;
/// First reconnect delay after a failed attempt.
pub const RECONNECT_BACKOFF_INITIAL_MS: u64 = 2_000;
/// Upper bound for the reconnect delay.
pub const RECONNECT_BACKOFF_MAX_MS: u64 = 60_000;

// --- Documents ---
/// Serialized size limit for each composed schema document.
pub const SCHEMA_MAX_BYTES: usize = 4_096;
/// Serialized size limit for the adoption document.
pub const ADOPTION_MAX_BYTES: usize = 8_192;
pub const JSON_SCHEMA_VERSION: &str = "http://json-schema.org/draft-07/schema#";

pub type Broker = String<64>;
pub type ClientId = String<32>;
pub type Username = String<32>;
pub type Password = String<64>;
pub type TopicSegment = String<32>;

// ───────────────────────────────────────────────────────────────
// Firmware identity
// ───────────────────────────────────────────────────────────────

/// Static build identity reported in the `firmware` adoption section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FirmwareInfo {
    pub name: &'static str,
    #[serde(rename = "shortName")]
    pub short_name: &'static str,
    pub maker: &'static str,
    pub version: &'static str,
    #[serde(rename = "githubUrl", skip_serializing_if = "Option::is_none")]
    pub source_url: Option<&'static str>,
}

impl FirmwareInfo {
    pub const fn new(
        name: &'static str,
        short_name: &'static str,
        maker: &'static str,
        version: &'static str,
    ) -> Self {
        Self {
            name,
            short_name,
            maker,
            version,
            source_url: None,
        }
    }

    pub const fn with_source_url(mut self, url: &'static str) -> Self {
        self.source_url = Some(url);
        self
    }
}

// ───────────────────────────────────────────────────────────────
// Session settings
// ───────────────────────────────────────────────────────────────

/// Effective connection parameters for the pub/sub session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub broker: Broker,
    pub port: u16,
    pub client_id: ClientId,
    pub username: Option<Username>,
    pub password: Option<Password>,
    pub topic_prefix: TopicSegment,
    pub topic_suffix: TopicSegment,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            broker: String::new(),
            port: DEFAULT_BROKER_PORT,
            client_id: String::new(),
            username: None,
            password: None,
            topic_prefix: String::new(),
            topic_suffix: String::new(),
        }
    }
}

impl SessionSettings {
    pub fn set_broker(&mut self, broker: &str, port: u16) -> Result<(), SettingsError> {
        self.broker = bounded(broker, "broker")?;
        self.port = port;
        Ok(())
    }

    pub fn set_client_id(&mut self, client_id: &str) -> Result<(), SettingsError> {
        if client_id.contains('/') {
            return Err(SettingsError::InvalidTopicSegment("client id"));
        }
        self.client_id = topic_segment(client_id, "client id")?;
        Ok(())
    }

    pub fn set_auth(&mut self, username: &str, password: &str) -> Result<(), SettingsError> {
        let username = bounded(username, "username")?;
        let password = bounded(password, "password")?;
        self.username = (!username.is_empty()).then_some(username);
        self.password = (!password.is_empty()).then_some(password);
        Ok(())
    }

    pub fn set_topic_prefix(&mut self, prefix: &str) -> Result<(), SettingsError> {
        self.topic_prefix = topic_segment(prefix, "topic prefix")?;
        Ok(())
    }

    pub fn set_topic_suffix(&mut self, suffix: &str) -> Result<(), SettingsError> {
        self.topic_suffix = topic_segment(suffix, "topic suffix")?;
        Ok(())
    }

    /// Layer persisted values over these defaults.  Stored topic segments
    /// that fail validation leave the default in place.
    pub fn overlay(&self, persisted: &PersistedSession) -> Self {
        let mut out = self.clone();
        if let Some(broker) = &persisted.broker {
            out.broker = broker.clone();
        }
        if let Some(port) = persisted.port {
            out.port = port;
        }
        if let Some(client_id) = &persisted.client_id {
            if let Err(e) = out.set_client_id(client_id) {
                warn!("settings: stored value ignored: {}", e);
            }
        }
        if persisted.username.is_some() {
            out.username = persisted.username.clone();
        }
        if persisted.password.is_some() {
            out.password = persisted.password.clone();
        }
        if let Some(prefix) = &persisted.topic_prefix {
            if let Err(e) = out.set_topic_prefix(prefix) {
                warn!("settings: stored value ignored: {}", e);
            }
        }
        if let Some(suffix) = &persisted.topic_suffix {
            if let Err(e) = out.set_topic_suffix(suffix) {
                warn!("settings: stored value ignored: {}", e);
            }
        }
        out
    }
}

/// Session settings as loaded from persistent storage.  Every field is
/// optional; present fields take precedence over code-set defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub broker: Option<Broker>,
    pub port: Option<u16>,
    pub client_id: Option<ClientId>,
    pub username: Option<Username>,
    pub password: Option<Password>,
    pub topic_prefix: Option<TopicSegment>,
    pub topic_suffix: Option<TopicSegment>,
}

fn bounded<const N: usize>(value: &str, field: &'static str) -> Result<String<N>, SettingsError> {
    let mut s = String::new();
    s.push_str(value).map_err(|()| SettingsError::TooLong(field))?;
    Ok(s)
}

fn topic_segment<const N: usize>(
    value: &str,
    field: &'static str,
) -> Result<String<N>, SettingsError> {
    if value.chars().any(|c| c == '+' || c == '#' || c.is_control()) {
        return Err(SettingsError::InvalidTopicSegment(field));
    }
    bounded(value, field)
}
