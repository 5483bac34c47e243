//! Adoption document.
//!
//! The self-description a controller hands to whoever adopts it, served
//! on `GET /adopt` and published retained on the `adopt` topic:
//!
//! ```text
//! {
//!   "firmware":      { name, shortName, maker, version, githubUrl? },
//!   "system":        { heap/flash/sketch/filesystem/psram figures },
//!   "network":       { mode, ip, mac },
//!   "configSchema":  { $schema, title, type: "object", properties },
//!   "commandSchema": { $schema, title, type: "object", properties }
//! }
//! ```
//!
//! Built fresh on every request; nothing here is cached.

use core::fmt::Write;
use core::net::Ipv4Addr;

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::app::ports::SystemInfoPort;
use crate::config::{ADOPTION_MAX_BYTES, FirmwareInfo, JSON_SCHEMA_VERSION};
use crate::error::DocumentError;
use crate::identity::MacDisplayString;
use crate::network::NetworkMode;
use crate::schema::{SchemaDocument, SchemaRegistry, compose, encoded_len};

/// Live resource figures, queried on every build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSnapshot {
    pub heap_used_bytes: u32,
    pub heap_free_bytes: u32,
    pub heap_max_alloc_bytes: u32,
    pub flash_chip_size_bytes: u32,
    pub sketch_space_used_bytes: u32,
    pub sketch_space_total_bytes: u32,
    pub file_system_used_bytes: u32,
    pub file_system_total_bytes: u32,
    pub available_ps_ram_bytes: u32,
    pub free_ps_ram_bytes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkInfo {
    pub mode: NetworkMode,
    /// Dotted quad, unpadded.
    pub ip: heapless::String<15>,
    pub mac: MacDisplayString,
}

impl NetworkInfo {
    pub fn new(mode: NetworkMode, ip: Ipv4Addr, mac: &str) -> Self {
        let mut ip_str = heapless::String::new();
        let _ = write!(ip_str, "{}", ip);
        let mut mac_str = MacDisplayString::new();
        let _ = mac_str.push_str(mac);
        Self {
            mode,
            ip: ip_str,
            mac: mac_str,
        }
    }
}

/// Read-only view of everything the document is built from.
pub struct AdoptionBuilder<'a> {
    pub firmware: &'a FirmwareInfo,
    pub system: &'a dyn SystemInfoPort,
    pub network: NetworkInfo,
    pub schemas: &'a SchemaRegistry,
}

impl AdoptionBuilder<'_> {
    pub fn build(&self) -> Result<AdoptionDocument, DocumentError> {
        let mut doc = Map::new();
        doc.insert("firmware".into(), to_value(self.firmware)?);
        doc.insert("system".into(), to_value(&self.system.snapshot())?);
        doc.insert("network".into(), to_value(&self.network)?);
        doc.insert("configSchema".into(), self.schema_envelope(&self.schemas.config));
        doc.insert("commandSchema".into(), self.schema_envelope(&self.schemas.command));

        let value = Value::Object(doc);
        let needed = encoded_len(&value)?;
        if needed > ADOPTION_MAX_BYTES {
            return Err(DocumentError::Overflow {
                needed,
                capacity: ADOPTION_MAX_BYTES,
            });
        }
        Ok(AdoptionDocument { value })
    }

    /// Wrap a composed schema in a draft-07 object schema.  Anything other
    /// than a JSON object yields empty `properties`.
    fn schema_envelope(&self, schema: &SchemaDocument) -> Value {
        let mut properties = Value::Object(Map::new());
        if schema.value().is_object() {
            compose(&mut properties, schema.value());
        }
        json!({
            "$schema": JSON_SCHEMA_VERSION,
            "title": self.firmware.short_name,
            "type": "object",
            "properties": properties,
        })
    }
}

fn to_value<T: Serialize + ?Sized>(section: &T) -> Result<Value, DocumentError> {
    serde_json::to_value(section).map_err(|_| DocumentError::Encode)
}

/// A built adoption document.  Owned by whoever asked for it.
#[derive(Debug, Clone, PartialEq)]
pub struct AdoptionDocument {
    value: Value,
}

impl AdoptionDocument {
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Serialized document, at most [`ADOPTION_MAX_BYTES`] long.
    pub fn encode(&self) -> Result<Vec<u8>, DocumentError> {
        let bytes = serde_json::to_vec(&self.value).map_err(|_| DocumentError::Encode)?;
        if bytes.len() > ADOPTION_MAX_BYTES {
            return Err(DocumentError::Overflow {
                needed: bytes.len(),
                capacity: ADOPTION_MAX_BYTES,
            });
        }
        Ok(bytes)
    }

    /// Encode into a caller-supplied buffer.  Never truncates.
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<usize, DocumentError> {
        let bytes = serde_json::to_vec(&self.value).map_err(|_| DocumentError::Encode)?;
        let Some(dst) = buf.get_mut(..bytes.len()) else {
            return Err(DocumentError::Overflow {
                needed: bytes.len(),
                capacity: buf.len(),
            });
        };
        dst.copy_from_slice(&bytes);
        Ok(bytes.len())
    }
}
