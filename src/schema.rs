//! Schema composition.
//!
//! Firmware declares the config and command payloads it understands as
//! JSON-Schema fragments.  [`compose`] deep-merges a fragment into a target
//! document; [`SchemaDocument::set`] clears first, so the stored document
//! always reflects the latest call only.
//!
//! Merge rule: object into object merges key-wise, recursively.  Anything
//! else (arrays, scalars, object-over-scalar) replaces the target wholesale.

use serde_json::Value;

use crate::config::SCHEMA_MAX_BYTES;
use crate::error::DocumentError;

/// Deep-merge `fragment` into `target`.  A `null` fragment is a no-op.
pub fn compose(target: &mut Value, fragment: &Value) {
    if fragment.is_null() {
        return;
    }
    merge(target, fragment);
}

fn merge(target: &mut Value, fragment: &Value) {
    match (target, fragment) {
        (Value::Object(dst), Value::Object(src)) => {
            for (key, value) in src {
                match dst.get_mut(key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        dst.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (dst, src) => *dst = src.clone(),
    }
}

/// Serialized length of `value` in bytes.
pub(crate) fn encoded_len(value: &Value) -> Result<usize, DocumentError> {
    serde_json::to_vec(value)
        .map(|bytes| bytes.len())
        .map_err(|_| DocumentError::Encode)
}

// ───────────────────────────────────────────────────────────────
// Schema documents
// ───────────────────────────────────────────────────────────────

/// One composed schema, bounded to [`SCHEMA_MAX_BYTES`] when serialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDocument {
    value: Value,
}

impl SchemaDocument {
    pub fn new() -> Self {
        Self { value: Value::Null }
    }

    /// Clear the document, then compose `fragment` into it.
    ///
    /// If the result would exceed the capacity the document is left empty
    /// and the overflow is returned.
    pub fn set(&mut self, fragment: &Value) -> Result<(), DocumentError> {
        self.clear();
        let mut next = Value::Null;
        compose(&mut next, fragment);
        let needed = encoded_len(&next)?;
        if needed > SCHEMA_MAX_BYTES {
            return Err(DocumentError::Overflow {
                needed,
                capacity: SCHEMA_MAX_BYTES,
            });
        }
        self.value = next;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.value = Value::Null;
    }

    pub fn is_empty(&self) -> bool {
        match &self.value {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// The two firmware-declared schemas exposed during adoption.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    pub config: SchemaDocument,
    pub command: SchemaDocument,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}
