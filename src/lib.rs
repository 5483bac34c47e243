//! NodeLink connectivity library.
//!
//! Brings a networked controller online (wired or wireless), keeps its
//! pub/sub session to the broker alive, serves the adoption document and
//! firmware-defined request extensions, and routes inbound config and
//! command payloads to firmware callbacks.
//!
//! All ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module; on the host the [`adapters::sim`] collaborators
//! stand in for the hardware.

#![deny(unused_must_use)]

pub mod adapters;
pub mod adoption;
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod identity;
pub mod network;
pub mod pins;
pub mod schema;
pub mod session;
