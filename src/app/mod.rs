//! Application core.
//!
//! The [`service::Orchestrator`] and the port traits it is built from.
//! All interaction with drivers, the broker client, the request server and
//! platform services happens through [`ports`], keeping this layer fully
//! testable against the simulated adapters.

pub mod ports;
pub mod service;
