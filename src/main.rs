//! NodeLink main entry point
//!
//! Boots an Ethernet-mode controller and runs the cooperative tick loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  EthernetLink       SimBroker        SimListener   SystemClock │
//! │  (PhysicalTransport)(SessionTransport)(RequestListener)(Clock) │
//! │  EspSystemInfo      SettingsStore    SessionLogSink            │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │                    Orchestrator                        │    │
//! │  │  NetworkBringUp · SessionSupervisor · RequestInterface │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The broker client and request server are the in-process simulators;
//! a sample config message is injected once the session is up so the
//! whole inbound path can be watched on the console.
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::{Result, anyhow};
use log::{LevelFilter, info, warn};
use serde_json::{Value, json};

use nodelink::adapters::gpio::GpioOutput;
use nodelink::adapters::log_sink;
use nodelink::adapters::sim::{SimBroker, SimEthernetDriver, SimListener};
use nodelink::adapters::system_info::EspSystemInfo;
use nodelink::adapters::time::{StdDelay, SystemClock};
use nodelink::api::Response;
use nodelink::app::service::{ConnectionState, Orchestrator};
use nodelink::config::{DEFAULT_BROKER_PORT, FirmwareInfo};
use nodelink::network::ethernet::EthernetLink;
use nodelink::pins;
use nodelink::session::SessionEvent;
use nodelink::session::topics::{self, TopicKind};

const FIRMWARE: FirmwareInfo = FirmwareInfo::new(
    "NodeLink Relay Controller",
    "nodelink-relay",
    "NodeLink",
    env!("CARGO_PKG_VERSION"),
);

/// Main loop period.
const TICK_MS: u64 = 50;
/// Telemetry period while a session is active.
const TELEMETRY_INTERVAL_TICKS: u32 = 200;

fn main() -> Result<()> {
    // ── 1. Bootstrap ──────────────────────────────────────────
    #[cfg(target_os = "espidf")]
    esp_idf_svc::sys::link_patches();
    log_sink::init(LevelFilter::Info).map_err(|e| anyhow!("logger: {}", e))?;

    info!("╔══════════════════════════════════════╗");
    info!("║  NodeLink v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Persisted settings ─────────────────────────────────
    #[cfg(target_os = "espidf")]
    let settings = nodelink::adapters::settings_store::NvsSettingsStore::new()?;
    #[cfg(not(target_os = "espidf"))]
    let settings = nodelink::adapters::settings_store::MemorySettingsStore::new();

    // ── 3. Collaborators ──────────────────────────────────────
    let ethernet = SimEthernetDriver::new();
    let reset = GpioOutput::new(pins::ETHERNET_RST_GPIO)?;
    let link = EthernetLink::new(ethernet, reset, StdDelay);
    let broker = SimBroker::new();
    let listener = SimListener::new();

    let mut node = Orchestrator::new(
        FIRMWARE,
        link,
        broker.clone(),
        listener,
        EspSystemInfo::new(),
        SystemClock::new(),
    );

    // ── 4. Firmware configuration ─────────────────────────────
    node.set_session_broker("broker.local", DEFAULT_BROKER_PORT)?;
    node.set_session_topic_prefix("nodelink")?;

    node.set_config_schema(&json!({
        "pulseMs": {"type": "integer", "minimum": 0, "maximum": 10000}
    }))?;
    node.set_command_schema(&json!({
        "relay": {"type": "boolean"},
        "restart": {"type": "boolean"}
    }))?;

    if !node.api_get(
        "/relay",
        Box::new(|_| Response::json_value(200, &json!({"relay": false}))),
    ) {
        warn!("main: /relay extension not registered");
    }

    // ── 5. Begin ──────────────────────────────────────────────
    let up = node.begin(
        Some(Box::new(|config: &Value| info!("main: config {}", config))),
        Some(Box::new(|command: &Value| info!("main: command {}", command))),
        &settings,
    );
    if !up {
        warn!("main: network down, running offline");
    }
    info!(
        "main: ip {} mac {}",
        node.ip_address_txt(),
        node.mac_address_txt()
    );

    // ── 6. Tick loop ──────────────────────────────────────────
    let mut ticks: u32 = 0;
    loop {
        if let Some(SessionEvent::Connected) = node.tick() {
            info!("main: session topics {}", node.session_topic_txt());
            let conf = topics::topic(node.session().effective_settings(), TopicKind::Config);
            broker.inject(&conf, br#"{"pulseMs":250}"#);
        }

        ticks = ticks.wrapping_add(1);
        if ticks % TELEMETRY_INTERVAL_TICKS == 0
            && node.connection_state() == ConnectionState::SessionActive
        {
            node.publish_telemetry(&json!({"uptimeTicks": ticks}));
        }

        std::thread::sleep(Duration::from_millis(TICK_MS));
    }
}
