//! Test rig: an Ethernet-mode orchestrator over the simulators, with a
//! handle to each simulator kept for driving and inspection.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use nodelink::adapters::settings_store::MemorySettingsStore;
use nodelink::adapters::sim::{
    ManualClock, SimBroker, SimDelay, SimEthernetDriver, SimListener, SimResetPin,
};
use nodelink::adapters::system_info::EspSystemInfo;
use nodelink::app::service::Orchestrator;
use nodelink::config::FirmwareInfo;
use nodelink::network::ethernet::EthernetLink;
use nodelink::session::SessionEvent;

pub const FIRMWARE: FirmwareInfo =
    FirmwareInfo::new("Rig Firmware", "rig", "Test Maker", "9.9.9").with_source_url("https://example.com/rig");

/// Client id of the simulated board on the wired interface.
pub const CLIENT_ID: &str = "5e7101";

pub type EthernetNode = Orchestrator<
    EthernetLink<SimEthernetDriver, SimResetPin, SimDelay>,
    SimBroker,
    SimListener,
    EspSystemInfo,
    ManualClock,
>;

pub type Received = Rc<RefCell<Vec<Value>>>;

pub struct Rig {
    pub node: EthernetNode,
    pub ethernet: SimEthernetDriver,
    pub reset: SimResetPin,
    pub delay: SimDelay,
    pub broker: SimBroker,
    pub listener: SimListener,
    pub clock: ManualClock,
    pub configs: Received,
    pub commands: Received,
}

impl Rig {
    /// Board with a broker address set from code.  Not started.
    pub fn new() -> Self {
        let ethernet = SimEthernetDriver::new();
        let reset = SimResetPin::new();
        let delay = SimDelay::new();
        let broker = SimBroker::new();
        let listener = SimListener::new();
        let clock = ManualClock::new();

        let mut node = Orchestrator::new(
            FIRMWARE,
            EthernetLink::new(ethernet.clone(), reset.clone(), delay.clone()),
            broker.clone(),
            listener.clone(),
            EspSystemInfo::new(),
            clock.clone(),
        );
        node.set_session_broker("broker.test", 1883).unwrap();

        Self {
            node,
            ethernet,
            reset,
            delay,
            broker,
            listener,
            clock,
            configs: Received::default(),
            commands: Received::default(),
        }
    }

    pub fn begin(&mut self) -> bool {
        self.begin_with(&MemorySettingsStore::new())
    }

    pub fn begin_with(&mut self, store: &MemorySettingsStore) -> bool {
        let configs = self.configs.clone();
        let commands = self.commands.clone();
        self.node.begin(
            Some(Box::new(move |v: &Value| configs.borrow_mut().push(v.clone()))),
            Some(Box::new(move |v: &Value| commands.borrow_mut().push(v.clone()))),
            store,
        )
    }

    /// Advance the clock by `ms`, then tick once.
    pub fn tick_after(&mut self, ms: u64) -> Option<SessionEvent> {
        self.clock.advance(ms);
        self.node.tick()
    }

    /// Begin and tick until the session is up.
    pub fn online() -> Self {
        let mut rig = Self::new();
        assert!(rig.begin());
        assert_eq!(rig.tick_after(10), Some(SessionEvent::Connected));
        rig
    }
}
