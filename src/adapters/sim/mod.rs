//! Simulated collaborators for host builds and tests.
//!
//! Every simulator is a cheap `Clone` handle over shared state, so a test
//! can keep one handle to drive and inspect the simulator after the
//! orchestrator has taken ownership of the other.
//!
//! | Simulator           | Implements            |
//! |---------------------|-----------------------|
//! | `SimEthernetDriver` | `EthernetDriver`      |
//! | `SimWifiDriver`     | `WifiDriver`          |
//! | `SimResetPin`       | `OutputPin`           |
//! | `SimDelay`          | `DelayNs`             |
//! | `SimBroker`         | `SessionTransport`    |
//! | `SimListener`       | `RequestListener`     |
//! | `ManualClock`       | `Clock`               |

mod broker;
mod clock;
mod http;
mod network;

pub use broker::{ConnectRecord, Published, SimBroker};
pub use clock::ManualClock;
pub use http::{SimConnection, SimListener};
pub use network::{SimDelay, SimEthernetDriver, SimResetPin, SimWifiDriver};
