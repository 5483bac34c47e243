//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter          | Implements         | Connects to                  |
//! |------------------|--------------------|------------------------------|
//! | `device_id`      | (none)             | eFuse base MAC               |
//! | `gpio`           | OutputPin          | Ethernet reset line          |
//! | `log_sink`       | `log::Log`         | Serial console + `log` topic |
//! | `settings_store` | SettingsPort       | NVS / in-memory blob         |
//! | `system_info`    | SystemInfoPort     | Heap, flash, SPIFFS, PSRAM   |
//! | `time`           | Clock, DelayNs     | ESP32 system timer           |
//! | `sim`            | every port         | In-process simulators        |

pub mod device_id;
pub mod gpio;
pub mod log_sink;
pub mod settings_store;
pub mod sim;
pub mod system_info;
pub mod time;
