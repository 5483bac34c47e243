//! System introspection for the `system` adoption section.
//!
//! On ESP-IDF every figure is read live from the heap allocator, the
//! flash driver, the running app partition, SPIFFS and PSRAM.  The
//! simulation returns fixed figures shaped like a 4 MB WROOM module
//! without PSRAM.

use crate::adoption::SystemSnapshot;
use crate::app::ports::SystemInfoPort;

#[derive(Debug, Clone, Copy, Default)]
pub struct EspSystemInfo;

impl EspSystemInfo {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "espidf")]
impl SystemInfoPort for EspSystemInfo {
    fn snapshot(&self) -> SystemSnapshot {
        use esp_idf_svc::sys::*;

        // SAFETY: all of these are read-only queries with valid out pointers.
        unsafe {
            let heap_total = heap_caps_get_total_size(MALLOC_CAP_DEFAULT) as u32;
            let heap_free = heap_caps_get_free_size(MALLOC_CAP_DEFAULT) as u32;

            let mut flash_size: u32 = 0;
            esp_flash_get_size(core::ptr::null_mut(), &mut flash_size);

            let running = esp_ota_get_running_partition();
            let sketch_total = if running.is_null() { 0 } else { (*running).size };

            let mut fs_total: usize = 0;
            let mut fs_used: usize = 0;
            if esp_spiffs_info(core::ptr::null(), &mut fs_total, &mut fs_used) != ESP_OK {
                fs_total = 0;
                fs_used = 0;
            }

            SystemSnapshot {
                heap_used_bytes: heap_total.saturating_sub(heap_free),
                heap_free_bytes: heap_free,
                heap_max_alloc_bytes: heap_caps_get_largest_free_block(MALLOC_CAP_DEFAULT) as u32,
                flash_chip_size_bytes: flash_size,
                // TODO: read the running image length from its app image header.
                sketch_space_used_bytes: 0,
                sketch_space_total_bytes: sketch_total,
                file_system_used_bytes: fs_used as u32,
                file_system_total_bytes: fs_total as u32,
                available_ps_ram_bytes: heap_caps_get_total_size(MALLOC_CAP_SPIRAM) as u32,
                free_ps_ram_bytes: heap_caps_get_free_size(MALLOC_CAP_SPIRAM) as u32,
            }
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl SystemInfoPort for EspSystemInfo {
    fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot {
            heap_used_bytes: 112_640,
            heap_free_bytes: 214_016,
            heap_max_alloc_bytes: 110_580,
            flash_chip_size_bytes: 4 * 1024 * 1024,
            sketch_space_used_bytes: 1_048_576,
            sketch_space_total_bytes: 1_966_080,
            file_system_used_bytes: 8_192,
            file_system_total_bytes: 1_441_792,
            available_ps_ram_bytes: 0,
            free_ps_ram_bytes: 0,
        }
    }
}
