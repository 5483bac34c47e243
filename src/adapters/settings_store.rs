//! Persisted session settings.
//!
//! Settings are stored as one `postcard` blob of [`PersistedSession`].
//!
//! - [`MemorySettingsStore`] keeps the blob in RAM (host builds, tests).
//! - [`NvsSettingsStore`] (ESP-IDF only) keeps it in the `nodelink` NVS
//!   namespace under the `session` key.

use core::cell::RefCell;

use log::info;

use crate::app::ports::SettingsPort;
use crate::config::PersistedSession;
use crate::error::SettingsError;

/// Largest blob accepted from storage.
pub const MAX_BLOB_SIZE: usize = 512;

fn decode(bytes: &[u8]) -> Result<PersistedSession, SettingsError> {
    if bytes.len() > MAX_BLOB_SIZE {
        return Err(SettingsError::Corrupted);
    }
    postcard::from_bytes(bytes).map_err(|_| SettingsError::Corrupted)
}

fn encode(settings: &PersistedSession) -> Result<Vec<u8>, SettingsError> {
    postcard::to_allocvec(settings).map_err(|_| SettingsError::IoError)
}

// ───────────────────────────────────────────────────────────────
// In-memory backend
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    blob: RefCell<Option<Vec<u8>>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-encoded bytes verbatim.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            blob: RefCell::new(Some(bytes)),
        }
    }

    pub fn save(&self, settings: &PersistedSession) -> Result<(), SettingsError> {
        let bytes = encode(settings)?;
        info!("settings: saved ({} bytes)", bytes.len());
        *self.blob.borrow_mut() = Some(bytes);
        Ok(())
    }

    pub fn clear(&self) {
        *self.blob.borrow_mut() = None;
    }
}

impl SettingsPort for MemorySettingsStore {
    fn load(&self) -> Result<Option<PersistedSession>, SettingsError> {
        self.blob.borrow().as_deref().map(decode).transpose()
    }
}

// ───────────────────────────────────────────────────────────────
// NVS backend
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use nvs::NvsSettingsStore;

#[cfg(target_os = "espidf")]
mod nvs {
    use esp_idf_svc::sys::*;
    use log::{info, warn};

    use super::{MAX_BLOB_SIZE, decode, encode};
    use crate::app::ports::SettingsPort;
    use crate::config::PersistedSession;
    use crate::error::SettingsError;

    const NAMESPACE: &[u8] = b"nodelink\0";
    const KEY: &[u8] = b"session\0";

    pub struct NvsSettingsStore;

    impl NvsSettingsStore {
        /// Initialise NVS flash, erasing it if the partition layout changed.
        pub fn new() -> Result<Self, SettingsError> {
            // SAFETY: called once from the main task before any NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("settings: erasing and re-initialising NVS");
                if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(SettingsError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(SettingsError::IoError);
            }
            Ok(Self)
        }

        fn with_handle<T>(
            write: bool,
            f: impl FnOnce(nvs_handle_t) -> Result<T, i32>,
        ) -> Result<T, i32> {
            let mode = if write {
                nvs_open_mode_t_NVS_READWRITE
            } else {
                nvs_open_mode_t_NVS_READONLY
            };
            let mut handle: nvs_handle_t = 0;
            // SAFETY: NAMESPACE is NUL-terminated; handle is a valid out pointer.
            let ret = unsafe { nvs_open(NAMESPACE.as_ptr().cast(), mode, &mut handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            let result = f(handle);
            // SAFETY: handle was opened above and is not used afterwards.
            unsafe { nvs_close(handle) };
            result
        }

        pub fn save(&self, settings: &PersistedSession) -> Result<(), SettingsError> {
            let bytes = encode(settings)?;
            Self::with_handle(true, |handle| {
                // SAFETY: KEY is NUL-terminated; bytes outlives the call.
                let ret = unsafe {
                    nvs_set_blob(handle, KEY.as_ptr().cast(), bytes.as_ptr().cast(), bytes.len())
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                match unsafe { nvs_commit(handle) } {
                    ESP_OK => Ok(()),
                    e => Err(e),
                }
            })
            .map_err(|e| {
                warn!("settings: NVS write error {}", e);
                SettingsError::IoError
            })?;
            info!("settings: saved to NVS ({} bytes)", bytes.len());
            Ok(())
        }
    }

    impl SettingsPort for NvsSettingsStore {
        fn load(&self) -> Result<Option<PersistedSession>, SettingsError> {
            let result = Self::with_handle(false, |handle| {
                let mut size: usize = 0;
                // SAFETY: a null buffer asks NVS for the stored length only.
                let ret = unsafe {
                    nvs_get_blob(handle, KEY.as_ptr().cast(), core::ptr::null_mut(), &mut size)
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                if size == 0 || size > MAX_BLOB_SIZE {
                    return Err(ESP_ERR_NVS_INVALID_LENGTH);
                }
                let mut buf = vec![0u8; size];
                // SAFETY: buf holds exactly `size` bytes.
                let ret = unsafe {
                    nvs_get_blob(handle, KEY.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut size)
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(buf)
            });

            match result {
                Ok(bytes) => decode(&bytes).map(Some),
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(None),
                Err(e) => {
                    warn!("settings: NVS read error {}", e);
                    Err(SettingsError::IoError)
                }
            }
        }
    }
}
