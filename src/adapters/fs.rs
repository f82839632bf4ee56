//! File store adapters.
//!
//! Implements [`FileStore`] three ways:
//!
//! - [`MemStore`]: in-memory map, for tests and volatile runs.
//! - [`DirStore`] (host): one file per name inside a directory.
//! - [`NvsStore`] (`target_os = "espidf"`): one NVS blob per name in the
//!   `devcycle` namespace.  NVS commits are atomic per `nvs_commit()`.
//!
//! Names are flat: no path separators, no `..`, at most
//! [`MAX_NAME_LEN`] bytes so they fit an NVS key.

use std::collections::HashMap;

use log::{debug, info};

#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::{FileStore, StorageError};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// NVS keys are limited to 15 characters.
pub const MAX_NAME_LEN: usize = 15;

/// Largest file accepted by the NVS backend.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
const MAX_BLOB_SIZE: usize = 4000;

fn validate_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(StorageError::InvalidName);
    }
    if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(StorageError::InvalidName);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// In-memory store
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone)]
pub struct MemStore {
    files: HashMap<String, String>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }
}

impl FileStore for MemStore {
    fn read(&self, name: &str) -> Result<String, StorageError> {
        validate_name(name)?;
        self.files.get(name).cloned().ok_or(StorageError::NotFound)
    }

    fn write(&mut self, name: &str, content: &str) -> Result<(), StorageError> {
        validate_name(name)?;
        self.files.insert(name.to_owned(), content.to_owned());
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Directory store (host)
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub struct DirStore {
    root: std::path::PathBuf,
}

#[cfg(not(target_os = "espidf"))]
impl DirStore {
    /// Use `root`, creating it if needed.
    pub fn new(root: impl Into<std::path::PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|_| StorageError::IoError)?;
        info!("DirStore: files under {}", root.display());
        Ok(Self { root })
    }
}

#[cfg(not(target_os = "espidf"))]
impl FileStore for DirStore {
    fn read(&self, name: &str) -> Result<String, StorageError> {
        validate_name(name)?;
        std::fs::read_to_string(self.root.join(name)).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound,
            _ => StorageError::IoError,
        })
    }

    fn write(&mut self, name: &str, content: &str) -> Result<(), StorageError> {
        validate_name(name)?;
        // Write beside the target, then rename over it.
        let tmp = self.root.join(format!(".{name}.tmp"));
        std::fs::write(&tmp, content).map_err(|_| StorageError::IoError)?;
        std::fs::rename(&tmp, self.root.join(name)).map_err(|_| StorageError::IoError)?;
        debug!("DirStore: wrote {} ({} bytes)", name, content.len());
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// NVS store (ESP-IDF)
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
const NVS_NAMESPACE: &[u8] = b"devcycle\0";

#[cfg(target_os = "espidf")]
pub struct NvsStore;

#[cfg(target_os = "espidf")]
impl NvsStore {
    /// Initialise NVS flash, erasing it on layout mismatch.
    pub fn new() -> Result<Self, StorageError> {
        // SAFETY: called once from the main task before any NVS access.
        let ret = unsafe { nvs_flash_init() };
        if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
            warn!("NvsStore: erasing and re-initialising flash partition");
            if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK {
                return Err(StorageError::IoError);
            }
        } else if ret != ESP_OK {
            return Err(StorageError::IoError);
        }
        info!("NvsStore: NVS initialised");
        Ok(Self)
    }

    fn key(name: &str) -> [u8; MAX_NAME_LEN + 1] {
        let mut buf = [0u8; MAX_NAME_LEN + 1];
        let len = name.len().min(MAX_NAME_LEN);
        buf[..len].copy_from_slice(&name.as_bytes()[..len]);
        buf
    }

    fn with_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let mut handle: nvs_handle_t = 0;
        let ret = unsafe { nvs_open(NVS_NAMESPACE.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }
        let result = f(handle);
        unsafe { nvs_close(handle) };
        result
    }
}

#[cfg(target_os = "espidf")]
impl FileStore for NvsStore {
    fn read(&self, name: &str) -> Result<String, StorageError> {
        validate_name(name)?;
        let key = Self::key(name);
        let result = Self::with_handle(false, |handle| {
            let mut size: usize = 0;
            let ret = unsafe {
                nvs_get_blob(handle, key.as_ptr() as *const _, core::ptr::null_mut(), &mut size)
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let mut buf = vec![0u8; size];
            let ret = unsafe {
                nvs_get_blob(handle, key.as_ptr() as *const _, buf.as_mut_ptr() as *mut _, &mut size)
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            buf.truncate(size);
            Ok(buf)
        });
        match result {
            Ok(bytes) => String::from_utf8(bytes).map_err(|_| StorageError::IoError),
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(StorageError::NotFound),
            Err(e) => {
                warn!("NvsStore: read {} failed ({})", name, e);
                Err(StorageError::IoError)
            }
        }
    }

    fn write(&mut self, name: &str, content: &str) -> Result<(), StorageError> {
        validate_name(name)?;
        if content.len() > MAX_BLOB_SIZE {
            return Err(StorageError::IoError);
        }
        let key = Self::key(name);
        let result = Self::with_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    key.as_ptr() as *const _,
                    content.as_ptr() as *const _,
                    content.len(),
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        });
        match result {
            Ok(()) => {
                debug!("NvsStore: wrote {} ({} bytes)", name, content.len());
                Ok(())
            }
            Err(e) => {
                warn!("NvsStore: write {} failed ({})", name, e);
                Err(StorageError::IoError)
            }
        }
    }
}
