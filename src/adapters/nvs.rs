//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`KeyValueStore`] over one NVS namespace.
//!
//! - **`target_os = "espidf"`**: raw `nvs_*` calls. Reads open the
//!   namespace read-only per call. Writes and erases open a read-write
//!   handle that stays open until [`commit`](KeyValueStore::commit),
//!   which runs `nvs_commit` and closes it.
//! - **all other targets**: an in-memory partition shared between
//!   clones, with per-handle staging so uncommitted changes are not
//!   visible.
//!
//! The default NVS partition must be initialised before use; `main` does
//! this by taking `EspDefaultNvsPartition`, which the WiFi driver needs
//! anyway.

use log::info;

use crate::app::ports::{KeyValueStore, StorageError};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;
#[cfg(not(target_os = "espidf"))]
use std::sync::{Arc, Mutex};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use std::ffi::{CStr, CString};

/// NVS limits namespace and key names to 15 bytes.
const NVS_NAME_MAX: usize = 15;

#[cfg(not(target_os = "espidf"))]
type SimPartition = Arc<Mutex<HashMap<String, String>>>;

pub struct NvsStore {
    namespace: heapless::String<NVS_NAME_MAX>,
    /// Read-write handle held between the first staged change and commit.
    #[cfg(target_os = "espidf")]
    txn: Option<nvs_handle_t>,
    #[cfg(not(target_os = "espidf"))]
    partition: SimPartition,
    #[cfg(not(target_os = "espidf"))]
    staged: Vec<(String, Option<String>)>,
}

impl NvsStore {
    pub fn new(namespace: &str) -> Result<Self, StorageError> {
        let mut ns = heapless::String::new();
        ns.push_str(namespace)
            .map_err(|()| StorageError::OpenFailed)?;

        #[cfg(target_os = "espidf")]
        info!("NvsStore: namespace '{}'", namespace);
        #[cfg(not(target_os = "espidf"))]
        info!("NvsStore: simulation backend, namespace '{}'", namespace);

        Ok(Self {
            namespace: ns,
            #[cfg(target_os = "espidf")]
            txn: None,
            #[cfg(not(target_os = "espidf"))]
            partition: Arc::new(Mutex::new(HashMap::new())),
            #[cfg(not(target_os = "espidf"))]
            staged: Vec::new(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl Clone for NvsStore {
    /// A fresh handle on the same namespace; staged changes are not shared.
    fn clone(&self) -> Self {
        Self {
            namespace: self.namespace.clone(),
            #[cfg(target_os = "espidf")]
            txn: None,
            #[cfg(not(target_os = "espidf"))]
            partition: Arc::clone(&self.partition),
            #[cfg(not(target_os = "espidf"))]
            staged: Vec::new(),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF backend
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
impl NvsStore {
    fn c_name(name: &str) -> Result<CString, StorageError> {
        if name.len() > NVS_NAME_MAX {
            return Err(StorageError::OpenFailed);
        }
        CString::new(name).map_err(|_| StorageError::OpenFailed)
    }

    fn open(&self, mode: nvs_open_mode_t) -> Result<nvs_handle_t, esp_err_t> {
        let ns = Self::c_name(&self.namespace).map_err(|_| ESP_ERR_INVALID_ARG as esp_err_t)?;
        let mut handle: nvs_handle_t = 0;
        let ret = unsafe { nvs_open(ns.as_ptr(), mode, &mut handle) };
        if ret != ESP_OK as esp_err_t {
            return Err(ret);
        }
        Ok(handle)
    }

    /// Read-write handle for staged changes, opened on first use.
    fn txn_handle(&mut self) -> Result<nvs_handle_t, StorageError> {
        if let Some(h) = self.txn {
            return Ok(h);
        }
        let h = self
            .open(nvs_open_mode_t_NVS_READWRITE)
            .map_err(|_| StorageError::OpenFailed)?;
        self.txn = Some(h);
        Ok(h)
    }
}

#[cfg(target_os = "espidf")]
impl Drop for NvsStore {
    fn drop(&mut self) {
        if let Some(h) = self.txn.take() {
            log::warn!("NvsStore: dropping uncommitted changes in '{}'", self.namespace);
            unsafe { nvs_close(h) };
        }
    }
}

#[cfg(target_os = "espidf")]
impl KeyValueStore for NvsStore {
    fn get_str(&self, key: &str) -> Result<Option<String>, StorageError> {
        let key = Self::c_name(key)?;
        let handle = match self.open(nvs_open_mode_t_NVS_READONLY) {
            Ok(h) => h,
            // Namespace never written.
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND as esp_err_t => return Ok(None),
            Err(_) => return Err(StorageError::OpenFailed),
        };

        let result = (|| {
            let mut len: usize = 0;
            let ret = unsafe { nvs_get_str(handle, key.as_ptr(), core::ptr::null_mut(), &mut len) };
            if ret == ESP_ERR_NVS_NOT_FOUND as esp_err_t {
                return Ok(None);
            }
            if ret != ESP_OK as esp_err_t || len == 0 {
                return Err(StorageError::ReadFailed);
            }

            let mut buf = vec![0u8; len];
            let ret =
                unsafe { nvs_get_str(handle, key.as_ptr(), buf.as_mut_ptr().cast(), &mut len) };
            if ret != ESP_OK as esp_err_t {
                return Err(StorageError::ReadFailed);
            }
            let value = CStr::from_bytes_until_nul(&buf)
                .map_err(|_| StorageError::ReadFailed)?
                .to_str()
                .map_err(|_| StorageError::ReadFailed)?;
            Ok(Some(value.to_owned()))
        })();

        unsafe { nvs_close(handle) };
        result
    }

    fn set_str(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let key = Self::c_name(key)?;
        let value = CString::new(value).map_err(|_| StorageError::WriteFailed)?;
        let handle = self.txn_handle()?;
        let ret = unsafe { nvs_set_str(handle, key.as_ptr(), value.as_ptr()) };
        if ret != ESP_OK as esp_err_t {
            return Err(StorageError::WriteFailed);
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, StorageError> {
        let key = Self::c_name(key)?;
        let handle = self.txn_handle()?;
        let ret = unsafe { nvs_erase_key(handle, key.as_ptr()) };
        if ret == ESP_ERR_NVS_NOT_FOUND as esp_err_t {
            return Ok(false);
        }
        if ret != ESP_OK as esp_err_t {
            return Err(StorageError::WriteFailed);
        }
        Ok(true)
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        let Some(handle) = self.txn.take() else {
            return Ok(());
        };
        let ret = unsafe { nvs_commit(handle) };
        unsafe { nvs_close(handle) };
        if ret != ESP_OK as esp_err_t {
            return Err(StorageError::CommitFailed);
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation backend
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl NvsStore {
    fn composite_key(&self, key: &str) -> String {
        format!("{}::{}", self.namespace, key)
    }

    fn check_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty() || key.len() > NVS_NAME_MAX {
            return Err(StorageError::WriteFailed);
        }
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl KeyValueStore for NvsStore {
    fn get_str(&self, key: &str) -> Result<Option<String>, StorageError> {
        let map = self.partition.lock().map_err(|_| StorageError::OpenFailed)?;
        Ok(map.get(&self.composite_key(key)).cloned())
    }

    fn set_str(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::check_key(key)?;
        self.staged.push((key.into(), Some(value.into())));
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, StorageError> {
        Self::check_key(key)?;
        let staged_value = self
            .staged
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.is_some());
        let existed = match staged_value {
            Some(present) => present,
            None => self.get_str(key)?.is_some(),
        };
        self.staged.push((key.into(), None));
        Ok(existed)
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        let mut map = self
            .partition
            .lock()
            .map_err(|_| StorageError::CommitFailed)?;
        for (key, value) in self.staged.drain(..) {
            let full = format!("{}::{}", self.namespace, key);
            match value {
                Some(v) => map.insert(full, v),
                None => map.remove(&full),
            };
        }
        Ok(())
    }
}
