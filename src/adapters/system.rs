//! Chip-level services: free heap, restart, chip information.

use core::sync::atomic::{AtomicU32, Ordering};

use log::info;

use crate::app::ports::SystemPort;

/// Snapshot of the chip identity printed at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipInfo {
    pub cores: u8,
    pub revision: u16,
    pub bluetooth: bool,
    pub ble: bool,
    pub embedded_flash: bool,
}

impl core::fmt::Display for ChipInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "ESP32 with {} CPU cores, WiFi{}{}, silicon revision {}, {} flash",
            self.cores,
            if self.bluetooth { "/BT" } else { "" },
            if self.ble { "/BLE" } else { "" },
            self.revision,
            if self.embedded_flash { "embedded" } else { "external" },
        )
    }
}

#[derive(Default)]
pub struct SystemAdapter {
    restarts: AtomicU32,
}

impl SystemAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart requests seen. Only meaningful in simulation, where
    /// `restart` returns.
    pub fn restart_count(&self) -> u32 {
        self.restarts.load(Ordering::Relaxed)
    }

    #[cfg(target_os = "espidf")]
    pub fn chip_info(&self) -> ChipInfo {
        use esp_idf_svc::sys::*;

        let mut raw: esp_chip_info_t = unsafe { core::mem::zeroed() };
        unsafe { esp_chip_info(&mut raw) };
        ChipInfo {
            cores: raw.cores,
            revision: raw.revision,
            bluetooth: raw.features & CHIP_FEATURE_BT != 0,
            ble: raw.features & CHIP_FEATURE_BLE != 0,
            embedded_flash: raw.features & CHIP_FEATURE_EMB_FLASH != 0,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn chip_info(&self) -> ChipInfo {
        ChipInfo {
            cores: 2,
            revision: 3,
            bluetooth: true,
            ble: true,
            embedded_flash: false,
        }
    }

    pub fn log_chip_info(&self) {
        info!("System: {}", self.chip_info());
    }
}

impl SystemPort for SystemAdapter {
    #[cfg(target_os = "espidf")]
    fn free_heap(&self) -> u32 {
        use esp_idf_svc::sys::*;
        unsafe { heap_caps_get_free_size(MALLOC_CAP_8BIT) as u32 }
    }

    #[cfg(not(target_os = "espidf"))]
    fn free_heap(&self) -> u32 {
        200_000
    }

    fn restart(&self) {
        self.restarts.fetch_add(1, Ordering::Relaxed);
        info!("System: restarting");
        #[cfg(target_os = "espidf")]
        unsafe {
            esp_idf_svc::sys::esp_restart();
        }
    }
}
