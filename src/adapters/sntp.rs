//! SNTP wall-clock synchronisation adapter.
//!
//! Fire-and-forget: `start` configures polling mode against one server
//! and returns; the LwIP SNTP client sets the system clock in the
//! background.

use log::info;

use crate::app::ports::{ServiceError, TimeSyncPort};

#[derive(Default)]
pub struct SntpTimeSync {
    /// LwIP keeps the server name pointer, so the string lives here.
    server: Option<std::ffi::CString>,
}

impl SntpTimeSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn server(&self) -> Option<&str> {
        self.server.as_ref().and_then(|s| s.to_str().ok())
    }
}

impl TimeSyncPort for SntpTimeSync {
    fn start(&mut self, server: &str) -> Result<(), ServiceError> {
        if self.server.is_some() {
            return Ok(());
        }
        let name = std::ffi::CString::new(server)
            .map_err(|_| ServiceError::StartFailed("time server name"))?;

        #[cfg(target_os = "espidf")]
        unsafe {
            use esp_idf_svc::sys::*;
            esp_sntp_setoperatingmode(esp_sntp_operatingmode_t_ESP_SNTP_OPMODE_POLL);
            esp_sntp_setservername(0, name.as_ptr());
            esp_sntp_init();
        }

        info!("SNTP: polling {}", server);
        self.server = Some(name);
        Ok(())
    }
}
