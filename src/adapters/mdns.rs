//! mDNS advertisement adapter.
//!
//! Station mode advertises `<hostname>.local` with a `_webthing._tcp`
//! service on the thing port. Access-point mode has no stored hostname,
//! so it advertises the setup hostname with an `_http._tcp` service for
//! the provisioning portal.
//!
//! Raw `mdns_*` calls from the `espressif/mdns` component on ESP-IDF;
//! logging only on simulation targets.

use log::info;

use crate::app::ports::{NameAdvertiser, ServiceError};

const INSTANCE_NAME: &str = "WebThing Node";

/// Service type/protocol pair for the current mode.
fn service_for(access_point: bool) -> (&'static str, &'static str) {
    if access_point {
        ("_http", "_tcp")
    } else {
        ("_webthing", "_tcp")
    }
}

pub struct MdnsAdvertiser {
    fallback_hostname: heapless::String<64>,
    /// Host name currently advertised, once started.
    advertised: Option<heapless::String<64>>,
}

impl MdnsAdvertiser {
    /// `fallback_hostname` is used when no hostname is supplied
    /// (access-point mode).
    pub fn new(fallback_hostname: &str) -> Result<Self, ServiceError> {
        let mut fallback = heapless::String::new();
        fallback
            .push_str(fallback_hostname)
            .map_err(|()| ServiceError::StartFailed("hostname too long"))?;
        Ok(Self {
            fallback_hostname: fallback,
            advertised: None,
        })
    }

    pub fn advertised(&self) -> Option<&str> {
        self.advertised.as_deref()
    }

    #[cfg(target_os = "espidf")]
    fn platform_start(&self, hostname: &str, access_point: bool, port: u16) -> Result<(), ServiceError> {
        use esp_idf_svc::sys::*;
        use std::ffi::CString;

        let host = CString::new(hostname).map_err(|_| ServiceError::StartFailed("hostname"))?;
        let instance = CString::new(INSTANCE_NAME).map_err(|_| ServiceError::StartFailed("instance"))?;
        let (svc, proto) = service_for(access_point);
        let svc = CString::new(svc).map_err(|_| ServiceError::StartFailed("service"))?;
        let proto = CString::new(proto).map_err(|_| ServiceError::StartFailed("service"))?;

        let ret = unsafe { mdns_init() };
        if ret != ESP_OK as esp_err_t {
            return Err(ServiceError::Driver(ret));
        }
        let ret = unsafe { mdns_hostname_set(host.as_ptr()) };
        if ret != ESP_OK as esp_err_t {
            return Err(ServiceError::Driver(ret));
        }
        let ret = unsafe { mdns_instance_name_set(instance.as_ptr()) };
        if ret != ESP_OK as esp_err_t {
            return Err(ServiceError::Driver(ret));
        }
        let ret = unsafe {
            mdns_service_add(
                instance.as_ptr(),
                svc.as_ptr(),
                proto.as_ptr(),
                port,
                core::ptr::null_mut(),
                0,
            )
        };
        if ret != ESP_OK as esp_err_t {
            return Err(ServiceError::Driver(ret));
        }
        info!("mDNS(espidf): registered {}.local port {}", hostname, port);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&self, hostname: &str, access_point: bool, port: u16) -> Result<(), ServiceError> {
        let (svc, proto) = service_for(access_point);
        info!(
            "mDNS(sim): registered {}.local '{}' {}.{}:{}",
            hostname, INSTANCE_NAME, svc, proto, port
        );
        Ok(())
    }
}

impl NameAdvertiser for MdnsAdvertiser {
    fn advertise(
        &mut self,
        hostname: Option<&str>,
        access_point: bool,
        port: u16,
    ) -> Result<(), ServiceError> {
        if self.advertised.is_some() {
            info!("mDNS: already advertising, ignoring");
            return Ok(());
        }
        let host = match hostname {
            Some(h) if !h.is_empty() => h,
            _ => self.fallback_hostname.as_str(),
        };
        let mut owned = heapless::String::new();
        owned
            .push_str(host)
            .map_err(|()| ServiceError::StartFailed("hostname too long"))?;

        self.platform_start(host, access_point, port)?;
        self.advertised = Some(owned);
        Ok(())
    }
}
