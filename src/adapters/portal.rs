//! Provisioning portal adapter.
//!
//! Serves `POST /config` while the node is an access point. The body is
//! an urlencoded `ssid` / `pass` / `mdns_host` form, handed to
//! [`ProvisioningHandler`], which validates, persists and requests a
//! restart. The form page itself is served elsewhere.

use std::sync::{Arc, Mutex};

use log::info;

use crate::app::credentials::NetworkCredentials;
use crate::app::portal::{PortalError, ProvisioningHandler};
use crate::app::ports::{EventSink, KeyValueStore, ProvisioningPortal, ServiceError, StorageError};

/// Largest accepted submission.
pub const MAX_BODY: usize = 512;

pub const CONFIG_PATH: &str = "/config";

pub struct HttpPortal<S, E> {
    handler: Arc<Mutex<ProvisioningHandler<S, E>>>,
    port: u16,
    #[cfg(target_os = "espidf")]
    server: Option<esp_idf_svc::http::server::EspHttpServer<'static>>,
    #[cfg(not(target_os = "espidf"))]
    started: bool,
}

impl<S, E> HttpPortal<S, E>
where
    S: KeyValueStore + Send + 'static,
    E: EventSink + Send + 'static,
{
    pub fn new(handler: ProvisioningHandler<S, E>, port: u16) -> Self {
        Self {
            handler: Arc::new(Mutex::new(handler)),
            port,
            #[cfg(target_os = "espidf")]
            server: None,
            #[cfg(not(target_os = "espidf"))]
            started: false,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run one submission through the handler, as the HTTP route does.
    pub fn submit(&self, body: &[u8]) -> Result<NetworkCredentials, PortalError> {
        dispatch(&self.handler, body)
    }
}

fn dispatch<S: KeyValueStore, E: EventSink>(
    handler: &Mutex<ProvisioningHandler<S, E>>,
    body: &[u8],
) -> Result<NetworkCredentials, PortalError> {
    if body.len() > MAX_BODY {
        return Err(PortalError::TooLarge);
    }
    let body = core::str::from_utf8(body).map_err(|_| PortalError::NotUtf8)?;
    let mut handler = handler
        .lock()
        .map_err(|_| PortalError::Storage(StorageError::OpenFailed))?;
    handler.accept(body)
}

#[cfg(target_os = "espidf")]
impl<S, E> ProvisioningPortal for HttpPortal<S, E>
where
    S: KeyValueStore + Send + 'static,
    E: EventSink + Send + 'static,
{
    fn start(&mut self) -> Result<(), ServiceError> {
        use embedded_svc::http::{Headers, Method};
        use embedded_svc::io::{Read, Write};
        use esp_idf_svc::http::server::{Configuration, EspHttpServer};

        if self.server.is_some() {
            return Ok(());
        }
        let conf = Configuration {
            http_port: self.port,
            ..Default::default()
        };
        let mut server = EspHttpServer::new(&conf).map_err(|e| ServiceError::Driver(e.code()))?;

        let handler = Arc::clone(&self.handler);
        server
            .fn_handler::<anyhow::Error, _>(CONFIG_PATH, Method::Post, move |mut req| {
                let len = req.content_len().unwrap_or(0) as usize;
                let mut body = vec![0_u8; len.min(MAX_BODY + 1)];
                let mut filled = 0;
                while filled < body.len() {
                    let n = req.read(&mut body[filled..])?;
                    if n == 0 {
                        break;
                    }
                    filled += n;
                }
                body.truncate(filled);

                match dispatch(&handler, &body) {
                    Ok(_) => {
                        req.into_ok_response()?
                            .write_all(b"Saved. Restarting into station mode.")?;
                    }
                    Err(e) => {
                        req.into_status_response(400)?
                            .write_all(e.to_string().as_bytes())?;
                    }
                }
                Ok(())
            })
            .map_err(|e| ServiceError::Driver(e.code()))?;

        info!("Portal(espidf): POST {} on port {}", CONFIG_PATH, self.port);
        self.server = Some(server);
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl<S, E> ProvisioningPortal for HttpPortal<S, E>
where
    S: KeyValueStore + Send + 'static,
    E: EventSink + Send + 'static,
{
    fn start(&mut self) -> Result<(), ServiceError> {
        if !self.started {
            info!("Portal(sim): POST {} on port {}", CONFIG_PATH, self.port);
            self.started = true;
        }
        Ok(())
    }
}
