//! Thing server registry.
//!
//! Keeps the registered things and the server parameters. The thing
//! protocol itself (HTTP/WebSocket, JSON-LD descriptions) is served by
//! an external component; this adapter is the handoff point and records
//! what was handed over.

use std::sync::{Arc, Mutex};

use log::info;

use crate::app::ports::{ServiceError, ThingServerPort};
use crate::things::ThingHandle;

#[derive(Debug, Default)]
struct Registry {
    root: bool,
    things: Vec<ThingHandle>,
    listening: Option<(u16, String)>,
}

/// Shared between the boot path (registration) and the link task (start).
#[derive(Clone, Default)]
pub struct ThingRegistry {
    inner: Arc<Mutex<Registry>>,
}

impl ThingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn thing_count(&self) -> usize {
        self.inner.lock().map(|r| r.things.len()).unwrap_or(0)
    }

    /// `(port, fqdn)` once started.
    pub fn listening(&self) -> Option<(u16, String)> {
        self.inner.lock().ok().and_then(|r| r.listening.clone())
    }
}

impl ThingServerPort for ThingRegistry {
    fn init_root_node(&mut self) {
        if let Ok(mut r) = self.inner.lock() {
            r.root = true;
        }
    }

    fn register_thing(&mut self, thing: ThingHandle) -> Result<(), ServiceError> {
        let mut r = self
            .inner
            .lock()
            .map_err(|_| ServiceError::StartFailed("registry poisoned"))?;
        if !r.root {
            return Err(ServiceError::StartFailed("root node not initialised"));
        }
        r.things.push(thing);
        Ok(())
    }

    fn start_server(&mut self, port: u16, hostname: &str, domain: &str) -> Result<(), ServiceError> {
        let mut r = self
            .inner
            .lock()
            .map_err(|_| ServiceError::StartFailed("registry poisoned"))?;
        if r.listening.is_some() {
            return Err(ServiceError::StartFailed("server already running"));
        }
        let fqdn = format!("{}.{}", hostname, domain);
        info!(
            "ThingServer: serving {} things at http://{}:{}",
            r.things.len(),
            fqdn,
            port
        );
        r.listening = Some((port, fqdn));
        Ok(())
    }
}
