//! Provisioning portal logic.
//!
//! In access-point mode the node serves a small form; its submission is
//! an `application/x-www-form-urlencoded` body with the fields `ssid`,
//! `pass` and `mdns_host`. This module parses and validates it, stores
//! the credentials and asks the liveness supervisor for a restart. The
//! HTTP binding lives in `adapters::portal`.

use core::fmt;
use std::borrow::Cow;
use std::sync::Arc;

use log::{info, warn};

use super::credentials::{
    CredentialError, CredentialStore, KEY_HOSTNAME, KEY_PASSPHRASE, KEY_SSID, NetworkCredentials,
};
use super::events::AppEvent;
use super::ports::{EventSink, KeyValueStore, StorageError};
use super::shared::SupervisorContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalError {
    /// The body exceeds the accepted size.
    TooLarge,
    /// Decoded bytes are not UTF-8.
    NotUtf8,
    /// Field validation failed.
    Credentials(CredentialError),
    /// The store rejected the write.
    Storage(StorageError),
}

impl fmt::Display for PortalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge => write!(f, "submission too large"),
            Self::NotUtf8 => write!(f, "field is not valid UTF-8"),
            Self::Credentials(e) => write!(f, "{e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
        }
    }
}

impl From<CredentialError> for PortalError {
    fn from(e: CredentialError) -> Self {
        Self::Credentials(e)
    }
}

impl From<StorageError> for PortalError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

/// Decode one form component. `+` becomes a space before `%XX`
/// escapes are expanded, so an encoded `%2B` stays a plus.
fn form_decode(raw: &str) -> Result<String, PortalError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(Cow::into_owned)
        .map_err(|_| PortalError::NotUtf8)
}

/// Parse and validate a form submission. Unknown fields are ignored;
/// the last occurrence of a repeated field wins.
pub fn parse_submission(body: &str) -> Result<NetworkCredentials, PortalError> {
    let mut ssid = None;
    let mut pass = None;
    let mut host = None;

    for pair in body.trim().split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let slot = match form_decode(key)?.as_str() {
            KEY_SSID => &mut ssid,
            KEY_PASSPHRASE => &mut pass,
            KEY_HOSTNAME => &mut host,
            _ => continue,
        };
        *slot = Some(form_decode(value)?);
    }

    let ssid = ssid.ok_or(CredentialError::Missing(KEY_SSID))?;
    let pass = pass.ok_or(CredentialError::Missing(KEY_PASSPHRASE))?;
    let host = host.ok_or(CredentialError::Missing(KEY_HOSTNAME))?;
    Ok(NetworkCredentials::new(&ssid, &pass, &host)?)
}

/// Handles submissions: validate, persist, request restart.
pub struct ProvisioningHandler<S, E> {
    shared: Arc<SupervisorContext>,
    store: CredentialStore<S>,
    sink: E,
}

impl<S: KeyValueStore, E: EventSink> ProvisioningHandler<S, E> {
    pub fn new(shared: Arc<SupervisorContext>, store: CredentialStore<S>, sink: E) -> Self {
        Self {
            shared,
            store,
            sink,
        }
    }

    /// Process one submission body.
    pub fn accept(&mut self, body: &str) -> Result<NetworkCredentials, PortalError> {
        let credentials = parse_submission(body).inspect_err(|e| {
            warn!("Portal: rejected submission ({})", e);
        })?;
        self.store.save(&credentials)?;

        let mut ssid = heapless::String::new();
        // Bounded by validation above.
        let _ = ssid.push_str(credentials.ssid());
        self.sink.emit(&AppEvent::CredentialsProvisioned { ssid });

        self.shared.request_restart();
        info!("Portal: credentials stored, restart requested");
        Ok(credentials)
    }
}
