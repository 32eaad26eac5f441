//! Network credentials and their persistent store.
//!
//! A credential set is the triple `(ssid, passphrase, hostname)`. It is
//! either complete and within bounds, or it does not exist: partial or
//! oversized sets read back from flash are treated as absent so the node
//! falls back to provisioning mode.

use core::fmt;

use log::{error, info, warn};

use super::ports::{KeyValueStore, StorageError};

/// Maximum SSID length in bytes (802.11 limit).
pub const SSID_MAX_LEN: usize = 32;
/// Maximum WPA passphrase length in bytes.
pub const PASSPHRASE_MAX_LEN: usize = 64;
/// Maximum mDNS hostname length in bytes.
pub const HOSTNAME_MAX_LEN: usize = 64;

pub const KEY_SSID: &str = "ssid";
pub const KEY_PASSPHRASE: &str = "pass";
pub const KEY_HOSTNAME: &str = "mdns_host";

/// Erase order.
const KEYS: [&str; 3] = [KEY_SSID, KEY_PASSPHRASE, KEY_HOSTNAME];

// ───────────────────────────────────────────────────────────────
// Validation errors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// A field was not supplied at all.
    Missing(&'static str),
    /// A field was supplied but empty.
    Empty(&'static str),
    /// A field exceeds its byte bound.
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(field) => write!(f, "{field} missing"),
            Self::Empty(field) => write!(f, "{field} empty"),
            Self::TooLong { field, len, max } => {
                write!(f, "{field} too long ({len} bytes, max {max})")
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// NetworkCredentials
// ───────────────────────────────────────────────────────────────

/// A complete, bounds-checked credential set.
#[derive(Clone, PartialEq, Eq)]
pub struct NetworkCredentials {
    ssid: heapless::String<SSID_MAX_LEN>,
    passphrase: heapless::String<PASSPHRASE_MAX_LEN>,
    hostname: heapless::String<HOSTNAME_MAX_LEN>,
}

fn bounded<const N: usize>(
    field: &'static str,
    value: &str,
) -> Result<heapless::String<N>, CredentialError> {
    if value.is_empty() {
        return Err(CredentialError::Empty(field));
    }
    let mut out = heapless::String::new();
    out.push_str(value).map_err(|()| CredentialError::TooLong {
        field,
        len: value.len(),
        max: N,
    })?;
    Ok(out)
}

impl NetworkCredentials {
    /// Validate and build a credential set.
    pub fn new(ssid: &str, passphrase: &str, hostname: &str) -> Result<Self, CredentialError> {
        Ok(Self {
            ssid: bounded(KEY_SSID, ssid)?,
            passphrase: bounded(KEY_PASSPHRASE, passphrase)?,
            hostname: bounded(KEY_HOSTNAME, hostname)?,
        })
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }
}

impl fmt::Debug for NetworkCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkCredentials")
            .field("ssid", &self.ssid.as_str())
            .field("passphrase", &"<redacted>")
            .field("hostname", &self.hostname.as_str())
            .finish()
    }
}

// ───────────────────────────────────────────────────────────────
// CredentialStore
// ───────────────────────────────────────────────────────────────

/// Load / save / erase of the credential triple over a [`KeyValueStore`].
pub struct CredentialStore<S> {
    store: S,
}

impl<S: KeyValueStore> CredentialStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Read the stored credentials.
    ///
    /// Returns `None` when the namespace is unreadable, any key is
    /// missing, or any value violates its bound. Never fails loudly: the
    /// caller falls back to provisioning.
    pub fn load(&self) -> Option<NetworkCredentials> {
        let read = |key: &str| match self.store.get_str(key) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!("Credentials: cannot read '{}' ({})", key, e);
                Err(e)
            }
        };

        let (ssid, pass, host) = match (
            read(KEY_SSID),
            read(KEY_PASSPHRASE),
            read(KEY_HOSTNAME),
        ) {
            (Ok(s), Ok(p), Ok(h)) => (s, p, h),
            _ => return None,
        };

        let (Some(ssid), Some(pass), Some(host)) = (ssid, pass, host) else {
            info!("Credentials: none stored");
            return None;
        };

        match NetworkCredentials::new(&ssid, &pass, &host) {
            Ok(creds) => {
                info!("Credentials: loaded for SSID '{}'", creds.ssid());
                Some(creds)
            }
            Err(e) => {
                warn!("Credentials: stored set is malformed ({}), ignoring", e);
                None
            }
        }
    }

    /// Persist a complete credential set.
    pub fn save(&mut self, credentials: &NetworkCredentials) -> Result<(), StorageError> {
        self.store.set_str(KEY_SSID, credentials.ssid())?;
        self.store.set_str(KEY_PASSPHRASE, credentials.passphrase())?;
        self.store.set_str(KEY_HOSTNAME, credentials.hostname())?;
        self.store.commit()?;
        info!("Credentials: saved for SSID '{}'", credentials.ssid());
        Ok(())
    }

    /// Remove all three keys and commit.
    ///
    /// Absent keys are not an error. The first failure aborts the erase
    /// and is returned; nothing is retried here.
    pub fn erase(&mut self) -> Result<(), StorageError> {
        for key in KEYS {
            match self.store.remove(key) {
                Ok(true) => {}
                Ok(false) => info!("Credentials: '{}' already absent", key),
                Err(e) => {
                    error!("Credentials: erase of '{}' failed ({})", key, e);
                    return Err(e);
                }
            }
        }
        if let Err(e) = self.store.commit() {
            error!("Credentials: erase commit failed ({})", e);
            return Err(e);
        }
        info!("Credentials: erased");
        Ok(())
    }
}
