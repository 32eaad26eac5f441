//! Unified error type for the node firmware.
//!
//! Each port defines its own small error enum (see [`crate::app::ports`]);
//! this module funnels them into a single [`Error`] so bring-up code in
//! `main` can use `?` across subsystems.

use core::fmt;

use crate::app::credentials::CredentialError;
use crate::app::ports::{RadioError, ServiceError, StorageError};

/// Every fallible bring-up operation funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Persistent key-value storage failed.
    Storage(StorageError),
    /// The radio driver rejected a request.
    Radio(RadioError),
    /// A network service (thing server, mDNS, SNTP, portal) failed to start.
    Service(ServiceError),
    /// Supplied credentials failed validation.
    Credentials(CredentialError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Radio(e) => write!(f, "radio: {e}"),
            Self::Service(e) => write!(f, "service: {e}"),
            Self::Credentials(e) => write!(f, "credentials: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<RadioError> for Error {
    fn from(e: RadioError) -> Self {
        Self::Radio(e)
    }
}

impl From<ServiceError> for Error {
    fn from(e: ServiceError) -> Self {
        Self::Service(e)
    }
}

impl From<CredentialError> for Error {
    fn from(e: CredentialError) -> Self {
        Self::Credentials(e)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
