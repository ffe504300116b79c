//! Error taxonomy for the auth boundary.

use thiserror::Error;

use palisade_store::{ConfigError, StoreError};

use crate::transport::TransportError;

/// Auth-level failure.
///
/// Construction-time misconfiguration (`InvalidNamespace`, `Config`) is
/// fatal and surfaces immediately. `InvalidIdentity` and
/// `IncorrectCredential` are thrown to the `login` caller, who decides the
/// user-facing response. Everything else only escapes through operations
/// documented as fallible; the fail-closed boundaries (`is_allow`,
/// `is_logged_in`, `resume`) convert all of these to their safe default.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The credential subject was not found, or matched more than one row.
    #[error("identity not found or ambiguous")]
    InvalidIdentity,

    /// Credential verification failed.
    #[error("credential verification failed")]
    IncorrectCredential,

    /// The auth namespace must be a non-empty string.
    #[error("auth namespace must not be empty")]
    InvalidNamespace,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A stored session marker could not be encoded or decoded.
    #[error("malformed session marker: {0}")]
    Marker(String),
}
