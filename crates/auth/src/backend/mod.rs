//! Session storage strategies.
//!
//! Three interchangeable backends implement one lifecycle contract:
//!
//! - [`RecordBackend`] — persists a session row in the relational store and
//!   keeps only a `{user_id, uuid, ip}` marker on the client side;
//! - [`ClientBlobBackend`] — keeps the identity marker inside an encrypted
//!   client blob (cookie-shaped transport);
//! - [`ServerKeyedBackend`] — same validation logic, but the marker lives in
//!   server-side keyed storage.
//!
//! Every backend maintains two independently TTL'd markers under
//! namespace-isolated keys: the *expiry marker* ("is there a session at
//! all", TTL = expire time) and the *suspend marker* ("has it been idle too
//! long", TTL = suspend time, refreshed on activity).

pub mod identity;
pub mod record;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use palisade_core::UserId;

use crate::error::AuthError;
use crate::verifier::CredentialVerifier;

pub use identity::{ClientBlobBackend, ServerKeyedBackend};
pub use record::RecordBackend;

/// What a backend needs to remember about a fresh login.
#[derive(Debug, Clone)]
pub struct LoginRecord {
    pub user_id: UserId,
    pub username: String,
    /// The presented plaintext credential. `None` for trusted re-entry
    /// (`login_with_id`), in which case re-validation skips the verifier.
    pub credential: Option<String>,
}

/// Marker kept by the persisted-record backend. The embedded `user_id` is a
/// client claim and is never trusted: re-validation binds the user from the
/// session row found by `uuid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMarker {
    pub user_id: i64,
    pub uuid: Uuid,
    pub ip: String,
}

/// Marker kept by the client-blob and server-keyed backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityMarker {
    pub user_id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
    pub ip: String,
}

/// A restored session marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    Record(RecordMarker),
    Identity(IdentityMarker),
}

impl Marker {
    /// The user id as claimed by the stored marker. Informational only;
    /// authoritative identity comes from [`SessionBackend::revalidate`].
    pub fn claimed_user_id(&self) -> UserId {
        match self {
            Marker::Record(m) => UserId::new(m.user_id),
            Marker::Identity(m) => UserId::new(m.user_id),
        }
    }
}

/// Namespace-isolated transport keys for the two markers.
#[derive(Debug, Clone)]
pub(crate) struct MarkerKeys {
    pub expire: String,
    pub suspend: String,
}

impl MarkerKeys {
    pub(crate) fn new(storage_name: &str, namespace: &str) -> Self {
        Self {
            expire: format!("{storage_name}-{namespace}-expire"),
            suspend: format!("{storage_name}-{namespace}-suspend"),
        }
    }
}

/// Uniform lifecycle contract over the three storage strategies.
pub trait SessionBackend: Send {
    /// Persist the identity marker (and, for the record variant, the session
    /// row) for a fresh login.
    fn store(&mut self, login: &LoginRecord) -> Result<(), AuthError>;

    /// Read back the stored marker, if any is live. A marker that fails to
    /// decode reads as absent.
    fn restore(&self) -> Result<Option<Marker>, AuthError>;

    /// Remove the markers; the record variant deletes the session row first
    /// and keeps the marker when that deletion fails, so a retry remains
    /// possible.
    fn delete(&mut self) -> Result<(), AuthError>;

    /// True iff the expiry marker is absent.
    fn has_expired(&self) -> bool;

    /// True iff the suspend marker is absent. The state machine gates the
    /// resulting transition on the cached status having been active.
    fn has_suspended(&self) -> bool;

    /// Re-arm the suspend marker without touching the expiry marker. No-op
    /// once the session has expired.
    fn update_suspend_time(&mut self) -> Result<(), AuthError>;

    /// Re-validate the stored marker against current store state and return
    /// the authoritative user id, or `None` when the session no longer holds.
    fn revalidate(&self, verifier: &dyn CredentialVerifier) -> Result<Option<UserId>, AuthError>;

    /// Revoke a specific persisted session. Only meaningful for the record
    /// variant; others ignore it.
    fn destroy(&mut self, _uuid: Uuid) -> Result<(), AuthError> {
        Ok(())
    }

    fn set_expire_time(&mut self, seconds: i64);

    fn set_suspend_time(&mut self, seconds: i64);
}
