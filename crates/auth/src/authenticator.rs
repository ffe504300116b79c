//! Identity-session lifecycle.
//!
//! An [`Authenticator`] owns one session slot and drives it through the
//! four-state machine (none, active, expired, suspended). The cached status
//! is lazily refreshed from the backend markers on every read, with expiry
//! taking precedence over suspension, and the suspension transition only
//! firing from the active state.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use palisade_core::{Clock, Permission, Status, SystemClock, UserId};
use palisade_store::{entity, row_i64, row_str, Filter, Schema, Store, StoreError};

use crate::backend::{
    ClientBlobBackend, LoginRecord, RecordBackend, ServerKeyedBackend, SessionBackend,
};
use crate::error::AuthError;
use crate::request::RequestMeta;
use crate::resolver::{Authorizer, ResourceRef, SubjectRef};
use crate::transport::MarkerTransport;
use crate::verifier::{CredentialVerifier, PlainVerifier};

/// Default session lifetime: one year.
pub const DEFAULT_EXPIRE_SECS: i64 = 31_536_000;

/// Default idle window before suspension: thirty minutes.
pub const DEFAULT_SUSPEND_SECS: i64 = 1_800;

const DEFAULT_NAMESPACE: &str = "default";

/// A username/password pair as presented by the caller.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Which session storage strategy to build, together with the transport its
/// markers live in. Choosing a strategy is a construction-time decision; no
/// runtime storage-type dispatch exists.
pub enum BackendConfig {
    /// Session rows persisted in the relational store, marker holds only a
    /// `{user_id, uuid, ip}` pointer.
    PersistedRecord { transport: Arc<dyn MarkerTransport> },
    /// Full identity marker in an encrypted client-side blob.
    ClientBlob { transport: Arc<dyn MarkerTransport> },
    /// Full identity marker in server-side keyed storage.
    ServerKeyed { transport: Arc<dyn MarkerTransport> },
}

/// Builder for [`Authenticator`]. Misconfiguration fails at `build`, never
/// at first use.
pub struct AuthBuilder {
    store: Arc<dyn Store>,
    backend: BackendConfig,
    schema: Schema,
    namespace: String,
    expire_time: i64,
    suspend_time: i64,
    verifier: Arc<dyn CredentialVerifier>,
    meta: RequestMeta,
    clock: Arc<dyn Clock>,
}

impl AuthBuilder {
    pub fn new(store: Arc<dyn Store>, backend: BackendConfig) -> Self {
        Self {
            store,
            backend,
            schema: Schema::default(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            expire_time: DEFAULT_EXPIRE_SECS,
            suspend_time: DEFAULT_SUSPEND_SECS,
            verifier: Arc::new(PlainVerifier),
            meta: RequestMeta::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Namespace for marker keys. Two authenticators with distinct
    /// namespaces never see each other's sessions even on a shared
    /// transport.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Session lifetime in seconds. Non-positive values clamp to zero.
    pub fn expire_after(mut self, seconds: i64) -> Self {
        self.expire_time = seconds.max(0);
        self
    }

    /// Idle window in seconds. Non-positive values clamp to zero.
    pub fn suspend_after(mut self, seconds: i64) -> Self {
        self.suspend_time = seconds.max(0);
        self
    }

    pub fn verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn request_meta(mut self, meta: RequestMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> Result<Authenticator, AuthError> {
        if self.namespace.trim().is_empty() {
            return Err(AuthError::InvalidNamespace);
        }
        // Fail fast on unmapped credential columns.
        self.schema.credential_columns()?;

        let backend: Box<dyn SessionBackend> = match self.backend {
            BackendConfig::PersistedRecord { transport } => Box::new(RecordBackend::new(
                self.store.clone(),
                self.schema.clone(),
                transport,
                self.clock.clone(),
                self.meta.clone(),
                &self.namespace,
                self.expire_time,
                self.suspend_time,
            )),
            BackendConfig::ClientBlob { transport } => Box::new(ClientBlobBackend::new(
                self.store.clone(),
                self.schema.clone(),
                transport,
                self.meta.clone(),
                &self.namespace,
                self.expire_time,
                self.suspend_time,
            )),
            BackendConfig::ServerKeyed { transport } => Box::new(ServerKeyedBackend::new(
                self.store.clone(),
                self.schema.clone(),
                transport,
                self.meta.clone(),
                &self.namespace,
                self.expire_time,
                self.suspend_time,
            )),
        };

        let authorizer = Authorizer::new(self.store.clone(), self.schema.clone())?;

        Ok(Authenticator {
            store: self.store,
            schema: self.schema,
            backend,
            authorizer,
            verifier: self.verifier,
            status: Status::None,
        })
    }
}

/// The session state machine plus its permission resolver.
pub struct Authenticator {
    store: Arc<dyn Store>,
    schema: Schema,
    backend: Box<dyn SessionBackend>,
    authorizer: Authorizer,
    verifier: Arc<dyn CredentialVerifier>,
    status: Status,
}

impl Authenticator {
    /// Authenticate with a username/password pair and open a session.
    ///
    /// Exactly one identity row must match the username
    /// ([`AuthError::InvalidIdentity`] otherwise), and the verifier must
    /// accept the pair ([`AuthError::IncorrectCredential`]). Neither failure
    /// mutates the cached status.
    pub fn login(&mut self, credentials: &Credentials) -> Result<(), AuthError> {
        let creds = self.schema.credential_columns()?;
        let users = self.schema.table(entity::USERS)?;
        let id_col = self.schema.column(entity::USERS, "id")?;

        let rows = self.store.select(
            users,
            &Filter::new().eq(creds.username.as_str(), credentials.username.as_str()),
            &[id_col, creds.password.as_str()],
        )?;
        if rows.len() != 1 {
            return Err(AuthError::InvalidIdentity);
        }

        let stored = row_str(&rows[0], &creds.password)
            .ok_or_else(|| StoreError::MissingColumn(creds.password.clone()))?;
        if !self.verifier.verify(&credentials.password, stored) {
            return Err(AuthError::IncorrectCredential);
        }

        let user_id = row_i64(&rows[0], id_col)
            .map(UserId::new)
            .ok_or_else(|| StoreError::MissingColumn(id_col.to_string()))?;

        self.open_session(LoginRecord {
            user_id,
            username: credentials.username.clone(),
            credential: Some(credentials.password.clone()),
        })
    }

    /// Open a session for an already-trusted user id, skipping credential
    /// verification. The id must resolve to exactly one identity row; the
    /// failure is raised before any mutation, so the cached status is
    /// untouched.
    pub fn login_with_id(&mut self, user_id: UserId) -> Result<(), AuthError> {
        let creds = self.schema.credential_columns()?;
        let users = self.schema.table(entity::USERS)?;
        let id_col = self.schema.column(entity::USERS, "id")?;

        let rows = self.store.select(
            users,
            &Filter::new().eq(id_col, user_id.as_i64()),
            &[creds.username.as_str()],
        )?;
        if rows.len() != 1 {
            return Err(AuthError::InvalidIdentity);
        }
        let username = row_str(&rows[0], &creds.username)
            .ok_or_else(|| StoreError::MissingColumn(creds.username.clone()))?
            .to_string();

        self.open_session(LoginRecord {
            user_id,
            username,
            credential: None,
        })
    }

    fn open_session(&mut self, login: LoginRecord) -> Result<(), AuthError> {
        self.backend.store(&login)?;
        self.status = Status::Active;
        self.backend.update_suspend_time()?;
        Ok(())
    }

    /// The current lifecycle status, refreshed against the backend markers.
    ///
    /// Expiry dominates suspension: once the expiry marker is gone the
    /// session reads as expired even if the suspend marker also lapsed, and
    /// a session that already latched suspended keeps expiring on schedule.
    /// The suspension edge itself only fires from the active state.
    pub fn status(&mut self) -> Status {
        if matches!(self.status, Status::Active | Status::Suspended) && self.backend.has_expired()
        {
            self.status = Status::Expired;
        } else if self.status == Status::Active && self.backend.has_suspended() {
            self.status = Status::Suspended;
        }
        self.status
    }

    pub fn is_none(&mut self) -> bool {
        self.status() == Status::None
    }

    pub fn is_expired(&mut self) -> bool {
        self.status() == Status::Expired
    }

    pub fn is_suspended(&mut self) -> bool {
        self.status() == Status::Suspended
    }

    /// Whether a live, re-validated session is present. Fail-closed: any
    /// error during re-validation reads as logged out.
    pub fn is_logged_in(&mut self) -> bool {
        if self.status() != Status::Active {
            return false;
        }
        match self.backend.revalidate(self.verifier.as_ref()) {
            Ok(Some(_)) => true,
            Ok(None) => false,
            Err(err) => {
                debug!(error = %err, "session re-validation failed; treating as logged out");
                false
            }
        }
    }

    /// Re-validate a suspended session and, on success, return it to active
    /// with a fresh suspend window. Errors read as a failed resume.
    pub fn resume(&mut self) -> bool {
        match self.backend.revalidate(self.verifier.as_ref()) {
            Ok(Some(_)) => {
                self.status = Status::Active;
                if let Err(err) = self.backend.update_suspend_time() {
                    debug!(error = %err, "could not re-arm suspend window");
                }
                true
            }
            Ok(None) => false,
            Err(err) => {
                debug!(error = %err, "session resume failed");
                false
            }
        }
    }

    /// Close the session and discard its markers (and session row, for the
    /// persisted-record strategy).
    pub fn logout(&mut self) -> Result<(), AuthError> {
        self.backend.delete()?;
        self.status = Status::None;
        Ok(())
    }

    /// Push the suspension deadline out by re-arming the suspend marker.
    /// No-op once the session has expired.
    pub fn extend_suspend_time(&mut self) -> Result<(), AuthError> {
        self.backend.update_suspend_time()
    }

    /// Change the session lifetime for subsequently opened sessions.
    /// Non-positive values clamp to zero.
    pub fn set_expiration(&mut self, seconds: i64) {
        self.backend.set_expire_time(seconds.max(0));
    }

    /// Change the idle window for subsequent re-arms. Non-positive values
    /// clamp to zero.
    pub fn set_suspend_time(&mut self, seconds: i64) {
        self.backend.set_suspend_time(seconds.max(0));
    }

    /// The authoritative user id of the live session, if any. Fail-closed.
    pub fn current_user(&mut self) -> Option<UserId> {
        if self.status() != Status::Active {
            return None;
        }
        match self.backend.revalidate(self.verifier.as_ref()) {
            Ok(user) => user,
            Err(err) => {
                debug!(error = %err, "session re-validation failed");
                None
            }
        }
    }

    /// UUIDs of persisted sessions belonging to `subject`, or to the current
    /// user when `subject` is `None`. Only the persisted-record strategy
    /// writes session rows; other strategies see an empty list.
    pub fn session_uuids(&mut self, subject: Option<SubjectRef>) -> Result<Vec<Uuid>, AuthError> {
        let user = match subject {
            Some(subject) => self.authorizer.resolve_user(&subject)?,
            None => self.current_user(),
        };
        let Some(user) = user else {
            return Ok(Vec::new());
        };

        let table = self.schema.table(entity::SESSIONS)?;
        let user_col = self.schema.column(entity::SESSIONS, "user_id")?;
        let uuid_col = self.schema.column(entity::SESSIONS, "uuid")?;
        let rows = self.store.select(
            table,
            &Filter::new().eq(user_col, user.as_i64()),
            &[uuid_col],
        )?;

        let mut uuids = Vec::with_capacity(rows.len());
        for row in &rows {
            let raw = row_str(row, uuid_col)
                .ok_or_else(|| StoreError::MissingColumn(uuid_col.to_string()))?;
            let uuid =
                Uuid::parse_str(raw).map_err(|e| AuthError::Marker(format!("bad uuid: {e}")))?;
            uuids.push(uuid);
        }
        Ok(uuids)
    }

    /// Revoke one persisted session by UUID. When the revoked session turns
    /// out to be the current one, the cached status drops to none.
    pub fn destroy_session(&mut self, uuid: Uuid) -> Result<(), AuthError> {
        self.backend.destroy(uuid)?;
        if self.status == Status::Active && self.backend.restore()?.is_none() {
            self.status = Status::None;
        }
        Ok(())
    }

    /// The permission resolver, for role/resource administration.
    pub fn authorizer(&self) -> &Authorizer {
        &self.authorizer
    }

    /// Whether the current user may exercise `permission` on `resource`.
    /// False when no live session exists. Fail-closed.
    pub fn is_allow(&mut self, permission: Permission, resource: impl Into<ResourceRef>) -> bool {
        let Some(user) = self.current_user() else {
            return false;
        };
        self.authorizer.is_allow(user, permission, resource)
    }

    /// Whether the current user holds an admin role. False when no live
    /// session exists.
    pub fn is_admin(&mut self) -> bool {
        let Some(user) = self.current_user() else {
            return false;
        };
        self.authorizer.is_admin(user)
    }
}
