//! Identity-marker session backends (client-blob and server-keyed).
//!
//! Both strategies keep the whole identity marker in the transport and share
//! one re-validation path: re-query the identity by username, require the
//! recorded IP to match the current request IP, and re-run the credential
//! verifier when a credential was recorded. They differ only in where the
//! transport lives — an encrypted client blob can be replayed or mangled by
//! the client, a server-keyed store cannot — which is why the shared
//! validation treats every undecodable marker as absent.

use std::sync::Arc;

use tracing::debug;

use palisade_core::UserId;
use palisade_store::{entity, row_i64, row_str, Filter, Schema, Store, StoreError};

use crate::backend::{IdentityMarker, LoginRecord, Marker, MarkerKeys, SessionBackend};
use crate::error::AuthError;
use crate::request::RequestMeta;
use crate::transport::MarkerTransport;
use crate::verifier::CredentialVerifier;

pub(crate) const BLOB_STORAGE_NAME: &str = "__palisade_blob__";
pub(crate) const KEYED_STORAGE_NAME: &str = "__palisade_keyed__";

pub(crate) struct IdentityCore {
    store: Arc<dyn Store>,
    schema: Schema,
    transport: Arc<dyn MarkerTransport>,
    meta: RequestMeta,
    keys: MarkerKeys,
    expire_time: i64,
    suspend_time: i64,
}

impl IdentityCore {
    #[allow(clippy::too_many_arguments)]
    fn new(
        store: Arc<dyn Store>,
        schema: Schema,
        transport: Arc<dyn MarkerTransport>,
        meta: RequestMeta,
        storage_name: &str,
        namespace: &str,
        expire_time: i64,
        suspend_time: i64,
    ) -> Self {
        Self {
            store,
            schema,
            transport,
            meta,
            keys: MarkerKeys::new(storage_name, namespace),
            expire_time,
            suspend_time,
        }
    }

    fn restore_identity(&self) -> Result<Option<IdentityMarker>, AuthError> {
        let Some(raw) = self.transport.get(&self.keys.expire)? else {
            return Ok(None);
        };
        match serde_json::from_str::<IdentityMarker>(&raw) {
            Ok(marker) => Ok(Some(marker)),
            Err(err) => {
                debug!(error = %err, "discarding undecodable identity marker");
                Ok(None)
            }
        }
    }

    fn store(&mut self, login: &LoginRecord) -> Result<(), AuthError> {
        let marker = IdentityMarker {
            user_id: login.user_id.as_i64(),
            username: login.username.clone(),
            credential: login.credential.clone(),
            ip: self.meta.ip.clone(),
        };
        let value = serde_json::to_string(&marker).map_err(|e| AuthError::Marker(e.to_string()))?;
        self.transport.set(&self.keys.expire, value, self.expire_time)?;
        Ok(())
    }

    fn delete(&mut self) -> Result<(), AuthError> {
        self.transport.remove(&self.keys.suspend)?;
        self.transport.remove(&self.keys.expire)?;
        Ok(())
    }

    fn has_expired(&self) -> bool {
        match self.transport.get(&self.keys.expire) {
            Ok(value) => value.is_none(),
            Err(err) => {
                debug!(error = %err, "expiry marker unreadable; treating as expired");
                true
            }
        }
    }

    fn has_suspended(&self) -> bool {
        match self.transport.get(&self.keys.suspend) {
            Ok(value) => value.is_none(),
            Err(err) => {
                debug!(error = %err, "suspend marker unreadable; treating as suspended");
                true
            }
        }
    }

    fn update_suspend_time(&mut self) -> Result<(), AuthError> {
        if self.has_expired() {
            return Ok(());
        }
        self.transport.remove(&self.keys.suspend)?;
        self.transport
            .set(&self.keys.suspend, "1".to_string(), self.suspend_time)?;
        Ok(())
    }

    fn revalidate(&self, verifier: &dyn CredentialVerifier) -> Result<Option<UserId>, AuthError> {
        let Some(marker) = self.restore_identity()? else {
            return Ok(None);
        };

        let creds = self.schema.credential_columns()?;
        let users = self.schema.table(entity::USERS)?;
        let id_col = self.schema.column(entity::USERS, "id")?;
        let rows = self.store.select(
            users,
            &Filter::new().eq(creds.username.as_str(), marker.username.as_str()),
            &[id_col, creds.password.as_str()],
        )?;
        if rows.len() != 1 {
            return Ok(None);
        }

        // Replay defense: the marker must come from the origin it was minted
        // for.
        if marker.ip != self.meta.ip {
            debug!("identity marker IP does not match the current request");
            return Ok(None);
        }

        if let Some(credential) = &marker.credential {
            let reference = row_str(&rows[0], &creds.password)
                .ok_or_else(|| StoreError::MissingColumn(creds.password.clone()))?;
            if !verifier.verify(credential, reference) {
                return Ok(None);
            }
        }

        let user_id = row_i64(&rows[0], id_col)
            .ok_or_else(|| StoreError::MissingColumn(id_col.to_string()))?;
        Ok(Some(UserId::new(user_id)))
    }
}

macro_rules! identity_backend {
    ($(#[$doc:meta])* $name:ident, $storage_name:expr) => {
        $(#[$doc])*
        pub struct $name {
            inner: IdentityCore,
        }

        impl $name {
            #[allow(clippy::too_many_arguments)]
            pub(crate) fn new(
                store: Arc<dyn Store>,
                schema: Schema,
                transport: Arc<dyn MarkerTransport>,
                meta: RequestMeta,
                namespace: &str,
                expire_time: i64,
                suspend_time: i64,
            ) -> Self {
                Self {
                    inner: IdentityCore::new(
                        store,
                        schema,
                        transport,
                        meta,
                        $storage_name,
                        namespace,
                        expire_time,
                        suspend_time,
                    ),
                }
            }
        }

        impl SessionBackend for $name {
            fn store(&mut self, login: &LoginRecord) -> Result<(), AuthError> {
                self.inner.store(login)
            }

            fn restore(&self) -> Result<Option<Marker>, AuthError> {
                Ok(self.inner.restore_identity()?.map(Marker::Identity))
            }

            fn delete(&mut self) -> Result<(), AuthError> {
                self.inner.delete()
            }

            fn has_expired(&self) -> bool {
                self.inner.has_expired()
            }

            fn has_suspended(&self) -> bool {
                self.inner.has_suspended()
            }

            fn update_suspend_time(&mut self) -> Result<(), AuthError> {
                self.inner.update_suspend_time()
            }

            fn revalidate(
                &self,
                verifier: &dyn CredentialVerifier,
            ) -> Result<Option<UserId>, AuthError> {
                self.inner.revalidate(verifier)
            }

            fn set_expire_time(&mut self, seconds: i64) {
                self.inner.expire_time = seconds;
            }

            fn set_suspend_time(&mut self, seconds: i64) {
                self.inner.suspend_time = seconds;
            }
        }
    };
}

identity_backend!(
    /// Keeps the identity marker in an encrypted client-side blob.
    ClientBlobBackend,
    BLOB_STORAGE_NAME
);

identity_backend!(
    /// Keeps the identity marker in server-side keyed storage. Same
    /// validation as the client-blob variant without the transport
    /// integrity concern.
    ServerKeyedBackend,
    KEYED_STORAGE_NAME
);
