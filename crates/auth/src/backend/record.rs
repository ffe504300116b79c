//! Persisted-record session backend.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use palisade_core::{Clock, UserId};
use palisade_store::{entity, row_i64, Filter, Row, Schema, Store, StoreError};

use crate::backend::{LoginRecord, Marker, MarkerKeys, RecordMarker, SessionBackend};
use crate::error::AuthError;
use crate::request::RequestMeta;
use crate::transport::MarkerTransport;
use crate::verifier::CredentialVerifier;

pub(crate) const STORAGE_NAME: &str = "__palisade_record__";

/// Stores each session as a row in the relational store, keyed by a freshly
/// generated v4 UUID, and keeps only `{user_id, uuid, ip}` client-side.
///
/// A tampered marker cannot impersonate another user: re-validation binds
/// the user id from the session row found by `uuid`, never from the marker.
pub struct RecordBackend {
    store: Arc<dyn Store>,
    schema: Schema,
    transport: Arc<dyn MarkerTransport>,
    clock: Arc<dyn Clock>,
    meta: RequestMeta,
    keys: MarkerKeys,
    expire_time: i64,
    suspend_time: i64,
}

impl RecordBackend {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        store: Arc<dyn Store>,
        schema: Schema,
        transport: Arc<dyn MarkerTransport>,
        clock: Arc<dyn Clock>,
        meta: RequestMeta,
        namespace: &str,
        expire_time: i64,
        suspend_time: i64,
    ) -> Self {
        Self {
            store,
            schema,
            transport,
            clock,
            meta,
            keys: MarkerKeys::new(STORAGE_NAME, namespace),
            expire_time,
            suspend_time,
        }
    }

    fn session_filter(&self, uuid: Uuid) -> Result<(String, Filter), AuthError> {
        let table = self.schema.table(entity::SESSIONS)?.to_string();
        let uuid_col = self.schema.column(entity::SESSIONS, "uuid")?;
        Ok((table, Filter::new().eq(uuid_col, uuid.to_string())))
    }

    fn restore_record(&self) -> Result<Option<RecordMarker>, AuthError> {
        let Some(raw) = self.transport.get(&self.keys.expire)? else {
            return Ok(None);
        };
        match serde_json::from_str::<RecordMarker>(&raw) {
            Ok(marker) => Ok(Some(marker)),
            Err(err) => {
                debug!(error = %err, "discarding undecodable session marker");
                Ok(None)
            }
        }
    }
}

impl SessionBackend for RecordBackend {
    fn store(&mut self, login: &LoginRecord) -> Result<(), AuthError> {
        let uuid = Uuid::new_v4();
        let now = self.clock.now();

        let table = self.schema.table(entity::SESSIONS)?.to_string();
        let col = |name: &str| -> Result<String, AuthError> {
            Ok(self.schema.column(entity::SESSIONS, name)?.to_string())
        };

        let mut row = Row::new();
        row.insert(col("uuid")?, json!(uuid.to_string()));
        row.insert(col("user_id")?, json!(login.user_id.as_i64()));
        row.insert(col("ip_address")?, json!(self.meta.ip));
        row.insert(col("device")?, json!(self.meta.device));
        row.insert(col("browser")?, json!(self.meta.browser));
        row.insert(col("platform")?, json!(self.meta.platform));
        row.insert(col("expire_at")?, json!(now + self.expire_time));
        row.insert(col("created_at")?, json!(now));

        if self.store.insert(&table, row)? {
            let marker = RecordMarker {
                user_id: login.user_id.as_i64(),
                uuid,
                ip: self.meta.ip.clone(),
            };
            let value =
                serde_json::to_string(&marker).map_err(|e| AuthError::Marker(e.to_string()))?;
            self.transport.set(&self.keys.expire, value, self.expire_time)?;
        }
        Ok(())
    }

    fn restore(&self) -> Result<Option<Marker>, AuthError> {
        Ok(self.restore_record()?.map(Marker::Record))
    }

    fn delete(&mut self) -> Result<(), AuthError> {
        if let Some(marker) = self.restore_record()? {
            let (table, filter) = self.session_filter(marker.uuid)?;
            // An error here keeps the marker: the caller may retry.
            self.store.delete(&table, &filter)?;
        }
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

    fn revalidate(&self, _verifier: &dyn CredentialVerifier) -> Result<Option<UserId>, AuthError> {
        let Some(marker) = self.restore_record()? else {
            return Ok(None);
        };

        let (table, filter) = self.session_filter(marker.uuid)?;
        let user_id_col = self.schema.column(entity::SESSIONS, "user_id")?;
        let rows = self.store.select(&table, &filter, &[user_id_col])?;
        if rows.len() != 1 {
            return Ok(None);
        }

        // The session row is authoritative for the user id.
        let user_id = row_i64(&rows[0], user_id_col)
            .ok_or_else(|| StoreError::MissingColumn(user_id_col.to_string()))?;

        let users = self.schema.table(entity::USERS)?;
        let id_col = self.schema.column(entity::USERS, "id")?;
        let count = self
            .store
            .count(users, &Filter::new().eq(id_col, user_id))?;
        if count != 1 {
            return Ok(None);
        }

        Ok(Some(UserId::new(user_id)))
    }

    fn destroy(&mut self, uuid: Uuid) -> Result<(), AuthError> {
        let (table, filter) = self.session_filter(uuid)?;
        if self.store.delete(&table, &filter)? {
            // Only drop our own markers when it was our session.
            let ours = self.restore_record()?.map(|m| m.uuid) == Some(uuid);
            if ours {
                self.transport.remove(&self.keys.suspend)?;
                self.transport.remove(&self.keys.expire)?;
            }
        }
        Ok(())
    }

    fn set_expire_time(&mut self, seconds: i64) {
        self.expire_time = seconds;
    }

    fn set_suspend_time(&mut self, seconds: i64) {
        self.suspend_time = seconds;
    }
}
