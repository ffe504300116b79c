//! Stateless API-key validation.
//!
//! No session is opened here: each call re-checks the key against the store.
//! A key is only valid when its row exists, at least one role is attached to
//! it, and the verifier accepts the presented key against the stored one.

use std::sync::Arc;

use palisade_store::{entity, row_i64, row_str, Filter, Schema, Store, StoreError};

use crate::error::AuthError;
use crate::verifier::{CredentialVerifier, PlainVerifier};

pub struct ApiKeyValidator {
    store: Arc<dyn Store>,
    schema: Schema,
    verifier: Arc<dyn CredentialVerifier>,
}

impl ApiKeyValidator {
    /// Fails when the schema lacks the api-key credential columns.
    pub fn new(store: Arc<dyn Store>, schema: Schema) -> Result<Self, AuthError> {
        schema.api_credential_columns()?;
        schema.table(entity::API_KEY_ROLE)?;
        Ok(Self {
            store,
            schema,
            verifier: Arc::new(PlainVerifier),
        })
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Validate a username/key pair.
    pub fn validate(&self, username: &str, api_key: &str) -> Result<(), AuthError> {
        if username.trim().is_empty() {
            return Err(AuthError::InvalidIdentity);
        }
        let creds = self.schema.api_credential_columns()?;
        let filter = Filter::new().eq(creds.username.as_str(), username);
        self.validate_row(&filter, api_key).map(|_| ())
    }

    /// Validate a bare key and return the username it belongs to, for
    /// callers that transmit only the key itself.
    pub fn validate_key(&self, api_key: &str) -> Result<String, AuthError> {
        if api_key.trim().is_empty() {
            return Err(AuthError::IncorrectCredential);
        }
        let creds = self.schema.api_credential_columns()?;
        let filter = Filter::new().eq(creds.api_key.as_str(), api_key);
        self.validate_row(&filter, api_key)
    }

    fn validate_row(&self, filter: &Filter, presented: &str) -> Result<String, AuthError> {
        let creds = self.schema.api_credential_columns()?;
        let table = self.schema.table(entity::API_KEYS)?;
        let id_col = self.schema.column(entity::API_KEYS, "id")?;

        let rows = self.store.select(
            table,
            filter,
            &[id_col, creds.username.as_str(), creds.api_key.as_str()],
        )?;
        if rows.len() != 1 {
            return Err(AuthError::InvalidIdentity);
        }

        let key_id = row_i64(&rows[0], id_col)
            .ok_or_else(|| StoreError::MissingColumn(id_col.to_string()))?;

        // A key without any attached role is unusable by definition.
        let edges = self.schema.table(entity::API_KEY_ROLE)?;
        let key_col = self.schema.column(entity::API_KEY_ROLE, "api_key_id")?;
        if self.store.count(edges, &Filter::new().eq(key_col, key_id))? == 0 {
            return Err(AuthError::InvalidIdentity);
        }

        let stored = row_str(&rows[0], &creds.api_key)
            .ok_or_else(|| StoreError::MissingColumn(creds.api_key.clone()))?;
        if !self.verifier.verify(presented, stored) {
            return Err(AuthError::IncorrectCredential);
        }

        let username = row_str(&rows[0], &creds.username)
            .ok_or_else(|| StoreError::MissingColumn(creds.username.clone()))?;
        Ok(username.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palisade_store::{InMemoryStore, Row};
    use serde_json::json;

    fn seeded() -> (Arc<InMemoryStore>, ApiKeyValidator) {
        let store = Arc::new(InMemoryStore::new());

        let mut key = Row::new();
        key.insert("username".into(), json!("service-a"));
        key.insert("api_key".into(), json!("k-123"));
        store.insert("api_keys", key).unwrap();

        let mut edge = Row::new();
        edge.insert("api_key_id".into(), json!(1));
        edge.insert("role_id".into(), json!(1));
        store.insert("api_key_role", edge).unwrap();

        let validator = ApiKeyValidator::new(store.clone(), Schema::default()).unwrap();
        (store, validator)
    }

    #[test]
    fn valid_pair_passes() {
        let (_store, validator) = seeded();
        validator.validate("service-a", "k-123").unwrap();
        assert_eq!(validator.validate_key("k-123").unwrap(), "service-a");
    }

    #[test]
    fn wrong_key_is_incorrect_credential() {
        let (_store, validator) = seeded();
        assert!(matches!(
            validator.validate("service-a", "k-999"),
            Err(AuthError::IncorrectCredential)
        ));
    }

    #[test]
    fn unknown_username_is_invalid_identity() {
        let (_store, validator) = seeded();
        assert!(matches!(
            validator.validate("service-b", "k-123"),
            Err(AuthError::InvalidIdentity)
        ));
        assert!(matches!(
            validator.validate_key("k-999"),
            Err(AuthError::InvalidIdentity)
        ));
    }

    #[test]
    fn empty_inputs_fail_without_touching_the_store() {
        let (_store, validator) = seeded();
        assert!(matches!(
            validator.validate("", "k-123"),
            Err(AuthError::InvalidIdentity)
        ));
        assert!(matches!(
            validator.validate_key("  "),
            Err(AuthError::IncorrectCredential)
        ));
    }

    #[test]
    fn key_without_attached_roles_is_rejected() {
        let (store, validator) = seeded();
        store
            .delete("api_key_role", &Filter::new().eq("api_key_id", 1))
            .unwrap();
        assert!(matches!(
            validator.validate("service-a", "k-123"),
            Err(AuthError::InvalidIdentity)
        ));
    }
}
