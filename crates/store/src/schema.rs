//! Logical-to-physical schema mapping.
//!
//! The toolkit addresses entities by logical name (`users`, `roles`, ...) and
//! columns by logical key (`id`, `username`, ...); deployments remap either
//! side to their physical names without touching auth code. DDL bootstrap is
//! deliberately out of scope: the host owns its migrations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Logical entity names understood by the toolkit.
pub mod entity {
    pub const USERS: &str = "users";
    pub const ROLES: &str = "roles";
    pub const RESOURCES: &str = "resources";
    pub const USER_ROLE: &str = "user_role";
    pub const ROLE_RES_PERM: &str = "role_res_perm";
    pub const USER_RES_PERM: &str = "user_res_perm";
    pub const SESSIONS: &str = "sessions";
    pub const API_KEYS: &str = "api_keys";
    pub const API_KEY_ROLE: &str = "api_key_role";
}

/// Schema misconfiguration. Fatal at construction time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("schema has no entity '{0}'")]
    UnknownEntity(String),

    #[error("entity '{entity}' is missing mandatory column '{column}'")]
    MissingColumn { entity: String, column: String },
}

/// Mapping of one logical entity to a physical table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMap {
    pub table: String,
    pub columns: BTreeMap<String, String>,
}

impl EntityMap {
    fn new(table: &str, columns: &[&str]) -> Self {
        Self {
            table: table.to_string(),
            columns: columns
                .iter()
                .map(|column| (column.to_string(), column.to_string()))
                .collect(),
        }
    }
}

/// The two mandatory credential columns for primary login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialColumns {
    pub username: String,
    pub password: String,
}

/// Credential columns for API-key validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCredentialColumns {
    pub username: String,
    pub api_key: String,
}

/// Resolves logical entity and column names to physical ones.
///
/// [`Schema::default`] maps every logical name to itself; use
/// [`Schema::with_entity`] to remap individual entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    entities: BTreeMap<String, EntityMap>,
}

impl Default for Schema {
    fn default() -> Self {
        let mut entities = BTreeMap::new();
        entities.insert(
            entity::USERS.to_string(),
            EntityMap::new("users", &["id", "username", "password"]),
        );
        entities.insert(
            entity::ROLES.to_string(),
            EntityMap::new("roles", &["id", "name", "description", "is_admin"]),
        );
        entities.insert(
            entity::RESOURCES.to_string(),
            EntityMap::new("resources", &["id", "name", "description"]),
        );
        entities.insert(
            entity::USER_ROLE.to_string(),
            EntityMap::new("user_role", &["id", "user_id", "role_id"]),
        );
        entities.insert(
            entity::ROLE_RES_PERM.to_string(),
            EntityMap::new("role_res_perm", &["id", "role_id", "resource_id", "perm_id"]),
        );
        entities.insert(
            entity::USER_RES_PERM.to_string(),
            EntityMap::new(
                "user_res_perm",
                &["id", "user_id", "resource_id", "perm_id", "is_allow"],
            ),
        );
        entities.insert(
            entity::SESSIONS.to_string(),
            EntityMap::new(
                "sessions",
                &[
                    "id",
                    "uuid",
                    "user_id",
                    "ip_address",
                    "device",
                    "browser",
                    "platform",
                    "expire_at",
                    "created_at",
                ],
            ),
        );
        entities.insert(
            entity::API_KEYS.to_string(),
            EntityMap::new("api_keys", &["id", "username", "api_key"]),
        );
        entities.insert(
            entity::API_KEY_ROLE.to_string(),
            EntityMap::new("api_key_role", &["id", "api_key_id", "role_id"]),
        );
        Self { entities }
    }
}

impl Schema {
    /// Replace the mapping of one logical entity.
    pub fn with_entity(mut self, logical: impl Into<String>, map: EntityMap) -> Self {
        self.entities.insert(logical.into(), map);
        self
    }

    /// Physical table name for a logical entity.
    pub fn table(&self, logical: &str) -> Result<&str, ConfigError> {
        self.entities
            .get(logical)
            .map(|map| map.table.as_str())
            .ok_or_else(|| ConfigError::UnknownEntity(logical.to_string()))
    }

    /// Physical column name for a logical column of a logical entity.
    pub fn column(&self, logical_entity: &str, logical_column: &str) -> Result<&str, ConfigError> {
        let map = self
            .entities
            .get(logical_entity)
            .ok_or_else(|| ConfigError::UnknownEntity(logical_entity.to_string()))?;
        map.columns
            .get(logical_column)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::MissingColumn {
                entity: logical_entity.to_string(),
                column: logical_column.to_string(),
            })
    }

    /// The mandatory username/password columns for primary login.
    pub fn credential_columns(&self) -> Result<CredentialColumns, ConfigError> {
        Ok(CredentialColumns {
            username: self.column(entity::USERS, "username")?.to_string(),
            password: self.column(entity::USERS, "password")?.to_string(),
        })
    }

    /// The mandatory username/api_key columns for API-key validation.
    pub fn api_credential_columns(&self) -> Result<ApiCredentialColumns, ConfigError> {
        Ok(ApiCredentialColumns {
            username: self.column(entity::API_KEYS, "username")?.to_string(),
            api_key: self.column(entity::API_KEYS, "api_key")?.to_string(),
        })
    }
}
