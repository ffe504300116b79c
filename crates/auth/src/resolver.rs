//! Role-based permission resolution with per-user overrides.
//!
//! Decision order, most specific first:
//!
//! 1. a `user_res_perm` row for the exact (user, resource, permission)
//!    triple is terminal and decides with its `is_allow` value, whether that
//!    value grants or denies;
//! 2. otherwise the user's roles are consulted and any role granting the
//!    (resource, permission) pair allows;
//! 3. otherwise the answer is deny.
//!
//! The public `is_allow` entry point is fail-closed: unknown permission ids,
//! unresolvable subjects or resources, and store failures all read as deny.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use palisade_core::{Permission, ResourceId, RoleId, UserId};
use palisade_store::{
    entity, row_bool, row_i64, row_str, ConfigError, Filter, Row, Schema, Store, StoreError,
};

use crate::error::AuthError;

/// A user referenced by id or by username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectRef {
    Id(UserId),
    Name(String),
}

impl From<UserId> for SubjectRef {
    fn from(id: UserId) -> Self {
        SubjectRef::Id(id)
    }
}

impl From<i64> for SubjectRef {
    fn from(id: i64) -> Self {
        SubjectRef::Id(UserId::new(id))
    }
}

impl From<&str> for SubjectRef {
    fn from(name: &str) -> Self {
        SubjectRef::Name(name.to_string())
    }
}

impl From<String> for SubjectRef {
    fn from(name: String) -> Self {
        SubjectRef::Name(name)
    }
}

/// A resource referenced by id or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRef {
    Id(ResourceId),
    Name(String),
}

impl From<ResourceId> for ResourceRef {
    fn from(id: ResourceId) -> Self {
        ResourceRef::Id(id)
    }
}

impl From<i64> for ResourceRef {
    fn from(id: i64) -> Self {
        ResourceRef::Id(ResourceId::new(id))
    }
}

impl From<&str> for ResourceRef {
    fn from(name: &str) -> Self {
        ResourceRef::Name(name.to_string())
    }
}

impl From<String> for ResourceRef {
    fn from(name: String) -> Self {
        ResourceRef::Name(name)
    }
}

/// A role referenced by id or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleRef {
    Id(RoleId),
    Name(String),
}

impl From<RoleId> for RoleRef {
    fn from(id: RoleId) -> Self {
        RoleRef::Id(id)
    }
}

impl From<i64> for RoleRef {
    fn from(id: i64) -> Self {
        RoleRef::Id(RoleId::new(id))
    }
}

impl From<&str> for RoleRef {
    fn from(name: &str) -> Self {
        RoleRef::Name(name.to_string())
    }
}

impl From<String> for RoleRef {
    fn from(name: String) -> Self {
        RoleRef::Name(name)
    }
}

/// A stored role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRecord {
    pub id: RoleId,
    pub name: String,
    pub description: Option<String>,
    pub is_admin: bool,
}

/// A stored resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub id: ResourceId,
    pub name: String,
    pub description: Option<String>,
}

/// A role to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRole {
    pub name: String,
    pub description: Option<String>,
    pub is_admin: bool,
}

impl NewRole {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            is_admin: false,
        }
    }

    pub fn admin(name: impl Into<String>) -> Self {
        Self {
            is_admin: true,
            ..Self::new(name)
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A resource to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResource {
    pub name: String,
    pub description: Option<String>,
}

impl NewResource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Permission resolver over the role graph.
pub struct Authorizer {
    store: Arc<dyn Store>,
    schema: Schema,
}

impl Authorizer {
    pub fn new(store: Arc<dyn Store>, schema: Schema) -> Result<Self, ConfigError> {
        // Every entity the resolver touches must be mapped up front.
        for ent in [
            entity::USERS,
            entity::ROLES,
            entity::RESOURCES,
            entity::USER_ROLE,
            entity::ROLE_RES_PERM,
            entity::USER_RES_PERM,
        ] {
            schema.table(ent)?;
        }
        Ok(Self { store, schema })
    }

    /// Whether `subject` may exercise `permission` on `resource`.
    /// Fail-closed: every failure path answers deny.
    pub fn is_allow(
        &self,
        subject: impl Into<SubjectRef>,
        permission: Permission,
        resource: impl Into<ResourceRef>,
    ) -> bool {
        match self.try_is_allow(subject.into(), permission, resource.into()) {
            Ok(allowed) => allowed,
            Err(err) => {
                debug!(error = %err, "permission check failed; denying");
                false
            }
        }
    }

    fn try_is_allow(
        &self,
        subject: SubjectRef,
        permission: Permission,
        resource: ResourceRef,
    ) -> Result<bool, AuthError> {
        let Some(user_id) = self.resolve_user(&subject)? else {
            return Ok(false);
        };
        let Some(resource_id) = self.resolve_resource(&resource)? else {
            return Ok(false);
        };
        self.decide(user_id, permission, resource_id)
    }

    fn decide(
        &self,
        user: UserId,
        permission: Permission,
        resource: ResourceId,
    ) -> Result<bool, AuthError> {
        // Per-user override first. A matching row is terminal either way.
        let overrides = self.schema.table(entity::USER_RES_PERM)?;
        let is_allow_col = self.schema.column(entity::USER_RES_PERM, "is_allow")?;
        let filter = Filter::new()
            .eq(self.schema.column(entity::USER_RES_PERM, "user_id")?, user.as_i64())
            .eq(
                self.schema.column(entity::USER_RES_PERM, "resource_id")?,
                resource.as_i64(),
            )
            .eq(
                self.schema.column(entity::USER_RES_PERM, "perm_id")?,
                permission.id().as_i64(),
            );
        let rows = self.store.select(overrides, &filter, &[is_allow_col])?;
        if let Some(row) = rows.first() {
            return Ok(row_bool(row, is_allow_col).unwrap_or(false));
        }

        // No override: any role granting the pair allows.
        for role_id in self.role_ids_of(user)? {
            let grants = self.schema.table(entity::ROLE_RES_PERM)?;
            let filter = Filter::new()
                .eq(self.schema.column(entity::ROLE_RES_PERM, "role_id")?, role_id.as_i64())
                .eq(
                    self.schema.column(entity::ROLE_RES_PERM, "resource_id")?,
                    resource.as_i64(),
                )
                .eq(
                    self.schema.column(entity::ROLE_RES_PERM, "perm_id")?,
                    permission.id().as_i64(),
                );
            if self.store.count(grants, &filter)? > 0 {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Grant `permission` on `resource` to `subject` as a per-user override.
    /// Skipped when the current decision already allows.
    pub fn allow_user(
        &self,
        subject: impl Into<SubjectRef>,
        permission: Permission,
        resource: impl Into<ResourceRef>,
    ) -> Result<(), AuthError> {
        self.set_user_override(subject.into(), permission, resource.into(), true)
    }

    /// Deny `permission` on `resource` to `subject` as a per-user override,
    /// shadowing every role grant. Skipped when the current decision already
    /// denies.
    pub fn disallow_user(
        &self,
        subject: impl Into<SubjectRef>,
        permission: Permission,
        resource: impl Into<ResourceRef>,
    ) -> Result<(), AuthError> {
        self.set_user_override(subject.into(), permission, resource.into(), false)
    }

    fn set_user_override(
        &self,
        subject: SubjectRef,
        permission: Permission,
        resource: ResourceRef,
        target: bool,
    ) -> Result<(), AuthError> {
        let user = self.resolve_user(&subject)?.ok_or(AuthError::InvalidIdentity)?;
        let resource = self
            .resolve_resource(&resource)?
            .ok_or(AuthError::InvalidIdentity)?;

        if self.decide(user, permission, resource)? == target {
            return Ok(());
        }

        let table = self.schema.table(entity::USER_RES_PERM)?.to_string();
        let user_col = self.schema.column(entity::USER_RES_PERM, "user_id")?;
        let res_col = self.schema.column(entity::USER_RES_PERM, "resource_id")?;
        let perm_col = self.schema.column(entity::USER_RES_PERM, "perm_id")?;
        let allow_col = self.schema.column(entity::USER_RES_PERM, "is_allow")?;

        let filter = Filter::new()
            .eq(user_col, user.as_i64())
            .eq(res_col, resource.as_i64())
            .eq(perm_col, permission.id().as_i64());

        let mut row = Row::new();
        row.insert(user_col.to_string(), json!(user.as_i64()));
        row.insert(res_col.to_string(), json!(resource.as_i64()));
        row.insert(perm_col.to_string(), json!(permission.id().as_i64()));
        row.insert(allow_col.to_string(), json!(target));

        self.store.upsert(&table, row, &filter)?;
        Ok(())
    }

    /// Grant `permission` on `resource` to every holder of `role`.
    pub fn allow_role(
        &self,
        role: impl Into<RoleRef>,
        permission: Permission,
        resource: impl Into<ResourceRef>,
    ) -> Result<(), AuthError> {
        let role = self
            .resolve_role(&role.into())?
            .ok_or(AuthError::InvalidIdentity)?;
        let resource = self
            .resolve_resource(&resource.into())?
            .ok_or(AuthError::InvalidIdentity)?;

        let table = self.schema.table(entity::ROLE_RES_PERM)?.to_string();
        let role_col = self.schema.column(entity::ROLE_RES_PERM, "role_id")?;
        let res_col = self.schema.column(entity::ROLE_RES_PERM, "resource_id")?;
        let perm_col = self.schema.column(entity::ROLE_RES_PERM, "perm_id")?;

        let filter = Filter::new()
            .eq(role_col, role.as_i64())
            .eq(res_col, resource.as_i64())
            .eq(perm_col, permission.id().as_i64());

        let mut row = Row::new();
        row.insert(role_col.to_string(), json!(role.as_i64()));
        row.insert(res_col.to_string(), json!(resource.as_i64()));
        row.insert(perm_col.to_string(), json!(permission.id().as_i64()));

        self.store.upsert(&table, row, &filter)?;
        Ok(())
    }

    /// Withdraw a role-level grant.
    pub fn disallow_role(
        &self,
        role: impl Into<RoleRef>,
        permission: Permission,
        resource: impl Into<ResourceRef>,
    ) -> Result<(), AuthError> {
        let role = self
            .resolve_role(&role.into())?
            .ok_or(AuthError::InvalidIdentity)?;
        let resource = self
            .resolve_resource(&resource.into())?
            .ok_or(AuthError::InvalidIdentity)?;

        let table = self.schema.table(entity::ROLE_RES_PERM)?;
        let filter = Filter::new()
            .eq(self.schema.column(entity::ROLE_RES_PERM, "role_id")?, role.as_i64())
            .eq(
                self.schema.column(entity::ROLE_RES_PERM, "resource_id")?,
                resource.as_i64(),
            )
            .eq(
                self.schema.column(entity::ROLE_RES_PERM, "perm_id")?,
                permission.id().as_i64(),
            );
        self.store.delete(table, &filter)?;
        Ok(())
    }

    /// Attach `subject` to each named role. Already-attached edges are kept
    /// as-is, so reassignment is idempotent.
    pub fn assign_roles(
        &self,
        subject: impl Into<SubjectRef>,
        roles: &[RoleRef],
    ) -> Result<(), AuthError> {
        let user = self
            .resolve_user(&subject.into())?
            .ok_or(AuthError::InvalidIdentity)?;

        let table = self.schema.table(entity::USER_ROLE)?.to_string();
        let user_col = self.schema.column(entity::USER_ROLE, "user_id")?;
        let role_col = self.schema.column(entity::USER_ROLE, "role_id")?;

        for role in roles {
            let role = self.resolve_role(role)?.ok_or(AuthError::InvalidIdentity)?;

            let filter = Filter::new()
                .eq(user_col, user.as_i64())
                .eq(role_col, role.as_i64());
            let mut row = Row::new();
            row.insert(user_col.to_string(), json!(user.as_i64()));
            row.insert(role_col.to_string(), json!(role.as_i64()));
            self.store.upsert(&table, row, &filter)?;
        }
        Ok(())
    }

    /// Detach `subject` from each named role.
    pub fn withdraw_roles(
        &self,
        subject: impl Into<SubjectRef>,
        roles: &[RoleRef],
    ) -> Result<(), AuthError> {
        let user = self
            .resolve_user(&subject.into())?
            .ok_or(AuthError::InvalidIdentity)?;

        let table = self.schema.table(entity::USER_ROLE)?.to_string();
        let user_col = self.schema.column(entity::USER_ROLE, "user_id")?;
        let role_col = self.schema.column(entity::USER_ROLE, "role_id")?;

        for role in roles {
            let role = self.resolve_role(role)?.ok_or(AuthError::InvalidIdentity)?;
            let filter = Filter::new()
                .eq(user_col, user.as_i64())
                .eq(role_col, role.as_i64());
            self.store.delete(&table, &filter)?;
        }
        Ok(())
    }

    /// The roles attached to `subject`.
    pub fn user_roles(&self, subject: impl Into<SubjectRef>) -> Result<Vec<RoleRecord>, AuthError> {
        let Some(user) = self.resolve_user(&subject.into())? else {
            return Ok(Vec::new());
        };
        let ids = self.role_ids_of(user)?;
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(role) = self.role_by_id(id)? {
                out.push(role);
            }
        }
        Ok(out)
    }

    /// Whether `subject` holds any role flagged as admin. Fail-closed.
    pub fn is_admin(&self, subject: impl Into<SubjectRef>) -> bool {
        let subject = subject.into();
        match self.user_roles(subject) {
            Ok(roles) => roles.iter().any(|role| role.is_admin),
            Err(err) => {
                debug!(error = %err, "admin check failed; denying");
                false
            }
        }
    }

    /// Whether `subject` holds `role`.
    pub fn has_role(
        &self,
        subject: impl Into<SubjectRef>,
        role: impl Into<RoleRef>,
    ) -> Result<bool, AuthError> {
        let Some(user) = self.resolve_user(&subject.into())? else {
            return Ok(false);
        };
        let Some(role) = self.resolve_role(&role.into())? else {
            return Ok(false);
        };

        let table = self.schema.table(entity::USER_ROLE)?;
        let filter = Filter::new()
            .eq(self.schema.column(entity::USER_ROLE, "user_id")?, user.as_i64())
            .eq(self.schema.column(entity::USER_ROLE, "role_id")?, role.as_i64());
        Ok(self.store.count(table, &filter)? > 0)
    }

    /// Whether a resource with this reference exists.
    pub fn has_resource(&self, resource: impl Into<ResourceRef>) -> Result<bool, AuthError> {
        Ok(self.resolve_resource(&resource.into())?.is_some())
    }

    /// All stored roles.
    pub fn roles(&self) -> Result<Vec<RoleRecord>, AuthError> {
        let table = self.schema.table(entity::ROLES)?;
        let rows = self.store.select(table, &Filter::new(), &[])?;
        rows.iter().map(|row| self.decode_role(row)).collect()
    }

    /// The roles flagged as admin.
    pub fn admin_roles(&self) -> Result<Vec<RoleRecord>, AuthError> {
        Ok(self.roles()?.into_iter().filter(|r| r.is_admin).collect())
    }

    pub fn role_names(&self) -> Result<Vec<String>, AuthError> {
        Ok(self.roles()?.into_iter().map(|r| r.name).collect())
    }

    pub fn admin_role_names(&self) -> Result<Vec<String>, AuthError> {
        Ok(self.admin_roles()?.into_iter().map(|r| r.name).collect())
    }

    /// All stored resources.
    pub fn resources(&self) -> Result<Vec<ResourceRecord>, AuthError> {
        let table = self.schema.table(entity::RESOURCES)?;
        let rows = self.store.select(table, &Filter::new(), &[])?;
        rows.iter().map(|row| self.decode_resource(row)).collect()
    }

    pub fn resource_names(&self) -> Result<Vec<String>, AuthError> {
        Ok(self.resources()?.into_iter().map(|r| r.name).collect())
    }

    /// Create roles. Existing names are left untouched.
    pub fn add_roles(&self, roles: &[NewRole]) -> Result<(), AuthError> {
        let table = self.schema.table(entity::ROLES)?.to_string();
        let name_col = self.schema.column(entity::ROLES, "name")?;
        let desc_col = self.schema.column(entity::ROLES, "description")?;
        let admin_col = self.schema.column(entity::ROLES, "is_admin")?;

        for role in roles {
            let filter = Filter::new().eq(name_col, role.name.as_str());
            if self.store.count(&table, &filter)? > 0 {
                continue;
            }
            let mut row = Row::new();
            row.insert(name_col.to_string(), json!(role.name));
            row.insert(desc_col.to_string(), json!(role.description));
            row.insert(admin_col.to_string(), json!(role.is_admin));
            self.store.insert(&table, row)?;
        }
        Ok(())
    }

    /// Delete roles along with their grant and membership edges.
    pub fn remove_roles(&self, roles: &[RoleRef]) -> Result<(), AuthError> {
        for role in roles {
            let Some(id) = self.resolve_role(role)? else {
                continue;
            };

            let grants = self.schema.table(entity::ROLE_RES_PERM)?;
            let grant_role_col = self.schema.column(entity::ROLE_RES_PERM, "role_id")?;
            self.store
                .delete(grants, &Filter::new().eq(grant_role_col, id.as_i64()))?;

            let memberships = self.schema.table(entity::USER_ROLE)?;
            let member_role_col = self.schema.column(entity::USER_ROLE, "role_id")?;
            self.store
                .delete(memberships, &Filter::new().eq(member_role_col, id.as_i64()))?;

            let table = self.schema.table(entity::ROLES)?;
            let id_col = self.schema.column(entity::ROLES, "id")?;
            self.store
                .delete(table, &Filter::new().eq(id_col, id.as_i64()))?;
        }
        Ok(())
    }

    /// Create resources. Existing names are left untouched.
    pub fn add_resources(&self, resources: &[NewResource]) -> Result<(), AuthError> {
        let table = self.schema.table(entity::RESOURCES)?.to_string();
        let name_col = self.schema.column(entity::RESOURCES, "name")?;
        let desc_col = self.schema.column(entity::RESOURCES, "description")?;

        for resource in resources {
            let filter = Filter::new().eq(name_col, resource.name.as_str());
            if self.store.count(&table, &filter)? > 0 {
                continue;
            }
            let mut row = Row::new();
            row.insert(name_col.to_string(), json!(resource.name));
            row.insert(desc_col.to_string(), json!(resource.description));
            self.store.insert(&table, row)?;
        }
        Ok(())
    }

    /// Delete resources along with every grant and override touching them.
    pub fn remove_resources(&self, resources: &[ResourceRef]) -> Result<(), AuthError> {
        for resource in resources {
            let Some(id) = self.resolve_resource(resource)? else {
                continue;
            };

            let grants = self.schema.table(entity::ROLE_RES_PERM)?;
            let grant_res_col = self.schema.column(entity::ROLE_RES_PERM, "resource_id")?;
            self.store
                .delete(grants, &Filter::new().eq(grant_res_col, id.as_i64()))?;

            let overrides = self.schema.table(entity::USER_RES_PERM)?;
            let override_res_col = self.schema.column(entity::USER_RES_PERM, "resource_id")?;
            self.store
                .delete(overrides, &Filter::new().eq(override_res_col, id.as_i64()))?;

            let table = self.schema.table(entity::RESOURCES)?;
            let id_col = self.schema.column(entity::RESOURCES, "id")?;
            self.store
                .delete(table, &Filter::new().eq(id_col, id.as_i64()))?;
        }
        Ok(())
    }

    pub(crate) fn resolve_user(&self, subject: &SubjectRef) -> Result<Option<UserId>, AuthError> {
        match subject {
            SubjectRef::Id(id) => {
                let table = self.schema.table(entity::USERS)?;
                let id_col = self.schema.column(entity::USERS, "id")?;
                let filter = Filter::new().eq(id_col, id.as_i64());
                Ok((self.store.count(table, &filter)? == 1).then_some(*id))
            }
            SubjectRef::Name(name) => {
                let table = self.schema.table(entity::USERS)?;
                let id_col = self.schema.column(entity::USERS, "id")?;
                let name_col = self.schema.column(entity::USERS, "username")?;
                let filter = Filter::new().eq(name_col, name.as_str());
                let rows = self.store.select(table, &filter, &[id_col])?;
                if rows.len() != 1 {
                    return Ok(None);
                }
                let id = row_i64(&rows[0], id_col)
                    .ok_or_else(|| StoreError::MissingColumn(id_col.to_string()))?;
                Ok(Some(UserId::new(id)))
            }
        }
    }

    fn resolve_resource(&self, resource: &ResourceRef) -> Result<Option<ResourceId>, AuthError> {
        match resource {
            ResourceRef::Id(id) => {
                let table = self.schema.table(entity::RESOURCES)?;
                let id_col = self.schema.column(entity::RESOURCES, "id")?;
                let filter = Filter::new().eq(id_col, id.as_i64());
                Ok((self.store.count(table, &filter)? == 1).then_some(*id))
            }
            ResourceRef::Name(name) => {
                let table = self.schema.table(entity::RESOURCES)?;
                let id_col = self.schema.column(entity::RESOURCES, "id")?;
                let name_col = self.schema.column(entity::RESOURCES, "name")?;
                let filter = Filter::new().eq(name_col, name.as_str());
                let rows = self.store.select(table, &filter, &[id_col])?;
                if rows.len() != 1 {
                    return Ok(None);
                }
                let id = row_i64(&rows[0], id_col)
                    .ok_or_else(|| StoreError::MissingColumn(id_col.to_string()))?;
                Ok(Some(ResourceId::new(id)))
            }
        }
    }

    fn resolve_role(&self, role: &RoleRef) -> Result<Option<RoleId>, AuthError> {
        match role {
            RoleRef::Id(id) => {
                let table = self.schema.table(entity::ROLES)?;
                let id_col = self.schema.column(entity::ROLES, "id")?;
                let filter = Filter::new().eq(id_col, id.as_i64());
                Ok((self.store.count(table, &filter)? == 1).then_some(*id))
            }
            RoleRef::Name(name) => {
                let table = self.schema.table(entity::ROLES)?;
                let id_col = self.schema.column(entity::ROLES, "id")?;
                let name_col = self.schema.column(entity::ROLES, "name")?;
                let filter = Filter::new().eq(name_col, name.as_str());
                let rows = self.store.select(table, &filter, &[id_col])?;
                if rows.len() != 1 {
                    return Ok(None);
                }
                let id = row_i64(&rows[0], id_col)
                    .ok_or_else(|| StoreError::MissingColumn(id_col.to_string()))?;
                Ok(Some(RoleId::new(id)))
            }
        }
    }

    fn role_ids_of(&self, user: UserId) -> Result<Vec<RoleId>, AuthError> {
        let table = self.schema.table(entity::USER_ROLE)?;
        let user_col = self.schema.column(entity::USER_ROLE, "user_id")?;
        let role_col = self.schema.column(entity::USER_ROLE, "role_id")?;
        let rows = self.store.select(
            table,
            &Filter::new().eq(user_col, user.as_i64()),
            &[role_col],
        )?;
        rows.iter()
            .map(|row| {
                row_i64(row, role_col)
                    .map(RoleId::new)
                    .ok_or_else(|| StoreError::MissingColumn(role_col.to_string()).into())
            })
            .collect()
    }

    fn role_by_id(&self, id: RoleId) -> Result<Option<RoleRecord>, AuthError> {
        let table = self.schema.table(entity::ROLES)?;
        let id_col = self.schema.column(entity::ROLES, "id")?;
        let rows = self
            .store
            .select(table, &Filter::new().eq(id_col, id.as_i64()), &[])?;
        rows.first().map(|row| self.decode_role(row)).transpose()
    }

    fn decode_role(&self, row: &Row) -> Result<RoleRecord, AuthError> {
        let id_col = self.schema.column(entity::ROLES, "id")?;
        let name_col = self.schema.column(entity::ROLES, "name")?;
        let desc_col = self.schema.column(entity::ROLES, "description")?;
        let admin_col = self.schema.column(entity::ROLES, "is_admin")?;
        Ok(RoleRecord {
            id: RoleId::new(
                row_i64(row, id_col).ok_or_else(|| StoreError::MissingColumn(id_col.to_string()))?,
            ),
            name: row_str(row, name_col)
                .ok_or_else(|| StoreError::MissingColumn(name_col.to_string()))?
                .to_string(),
            description: row_str(row, desc_col).map(str::to_string),
            is_admin: row_bool(row, admin_col).unwrap_or(false),
        })
    }

    fn decode_resource(&self, row: &Row) -> Result<ResourceRecord, AuthError> {
        let id_col = self.schema.column(entity::RESOURCES, "id")?;
        let name_col = self.schema.column(entity::RESOURCES, "name")?;
        let desc_col = self.schema.column(entity::RESOURCES, "description")?;
        Ok(ResourceRecord {
            id: ResourceId::new(
                row_i64(row, id_col).ok_or_else(|| StoreError::MissingColumn(id_col.to_string()))?,
            ),
            name: row_str(row, name_col)
                .ok_or_else(|| StoreError::MissingColumn(name_col.to_string()))?
                .to_string(),
            description: row_str(row, desc_col).map(str::to_string),
        })
    }
}
