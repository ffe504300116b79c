//! Strongly-typed identifiers used across the toolkit.
//!
//! Identities, roles, resources and permissions are keyed by integers in the
//! backing relational store, so these are thin `i64` newtypes rather than
//! UUIDs. Session records are the exception and carry a `uuid::Uuid` of their
//! own (see the auth crate).

use serde::{Deserialize, Serialize};

/// Identifier of a user (authentication subject).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

/// Identifier of a role.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(i64);

/// Identifier of an authorizable resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(i64);

/// Identifier of a permission.
///
/// The built-in permission set is closed (see [`crate::Permission`]), but
/// extended deployments pass permissions around as raw integers, so the id is
/// its own type rather than the enum.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionId(i64);

macro_rules! impl_i64_newtype {
    ($t:ty) => {
        impl $t {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }
    };
}

impl_i64_newtype!(UserId);
impl_i64_newtype!(RoleId);
impl_i64_newtype!(ResourceId);
impl_i64_newtype!(PermissionId);
