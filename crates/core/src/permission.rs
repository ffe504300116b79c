use serde::{Deserialize, Serialize};

use crate::PermissionId;

/// The built-in permission set.
///
/// The wire representation is the integer id (1–4); anything outside the
/// recognized set is rejected by the authorization resolver.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Create,
    Read,
    Update,
    Delete,
}

impl Permission {
    pub const ALL: [Permission; 4] = [
        Permission::Create,
        Permission::Read,
        Permission::Update,
        Permission::Delete,
    ];

    pub const fn id(self) -> PermissionId {
        match self {
            Permission::Create => PermissionId::new(1),
            Permission::Read => PermissionId::new(2),
            Permission::Update => PermissionId::new(3),
            Permission::Delete => PermissionId::new(4),
        }
    }

    /// Map an integer id back to a built-in permission, if recognized.
    pub const fn from_id(id: PermissionId) -> Option<Self> {
        match id.as_i64() {
            1 => Some(Permission::Create),
            2 => Some(Permission::Read),
            3 => Some(Permission::Update),
            4 => Some(Permission::Delete),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Permission::Create => "create",
            Permission::Read => "read",
            Permission::Update => "update",
            Permission::Delete => "delete",
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Permission> for PermissionId {
    fn from(value: Permission) -> Self {
        value.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for perm in Permission::ALL {
            assert_eq!(Permission::from_id(perm.id()), Some(perm));
        }
    }

    #[test]
    fn unknown_ids_are_rejected() {
        assert_eq!(Permission::from_id(PermissionId::new(0)), None);
        assert_eq!(Permission::from_id(PermissionId::new(5)), None);
        assert_eq!(Permission::from_id(PermissionId::new(-1)), None);
    }
}
