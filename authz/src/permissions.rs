//! Static role → permission table.
//!
//! | Role   | Permissions                                                 |
//! |--------|-------------------------------------------------------------|
//! | admin  | read, write, delete, manage:users, manage:api-keys          |
//! | member | read, write, delete, manage:api-keys                        |
//! | viewer | read                                                        |
//!
//! Permissions are listed per role instead of being derived from a role
//! hierarchy: roles here are not strictly nested.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use tracing::debug;
use user::{Identity, Role};

use crate::error::{AuthzError, Result};
use crate::types::Permission;

static NO_PERMISSIONS: BTreeSet<Permission> = BTreeSet::new();

/// Immutable mapping from every enumerated role to its permission set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionTable {
    entries: BTreeMap<Role, BTreeSet<Permission>>,
}

impl PermissionTable {
    /// Builds a table, failing if any role in `Role::ALL` has no entry.
    pub fn validated(entries: BTreeMap<Role, BTreeSet<Permission>>) -> Result<Self> {
        if let Some(missing) = Role::ALL.iter().find(|role| !entries.contains_key(role)) {
            return Err(AuthzError::MissingRoleEntry(*missing));
        }
        Ok(Self { entries })
    }

    /// The table shipped with Trellis.
    pub fn builtin() -> Result<Self> {
        let entries = BTreeMap::from([
            (
                Role::Admin,
                BTreeSet::from([
                    Permission::READ,
                    Permission::WRITE,
                    Permission::DELETE,
                    Permission::MANAGE_USERS,
                    Permission::MANAGE_API_KEYS,
                ]),
            ),
            (
                Role::Member,
                BTreeSet::from([
                    Permission::READ,
                    Permission::WRITE,
                    Permission::DELETE,
                    Permission::MANAGE_API_KEYS,
                ]),
            ),
            (Role::Viewer, BTreeSet::from([Permission::READ])),
        ]);
        Self::validated(entries)
    }

    /// Permissions granted to `role`; empty when the role has no entry.
    pub fn permissions_for(&self, role: Role) -> &BTreeSet<Permission> {
        self.entries.get(&role).unwrap_or(&NO_PERMISSIONS)
    }

    /// Same as `permissions_for`, keyed by a raw role name.
    ///
    /// Unknown names fail closed with the empty set.
    pub fn permissions_for_name(&self, role: &str) -> &BTreeSet<Permission> {
        match Role::from_str(role) {
            Ok(role) => self.permissions_for(role),
            Err(_) => {
                debug!("No permissions for unknown role: {}", role);
                &NO_PERMISSIONS
            }
        }
    }

    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.entries.keys().copied()
    }

    pub fn has_permission(&self, identity: &Identity, permission: &Permission) -> bool {
        self.permissions_for(identity.role).contains(permission)
    }
}
