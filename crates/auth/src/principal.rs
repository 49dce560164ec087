use serde::{Deserialize, Serialize};

use crate::{Permission, Role};

/// Identity of an authenticated principal (the account's username).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully resolved principal for authorization decisions.
///
/// Effective permissions are the union of explicit grants and whatever the
/// principal's roles map to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub principal_id: PrincipalId,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

impl Principal {
    pub fn new(principal_id: PrincipalId, roles: Vec<Role>) -> Self {
        Self {
            principal_id,
            roles,
            permissions: Vec::new(),
        }
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permissions.push(permission);
        self
    }

    pub fn effective_permissions(&self) -> Vec<Permission> {
        let mut perms: Vec<Permission> = self
            .roles
            .iter()
            .flat_map(Role::permissions)
            .chain(self.permissions.iter().cloned())
            .collect();
        perms.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        perms.dedup();
        perms
    }
}
