use thiserror::Error;

use crate::{Permission, Principal};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Authorize a principal for one permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    let granted = principal
        .effective_permissions()
        .iter()
        .any(|p| p.is_wildcard() || p == required);

    if granted {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PrincipalId, Role};

    fn principal(roles: Vec<Role>) -> Principal {
        Principal::new(PrincipalId::new("someone"), roles)
    }

    #[test]
    fn admin_wildcard_allows_purge() {
        let admin = principal(vec![Role::ADMIN]);
        assert!(authorize(&admin, &Permission::CATALOG_PURGE).is_ok());
    }

    #[test]
    fn clerk_is_forbidden_to_purge() {
        let clerk = principal(vec![Role::CLERK]);
        assert_eq!(
            authorize(&clerk, &Permission::CATALOG_PURGE),
            Err(AuthzError::Forbidden("catalog.purge".to_string()))
        );
        assert!(authorize(&clerk, &Permission::SALES_RECORD).is_ok());
    }

    #[test]
    fn explicit_grant_without_role_is_honored() {
        let p = principal(vec![]).with_permission(Permission::CATALOG_PURGE);
        assert!(authorize(&p, &Permission::CATALOG_PURGE).is_ok());
    }

    #[test]
    fn no_roles_no_access() {
        let nobody = principal(vec![]);
        assert!(authorize(&nobody, &Permission::CATALOG_READ).is_err());
    }
}
