//! Route-level authorization against a token's permission snapshot.
//!
//! The check is pure: it reads only the claims, never the role store,
//! so edits to a role take effect at the holder's next login.

use tracing::debug;

use crate::error::AuthError;
use crate::token::AccessTokenClaims;

/// One `{module_key, action}` pair a route declares it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRequirement {
    pub module_key: String,
    pub action: String,
}

impl PermissionRequirement {
    pub fn new(module_key: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            module_key: module_key.into(),
            action: action.into(),
        }
    }
}

/// Decide whether `claims` satisfy every requirement in `required`.
///
/// - No requirements: allowed.
/// - Admin principals: allowed without inspecting permissions.
/// - Empty permission snapshot: [`AuthError::NoPermissions`].
/// - Any requirement not granted by some entry: [`AuthError::PermissionDenied`].
pub fn authorize(
    claims: &AccessTokenClaims,
    required: &[PermissionRequirement],
) -> Result<(), AuthError> {
    if required.is_empty() || claims.is_admin() {
        return Ok(());
    }

    if claims.permissions.is_empty() {
        debug!(sub = %claims.sub, "Denied: token carries no permissions");
        return Err(AuthError::NoPermissions);
    }

    for requirement in required {
        let granted = claims
            .permissions
            .iter()
            .any(|p| p.allows(&requirement.module_key, &requirement.action));
        if !granted {
            debug!(
                sub = %claims.sub,
                module_key = %requirement.module_key,
                action = %requirement.action,
                "Denied: missing permission"
            );
            return Err(AuthError::PermissionDenied);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use famvault_core::models::role::ModulePermission;

    use super::*;
    use crate::token::PrincipalClaims;

    fn claims(principal: PrincipalClaims, permissions: Vec<ModulePermission>) -> AccessTokenClaims {
        AccessTokenClaims {
            sub: "subject".into(),
            tenant_id: "482913".into(),
            iss: "famvault".into(),
            iat: 0,
            exp: 0,
            jti: "jti".into(),
            permissions,
            principal,
        }
    }

    fn member(permissions: Vec<ModulePermission>) -> AccessTokenClaims {
        claims(
            PrincipalClaims::Member {
                name: "Asha".into(),
                email: "asha@example.com".into(),
                relation: None,
            },
            permissions,
        )
    }

    #[test]
    fn no_requirement_always_allows() {
        assert!(authorize(&member(vec![]), &[]).is_ok());
    }

    #[test]
    fn admin_bypasses_permissions() {
        let admin = claims(
            PrincipalClaims::Admin {
                username: "alice".into(),
                email: "alice@example.com".into(),
                roles: vec!["admin".into()],
            },
            vec![],
        );
        let required = [PermissionRequirement::new("loan", "delete")];
        assert!(authorize(&admin, &required).is_ok());
    }

    #[test]
    fn empty_snapshot_is_no_permissions() {
        let required = [PermissionRequirement::new("documents", "read")];
        assert!(matches!(
            authorize(&member(vec![]), &required),
            Err(AuthError::NoPermissions)
        ));
    }

    #[test]
    fn action_must_be_granted() {
        let token = member(vec![ModulePermission::new("documents", ["read"])]);

        assert!(authorize(&token, &[PermissionRequirement::new("documents", "read")]).is_ok());
        assert!(matches!(
            authorize(&token, &[PermissionRequirement::new("documents", "delete")]),
            Err(AuthError::PermissionDenied)
        ));
    }

    #[test]
    fn all_requirements_must_hold() {
        let token = member(vec![
            ModulePermission::new("documents", ["read"]),
            ModulePermission::new("family", ["read", "update"]),
        ]);

        let both = [
            PermissionRequirement::new("documents", "read"),
            PermissionRequirement::new("family", "update"),
        ];
        assert!(authorize(&token, &both).is_ok());

        let one_missing = [
            PermissionRequirement::new("documents", "read"),
            PermissionRequirement::new("loan", "read"),
        ];
        assert!(matches!(
            authorize(&token, &one_missing),
            Err(AuthError::PermissionDenied)
        ));
    }
}
