//! Authentication service: tenant resolution, two-tier credential
//! checks and token issuance.

use std::sync::Arc;

use famvault_core::error::VaultResult;
use famvault_core::models::admin_user::AdminUser;
use famvault_core::models::family_member::FamilyMember;
use famvault_core::models::role::ModulePermission;
use famvault_core::repository::{
    AdminUserRepository, FamilyMemberRepository, ReadOptions, RoleRepository, TenantDirectory,
};
use famvault_db::{StoreConnector, TenantConnectionRegistry, TenantStore};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token::{self, PrincipalClaims};

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub tenant_id: String,
    pub username_or_email: String,
    pub password: String,
}

/// Sanitized view of the authenticated principal. Never carries a
/// password hash.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Principal {
    Admin {
        id: Uuid,
        username: String,
        email: String,
        roles: Vec<String>,
    },
    Member {
        id: Uuid,
        name: String,
        email: String,
        relation: Option<String>,
    },
}

impl Principal {
    pub fn id(&self) -> Uuid {
        match self {
            Principal::Admin { id, .. } | Principal::Member { id, .. } => *id,
        }
    }

    pub fn role(&self) -> &'static str {
        match self {
            Principal::Admin { .. } => "admin",
            Principal::Member { .. } => "member",
        }
    }

    fn claims(&self) -> PrincipalClaims {
        match self {
            Principal::Admin {
                username,
                email,
                roles,
                ..
            } => PrincipalClaims::Admin {
                username: username.clone(),
                email: email.clone(),
                roles: roles.clone(),
            },
            Principal::Member {
                name,
                email,
                relation,
                ..
            } => PrincipalClaims::Member {
                name: name.clone(),
                email: email.clone(),
                relation: relation.clone(),
            },
        }
    }
}

impl From<&AdminUser> for Principal {
    fn from(user: &AdminUser) -> Self {
        Principal::Admin {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            roles: user.roles.clone(),
        }
    }
}

impl From<&FamilyMember> for Principal {
    fn from(member: &FamilyMember) -> Self {
        Principal::Member {
            id: member.id,
            name: member.name.clone(),
            email: member.email.clone(),
            relation: member.relation.clone(),
        }
    }
}

/// Successful login result.
#[derive(Debug, Serialize)]
pub struct LoginOutput {
    pub message: String,
    /// Signed JWT access token.
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    pub principal: Principal,
}

/// Authentication service.
///
/// Resolves the tenant through the central directory, then checks
/// credentials against that tenant's own store.
pub struct AuthService<D: TenantDirectory, K: StoreConnector> {
    directory: Arc<D>,
    registry: Arc<TenantConnectionRegistry<K>>,
    config: AuthConfig,
}

impl<D: TenantDirectory, K: StoreConnector> AuthService<D, K> {
    pub fn new(
        directory: Arc<D>,
        registry: Arc<TenantConnectionRegistry<K>>,
        config: AuthConfig,
    ) -> Self {
        Self {
            directory,
            registry,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Authenticate an admin user or family member and issue an access
    /// token carrying the role's permission snapshot.
    pub async fn login(&self, input: LoginInput) -> VaultResult<LoginOutput> {
        if input.password.is_empty() {
            return Err(AuthError::InvalidCredentials.into());
        }

        let tenant = self
            .directory
            .get_by_tenant_id(&input.tenant_id)
            .await?
            .filter(|t| t.enabled)
            .ok_or(AuthError::InvalidTenant)?;

        let store = self
            .registry
            .get_or_create_connection(&tenant.tenant_id)
            .await?;

        let principal = match self.resolve(&store, &input).await {
            Ok(principal) => principal,
            Err(e) => {
                info!(tenant_id = %tenant.tenant_id, "Login failed");
                return Err(e);
            }
        };

        let role = principal.role();
        let permissions = self.load_permissions(&store, role).await?;

        let access_token = token::issue_access_token(
            principal.id(),
            &tenant.tenant_id,
            principal.claims(),
            permissions,
            &self.config,
        )?;

        info!(
            tenant_id = %tenant.tenant_id,
            subject = %principal.id(),
            role,
            "Login successful"
        );

        Ok(LoginOutput {
            message: format!("Login successful as {role}"),
            access_token,
            expires_in: self.config.access_token_lifetime_secs,
            principal,
        })
    }

    /// Admin users first, then family members. Every failure past this
    /// point is reported as `InvalidCredentials`.
    async fn resolve(
        &self,
        store: &TenantStore<K::Conn>,
        input: &LoginInput,
    ) -> VaultResult<Principal> {
        let admin = store
            .admin_users()
            .find_by_username_or_email(&input.username_or_email)
            .await?;

        if let Some(user) = admin {
            if !self.check_hash(&input.password, &user.password_hash, user.id) {
                return Err(AuthError::InvalidCredentials.into());
            }
            return Ok(Principal::from(&user));
        }

        let member = store
            .family_members()
            .find_by_email(
                &input.username_or_email,
                &ReadOptions::for_tenant(store.tenant_id()),
            )
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let accepted = match member.password_hash.as_deref() {
            Some(hash) if !hash.is_empty() => self.check_hash(&input.password, hash, member.id),
            _ => fallback_matches(&member, &input.password),
        };

        if !accepted {
            return Err(AuthError::InvalidCredentials.into());
        }
        Ok(Principal::from(&member))
    }

    /// Malformed or missing hashes count as a mismatch.
    fn check_hash(&self, password: &str, hash: &str, subject: Uuid) -> bool {
        if hash.is_empty() {
            warn!(subject = %subject, "Credential record has no password hash");
            return false;
        }
        match password::verify_password(password, hash, self.config.pepper.as_deref()) {
            Ok(valid) => valid,
            Err(e) => {
                warn!(subject = %subject, error = %e, "Malformed password hash");
                false
            }
        }
    }

    async fn load_permissions(
        &self,
        store: &TenantStore<K::Conn>,
        role: &str,
    ) -> VaultResult<Vec<ModulePermission>> {
        Ok(store
            .roles()
            .find_active_by_name(role)
            .await?
            .map(|r| r.permissions)
            .unwrap_or_default())
    }
}

/// Password-less members authenticate with their date of birth as
/// `YYYYMMDD` or their exact contact number. Neither is a secret.
fn fallback_matches(member: &FamilyMember, password: &str) -> bool {
    let dob_matches = member
        .date_of_birth
        .is_some_and(|dob| dob.format("%Y%m%d").to_string() == password);
    let contact_matches = member
        .contact_number
        .as_deref()
        .is_some_and(|number| !number.is_empty() && number == password);
    dob_matches || contact_matches
}
