//! FamVault Auth: password verification, two-tier login, JWT
//! issuance/validation and permission checks.

pub mod authorize;
pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use authorize::{PermissionRequirement, authorize};
pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthService, LoginInput, LoginOutput, Principal};
pub use token::{AccessTokenClaims, PrincipalClaims, ValidatedClaims, validate_access_token};
