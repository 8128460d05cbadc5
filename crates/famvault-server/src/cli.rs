//! CLI argument definitions for the FamVault binary.

use clap::{Parser, Subcommand, ValueEnum};

/// Store backend type
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Store {
    /// SurrealDB server over WebSocket
    Remote,
    /// Embedded in-memory engine (nothing survives the process)
    Memory,
}

/// FamVault tenant administration and login
#[derive(Parser, Debug)]
#[command(name = "famvault")]
#[command(about = "FamVault: multi-tenant family records backend")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings shared by every command
#[derive(clap::Args, Debug)]
pub struct Settings {
    /// Store backend to use
    #[arg(long, default_value = "remote", env = "FAMVAULT_STORE", global = true)]
    pub store: Store,

    /// SurrealDB endpoint
    #[arg(long, default_value = "127.0.0.1:8000", env = "FAMVAULT_DB_URL", global = true)]
    pub db_url: String,

    /// SurrealDB namespace shared by the directory and all tenant stores
    #[arg(long, default_value = "famvault", env = "FAMVAULT_DB_NAMESPACE", global = true)]
    pub db_namespace: String,

    /// SurrealDB root username
    #[arg(long, default_value = "root", env = "FAMVAULT_DB_USER", global = true)]
    pub db_user: String,

    /// SurrealDB root password
    #[arg(long, default_value = "root", env = "FAMVAULT_DB_PASS", global = true, hide_env_values = true)]
    pub db_pass: String,

    /// 64 hex characters (256-bit master key for field encryption)
    #[arg(long, env = "MASTER_ENCRYPTION_KEY", global = true, hide_env_values = true)]
    pub master_key: Option<String>,

    /// Token signing secret
    #[arg(long, env = "JWT_SECRET", global = true, hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Token issuer
    #[arg(long, default_value = "famvault", env = "JWT_ISSUER", global = true)]
    pub jwt_issuer: String,

    /// Access token lifetime in seconds
    #[arg(long, default_value_t = 3600, env = "ACCESS_TOKEN_TTL_SECS", global = true)]
    pub access_token_ttl_secs: u64,

    /// Pepper prepended to passwords before hashing
    #[arg(long, env = "PASSWORD_PEPPER", global = true, hide_env_values = true)]
    pub password_pepper: Option<String>,

    /// Fall back to fixed, publicly known secrets when none are configured.
    /// Local development only.
    #[arg(long, global = true)]
    pub insecure_dev_defaults: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a tenant and seed its administrator
    Provision(ProvisionArgs),
    /// Disable a tenant and release its store
    Offboard(OffboardArgs),
    /// Log in as an administrator or family member and print the token
    Login(LoginArgs),
    /// Validate a token and check it against required permissions
    Authorize(AuthorizeArgs),
}

/// Arguments for the provision command
#[derive(clap::Args, Debug)]
pub struct ProvisionArgs {
    /// Owner contact email (unique across tenants)
    #[arg(long)]
    pub email: String,

    /// Administrator username
    #[arg(long)]
    pub username: String,

    /// Administrator password
    #[arg(long, env = "FAMVAULT_ADMIN_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Display name (defaults to the username)
    #[arg(long)]
    pub display_name: Option<String>,
}

/// Arguments for the offboard command
#[derive(clap::Args, Debug)]
pub struct OffboardArgs {
    /// Six-digit tenant id
    pub tenant_id: String,
}

/// Arguments for the login command
#[derive(clap::Args, Debug)]
pub struct LoginArgs {
    /// Six-digit tenant id
    #[arg(short, long)]
    pub tenant_id: String,

    /// Admin username or email, or family member email
    #[arg(short, long)]
    pub user: String,

    /// Password (or, for members without one, date of birth as YYYYMMDD
    /// or contact number)
    #[arg(short, long, env = "FAMVAULT_LOGIN_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Arguments for the authorize command
#[derive(clap::Args, Debug)]
pub struct AuthorizeArgs {
    /// Access token to check
    #[arg(long, env = "FAMVAULT_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Required permission as `module:action`; repeatable
    #[arg(short, long = "require", value_parser = parse_requirement)]
    pub requirements: Vec<(String, String)>,
}

fn parse_requirement(value: &str) -> Result<(String, String), String> {
    match value.split_once(':') {
        Some((module, action)) if !module.is_empty() && !action.is_empty() => {
            Ok((module.to_string(), action.to_string()))
        }
        _ => Err(format!("expected `module:action`, got {value:?}")),
    }
}
