//! Wiring of the directory, tenant registry and auth service, plus the
//! command handlers that drive them.

use std::sync::Arc;

use famvault_auth::password::check_password_policy;
use famvault_auth::{AuthConfig, AuthService, LoginInput, PermissionRequirement};
use famvault_core::error::{VaultError, VaultResult};
use famvault_crypto::MasterKey;
use famvault_db::repository::SurrealTenantDirectory;
use famvault_db::{ProvisionTenant, StoreConnector, TenantConnectionRegistry, TenantProvisioner};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::cli::{AuthorizeArgs, Commands, LoginArgs, ProvisionArgs, Settings};

/// Publicly known development secrets. Never valid outside local use.
const DEV_MASTER_KEY_HEX: &str =
    "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
const DEV_JWT_SECRET: &str = "famvault-insecure-development-secret";

/// Secrets resolved from the environment.
pub struct Secrets {
    pub master: Arc<MasterKey>,
    pub auth: AuthConfig,
}

impl Secrets {
    pub fn resolve(settings: &Settings) -> VaultResult<Self> {
        let master_hex = match (&settings.master_key, settings.insecure_dev_defaults) {
            (Some(hex), _) if !hex.trim().is_empty() => hex.clone(),
            (_, true) => {
                warn!("MASTER_ENCRYPTION_KEY not set, using the INSECURE development key");
                DEV_MASTER_KEY_HEX.to_string()
            }
            (_, false) => {
                return Err(VaultError::Config(
                    "MASTER_ENCRYPTION_KEY is required".into(),
                ));
            }
        };

        let jwt_secret = match (&settings.jwt_secret, settings.insecure_dev_defaults) {
            (Some(secret), _) if !secret.is_empty() => secret.clone(),
            (_, true) => {
                warn!("JWT_SECRET not set, using the INSECURE development secret");
                DEV_JWT_SECRET.to_string()
            }
            (_, false) => return Err(VaultError::Config("JWT_SECRET is required".into())),
        };

        let master = MasterKey::from_hex(&master_hex)
            .map_err(|e| VaultError::Config(format!("MASTER_ENCRYPTION_KEY: {e}")))?;

        Ok(Self {
            master: Arc::new(master),
            auth: AuthConfig {
                jwt_secret,
                jwt_issuer: settings.jwt_issuer.clone(),
                access_token_lifetime_secs: settings.access_token_ttl_secs,
                pepper: settings.password_pepper.clone(),
                ..Default::default()
            },
        })
    }
}

/// Everything a command needs, built over one store connector.
pub struct App<K: StoreConnector> {
    directory: Arc<SurrealTenantDirectory<K::Conn>>,
    registry: Arc<TenantConnectionRegistry<K>>,
    auth: AuthService<SurrealTenantDirectory<K::Conn>, K>,
}

impl<K: StoreConnector> App<K> {
    pub async fn open(connector: K, secrets: Secrets) -> VaultResult<Self> {
        let directory = Arc::new(SurrealTenantDirectory::open(&connector).await?);

        let mut registry = TenantConnectionRegistry::new(connector, secrets.master);
        if let Some(pepper) = &secrets.auth.pepper {
            registry = registry.with_pepper(pepper.clone());
        }
        let registry = Arc::new(registry);

        let auth = AuthService::new(Arc::clone(&directory), Arc::clone(&registry), secrets.auth);

        Ok(Self {
            directory,
            registry,
            auth,
        })
    }

    pub async fn run(&self, command: Commands) -> VaultResult<Value> {
        match command {
            Commands::Provision(args) => self.provision(args).await,
            Commands::Offboard(args) => {
                let tenant = self.provisioner().offboard(&args.tenant_id).await?;
                Ok(json!({ "tenant": tenant }))
            }
            Commands::Login(args) => self.login(args).await,
            Commands::Authorize(args) => self.authorize(args),
        }
    }

    /// Close every tenant store opened by this process.
    pub async fn shutdown(&self) {
        self.registry.shutdown().await;
    }

    fn provisioner(&self) -> TenantProvisioner<SurrealTenantDirectory<K::Conn>, K> {
        TenantProvisioner::new(Arc::clone(&self.directory), Arc::clone(&self.registry))
    }

    async fn provision(&self, args: ProvisionArgs) -> VaultResult<Value> {
        check_password_policy(&args.password, self.auth.config())?;

        let provisioned = self
            .provisioner()
            .provision(ProvisionTenant {
                email: args.email,
                username: args.username,
                password: args.password,
                display_name: args.display_name,
            })
            .await?;

        Ok(json!({
            "tenant": provisioned.tenant,
            "admin": provisioned.admin,
        }))
    }

    async fn login(&self, args: LoginArgs) -> VaultResult<Value> {
        let output = self
            .auth
            .login(LoginInput {
                tenant_id: args.tenant_id,
                username_or_email: args.user,
                password: args.password,
            })
            .await?;

        serde_json::to_value(&output).map_err(|e| VaultError::Internal(e.to_string()))
    }

    fn authorize(&self, args: AuthorizeArgs) -> VaultResult<Value> {
        let validated = famvault_auth::validate_access_token(&args.token, self.auth.config())?;
        let required: Vec<PermissionRequirement> = args
            .requirements
            .into_iter()
            .map(|(module, action)| PermissionRequirement::new(module, action))
            .collect();

        famvault_auth::authorize(validated.claims(), &required)?;
        info!(sub = %validated.claims().sub, "Token authorized");

        Ok(json!({
            "allowed": true,
            "tenant_id": validated.claims().tenant_id,
            "role": validated.claims().role(),
        }))
    }
}
