//! Configuration module for invl-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables. Also handles admin secret hashing.

pub mod file;
pub mod runtime;

use crate::config::file::{FileConfig, TenantConfig as FileTenantConfig};
use crate::config::runtime::{
    AdminConfig, PlatformConfig, ReconciliationWindow, ServerConfig, SharedConfig, TenantConfig,
    TenantDirectory,
};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use time::UtcOffset;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("password hashing error: {0}")]
    HashError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub platform: PlatformConfig,
    pub admin: AdminConfig,
    pub tenants: TenantDirectory,
    pub reconciliation: ReconciliationWindow,
}

impl LoadedConfig {
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig::new(
            self.server,
            self.platform,
            self.admin,
            self.tenants,
            self.reconciliation,
        )
    }

    /// Push the reloadable sections into a running configuration.
    ///
    /// `server` and `platform` need a restart and are ignored here.
    pub async fn apply_to(self, shared: &SharedConfig) {
        shared
            .reload(self.admin, self.tenants, self.reconciliation)
            .await;
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Validate the configuration
    /// 3. Hash the admin secret if it's plaintext (and rewrite the file)
    /// 4. Apply CLI overrides
    /// 5. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        validate(&file_config)?;

        let secret_hash = if file_config.is_admin_secret_hashed() {
            file_config.admin.secret.clone()
        } else {
            let hash = hash_secret(&file_config.admin.secret)?;
            file_config.admin.secret = hash.clone();
            self.rewrite_config(&file_config)?;
            tracing::info!("Admin secret hashed and config file updated");
            hash
        };

        // Applied after the rewrite so the override never lands in the file.
        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        build_loaded_config(file_config, secret_hash)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn rewrite_config(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)?;

        // Write to a sibling temp file, then rename over the original.
        let temp_path = self.config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, toml_string)?;
        std::fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.admin.secret.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "admin secret must not be empty".into(),
        ));
    }
    if config.platform.request_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "platform request timeout must be positive".into(),
        ));
    }
    if config.reconciliation.lookback_minutes == 0 {
        return Err(ConfigError::ValidationError(
            "reconciliation lookback must be positive".into(),
        ));
    }

    let mut seen = HashSet::new();
    for tenant in &config.tenants {
        let domain = tenant.domain.trim().to_ascii_lowercase();
        if domain.is_empty() {
            return Err(ConfigError::ValidationError(
                "tenant domain must not be empty".into(),
            ));
        }
        if !seen.insert(domain) {
            return Err(ConfigError::ValidationError(format!(
                "tenant {} is configured twice",
                tenant.domain
            )));
        }
        if tenant.webhook_secret.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "tenant {} has no webhook secret",
                tenant.domain
            )));
        }
        utc_offset(tenant)?;
    }
    Ok(())
}

fn utc_offset(tenant: &FileTenantConfig) -> Result<UtcOffset, ConfigError> {
    UtcOffset::from_whole_seconds(tenant.utc_offset_minutes.saturating_mul(60)).map_err(|_| {
        ConfigError::ValidationError(format!(
            "tenant {} has an out-of-range utc offset",
            tenant.domain
        ))
    })
}

fn hash_secret(plaintext: &str) -> Result<String, ConfigError> {
    use argon2::{
        Argon2, PasswordHasher,
        password_hash::{SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ConfigError::HashError(e.to_string()))
}

fn build_loaded_config(
    file_config: FileConfig,
    secret_hash: String,
) -> Result<LoadedConfig, ConfigError> {
    let tenants = file_config
        .tenants
        .into_iter()
        .map(convert_tenant)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
        },
        platform: PlatformConfig {
            api_version: file_config.platform.api_version,
            request_timeout: Duration::from_secs(file_config.platform.request_timeout_secs),
        },
        admin: AdminConfig::new(secret_hash),
        tenants: TenantDirectory::new(tenants),
        reconciliation: ReconciliationWindow::from_minutes(
            file_config.reconciliation.lookback_minutes,
            file_config.reconciliation.lookahead_minutes,
        ),
    })
}

fn convert_tenant(t: FileTenantConfig) -> Result<TenantConfig, ConfigError> {
    let utc_offset = utc_offset(&t)?;
    let mut tenant = TenantConfig::new(
        t.domain.trim(),
        t.access_token,
        t.webhook_secret.into_bytes().into_boxed_slice(),
    );
    tenant.utc_offset = utc_offset;
    tenant.api_base = t.api_base;
    Ok(tenant)
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}
