//! TOML file configuration structures.
//!
//! These structs directly map to the `invl-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub admin: AdminConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,
    #[serde(default)]
    pub tenants: Vec<TenantConfig>,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

/// Admin configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// The admin secret. If this is plaintext (doesn't start with `$argon2`),
    /// it will be hashed and the config file will be rewritten.
    pub secret: String,
}

/// Commerce platform client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_api_version() -> String {
    "2024-10".to_owned()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// How far before (`lookback`) or after (`lookahead`) a provisional row an
/// authoritative event may fall and still explain it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationConfig {
    #[serde(default = "default_lookback_minutes")]
    pub lookback_minutes: u32,
    #[serde(default = "default_lookahead_minutes")]
    pub lookahead_minutes: u32,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            lookback_minutes: default_lookback_minutes(),
            lookahead_minutes: default_lookahead_minutes(),
        }
    }
}

fn default_lookback_minutes() -> u32 {
    30
}

fn default_lookahead_minutes() -> u32 {
    5
}

/// One connected shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantConfig {
    /// Shop domain as sent in `X-Shopify-Shop-Domain`.
    pub domain: String,
    /// Admin API access token.
    pub access_token: String,
    /// Webhook signing secret.
    pub webhook_secret: String,
    /// Offset from UTC, in minutes, for ledger calendar dates.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    /// Admin API base URL, when not `https://{domain}/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<Url>,
}

impl FileConfig {
    /// Check if the admin secret is already hashed (argon2 format).
    pub fn is_admin_secret_hashed(&self) -> bool {
        self.admin.secret.starts_with("$argon2")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[admin]
secret = "test-secret"

[platform]
api_version = "2025-01"

[reconciliation]
lookback_minutes = 45

[[tenants]]
domain = "acme.myshopify.com"
access_token = "shpat_123"
webhook_secret = "whsec"
utc_offset_minutes = 540

[[tenants]]
domain = "dev.myshopify.com"
access_token = "shpat_456"
webhook_secret = "whsec2"
api_base = "http://127.0.0.1:9000/"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.platform.api_version, "2025-01");
        assert_eq!(config.platform.request_timeout_secs, 30);
        assert_eq!(config.reconciliation.lookback_minutes, 45);
        assert_eq!(config.reconciliation.lookahead_minutes, 5);
        assert_eq!(config.tenants.len(), 2);
        assert_eq!(config.tenants[0].utc_offset_minutes, 540);
        assert!(config.tenants[1].api_base.is_some());
        assert!(!config.is_admin_secret_hashed());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: FileConfig = toml::from_str("[admin]\nsecret = \"s\"\n").unwrap();
        assert_eq!(config.server.listen, default_listen_addr());
        assert_eq!(config.platform.api_version, "2024-10");
        assert!(config.tenants.is_empty());
    }

    #[test]
    fn test_hashed_secret_detection() {
        let config: FileConfig = toml::from_str(
            "[admin]\nsecret = \"$argon2id$v=19$m=19456,t=2,p=1$abc123\"\n",
        )
        .unwrap();
        assert!(config.is_admin_secret_hashed());
    }
}
