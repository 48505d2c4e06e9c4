//! Validated runtime configuration.
//!
//! These types are shared across crates. Loading and parsing the TOML file
//! is handled by the server crate.

mod admin;
mod reloadable;
mod tenant;

pub use admin::AdminConfig;
pub use reloadable::Reloadable;
pub use tenant::{TenantConfig, TenantDirectory};

use std::net::SocketAddr;
use std::time::Duration;

use crate::ledger::ReconciliationWindow;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

/// Commerce platform client settings. Not reloadable: the HTTP client is
/// built once at startup.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub api_version: String,
    pub request_timeout: Duration,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_version: "2024-10".to_owned(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Configuration shared by every handler.
///
/// Sections that SIGHUP may replace are [`Reloadable`]; each has its own
/// lock so a reload never blocks unrelated readers.
#[derive(Debug, Clone)]
pub struct SharedConfig {
    pub server: ServerConfig,
    pub platform: PlatformConfig,
    pub admin: Reloadable<AdminConfig>,
    pub tenants: Reloadable<TenantDirectory>,
    pub reconciliation: Reloadable<ReconciliationWindow>,
}

impl SharedConfig {
    pub fn new(
        server: ServerConfig,
        platform: PlatformConfig,
        admin: AdminConfig,
        tenants: TenantDirectory,
        reconciliation: ReconciliationWindow,
    ) -> Self {
        Self {
            server,
            platform,
            admin: Reloadable::new(admin),
            tenants: Reloadable::new(tenants),
            reconciliation: Reloadable::new(reconciliation),
        }
    }

    /// Replace every reloadable section, in a fixed order.
    pub async fn reload(
        &self,
        admin: AdminConfig,
        tenants: TenantDirectory,
        reconciliation: ReconciliationWindow,
    ) {
        self.admin.replace(admin).await;
        let version = self.tenants.replace(tenants).await;
        self.reconciliation.replace(reconciliation).await;
        tracing::info!(tenants_version = version, "Configuration sections replaced");
    }
}
