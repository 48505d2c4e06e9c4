//! Per-tenant (per-shop) configuration.

use std::collections::HashMap;

use time::UtcOffset;
use url::Url;

/// One connected shop.
#[derive(Debug, Clone)]
pub struct TenantConfig {
    /// Shop domain, e.g. `acme.myshopify.com`. Also the ledger `tenant_id`.
    pub domain: String,
    /// Admin API access token.
    pub access_token: String,
    /// Key for verifying inbound webhook HMACs.
    pub webhook_secret: Box<[u8]>,
    /// Fixed offset used to derive ledger calendar dates.
    pub utc_offset: UtcOffset,
    /// Overrides `https://{domain}/` as the Admin API base.
    pub api_base: Option<Url>,
}

impl TenantConfig {
    pub fn new(
        domain: impl Into<String>,
        access_token: impl Into<String>,
        webhook_secret: impl Into<Box<[u8]>>,
    ) -> Self {
        Self {
            domain: domain.into(),
            access_token: access_token.into(),
            webhook_secret: webhook_secret.into(),
            utc_offset: UtcOffset::UTC,
            api_base: None,
        }
    }

    pub fn webhook_secret_bytes(&self) -> &[u8] {
        &self.webhook_secret
    }

    /// Admin GraphQL endpoint for the given API version.
    pub fn graphql_endpoint(&self, api_version: &str) -> Result<Url, url::ParseError> {
        let base = match &self.api_base {
            Some(base) => base.clone(),
            None => Url::parse(&format!("https://{}/", self.domain))?,
        };
        base.join(&format!("admin/api/{api_version}/graphql.json"))
    }
}

/// Tenants by lowercased shop domain.
#[derive(Debug, Clone, Default)]
pub struct TenantDirectory {
    tenants: HashMap<String, TenantConfig>,
}

impl TenantDirectory {
    pub fn new(tenants: impl IntoIterator<Item = TenantConfig>) -> Self {
        Self {
            tenants: tenants
                .into_iter()
                .map(|t| (t.domain.to_ascii_lowercase(), t))
                .collect(),
        }
    }

    pub fn get(&self, domain: &str) -> Option<&TenantConfig> {
        self.tenants.get(&domain.trim().to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}
