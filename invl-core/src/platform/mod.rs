//! Commerce platform collaborators.
//!
//! The platform is the source of truth for on-hand quantity. The ledger
//! only asks it to apply adjustments and answers lookups for display and
//! delta computation.

pub mod calendar;
pub mod graphql;

pub use calendar::ConfiguredCalendar;
pub use graphql::GraphqlPlatform;

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use time::{Date, OffsetDateTime};

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("platform request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("platform returned errors: {0}")]
    Graphql(String),

    #[error("tenant not configured: {0}")]
    UnknownTenant(String),

    #[error("platform response parsing error: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantityChange {
    pub inventory_item_id: String,
    pub delta: i64,
}

/// One batched quantity adjustment at a location.
#[derive(Debug, Clone, Copy)]
pub struct AdjustRequest<'a> {
    pub tenant_id: &'a str,
    pub location_id: &'a str,
    pub changes: &'a [QuantityChange],
    /// Platform reason code, e.g. `correction` or `received`.
    pub reason: &'a str,
    /// Business object the change is attributed to.
    pub reference: Option<&'a str>,
}

/// Result of an adjust call that reached the platform.
///
/// Non-empty `errors` means nothing was applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjustOutcome {
    pub correlation_id: Option<String>,
    pub errors: Vec<String>,
    /// Available quantity after the change, by canonical item id, where reported.
    pub quantities_after: HashMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVariant {
    pub inventory_item_id: String,
    pub sku: Option<String>,
}

#[async_trait]
pub trait InventoryPlatform: Send + Sync {
    async fn adjust(&self, request: AdjustRequest<'_>) -> Result<AdjustOutcome, PlatformError>;

    async fn read_available(
        &self,
        tenant_id: &str,
        inventory_item_id: &str,
        location_id: &str,
    ) -> Result<Option<i64>, PlatformError>;

    async fn resolve_variant(
        &self,
        tenant_id: &str,
        variant_id: &str,
    ) -> Result<Option<ResolvedVariant>, PlatformError>;

    async fn location_name(
        &self,
        tenant_id: &str,
        location_id: &str,
    ) -> Result<Option<String>, PlatformError>;
}

/// Maps an instant to the tenant's local calendar date.
#[async_trait]
pub trait TenantCalendar: Send + Sync {
    async fn local_date(&self, tenant_id: &str, at: OffsetDateTime) -> Date;
}
