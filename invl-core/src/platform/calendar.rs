use async_trait::async_trait;
use time::{Date, OffsetDateTime, UtcOffset};

use super::TenantCalendar;
use crate::config::{Reloadable, TenantDirectory};

/// Calendar backed by each tenant's configured UTC offset.
///
/// Unknown tenants fall back to UTC.
#[derive(Debug, Clone)]
pub struct ConfiguredCalendar {
    tenants: Reloadable<TenantDirectory>,
}

impl ConfiguredCalendar {
    pub fn new(tenants: Reloadable<TenantDirectory>) -> Self {
        Self { tenants }
    }
}

#[async_trait]
impl TenantCalendar for ConfiguredCalendar {
    async fn local_date(&self, tenant_id: &str, at: OffsetDateTime) -> Date {
        let offset = self
            .tenants
            .read()
            .await
            .get(tenant_id)
            .map(|t| t.utc_offset)
            .unwrap_or(UtcOffset::UTC);
        at.to_offset(offset).date()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TenantConfig;
    use time::macros::{date, datetime, offset};

    #[tokio::test]
    async fn test_local_date_follows_tenant_offset() {
        let mut tokyo = TenantConfig::new("tokyo.myshopify.com", "tok", *b"s");
        tokyo.utc_offset = offset!(+9);
        let calendar = ConfiguredCalendar::new(Reloadable::new(TenantDirectory::new([tokyo])));
        let at = datetime!(2024-01-01 20:00:00 UTC);

        assert_eq!(calendar.local_date("tokyo.myshopify.com", at).await, date!(2024-01-02));
        assert_eq!(calendar.local_date("elsewhere.myshopify.com", at).await, date!(2024-01-01));
    }
}
