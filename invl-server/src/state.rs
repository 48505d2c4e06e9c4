//! Application state shared across all request handlers.

use invl_core::adapters::WebhookIngestor;
use invl_core::config::SharedConfig;
use invl_core::ledger::{LedgerStore, LedgerWriter, ReconciliationMatcher};
use invl_core::orchestrator::{InventoryMutationOrchestrator, ReceiptBook};
use invl_core::platform::{ConfiguredCalendar, InventoryPlatform, TenantCalendar};
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Runtime configuration (reloadable sections are replaced on SIGHUP).
    pub config: SharedConfig,
    pub ingestor: WebhookIngestor,
    pub orchestrator: Arc<InventoryMutationOrchestrator>,
    /// Read side of the ledger for the admin listing.
    pub ledger: Arc<dyn LedgerStore>,
}

impl AppState {
    /// Wire the ledger core on top of the given stores and platform.
    pub fn new(
        config: SharedConfig,
        platform: Arc<dyn InventoryPlatform>,
        ledger: Arc<dyn LedgerStore>,
        receipts: Arc<dyn ReceiptBook>,
    ) -> Self {
        let matcher = ReconciliationMatcher::new(ledger.clone(), config.reconciliation.clone());
        let writer = LedgerWriter::new(ledger.clone(), matcher);
        let calendar: Arc<dyn TenantCalendar> =
            Arc::new(ConfiguredCalendar::new(config.tenants.clone()));

        let orchestrator = InventoryMutationOrchestrator::new(
            platform.clone(),
            calendar.clone(),
            writer.clone(),
            receipts,
        );
        let ingestor = WebhookIngestor::new(writer, platform, calendar);

        Self {
            config,
            ingestor,
            orchestrator: Arc::new(orchestrator),
            ledger,
        }
    }

    /// The configured spelling of a tenant's domain, if the tenant is known.
    pub async fn tenant_domain(&self, raw: &str) -> Option<String> {
        self.config
            .tenants
            .read()
            .await
            .get(raw)
            .map(|tenant| tenant.domain.to_ascii_lowercase())
    }
}
