//! Shared test doubles.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::adapters::WebhookIngestor;
use crate::config::{Reloadable, TenantDirectory};
use crate::entities::LedgerActivity;
use crate::entities::ledger_entry::LedgerEntryInsert;
use crate::ids::canonical_id;
use crate::ledger::{
    LedgerStore, LedgerWriter, MemoryLedgerStore, ReconciliationMatcher, ReconciliationWindow,
};
use crate::orchestrator::{InventoryMutationOrchestrator, MemoryReceiptBook};
use crate::platform::{
    AdjustOutcome, AdjustRequest, ConfiguredCalendar, InventoryPlatform, PlatformError,
    ResolvedVariant,
};

pub(crate) const TENANT: &str = "t1.myshopify.com";

/// An authoritative `order_sales` row for inv_1 at loc_1.
pub(crate) fn entry_at(at: OffsetDateTime, key: &str) -> LedgerEntryInsert {
    LedgerEntryInsert {
        tenant_id: TENANT.to_owned(),
        occurred_at: at,
        calendar_date: at.date(),
        inventory_item_id: "inv_1".to_owned(),
        variant_id: None,
        sku: None,
        location_id: "loc_1".to_owned(),
        location_name: None,
        activity: LedgerActivity::OrderSales,
        delta: None,
        quantity_after: None,
        source_type: "order".to_owned(),
        source_id: "order_123".to_owned(),
        adjustment_group_id: None,
        idempotency_key: key.to_owned(),
        note: None,
    }
}

/// A provisional `generic_webhook` row for inv_1 at loc_1.
pub(crate) fn provisional_at(at: OffsetDateTime, key: &str) -> LedgerEntryInsert {
    LedgerEntryInsert {
        activity: LedgerActivity::GenericWebhook,
        source_type: "inventory_level".to_owned(),
        source_id: "inv_1".to_owned(),
        ..entry_at(at, key)
    }
}

/// Platform double with canned answers. Ids are matched canonically.
#[derive(Debug, Default)]
pub(crate) struct ScriptedPlatform {
    adjust_errors: Vec<String>,
    quantities_after: HashMap<String, i64>,
    variants: HashMap<String, ResolvedVariant>,
    failing_variants: HashSet<String>,
    available: HashMap<(String, String), i64>,
    location_names: HashMap<String, String>,
    adjust_calls: AtomicU32,
}

impl ScriptedPlatform {
    pub(crate) fn with_adjust_errors(mut self, errors: Vec<String>) -> Self {
        self.adjust_errors = errors;
        self
    }

    pub(crate) fn with_quantity_after(mut self, item: &str, quantity: i64) -> Self {
        self.quantities_after.insert(canonical_id(item), quantity);
        self
    }

    pub(crate) fn with_variant(mut self, variant: &str, item: &str, sku: Option<&str>) -> Self {
        self.variants.insert(
            canonical_id(variant),
            ResolvedVariant {
                inventory_item_id: item.to_owned(),
                sku: sku.map(str::to_owned),
            },
        );
        self
    }

    pub(crate) fn with_failing_variant(mut self, variant: &str) -> Self {
        self.failing_variants.insert(canonical_id(variant));
        self
    }

    pub(crate) fn with_available(mut self, item: &str, location: &str, quantity: i64) -> Self {
        self.available
            .insert((canonical_id(item), canonical_id(location)), quantity);
        self
    }

    pub(crate) fn with_location_name(mut self, location: &str, name: &str) -> Self {
        self.location_names
            .insert(canonical_id(location), name.to_owned());
        self
    }

    pub(crate) fn adjust_calls(&self) -> u32 {
        self.adjust_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InventoryPlatform for ScriptedPlatform {
    async fn adjust(&self, request: AdjustRequest<'_>) -> Result<AdjustOutcome, PlatformError> {
        let n = self.adjust_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.adjust_errors.is_empty() {
            return Ok(AdjustOutcome {
                errors: self.adjust_errors.clone(),
                ..Default::default()
            });
        }
        let quantities_after = request
            .changes
            .iter()
            .filter_map(|c| {
                self.quantities_after
                    .get(&c.inventory_item_id)
                    .map(|q| (c.inventory_item_id.clone(), *q))
            })
            .collect();
        Ok(AdjustOutcome {
            correlation_id: Some(format!("group-{n}")),
            errors: Vec::new(),
            quantities_after,
        })
    }

    async fn read_available(
        &self,
        _tenant_id: &str,
        inventory_item_id: &str,
        location_id: &str,
    ) -> Result<Option<i64>, PlatformError> {
        Ok(self
            .available
            .get(&(canonical_id(inventory_item_id), canonical_id(location_id)))
            .copied())
    }

    async fn resolve_variant(
        &self,
        _tenant_id: &str,
        variant_id: &str,
    ) -> Result<Option<ResolvedVariant>, PlatformError> {
        let variant_id = canonical_id(variant_id);
        if self.failing_variants.contains(&variant_id) {
            return Err(PlatformError::Graphql("timed out".into()));
        }
        Ok(self.variants.get(&variant_id).cloned())
    }

    async fn location_name(
        &self,
        _tenant_id: &str,
        location_id: &str,
    ) -> Result<Option<String>, PlatformError> {
        Ok(self.location_names.get(&canonical_id(location_id)).cloned())
    }
}

/// Core wired to in-memory stores and a scripted platform.
pub(crate) struct Harness {
    pub platform: Arc<ScriptedPlatform>,
    pub ledger: Arc<MemoryLedgerStore>,
    pub receipts: Arc<MemoryReceiptBook>,
    pub orchestrator: InventoryMutationOrchestrator,
    pub ingestor: WebhookIngestor,
}

impl Harness {
    pub(crate) fn new(platform: ScriptedPlatform) -> Self {
        let platform = Arc::new(platform);
        let ledger = Arc::new(MemoryLedgerStore::new());
        let receipts = Arc::new(MemoryReceiptBook::new());
        let store: Arc<dyn LedgerStore> = ledger.clone();
        let matcher =
            ReconciliationMatcher::new(store.clone(), Reloadable::new(ReconciliationWindow::default()));
        let writer = LedgerWriter::new(store, matcher);
        let calendar = Arc::new(ConfiguredCalendar::new(Reloadable::new(
            TenantDirectory::default(),
        )));
        let orchestrator = InventoryMutationOrchestrator::new(
            platform.clone(),
            calendar.clone(),
            writer.clone(),
            receipts.clone(),
        );
        let ingestor = WebhookIngestor::new(writer, platform.clone(), calendar);
        Self {
            platform,
            ledger,
            receipts,
            orchestrator,
            ingestor,
        }
    }
}
