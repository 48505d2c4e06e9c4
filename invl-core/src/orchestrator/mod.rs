//! Inventory Mutation Orchestrator.
//!
//! Direct actions change stock on the platform first and record the change
//! second. The platform call is authoritative: once it succeeds the action
//! succeeds, and a ledger failure is logged and counted but never reported
//! as a failed mutation.

pub mod receipts;

pub use receipts::{MemoryReceiptBook, ReceiptBook};

use std::sync::Arc;

use itertools::Itertools;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::entities::LedgerActivity;
use crate::entities::ledger_entry::LedgerEntryInsert;
use crate::entities::stock_receipt::{ReceiptStatus, StockReceipt, TransitionStockReceipt};
use crate::ids::canonical_id;
use crate::ledger::{KeyParts, LedgerTally, LedgerWrite, LedgerWriter, derive_key};
use crate::platform::{
    AdjustRequest, InventoryPlatform, PlatformError, QuantityChange, TenantCalendar,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineChange {
    pub inventory_item_id: String,
    /// Signed: positive adds stock.
    pub quantity: i64,
}

#[derive(Debug, Clone)]
pub struct MutationRequest {
    pub tenant_id: String,
    pub location_id: String,
    pub lines: Vec<LineChange>,
    pub activity: LedgerActivity,
    pub source_type: String,
    /// Defaults to the platform's correlation id when absent.
    pub source_id: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Error)]
pub enum MutationError {
    /// Nothing was sent to the platform.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The platform refused the adjustment. Nothing was applied.
    #[error("{0}")]
    Rejected(String),

    #[error("platform call failed: {0}")]
    Platform(#[from] PlatformError),

    #[error("receipt not found")]
    ReceiptNotFound,

    #[error("receipt store error: {0}")]
    Store(#[from] sqlx::Error),
}

/// A mutation that the platform accepted, or an idempotent no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationApplied {
    pub adjustment_group_id: Option<String>,
    /// `false` when nothing had to be done (e.g. receipt already cancelled).
    pub mutated: bool,
    pub ledger: LedgerTally,
}

impl MutationApplied {
    fn unchanged(adjustment_group_id: Option<String>) -> Self {
        Self {
            adjustment_group_id,
            ..Default::default()
        }
    }
}

/// Platform reason code for a direct action.
fn adjustment_reason(activity: LedgerActivity) -> &'static str {
    match activity {
        LedgerActivity::CountCorrection => "cycle_count_available",
        LedgerActivity::PurchaseReceive | LedgerActivity::TransferReceive => "received",
        LedgerActivity::ManualAdjustment
        | LedgerActivity::PurchaseCancel
        | LedgerActivity::TransferCancel
        | LedgerActivity::OrderSales
        | LedgerActivity::GenericWebhook => "correction",
    }
}

#[derive(Clone)]
pub struct InventoryMutationOrchestrator {
    platform: Arc<dyn InventoryPlatform>,
    calendar: Arc<dyn TenantCalendar>,
    writer: LedgerWriter,
    receipts: Arc<dyn ReceiptBook>,
}

impl InventoryMutationOrchestrator {
    pub fn new(
        platform: Arc<dyn InventoryPlatform>,
        calendar: Arc<dyn TenantCalendar>,
        writer: LedgerWriter,
        receipts: Arc<dyn ReceiptBook>,
    ) -> Self {
        Self {
            platform,
            calendar,
            writer,
            receipts,
        }
    }

    pub fn receipts(&self) -> &Arc<dyn ReceiptBook> {
        &self.receipts
    }

    /// Apply a batched quantity change and record one ledger row per line.
    #[tracing::instrument(
        skip_all,
        fields(tenant = %request.tenant_id, activity = %request.activity)
    )]
    pub async fn apply(&self, request: MutationRequest) -> Result<MutationApplied, MutationError> {
        let location_id = canonical_id(&request.location_id);
        if location_id.is_empty() {
            return Err(MutationError::Validation("location is required".into()));
        }
        if request.activity.is_provisional() {
            return Err(MutationError::Validation(format!(
                "{} cannot be applied directly",
                request.activity
            )));
        }
        let changes: Vec<QuantityChange> = request
            .lines
            .iter()
            .filter(|line| line.quantity != 0)
            .map(|line| QuantityChange {
                inventory_item_id: canonical_id(&line.inventory_item_id),
                delta: line.quantity,
            })
            .collect();
        if changes.iter().any(|c| c.inventory_item_id.is_empty()) {
            return Err(MutationError::Validation("inventory item id is required".into()));
        }
        if changes.is_empty() {
            return Err(MutationError::Validation(
                "at least one non-zero line is required".into(),
            ));
        }

        let outcome = self
            .platform
            .adjust(AdjustRequest {
                tenant_id: &request.tenant_id,
                location_id: &location_id,
                changes: &changes,
                reason: adjustment_reason(request.activity),
                reference: request.source_id.as_deref(),
            })
            .await?;
        if !outcome.errors.is_empty() {
            let message = outcome.errors.iter().join("; ");
            tracing::warn!(error = %message, "Platform rejected adjustment");
            return Err(MutationError::Rejected(message));
        }

        let now = OffsetDateTime::now_utc();
        let calendar_date = self.calendar.local_date(&request.tenant_id, now).await;
        let location_name = match self
            .platform
            .location_name(&request.tenant_id, &location_id)
            .await
        {
            Ok(name) => name,
            Err(e) => {
                tracing::debug!(error = %e, "Location name lookup failed");
                None
            }
        };
        let group_id = outcome.correlation_id.clone();
        let source_id = request
            .source_id
            .clone()
            .or_else(|| group_id.clone())
            .unwrap_or_default();

        let mut ledger = LedgerTally::default();
        for change in &changes {
            let idempotency_key = derive_key(&KeyParts {
                tenant_id: &request.tenant_id,
                activity_class: request.activity.as_str(),
                inventory_item_id: &change.inventory_item_id,
                location_id: &location_id,
                source_id: Some(&source_id),
                sub_source_id: group_id.as_deref(),
                timestamp: now,
            });
            let entry = LedgerEntryInsert {
                tenant_id: request.tenant_id.clone(),
                occurred_at: now,
                calendar_date,
                inventory_item_id: change.inventory_item_id.clone(),
                variant_id: None,
                sku: None,
                location_id: location_id.clone(),
                location_name: location_name.clone(),
                activity: request.activity,
                delta: Some(change.delta),
                quantity_after: outcome.quantities_after.get(&change.inventory_item_id).copied(),
                source_type: request.source_type.clone(),
                source_id: source_id.clone(),
                adjustment_group_id: group_id.clone(),
                idempotency_key,
                note: request.note.clone(),
            };
            let result = self.writer.write(LedgerWrite::exact(entry)).await;
            if let Err(e) = &result {
                tracing::warn!(
                    error = %e,
                    inventory_item_id = %change.inventory_item_id,
                    "Ledger write failed after successful mutation"
                );
            }
            ledger.record(&result);
        }

        Ok(MutationApplied {
            adjustment_group_id: group_id,
            mutated: true,
            ledger,
        })
    }

    /// Receive a draft receipt into stock.
    ///
    /// Already received or cancelled receipts are a no-op.
    #[tracing::instrument(skip(self))]
    pub async fn receive(&self, tenant_id: &str, id: Uuid) -> Result<MutationApplied, MutationError> {
        let receipt = self.load(tenant_id, id).await?;
        if receipt.status != ReceiptStatus::Draft {
            tracing::debug!(status = ?receipt.status, "Receipt not in draft, nothing to receive");
            return Ok(MutationApplied::unchanged(receipt.adjustment_group_id));
        }
        if !self
            .claim(&receipt, ReceiptStatus::Draft, ReceiptStatus::Received)
            .await?
        {
            return Ok(MutationApplied::unchanged(None));
        }

        let activity = receipt.kind.receive_activity();
        let result = self.apply(receipt_mutation(&receipt, activity, 1)).await;
        self.settle(&receipt, ReceiptStatus::Received, ReceiptStatus::Draft, result)
            .await
    }

    /// Reverse a received receipt.
    ///
    /// Only received receipts are cancellable; drafts and already cancelled
    /// receipts are a no-op with no platform call.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, tenant_id: &str, id: Uuid) -> Result<MutationApplied, MutationError> {
        let receipt = self.load(tenant_id, id).await?;
        if receipt.status != ReceiptStatus::Received {
            tracing::debug!(status = ?receipt.status, "Receipt not received, nothing to cancel");
            return Ok(MutationApplied::unchanged(None));
        }
        if !self
            .claim(&receipt, ReceiptStatus::Received, ReceiptStatus::Cancelled)
            .await?
        {
            return Ok(MutationApplied::unchanged(None));
        }

        let activity = receipt.kind.cancel_activity();
        let result = self.apply(receipt_mutation(&receipt, activity, -1)).await;
        self.settle(&receipt, ReceiptStatus::Cancelled, ReceiptStatus::Received, result)
            .await
    }

    async fn load(&self, tenant_id: &str, id: Uuid) -> Result<StockReceipt, MutationError> {
        self.receipts
            .get(tenant_id, id)
            .await?
            .ok_or(MutationError::ReceiptNotFound)
    }

    async fn claim(
        &self,
        receipt: &StockReceipt,
        from: ReceiptStatus,
        to: ReceiptStatus,
    ) -> Result<bool, MutationError> {
        let claimed = self
            .receipts
            .transition(TransitionStockReceipt {
                tenant_id: receipt.tenant_id.clone(),
                id: receipt.id,
                from,
                to,
                adjustment_group_id: None,
            })
            .await?;
        if !claimed {
            tracing::debug!("Receipt claimed by a concurrent request");
        }
        Ok(claimed)
    }

    /// Record the correlation id on success, or hand the claim back on failure.
    async fn settle(
        &self,
        receipt: &StockReceipt,
        claimed: ReceiptStatus,
        previous: ReceiptStatus,
        result: Result<MutationApplied, MutationError>,
    ) -> Result<MutationApplied, MutationError> {
        let (to, adjustment_group_id) = match &result {
            Ok(applied) => (claimed, applied.adjustment_group_id.clone()),
            Err(_) => (previous, None),
        };
        let recorded = self
            .receipts
            .transition(TransitionStockReceipt {
                tenant_id: receipt.tenant_id.clone(),
                id: receipt.id,
                from: claimed,
                to,
                adjustment_group_id,
            })
            .await;
        if let Err(e) = recorded {
            tracing::error!(error = %e, "Failed to settle receipt status");
        }
        result
    }
}

fn receipt_mutation(receipt: &StockReceipt, activity: LedgerActivity, sign: i64) -> MutationRequest {
    MutationRequest {
        tenant_id: receipt.tenant_id.clone(),
        location_id: receipt.location_id.clone(),
        lines: receipt
            .lines
            .iter()
            .map(|line| LineChange {
                inventory_item_id: line.inventory_item_id.clone(),
                quantity: line.quantity.saturating_abs() * sign,
            })
            .collect(),
        activity,
        source_type: receipt.kind.source_type().to_owned(),
        source_id: Some(receipt.id.to_string()),
        note: receipt.note.clone(),
    }
}
