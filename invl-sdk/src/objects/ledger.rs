//! Ledger entry DTOs.

use serde::{Deserialize, Serialize};

use super::webhook::WebhookTopic;

/// Cause of a ledger entry.
///
/// This is the API/DTO version without sqlx::Type.
/// For database operations, use the version in `invl-core::entities`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerActivity {
    ManualAdjustment,
    OrderSales,
    PurchaseReceive,
    PurchaseCancel,
    TransferReceive,
    TransferCancel,
    CountCorrection,
    GenericWebhook,
}

impl std::fmt::Display for LedgerActivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LedgerActivity::ManualAdjustment => "manual_adjustment",
            LedgerActivity::OrderSales => "order_sales",
            LedgerActivity::PurchaseReceive => "purchase_receive",
            LedgerActivity::PurchaseCancel => "purchase_cancel",
            LedgerActivity::TransferReceive => "transfer_receive",
            LedgerActivity::TransferCancel => "transfer_cancel",
            LedgerActivity::CountCorrection => "count_correction",
            LedgerActivity::GenericWebhook => "generic_webhook",
        };
        f.write_str(s)
    }
}

/// A ledger row as returned by the admin API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntryResponse {
    pub id: i64,
    pub tenant_id: String,
    /// Event time (unix seconds).
    pub occurred_at: i64,
    /// Tenant-local `YYYY-MM-DD`.
    pub calendar_date: String,
    pub inventory_item_id: String,
    pub variant_id: Option<String>,
    pub sku: Option<String>,
    pub location_id: String,
    pub location_name: Option<String>,
    pub activity: LedgerActivity,
    pub delta: Option<i64>,
    pub quantity_after: Option<i64>,
    pub source_type: String,
    pub source_id: String,
    pub adjustment_group_id: Option<String>,
    pub idempotency_key: String,
    pub note: Option<String>,
    pub created_at: i64,
}

/// Acknowledgement returned to the webhook transport.
///
/// The delivery is acknowledged even when individual lines were skipped or
/// failed, so the platform does not redeliver a permanently bad line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub topic: Option<WebhookTopic>,
    pub written: u32,
    pub upgraded: u32,
    pub deduplicated: u32,
    pub skipped: u32,
    pub failed: u32,
}
