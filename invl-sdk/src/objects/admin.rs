//! Admin API request and response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ledger::LedgerActivity;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Direct adjustments an operator may record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    ManualAdjustment,
    CountCorrection,
}

impl From<AdjustmentKind> for LedgerActivity {
    fn from(value: AdjustmentKind) -> Self {
        match value {
            AdjustmentKind::ManualAdjustment => LedgerActivity::ManualAdjustment,
            AdjustmentKind::CountCorrection => LedgerActivity::CountCorrection,
        }
    }
}

/// One signed quantity change for an inventory item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineChangeRequest {
    pub inventory_item_id: String,
    pub quantity: i64,
}

/// `POST /tenants/{tenant}/adjustments`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentRequest {
    pub kind: AdjustmentKind,
    pub location_id: String,
    pub lines: Vec<LineChangeRequest>,
    /// Business object the change belongs to (count session id, ticket, ...).
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptKind {
    Purchase,
    Transfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    Draft,
    Received,
    Cancelled,
}

/// `POST /tenants/{tenant}/receipts`
///
/// Line quantities are the (positive) quantities to add on receive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReceiptRequest {
    pub kind: ReceiptKind,
    pub location_id: String,
    pub lines: Vec<LineChangeRequest>,
    #[serde(default)]
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTallyResponse {
    pub written: u32,
    pub upgraded: u32,
    pub deduplicated: u32,
    pub failed: u32,
}

/// Result of a direct inventory mutation.
///
/// `mutated` is false when the call was an idempotent no-op (e.g. cancelling
/// an already cancelled receipt).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResponse {
    pub ok: bool,
    pub error: Option<String>,
    pub adjustment_group_id: Option<String>,
    pub mutated: bool,
    pub ledger: LedgerTallyResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptResponse {
    pub id: Uuid,
    pub tenant_id: String,
    pub kind: ReceiptKind,
    pub location_id: String,
    pub lines: Vec<LineChangeRequest>,
    pub status: ReceiptStatus,
    pub note: Option<String>,
    /// Correlation id of the last successful receive or cancel mutation.
    pub adjustment_group_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 200;
const MAX_OFFSET: i64 = 100_000;

/// Query parameters for listing ledger entries.
///
/// `from`/`to` are unix seconds bounding the event time (inclusive).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListLedgerQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub inventory_item_id: Option<String>,
    pub location_id: Option<String>,
    pub activity: Option<LedgerActivity>,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// Clamp limit and offset to safe maximums.
pub fn clamp_pagination(limit: i64, offset: i64) -> (i64, i64) {
    (limit.clamp(1, MAX_LIMIT), offset.clamp(0, MAX_OFFSET))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_pagination() {
        assert_eq!(clamp_pagination(0, -5), (1, 0));
        assert_eq!(clamp_pagination(20, 40), (20, 40));
        assert_eq!(clamp_pagination(10_000, 1_000_000), (200, 100_000));
    }

    #[test]
    fn test_adjustment_request_parsing() {
        let json = r#"{
            "kind": "count_correction",
            "location_id": "gid://shopify/Location/1",
            "lines": [{"inventory_item_id": "42", "quantity": -2}]
        }"#;
        let request: AdjustmentRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.kind, AdjustmentKind::CountCorrection);
        assert_eq!(LedgerActivity::from(request.kind), LedgerActivity::CountCorrection);
        assert_eq!(request.lines[0].quantity, -2);
        assert!(request.source_id.is_none());
    }
}
