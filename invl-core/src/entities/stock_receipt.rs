use crate::entities::LedgerActivity;
use crate::framework::DatabaseProcessor;
use invl_sdk::objects::{
    LineChangeRequest, ReceiptKind as SdkReceiptKind, ReceiptStatus as SdkReceiptStatus,
};
use kanau::processor::Processor;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "receipt_kind")]
pub enum ReceiptKind {
    Purchase,
    Transfer,
}

impl ReceiptKind {
    pub fn receive_activity(self) -> LedgerActivity {
        match self {
            ReceiptKind::Purchase => LedgerActivity::PurchaseReceive,
            ReceiptKind::Transfer => LedgerActivity::TransferReceive,
        }
    }

    pub fn cancel_activity(self) -> LedgerActivity {
        match self {
            ReceiptKind::Purchase => LedgerActivity::PurchaseCancel,
            ReceiptKind::Transfer => LedgerActivity::TransferCancel,
        }
    }

    /// `source_type` of ledger rows attributed to this receipt.
    pub fn source_type(self) -> &'static str {
        match self {
            ReceiptKind::Purchase => "purchase_entry",
            ReceiptKind::Transfer => "transfer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "receipt_status")]
pub enum ReceiptStatus {
    Draft,
    Received,
    Cancelled,
}

impl From<SdkReceiptKind> for ReceiptKind {
    fn from(value: SdkReceiptKind) -> Self {
        match value {
            SdkReceiptKind::Purchase => ReceiptKind::Purchase,
            SdkReceiptKind::Transfer => ReceiptKind::Transfer,
        }
    }
}

impl From<ReceiptKind> for SdkReceiptKind {
    fn from(value: ReceiptKind) -> Self {
        match value {
            ReceiptKind::Purchase => SdkReceiptKind::Purchase,
            ReceiptKind::Transfer => SdkReceiptKind::Transfer,
        }
    }
}

impl From<ReceiptStatus> for SdkReceiptStatus {
    fn from(value: ReceiptStatus) -> Self {
        match value {
            ReceiptStatus::Draft => SdkReceiptStatus::Draft,
            ReceiptStatus::Received => SdkReceiptStatus::Received,
            ReceiptStatus::Cancelled => SdkReceiptStatus::Cancelled,
        }
    }
}

/// One receipt line, stored as JSONB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub inventory_item_id: String,
    pub quantity: i64,
}

impl From<LineChangeRequest> for ReceiptLine {
    fn from(value: LineChangeRequest) -> Self {
        Self {
            inventory_item_id: value.inventory_item_id,
            quantity: value.quantity,
        }
    }
}

impl From<&ReceiptLine> for LineChangeRequest {
    fn from(value: &ReceiptLine) -> Self {
        Self {
            inventory_item_id: value.inventory_item_id.clone(),
            quantity: value.quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StockReceipt {
    pub id: Uuid,
    pub tenant_id: String,
    pub kind: ReceiptKind,
    pub location_id: String,
    pub lines: Json<Vec<ReceiptLine>>,
    pub status: ReceiptStatus,
    pub note: Option<String>,
    pub adjustment_group_id: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const RECEIPT_COLUMNS: &str =
    "id, tenant_id, kind, location_id, lines, status, note, adjustment_group_id, created_at, updated_at";

#[derive(Debug, Clone)]
/// Create a draft receipt.
pub struct InsertStockReceipt {
    pub tenant_id: String,
    pub kind: ReceiptKind,
    pub location_id: String,
    pub lines: Vec<ReceiptLine>,
    pub note: Option<String>,
}

impl Processor<InsertStockReceipt> for DatabaseProcessor {
    type Output = StockReceipt;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertStockReceipt")]
    async fn process(&self, insert: InsertStockReceipt) -> Result<StockReceipt, sqlx::Error> {
        let sql = format!(
            "INSERT INTO stock_receipts (id, tenant_id, kind, location_id, lines, status, note) \
             VALUES ($1, $2, $3, $4, $5, 'draft', $6) \
             RETURNING {RECEIPT_COLUMNS}"
        );
        sqlx::query_as::<_, StockReceipt>(&sql)
            .bind(Uuid::now_v7())
            .bind(insert.tenant_id)
            .bind(insert.kind)
            .bind(insert.location_id)
            .bind(Json(insert.lines))
            .bind(insert.note)
            .fetch_one(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
pub struct GetStockReceipt {
    pub tenant_id: String,
    pub id: Uuid,
}

impl Processor<GetStockReceipt> for DatabaseProcessor {
    type Output = Option<StockReceipt>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetStockReceipt")]
    async fn process(&self, query: GetStockReceipt) -> Result<Option<StockReceipt>, sqlx::Error> {
        let sql = format!(
            "SELECT {RECEIPT_COLUMNS} FROM stock_receipts WHERE id = $1 AND tenant_id = $2"
        );
        sqlx::query_as::<_, StockReceipt>(&sql)
            .bind(query.id)
            .bind(query.tenant_id)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// Compare-and-set the status of a receipt.
///
/// Returns `true` if this call moved the receipt from `from` to `to`.
/// `adjustment_group_id`, when given, is recorded alongside.
pub struct TransitionStockReceipt {
    pub tenant_id: String,
    pub id: Uuid,
    pub from: ReceiptStatus,
    pub to: ReceiptStatus,
    pub adjustment_group_id: Option<String>,
}

impl Processor<TransitionStockReceipt> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:TransitionStockReceipt")]
    async fn process(&self, cmd: TransitionStockReceipt) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE stock_receipts
            SET status = $4,
                adjustment_group_id = COALESCE($5, adjustment_group_id),
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND status = $3
            "#,
        )
        .bind(cmd.id)
        .bind(cmd.tenant_id)
        .bind(cmd.from)
        .bind(cmd.to)
        .bind(cmd.adjustment_group_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_mapping() {
        assert_eq!(
            ReceiptKind::Purchase.receive_activity(),
            LedgerActivity::PurchaseReceive
        );
        assert_eq!(
            ReceiptKind::Purchase.cancel_activity(),
            LedgerActivity::PurchaseCancel
        );
        assert_eq!(
            ReceiptKind::Transfer.receive_activity(),
            LedgerActivity::TransferReceive
        );
        assert_eq!(
            ReceiptKind::Transfer.cancel_activity(),
            LedgerActivity::TransferCancel
        );
    }
}
