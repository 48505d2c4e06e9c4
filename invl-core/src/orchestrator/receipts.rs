//! Receipt persistence seam.
//!
//! Receive and cancel decide idempotency from the receipt's status alone, so
//! the only operations needed are create, read, and a compare-and-set on
//! the status.

use std::collections::HashMap;

use async_trait::async_trait;
use kanau::processor::Processor;
use sqlx::types::Json;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::entities::stock_receipt::{
    GetStockReceipt, InsertStockReceipt, ReceiptStatus, StockReceipt, TransitionStockReceipt,
};
use crate::framework::DatabaseProcessor;

#[async_trait]
pub trait ReceiptBook: Send + Sync {
    async fn create(&self, insert: InsertStockReceipt) -> Result<StockReceipt, sqlx::Error>;

    async fn get(&self, tenant_id: &str, id: Uuid) -> Result<Option<StockReceipt>, sqlx::Error>;

    /// `true` if this call performed the transition.
    async fn transition(&self, cmd: TransitionStockReceipt) -> Result<bool, sqlx::Error>;
}

#[async_trait]
impl ReceiptBook for DatabaseProcessor {
    async fn create(&self, insert: InsertStockReceipt) -> Result<StockReceipt, sqlx::Error> {
        self.process(insert).await
    }

    async fn get(&self, tenant_id: &str, id: Uuid) -> Result<Option<StockReceipt>, sqlx::Error> {
        self.process(GetStockReceipt {
            tenant_id: tenant_id.to_owned(),
            id,
        })
        .await
    }

    async fn transition(&self, cmd: TransitionStockReceipt) -> Result<bool, sqlx::Error> {
        self.process(cmd).await
    }
}

/// In-process [`ReceiptBook`].
#[derive(Debug, Default)]
pub struct MemoryReceiptBook {
    receipts: Mutex<HashMap<Uuid, StockReceipt>>,
}

impl MemoryReceiptBook {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReceiptBook for MemoryReceiptBook {
    async fn create(&self, insert: InsertStockReceipt) -> Result<StockReceipt, sqlx::Error> {
        let now = OffsetDateTime::now_utc();
        let receipt = StockReceipt {
            id: Uuid::now_v7(),
            tenant_id: insert.tenant_id,
            kind: insert.kind,
            location_id: insert.location_id,
            lines: Json(insert.lines),
            status: ReceiptStatus::Draft,
            note: insert.note,
            adjustment_group_id: None,
            created_at: now,
            updated_at: now,
        };
        self.receipts
            .lock()
            .await
            .insert(receipt.id, receipt.clone());
        Ok(receipt)
    }

    async fn get(&self, tenant_id: &str, id: Uuid) -> Result<Option<StockReceipt>, sqlx::Error> {
        Ok(self
            .receipts
            .lock()
            .await
            .get(&id)
            .filter(|r| r.tenant_id == tenant_id)
            .cloned())
    }

    async fn transition(&self, cmd: TransitionStockReceipt) -> Result<bool, sqlx::Error> {
        let mut receipts = self.receipts.lock().await;
        let Some(receipt) = receipts
            .get_mut(&cmd.id)
            .filter(|r| r.tenant_id == cmd.tenant_id && r.status == cmd.from)
        else {
            return Ok(false);
        };
        receipt.status = cmd.to;
        if cmd.adjustment_group_id.is_some() {
            receipt.adjustment_group_id = cmd.adjustment_group_id;
        }
        receipt.updated_at = OffsetDateTime::now_utc();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::stock_receipt::{ReceiptKind, ReceiptLine};

    fn claim(receipt: &StockReceipt, from: ReceiptStatus, to: ReceiptStatus) -> TransitionStockReceipt {
        TransitionStockReceipt {
            tenant_id: receipt.tenant_id.clone(),
            id: receipt.id,
            from,
            to,
            adjustment_group_id: None,
        }
    }

    #[tokio::test]
    async fn test_transition_is_compare_and_set() {
        let book = MemoryReceiptBook::new();
        let receipt = book
            .create(InsertStockReceipt {
                tenant_id: "t1.myshopify.com".into(),
                kind: ReceiptKind::Purchase,
                location_id: "loc_1".into(),
                lines: vec![ReceiptLine {
                    inventory_item_id: "inv_1".into(),
                    quantity: 3,
                }],
                note: None,
            })
            .await
            .unwrap();

        let draft_to_received = claim(&receipt, ReceiptStatus::Draft, ReceiptStatus::Received);
        assert!(book.transition(draft_to_received.clone()).await.unwrap());
        assert!(!book.transition(draft_to_received).await.unwrap());

        let stored = book.get("t1.myshopify.com", receipt.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ReceiptStatus::Received);
        assert!(book.get("t2.myshopify.com", receipt.id).await.unwrap().is_none());
    }
}
