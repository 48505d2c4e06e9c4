//! Ledger persistence seam.

use async_trait::async_trait;
use kanau::processor::Processor;
use time::OffsetDateTime;

use crate::entities::ledger_entry::{
    FindLedgerEntryByKey, FindProvisionalLedgerEntry, GetLatestLedgerEntry, InsertLedgerEntry,
    LedgerEntry, LedgerEntryInsert, LedgerUpgrade, ListLedgerEntries, UpgradeLedgerEntry,
};
use crate::framework::DatabaseProcessor;
use crate::ids::{ResourceKind, Spellings, spellings};

#[derive(Debug, thiserror::Error)]
pub enum LedgerStoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// The idempotency key is already held by another row.
    #[error("idempotency key already in use: {0}")]
    KeyConflict(String),
    #[error("ledger store unavailable: {0}")]
    Unavailable(String),
}

/// One (tenant, item, location) stream with every spelling of its ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockScope {
    pub tenant_id: String,
    pub item_ids: Spellings,
    pub location_ids: Spellings,
}

impl StockScope {
    pub fn new(tenant_id: &str, inventory_item_id: &str, location_id: &str) -> Self {
        Self {
            tenant_id: tenant_id.to_owned(),
            item_ids: spellings(ResourceKind::InventoryItem, inventory_item_id),
            location_ids: spellings(ResourceKind::Location, location_id),
        }
    }

    pub fn contains(&self, row: &LedgerEntry) -> bool {
        row.tenant_id == self.tenant_id
            && self.item_ids.contains(&row.inventory_item_id)
            && self.location_ids.contains(&row.location_id)
    }
}

/// Append-only ledger storage keyed by (tenant, idempotency key).
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn find_by_key(
        &self,
        tenant_id: &str,
        idempotency_key: &str,
    ) -> Result<Option<LedgerEntry>, LedgerStoreError>;

    /// Most recent row of the stream by event time, any activity.
    async fn latest_for(
        &self,
        scope: &StockScope,
        exclude_id: Option<i64>,
    ) -> Result<Option<LedgerEntry>, LedgerStoreError>;

    /// Most recent provisional row of the stream with event time in `[from, to]`.
    async fn latest_provisional_between(
        &self,
        scope: &StockScope,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> Result<Option<LedgerEntry>, LedgerStoreError>;

    /// Insert a row. `None` if the key is already taken.
    async fn insert(&self, entry: LedgerEntryInsert)
    -> Result<Option<LedgerEntry>, LedgerStoreError>;

    /// Upgrade a row that is still provisional. `None` if it no longer is.
    async fn upgrade(
        &self,
        tenant_id: &str,
        id: i64,
        upgrade: LedgerUpgrade,
    ) -> Result<Option<LedgerEntry>, LedgerStoreError>;

    async fn list(&self, query: ListLedgerEntries) -> Result<Vec<LedgerEntry>, LedgerStoreError>;
}

#[async_trait]
impl LedgerStore for DatabaseProcessor {
    async fn find_by_key(
        &self,
        tenant_id: &str,
        idempotency_key: &str,
    ) -> Result<Option<LedgerEntry>, LedgerStoreError> {
        Ok(self
            .process(FindLedgerEntryByKey {
                tenant_id: tenant_id.to_owned(),
                idempotency_key: idempotency_key.to_owned(),
            })
            .await?)
    }

    async fn latest_for(
        &self,
        scope: &StockScope,
        exclude_id: Option<i64>,
    ) -> Result<Option<LedgerEntry>, LedgerStoreError> {
        Ok(self
            .process(GetLatestLedgerEntry {
                tenant_id: scope.tenant_id.clone(),
                item_ids: scope.item_ids.to_vec(),
                location_ids: scope.location_ids.to_vec(),
                exclude_id,
            })
            .await?)
    }

    async fn latest_provisional_between(
        &self,
        scope: &StockScope,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> Result<Option<LedgerEntry>, LedgerStoreError> {
        Ok(self
            .process(FindProvisionalLedgerEntry {
                tenant_id: scope.tenant_id.clone(),
                item_ids: scope.item_ids.to_vec(),
                location_ids: scope.location_ids.to_vec(),
                from,
                to,
            })
            .await?)
    }

    async fn insert(
        &self,
        entry: LedgerEntryInsert,
    ) -> Result<Option<LedgerEntry>, LedgerStoreError> {
        Ok(self.process(InsertLedgerEntry { entry }).await?)
    }

    async fn upgrade(
        &self,
        tenant_id: &str,
        id: i64,
        upgrade: LedgerUpgrade,
    ) -> Result<Option<LedgerEntry>, LedgerStoreError> {
        let key = upgrade.idempotency_key.clone();
        let result = self
            .process(UpgradeLedgerEntry {
                id,
                tenant_id: tenant_id.to_owned(),
                upgrade,
            })
            .await;
        match result {
            Ok(row) => Ok(row),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(LedgerStoreError::KeyConflict(key))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, query: ListLedgerEntries) -> Result<Vec<LedgerEntry>, LedgerStoreError> {
        Ok(self.process(query).await?)
    }
}
