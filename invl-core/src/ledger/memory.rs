//! In-process [`LedgerStore`].
//!
//! Holds the same unique-key and conditional-upgrade guarantees as the
//! Postgres table. Used by tests and by local runs without a database.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::store::{LedgerStore, LedgerStoreError, StockScope};
use crate::entities::ledger_entry::{
    LedgerEntry, LedgerEntryInsert, LedgerUpgrade, ListLedgerEntries,
};

#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    rows: RwLock<Vec<LedgerEntry>>,
    next_id: AtomicI64,
    unavailable: AtomicBool,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with [`LedgerStoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// All rows in insertion order.
    pub async fn entries(&self) -> Vec<LedgerEntry> {
        self.rows.read().await.clone()
    }

    fn check_available(&self) -> Result<(), LedgerStoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LedgerStoreError::Unavailable("memory store switched off".into()));
        }
        Ok(())
    }
}

fn newest_first(a: &&LedgerEntry, b: &&LedgerEntry) -> std::cmp::Ordering {
    (a.occurred_at, a.id).cmp(&(b.occurred_at, b.id))
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn find_by_key(
        &self,
        tenant_id: &str,
        idempotency_key: &str,
    ) -> Result<Option<LedgerEntry>, LedgerStoreError> {
        self.check_available()?;
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|r| r.tenant_id == tenant_id && r.answers_to(idempotency_key))
            .cloned())
    }

    async fn latest_for(
        &self,
        scope: &StockScope,
        exclude_id: Option<i64>,
    ) -> Result<Option<LedgerEntry>, LedgerStoreError> {
        self.check_available()?;
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|r| scope.contains(r) && Some(r.id) != exclude_id)
            .max_by(newest_first)
            .cloned())
    }

    async fn latest_provisional_between(
        &self,
        scope: &StockScope,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> Result<Option<LedgerEntry>, LedgerStoreError> {
        self.check_available()?;
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|r| {
                scope.contains(r)
                    && r.activity.is_provisional()
                    && r.occurred_at >= from
                    && r.occurred_at <= to
            })
            .max_by(newest_first)
            .cloned())
    }

    async fn insert(
        &self,
        entry: LedgerEntryInsert,
    ) -> Result<Option<LedgerEntry>, LedgerStoreError> {
        self.check_available()?;
        let mut rows = self.rows.write().await;
        if rows
            .iter()
            .any(|r| r.tenant_id == entry.tenant_id && r.idempotency_key == entry.idempotency_key)
        {
            return Ok(None);
        }
        let now = OffsetDateTime::now_utc();
        let row = LedgerEntry {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            tenant_id: entry.tenant_id,
            occurred_at: entry.occurred_at,
            calendar_date: entry.calendar_date,
            inventory_item_id: entry.inventory_item_id,
            variant_id: entry.variant_id,
            sku: entry.sku,
            location_id: entry.location_id,
            location_name: entry.location_name,
            activity: entry.activity,
            delta: entry.delta,
            quantity_after: entry.quantity_after,
            source_type: entry.source_type,
            source_id: entry.source_id,
            adjustment_group_id: entry.adjustment_group_id,
            idempotency_key: entry.idempotency_key,
            superseded_key: None,
            note: entry.note,
            created_at: now,
            updated_at: now,
        };
        rows.push(row.clone());
        Ok(Some(row))
    }

    async fn upgrade(
        &self,
        tenant_id: &str,
        id: i64,
        upgrade: LedgerUpgrade,
    ) -> Result<Option<LedgerEntry>, LedgerStoreError> {
        self.check_available()?;
        let mut rows = self.rows.write().await;
        if rows.iter().any(|r| {
            r.tenant_id == tenant_id && r.id != id && r.idempotency_key == upgrade.idempotency_key
        }) {
            return Err(LedgerStoreError::KeyConflict(upgrade.idempotency_key));
        }
        let Some(row) = rows
            .iter_mut()
            .find(|r| r.id == id && r.tenant_id == tenant_id && r.activity.is_provisional())
        else {
            return Ok(None);
        };
        upgrade.apply_to(row, OffsetDateTime::now_utc());
        Ok(Some(row.clone()))
    }

    async fn list(&self, query: ListLedgerEntries) -> Result<Vec<LedgerEntry>, LedgerStoreError> {
        self.check_available()?;
        let rows = self.rows.read().await;
        let mut matched: Vec<&LedgerEntry> = rows.iter().filter(|r| query.matches(r)).collect();
        matched.sort_by(|a, b| newest_first(b, a));
        Ok(matched
            .into_iter()
            .skip(usize::try_from(query.offset).unwrap_or(0))
            .take(usize::try_from(query.limit).unwrap_or(0))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{entry_at, provisional_at};
    use time::macros::datetime;

    #[tokio::test]
    async fn test_insert_is_unique_per_tenant_key() {
        let store = MemoryLedgerStore::new();
        let entry = entry_at(datetime!(2024-01-01 10:00:00 UTC), "k1");
        assert!(store.insert(entry.clone()).await.unwrap().is_some());
        assert!(store.insert(entry.clone()).await.unwrap().is_none());

        let other_tenant = LedgerEntryInsert {
            tenant_id: "t2.myshopify.com".into(),
            ..entry
        };
        assert!(store.insert(other_tenant).await.unwrap().is_some());
        assert_eq!(store.entries().await.len(), 2);
    }

    #[tokio::test]
    async fn test_upgrade_only_applies_to_provisional_rows() {
        let store = MemoryLedgerStore::new();
        let row = store
            .insert(provisional_at(datetime!(2024-01-01 10:00:00 UTC), "g1"))
            .await
            .unwrap()
            .unwrap();
        let authoritative = entry_at(datetime!(2024-01-01 10:03:00 UTC), "a1");
        let upgrade = LedgerUpgrade::from(&authoritative);

        let upgraded = store
            .upgrade(&row.tenant_id, row.id, upgrade.clone())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(upgraded.idempotency_key, "a1");
        assert!(upgraded.activity.is_authoritative());

        let again = store.upgrade(&row.tenant_id, row.id, upgrade).await.unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_upgrade_onto_taken_key_conflicts() {
        let store = MemoryLedgerStore::new();
        let ts = datetime!(2024-01-01 10:00:00 UTC);
        store.insert(entry_at(ts, "a1")).await.unwrap();
        let row = store.insert(provisional_at(ts, "g1")).await.unwrap().unwrap();
        let result = store
            .upgrade(&row.tenant_id, row.id, LedgerUpgrade::from(&entry_at(ts, "a1")))
            .await;
        assert!(matches!(result, Err(LedgerStoreError::KeyConflict(k)) if k == "a1"));
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_paginated() {
        let store = MemoryLedgerStore::new();
        for (minute, key) in [(0, "a"), (2, "b"), (1, "c")] {
            let ts = datetime!(2024-01-01 10:00:00 UTC) + time::Duration::minutes(minute);
            store.insert(entry_at(ts, key)).await.unwrap();
        }
        let page = store
            .list(ListLedgerEntries {
                tenant_id: "t1.myshopify.com".into(),
                limit: 2,
                offset: 0,
                ..Default::default()
            })
            .await
            .unwrap();
        let keys: Vec<_> = page.iter().map(|r| r.idempotency_key.as_str()).collect();
        assert_eq!(keys, ["b", "c"]);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails() {
        let store = MemoryLedgerStore::new();
        store.set_unavailable(true);
        let result = store.find_by_key("t1.myshopify.com", "k").await;
        assert!(matches!(result, Err(LedgerStoreError::Unavailable(_))));
    }
}
