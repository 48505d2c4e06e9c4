use std::sync::Arc;

use invl_sdk::objects::LedgerTallyResponse;

use super::delta::{Sign, compute_delta};
use super::matcher::ReconciliationMatcher;
use super::store::{LedgerStore, LedgerStoreError, StockScope};
use crate::entities::ledger_entry::{LedgerEntryInsert, LedgerUpgrade};

/// What a write did to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The key was already recorded. Not an error.
    Deduplicated,
    /// A provisional row was upgraded in place.
    Upgraded,
}

impl WriteOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            WriteOutcome::Written => "written",
            WriteOutcome::Deduplicated => "deduplicated",
            WriteOutcome::Upgraded => "upgraded",
        }
    }
}

/// A change seen only as "this much, this way".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservedChange {
    pub magnitude: Option<i64>,
    pub sign: Sign,
}

#[derive(Debug, Clone)]
pub struct LedgerWrite {
    pub entry: LedgerEntryInsert,
    /// When set, `entry.delta` is computed against the stored baseline.
    /// When unset, `entry.delta` is taken as given.
    pub observed: Option<ObservedChange>,
}

impl LedgerWrite {
    pub fn exact(entry: LedgerEntryInsert) -> Self {
        Self {
            entry,
            observed: None,
        }
    }

    pub fn observed(entry: LedgerEntryInsert, magnitude: Option<i64>, sign: Sign) -> Self {
        Self {
            entry,
            observed: Some(ObservedChange { magnitude, sign }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerWriteError {
    #[error("ledger store error: {0}")]
    Store(#[from] LedgerStoreError),
}

/// Per-request count of write outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerTally {
    pub written: u32,
    pub upgraded: u32,
    pub deduplicated: u32,
    pub failed: u32,
}

impl LedgerTally {
    pub fn record(&mut self, result: &Result<WriteOutcome, LedgerWriteError>) {
        match result {
            Ok(WriteOutcome::Written) => self.written += 1,
            Ok(WriteOutcome::Upgraded) => self.upgraded += 1,
            Ok(WriteOutcome::Deduplicated) => self.deduplicated += 1,
            Err(_) => self.failed += 1,
        }
    }
}

impl From<LedgerTally> for LedgerTallyResponse {
    fn from(t: LedgerTally) -> Self {
        Self {
            written: t.written,
            upgraded: t.upgraded,
            deduplicated: t.deduplicated,
            failed: t.failed,
        }
    }
}

/// The single entry point every producer writes through.
#[derive(Clone)]
pub struct LedgerWriter {
    store: Arc<dyn LedgerStore>,
    matcher: ReconciliationMatcher,
}

impl LedgerWriter {
    pub fn new(store: Arc<dyn LedgerStore>, matcher: ReconciliationMatcher) -> Self {
        Self { store, matcher }
    }

    /// Record one change.
    ///
    /// 1. An existing key makes the write a no-op.
    /// 2. An authoritative write takes over the latest provisional row of
    ///    the same stream inside the reconciliation window.
    /// 3. A provisional write that only reports the outcome of the newest
    ///    authoritative row inside the window is a no-op.
    /// 4. Anything else is inserted.
    #[tracing::instrument(
        skip_all,
        fields(
            tenant = %write.entry.tenant_id,
            inventory_item_id = %write.entry.inventory_item_id,
            location_id = %write.entry.location_id,
            idempotency_key = %write.entry.idempotency_key,
            activity = %write.entry.activity,
        )
    )]
    pub async fn write(&self, write: LedgerWrite) -> Result<WriteOutcome, LedgerWriteError> {
        let LedgerWrite {
            mut entry,
            observed,
        } = write;

        if self
            .store
            .find_by_key(&entry.tenant_id, &entry.idempotency_key)
            .await?
            .is_some()
        {
            tracing::debug!(outcome = "deduplicated", "Key already recorded");
            return Ok(WriteOutcome::Deduplicated);
        }

        let scope = StockScope::new(&entry.tenant_id, &entry.inventory_item_id, &entry.location_id);
        let candidate = if entry.activity.is_authoritative() {
            self.matcher
                .find_upgrade_candidate(&scope, entry.occurred_at)
                .await?
        } else {
            if let Some(row) = self
                .matcher
                .find_echoed_authoritative(&scope, entry.occurred_at, entry.quantity_after)
                .await?
            {
                tracing::debug!(
                    outcome = "deduplicated",
                    ledger_id = row.id,
                    "Generic signal echoes a recorded change"
                );
                return Ok(WriteOutcome::Deduplicated);
            }
            None
        };

        if let Some(observed) = observed {
            // The candidate describes this very change, so it is not the baseline.
            entry.delta = self
                .delta_against_baseline(&scope, &entry, observed, candidate.as_ref().map(|c| c.id))
                .await?;
        }

        if let Some(candidate) = candidate {
            match self
                .store
                .upgrade(&entry.tenant_id, candidate.id, LedgerUpgrade::from(&entry))
                .await
            {
                Ok(Some(row)) => {
                    tracing::info!(
                        outcome = "upgraded",
                        ledger_id = row.id,
                        delta = ?row.delta,
                        "Provisional ledger entry upgraded"
                    );
                    return Ok(WriteOutcome::Upgraded);
                }
                Ok(None) => {
                    tracing::debug!(
                        ledger_id = candidate.id,
                        "Candidate upgraded concurrently, inserting instead"
                    );
                    if let Some(observed) = observed {
                        entry.delta = self
                            .delta_against_baseline(&scope, &entry, observed, None)
                            .await?;
                    }
                }
                Err(LedgerStoreError::KeyConflict(_)) => {
                    tracing::debug!(outcome = "deduplicated", "Key taken during upgrade");
                    return Ok(WriteOutcome::Deduplicated);
                }
                Err(e) => return Err(e.into()),
            }
        }

        match self.store.insert(entry).await? {
            Some(row) => {
                tracing::info!(
                    outcome = "written",
                    ledger_id = row.id,
                    delta = ?row.delta,
                    "Ledger entry written"
                );
                Ok(WriteOutcome::Written)
            }
            None => {
                tracing::debug!(outcome = "deduplicated", "Lost insert race on key");
                Ok(WriteOutcome::Deduplicated)
            }
        }
    }

    async fn delta_against_baseline(
        &self,
        scope: &StockScope,
        entry: &LedgerEntryInsert,
        observed: ObservedChange,
        exclude_id: Option<i64>,
    ) -> Result<Option<i64>, LedgerStoreError> {
        let baseline = self.store.latest_for(scope, exclude_id).await?;
        Ok(compute_delta(
            baseline.and_then(|row| row.quantity_after),
            entry.quantity_after,
            observed.magnitude,
            observed.sign,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Reloadable;
    use crate::entities::LedgerActivity;
    use crate::ledger::{MemoryLedgerStore, ReconciliationWindow};
    use crate::testing::{entry_at, provisional_at};
    use time::macros::datetime;

    fn writer(store: &Arc<MemoryLedgerStore>) -> LedgerWriter {
        let store: Arc<dyn LedgerStore> = store.clone();
        let matcher =
            ReconciliationMatcher::new(store.clone(), Reloadable::new(ReconciliationWindow::default()));
        LedgerWriter::new(store, matcher)
    }

    #[tokio::test]
    async fn test_redelivery_is_deduplicated() {
        let store = Arc::new(MemoryLedgerStore::new());
        let writer = writer(&store);
        let entry = entry_at(datetime!(2024-01-01 10:00:00 UTC), "k1");

        let first = writer.write(LedgerWrite::exact(entry.clone())).await.unwrap();
        assert_eq!(first, WriteOutcome::Written);
        for _ in 0..3 {
            let again = writer.write(LedgerWrite::exact(entry.clone())).await.unwrap();
            assert_eq!(again, WriteOutcome::Deduplicated);
        }
        assert_eq!(store.entries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_authoritative_upgrades_provisional() {
        let store = Arc::new(MemoryLedgerStore::new());
        let writer = writer(&store);
        let generic = LedgerEntryInsert {
            delta: Some(-1),
            quantity_after: Some(9),
            ..provisional_at(datetime!(2024-01-01 10:00:00 UTC), "g1")
        };
        writer.write(LedgerWrite::exact(generic)).await.unwrap();

        let sale = LedgerEntryInsert {
            sku: Some("SKU-1".into()),
            ..entry_at(datetime!(2024-01-01 10:03:00 UTC), "s1")
        };
        let outcome = writer
            .write(LedgerWrite::observed(sale, Some(1), Sign::Decrease))
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Upgraded);

        let rows = store.entries().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].activity, LedgerActivity::OrderSales);
        assert_eq!(rows[0].idempotency_key, "s1");
        assert_eq!(rows[0].delta, Some(-1));
        assert_eq!(rows[0].quantity_after, Some(9));
        assert_eq!(rows[0].sku.as_deref(), Some("SKU-1"));
        assert_eq!(rows[0].superseded_key.as_deref(), Some("g1"));

        // The generic signal arriving again must not reopen the change.
        let redelivered = provisional_at(datetime!(2024-01-01 10:00:00 UTC), "g1");
        let outcome = writer.write(LedgerWrite::exact(redelivered)).await.unwrap();
        assert_eq!(outcome, WriteOutcome::Deduplicated);
        assert_eq!(store.entries().await.len(), 1);
    }

    async fn authoritative_after_generic(at: time::OffsetDateTime) -> (WriteOutcome, usize) {
        let store = Arc::new(MemoryLedgerStore::new());
        let writer = writer(&store);
        writer
            .write(LedgerWrite::exact(provisional_at(
                datetime!(2024-01-01 10:00:00 UTC),
                "g1",
            )))
            .await
            .unwrap();
        let outcome = writer.write(LedgerWrite::exact(entry_at(at, "s1"))).await.unwrap();
        (outcome, store.entries().await.len())
    }

    #[tokio::test]
    async fn test_no_upgrade_outside_window() {
        let (outcome, rows) = authoritative_after_generic(datetime!(2024-01-01 10:10:00 UTC)).await;
        assert_eq!(outcome, WriteOutcome::Written);
        assert_eq!(rows, 2);

        let (outcome, rows) = authoritative_after_generic(datetime!(2024-01-01 10:05:01 UTC)).await;
        assert_eq!(outcome, WriteOutcome::Written);
        assert_eq!(rows, 2);

        let (outcome, rows) = authoritative_after_generic(datetime!(2024-01-01 09:29:59 UTC)).await;
        assert_eq!(outcome, WriteOutcome::Written);
        assert_eq!(rows, 2);
    }

    #[tokio::test]
    async fn test_window_edges_upgrade() {
        for at in [
            datetime!(2024-01-01 10:05:00 UTC),
            datetime!(2024-01-01 09:30:00 UTC),
        ] {
            let (outcome, rows) = authoritative_after_generic(at).await;
            assert_eq!(outcome, WriteOutcome::Upgraded, "{at}");
            assert_eq!(rows, 1, "{at}");
        }
    }

    #[tokio::test]
    async fn test_generic_echo_of_recorded_change_is_deduplicated() {
        let store = Arc::new(MemoryLedgerStore::new());
        let writer = writer(&store);
        let adjustment = LedgerEntryInsert {
            activity: LedgerActivity::ManualAdjustment,
            delta: Some(-2),
            quantity_after: Some(8),
            ..entry_at(datetime!(2024-01-01 10:00:00 UTC), "adj")
        };
        writer.write(LedgerWrite::exact(adjustment)).await.unwrap();

        let echo = LedgerEntryInsert {
            quantity_after: Some(8),
            ..provisional_at(datetime!(2024-01-01 10:00:40 UTC), "g1")
        };
        let outcome = writer
            .write(LedgerWrite::observed(echo, None, Sign::Decrease))
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Deduplicated);
        assert_eq!(store.entries().await.len(), 1);

        // A different level is a new change.
        let next = LedgerEntryInsert {
            quantity_after: Some(5),
            ..provisional_at(datetime!(2024-01-01 10:02:00 UTC), "g2")
        };
        let outcome = writer
            .write(LedgerWrite::observed(next, None, Sign::Decrease))
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Written);
        let rows = store.entries().await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].delta, Some(-3));
    }

    #[tokio::test]
    async fn test_provisional_never_upgrades_provisional() {
        let store = Arc::new(MemoryLedgerStore::new());
        let writer = writer(&store);
        let ts = datetime!(2024-01-01 10:00:00 UTC);
        writer.write(LedgerWrite::exact(provisional_at(ts, "g1"))).await.unwrap();
        let outcome = writer
            .write(LedgerWrite::exact(provisional_at(ts + time::Duration::minutes(1), "g2")))
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Written);
        assert_eq!(store.entries().await.len(), 2);
    }

    #[tokio::test]
    async fn test_delta_uses_previous_quantity() {
        let store = Arc::new(MemoryLedgerStore::new());
        let writer = writer(&store);
        let first = LedgerEntryInsert {
            quantity_after: Some(10),
            ..entry_at(datetime!(2024-01-01 08:00:00 UTC), "a")
        };
        writer.write(LedgerWrite::exact(first)).await.unwrap();

        let second = LedgerEntryInsert {
            quantity_after: Some(7),
            ..entry_at(datetime!(2024-01-01 09:00:00 UTC), "b")
        };
        writer
            .write(LedgerWrite::observed(second, Some(5), Sign::Decrease))
            .await
            .unwrap();

        let rows = store.entries().await;
        assert_eq!(rows[1].delta, Some(-3));
    }

    #[tokio::test]
    async fn test_delta_falls_back_to_magnitude_without_baseline() {
        let store = Arc::new(MemoryLedgerStore::new());
        let writer = writer(&store);
        let entry = LedgerEntryInsert {
            quantity_after: Some(7),
            ..entry_at(datetime!(2024-01-01 09:00:00 UTC), "b")
        };
        writer
            .write(LedgerWrite::observed(entry, Some(3), Sign::Decrease))
            .await
            .unwrap();
        assert_eq!(store.entries().await[0].delta, Some(-3));
    }

    #[tokio::test]
    async fn test_store_failure_is_an_error_not_a_panic() {
        let store = Arc::new(MemoryLedgerStore::new());
        let writer = writer(&store);
        store.set_unavailable(true);
        let result = writer
            .write(LedgerWrite::exact(entry_at(datetime!(2024-01-01 09:00:00 UTC), "b")))
            .await;
        assert!(matches!(
            result,
            Err(LedgerWriteError::Store(LedgerStoreError::Unavailable(_)))
        ));

        let mut tally = LedgerTally::default();
        tally.record(&result);
        tally.record(&Ok(WriteOutcome::Upgraded));
        assert_eq!(tally.failed, 1);
        assert_eq!(tally.upgraded, 1);
    }
}
