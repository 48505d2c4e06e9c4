//! Reconciliation of provisional rows with later authoritative signals.

use std::sync::Arc;

use time::{Duration, OffsetDateTime};

use super::store::{LedgerStore, LedgerStoreError, StockScope};
use crate::config::Reloadable;
use crate::entities::ledger_entry::LedgerEntry;

/// How far an authoritative event may sit from the provisional row it
/// explains, measured from the provisional row's event time.
///
/// An authoritative event up to `lookback` before or `lookahead` after a
/// generic signal describes the same change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationWindow {
    pub lookback: Duration,
    pub lookahead: Duration,
}

impl Default for ReconciliationWindow {
    fn default() -> Self {
        Self {
            lookback: Duration::minutes(30),
            lookahead: Duration::minutes(5),
        }
    }
}

impl ReconciliationWindow {
    pub fn from_minutes(lookback: u32, lookahead: u32) -> Self {
        Self {
            lookback: Duration::minutes(i64::from(lookback)),
            lookahead: Duration::minutes(i64::from(lookahead)),
        }
    }

    /// Whether an authoritative event at `authoritative_at` may explain a
    /// provisional row at `provisional_at`. Both bounds are inclusive.
    pub fn contains(
        &self,
        provisional_at: OffsetDateTime,
        authoritative_at: OffsetDateTime,
    ) -> bool {
        authoritative_at >= provisional_at - self.lookback
            && authoritative_at <= provisional_at + self.lookahead
    }

    /// Inclusive `[from, to]` provisional event times an authoritative event
    /// at `authoritative_at` may explain.
    pub fn candidate_bounds(
        &self,
        authoritative_at: OffsetDateTime,
    ) -> (OffsetDateTime, OffsetDateTime) {
        (
            authoritative_at - self.lookahead,
            authoritative_at + self.lookback,
        )
    }
}

#[derive(Clone)]
pub struct ReconciliationMatcher {
    store: Arc<dyn LedgerStore>,
    window: Reloadable<ReconciliationWindow>,
}

impl ReconciliationMatcher {
    pub fn new(store: Arc<dyn LedgerStore>, window: Reloadable<ReconciliationWindow>) -> Self {
        Self { store, window }
    }

    /// The most recent provisional row of the stream that an authoritative
    /// event at `authoritative_at` may explain, if any.
    pub async fn find_upgrade_candidate(
        &self,
        scope: &StockScope,
        authoritative_at: OffsetDateTime,
    ) -> Result<Option<LedgerEntry>, LedgerStoreError> {
        let window = self.window.snapshot().await;
        let (from, to) = window.candidate_bounds(authoritative_at);
        self.store.latest_provisional_between(scope, from, to).await
    }

    /// The authoritative row a late generic signal merely echoes.
    ///
    /// Matches only when that row is still the newest of the stream, lies
    /// inside the window and left the stock at the reported quantity.
    pub async fn find_echoed_authoritative(
        &self,
        scope: &StockScope,
        provisional_at: OffsetDateTime,
        quantity_after: Option<i64>,
    ) -> Result<Option<LedgerEntry>, LedgerStoreError> {
        let Some(quantity_after) = quantity_after else {
            return Ok(None);
        };
        let window = self.window.snapshot().await;
        let latest = self.store.latest_for(scope, None).await?;
        Ok(latest.filter(|row| {
            row.activity.is_authoritative()
                && row.quantity_after == Some(quantity_after)
                && window.contains(provisional_at, row.occurred_at)
        }))
    }
}
