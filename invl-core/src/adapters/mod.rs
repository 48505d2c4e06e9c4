//! Event source adapters.
//!
//! Webhook adapters turn platform notifications into ledger writes. The
//! direct-action adapter turns admin API requests into orchestrator calls.

pub mod direct;
pub mod fulfillment;
pub mod generic;

use std::sync::Arc;

use invl_sdk::objects::{WebhookAck, WebhookTopic};
use thiserror::Error;
use time::{Date, OffsetDateTime};

use crate::ledger::{LedgerWrite, LedgerWriter, WriteOutcome};
use crate::platform::{InventoryPlatform, TenantCalendar};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("malformed {topic} payload: {source}")]
    Malformed {
        topic: WebhookTopic,
        #[source]
        source: serde_json::Error,
    },
}

/// What happened to one line of a delivery.
#[derive(Debug)]
pub(crate) enum LineOutcome {
    Write(LedgerWrite),
    /// Not a stock movement the ledger records.
    Skipped(&'static str),
    /// A lookup failed; the rest of the delivery proceeds.
    LookupFailed(String),
}

/// Routes verified webhook deliveries to their adapter.
#[derive(Clone)]
pub struct WebhookIngestor {
    writer: LedgerWriter,
    platform: Arc<dyn InventoryPlatform>,
    calendar: Arc<dyn TenantCalendar>,
}

impl WebhookIngestor {
    pub fn new(
        writer: LedgerWriter,
        platform: Arc<dyn InventoryPlatform>,
        calendar: Arc<dyn TenantCalendar>,
    ) -> Self {
        Self {
            writer,
            platform,
            calendar,
        }
    }

    /// Ingest one delivery. Only an unparseable body is an error; per-line
    /// skips and failures are reported in the acknowledgement.
    #[tracing::instrument(skip(self, body), fields(tenant = %tenant_id, topic = %topic))]
    pub async fn ingest(
        &self,
        tenant_id: &str,
        topic: WebhookTopic,
        body: &[u8],
    ) -> Result<WebhookAck, IngestError> {
        let malformed = |source| IngestError::Malformed { topic, source };
        let lines = match topic {
            WebhookTopic::InventoryLevelsUpdate => {
                let payload = serde_json::from_slice(body).map_err(malformed)?;
                vec![generic::translate(self, tenant_id, payload).await]
            }
            WebhookTopic::FulfillmentsCreate | WebhookTopic::FulfillmentsUpdate => {
                let payload = serde_json::from_slice(body).map_err(malformed)?;
                fulfillment::translate_fulfillment(self, tenant_id, payload).await
            }
            WebhookTopic::OrdersFulfilled
            | WebhookTopic::OrdersPartiallyFulfilled
            | WebhookTopic::OrdersUpdated => {
                let payload = serde_json::from_slice(body).map_err(malformed)?;
                fulfillment::translate_order(self, tenant_id, payload).await
            }
        };

        let mut ack = WebhookAck {
            topic: Some(topic),
            ..Default::default()
        };
        for line in lines {
            match line {
                LineOutcome::Write(write) => match self.writer.write(write).await {
                    Ok(WriteOutcome::Written) => ack.written += 1,
                    Ok(WriteOutcome::Upgraded) => ack.upgraded += 1,
                    Ok(WriteOutcome::Deduplicated) => ack.deduplicated += 1,
                    Err(e) => {
                        tracing::error!(error = %e, "Ledger write failed");
                        ack.failed += 1;
                    }
                },
                LineOutcome::Skipped(reason) => {
                    tracing::debug!(reason, "Line skipped");
                    ack.skipped += 1;
                }
                LineOutcome::LookupFailed(reason) => {
                    tracing::warn!(%reason, "Line lookup failed");
                    ack.failed += 1;
                }
            }
        }
        tracing::info!(
            written = ack.written,
            upgraded = ack.upgraded,
            deduplicated = ack.deduplicated,
            skipped = ack.skipped,
            failed = ack.failed,
            "Webhook ingested"
        );
        Ok(ack)
    }

    pub(crate) async fn local_date(&self, tenant_id: &str, at: OffsetDateTime) -> Date {
        self.calendar.local_date(tenant_id, at).await
    }

    /// Best-effort current available quantity.
    pub(crate) async fn read_available(
        &self,
        tenant_id: &str,
        inventory_item_id: &str,
        location_id: &str,
    ) -> Option<i64> {
        match self
            .platform
            .read_available(tenant_id, inventory_item_id, location_id)
            .await
        {
            Ok(available) => available,
            Err(e) => {
                tracing::debug!(error = %e, inventory_item_id, "Available quantity lookup failed");
                None
            }
        }
    }

    /// Best-effort location name for display.
    pub(crate) async fn location_name(&self, tenant_id: &str, location_id: &str) -> Option<String> {
        match self.platform.location_name(tenant_id, location_id).await {
            Ok(name) => name,
            Err(e) => {
                tracing::debug!(error = %e, location_id, "Location name lookup failed");
                None
            }
        }
    }
}
