//! Order and fulfillment topics: stock left the location because it was sold.

use invl_sdk::objects::{FulfillmentLineItem, FulfillmentPayload, OrderPayload};
use time::OffsetDateTime;

use super::{LineOutcome, WebhookIngestor};
use crate::entities::LedgerActivity;
use crate::entities::ledger_entry::LedgerEntryInsert;
use crate::ids::canonical_id;
use crate::ledger::{KeyParts, LedgerWrite, Sign, derive_key};

pub(crate) const SOURCE_TYPE: &str = "order";

/// Order-level context a fulfillment inherits when it lacks its own.
#[derive(Debug, Default)]
struct OrderContext<'a> {
    order_id: Option<&'a str>,
    location_id: Option<&'a str>,
    updated_at: Option<OffsetDateTime>,
    name: Option<&'a str>,
}

pub(crate) async fn translate_order(
    ctx: &WebhookIngestor,
    tenant_id: &str,
    order: OrderPayload,
) -> Vec<LineOutcome> {
    if order.cancelled_at.is_some() {
        return vec![LineOutcome::Skipped("order cancelled")];
    }
    let order_ctx = OrderContext {
        order_id: Some(order.id.as_str()),
        location_id: order.location_id.as_deref(),
        updated_at: order.updated_at,
        name: order.name.as_deref(),
    };
    let mut lines = Vec::new();
    for fulfillment in &order.fulfillments {
        lines.extend(translate_one(ctx, tenant_id, fulfillment, &order_ctx).await);
    }
    lines
}

pub(crate) async fn translate_fulfillment(
    ctx: &WebhookIngestor,
    tenant_id: &str,
    fulfillment: FulfillmentPayload,
) -> Vec<LineOutcome> {
    let order_ctx = OrderContext {
        order_id: fulfillment.order_id.as_deref(),
        ..Default::default()
    };
    translate_one(ctx, tenant_id, &fulfillment, &order_ctx).await
}

async fn translate_one(
    ctx: &WebhookIngestor,
    tenant_id: &str,
    fulfillment: &FulfillmentPayload,
    order: &OrderContext<'_>,
) -> Vec<LineOutcome> {
    if !fulfillment.moves_stock() {
        return vec![LineOutcome::Skipped("fulfillment not in success or open state")];
    }
    let Some(order_id) = order.order_id.map(canonical_id).filter(|id| !id.is_empty()) else {
        return vec![LineOutcome::Skipped("fulfillment without order")];
    };
    let Some(location_id) = fulfillment
        .location_id
        .as_deref()
        .or(order.location_id)
        .map(canonical_id)
        .filter(|id| !id.is_empty())
    else {
        return vec![LineOutcome::Skipped("fulfillment without location")];
    };
    let Some(occurred_at) = fulfillment
        .created_at
        .or(fulfillment.updated_at)
        .or(order.updated_at)
    else {
        return vec![LineOutcome::Skipped("fulfillment without timestamp")];
    };

    let calendar_date = ctx.local_date(tenant_id, occurred_at).await;
    let location_name = ctx.location_name(tenant_id, &location_id).await;
    let fulfillment_id = canonical_id(&fulfillment.id);
    let note = order.name.map(|name| format!("Fulfilled for order {name}"));

    let mut lines = Vec::with_capacity(fulfillment.line_items.len());
    for item in &fulfillment.line_items {
        let line = LineContext {
            tenant_id,
            order_id: &order_id,
            fulfillment_id: &fulfillment_id,
            location_id: &location_id,
            location_name: location_name.as_deref(),
            occurred_at,
            calendar_date,
            note: note.as_deref(),
        };
        lines.push(translate_line(ctx, &line, item).await);
    }
    lines
}

struct LineContext<'a> {
    tenant_id: &'a str,
    order_id: &'a str,
    fulfillment_id: &'a str,
    location_id: &'a str,
    location_name: Option<&'a str>,
    occurred_at: OffsetDateTime,
    calendar_date: time::Date,
    note: Option<&'a str>,
}

async fn translate_line(
    ctx: &WebhookIngestor,
    line: &LineContext<'_>,
    item: &FulfillmentLineItem,
) -> LineOutcome {
    if item.quantity <= 0 {
        return LineOutcome::Skipped("line without quantity");
    }
    let Some(variant_id) = item.variant_id.as_deref().map(canonical_id) else {
        return LineOutcome::Skipped("line without variant");
    };
    let resolved = match ctx.platform.resolve_variant(line.tenant_id, &variant_id).await {
        Ok(Some(resolved)) => resolved,
        Ok(None) => return LineOutcome::Skipped("variant not found"),
        Err(e) => return LineOutcome::LookupFailed(format!("variant {variant_id}: {e}")),
    };
    let Some(sku) = resolved
        .sku
        .or_else(|| item.sku.clone())
        .filter(|sku| !sku.trim().is_empty())
    else {
        return LineOutcome::Skipped("line without sku");
    };
    let inventory_item_id = canonical_id(&resolved.inventory_item_id);
    let sub_source = format!("{}:{}", line.fulfillment_id, canonical_id(&item.id));

    let quantity_after = ctx
        .read_available(line.tenant_id, &inventory_item_id, line.location_id)
        .await;
    let idempotency_key = derive_key(&KeyParts {
        tenant_id: line.tenant_id,
        activity_class: LedgerActivity::OrderSales.as_str(),
        inventory_item_id: &inventory_item_id,
        location_id: line.location_id,
        source_id: Some(line.order_id),
        sub_source_id: Some(&sub_source),
        timestamp: line.occurred_at,
    });
    let entry = LedgerEntryInsert {
        tenant_id: line.tenant_id.to_owned(),
        occurred_at: line.occurred_at,
        calendar_date: line.calendar_date,
        inventory_item_id,
        variant_id: Some(variant_id),
        sku: Some(sku),
        location_id: line.location_id.to_owned(),
        location_name: line.location_name.map(str::to_owned),
        activity: LedgerActivity::OrderSales,
        delta: None,
        quantity_after,
        source_type: SOURCE_TYPE.to_owned(),
        source_id: line.order_id.to_owned(),
        adjustment_group_id: None,
        idempotency_key,
        note: line.note.map(str::to_owned),
    };
    LineOutcome::Write(LedgerWrite::observed(entry, Some(item.quantity), Sign::Decrease))
}

#[cfg(test)]
mod tests {
    use invl_sdk::objects::WebhookTopic;
    use time::macros::datetime;

    use crate::entities::LedgerActivity;
    use crate::testing::{Harness, ScriptedPlatform};

    fn platform() -> ScriptedPlatform {
        ScriptedPlatform::default()
            .with_variant("55", "inv_1", Some("SKU-1"))
            .with_variant("56", "inv_2", None)
            .with_available("inv_1", "loc_1", 9)
            .with_location_name("loc_1", "Main warehouse")
    }

    fn level_update(available: i64, at: &str) -> String {
        format!(
            r#"{{"inventory_item_id": "inv_1", "location_id": "loc_1",
                "available": {available}, "updated_at": "{at}"}}"#
        )
    }

    fn order_fulfilled(status: &str, cancelled_at: Option<&str>) -> String {
        let cancelled_at = cancelled_at.map_or("null".to_owned(), |c| format!("\"{c}\""));
        format!(
            r##"{{
                "id": "order_123",
                "name": "#1001",
                "cancelled_at": {cancelled_at},
                "fulfillments": [{{
                    "id": "f1",
                    "status": "{status}",
                    "location_id": "gid://shopify/Location/loc_1",
                    "created_at": "2024-01-01T10:03:00Z",
                    "line_items": [
                        {{"id": "li1", "variant_id": 55, "quantity": 1}},
                        {{"id": "li2", "variant_id": 56, "quantity": 2}},
                        {{"id": "li3", "quantity": 1}}
                    ]
                }}]
            }}"##
        )
    }

    #[tokio::test]
    async fn test_generic_then_fulfillment_then_redelivery() {
        let h = Harness::new(platform());
        let tenant = "t1.myshopify.com";

        let ack = h
            .ingestor
            .ingest(
                tenant,
                WebhookTopic::InventoryLevelsUpdate,
                level_update(9, "2024-01-01T10:00:00Z").as_bytes(),
            )
            .await
            .unwrap();
        assert_eq!(ack.written, 1);
        let rows = h.ledger.entries().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].activity, LedgerActivity::GenericWebhook);
        assert_eq!(rows[0].quantity_after, Some(9));
        assert_eq!(rows[0].delta, None);

        let body = order_fulfilled("success", None);
        let ack = h
            .ingestor
            .ingest(tenant, WebhookTopic::OrdersFulfilled, body.as_bytes())
            .await
            .unwrap();
        assert_eq!(ack.upgraded, 1);
        assert_eq!(ack.skipped, 2);

        let rows = h.ledger.entries().await;
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.activity, LedgerActivity::OrderSales);
        assert_eq!(row.source_id, "order_123");
        assert_eq!(row.source_type, "order");
        assert_eq!(row.delta, Some(-1));
        assert_eq!(row.quantity_after, Some(9));
        assert_eq!(row.sku.as_deref(), Some("SKU-1"));
        assert_eq!(row.variant_id.as_deref(), Some("55"));
        assert_eq!(row.location_name.as_deref(), Some("Main warehouse"));
        assert_eq!(row.occurred_at, datetime!(2024-01-01 10:00:00 UTC));
        let upgraded_key = row.idempotency_key.clone();

        for topic in [WebhookTopic::OrdersFulfilled, WebhookTopic::OrdersUpdated] {
            let ack = h.ingestor.ingest(tenant, topic, body.as_bytes()).await.unwrap();
            assert_eq!(ack.deduplicated, 1);
            assert_eq!(ack.written + ack.upgraded, 0);
        }
        let rows = h.ledger.entries().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].idempotency_key, upgraded_key);
    }

    #[tokio::test]
    async fn test_cancelled_and_unfinished_fulfillments_are_skipped() {
        let h = Harness::new(platform());
        let tenant = "t1.myshopify.com";

        let cancelled = order_fulfilled("success", Some("2024-01-01T11:00:00Z"));
        let ack = h
            .ingestor
            .ingest(tenant, WebhookTopic::OrdersUpdated, cancelled.as_bytes())
            .await
            .unwrap();
        assert_eq!(ack.skipped, 1);

        let pending = order_fulfilled("pending", None);
        let ack = h
            .ingestor
            .ingest(tenant, WebhookTopic::OrdersUpdated, pending.as_bytes())
            .await
            .unwrap();
        assert_eq!(ack.skipped, 1);
        assert!(h.ledger.entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_fulfillment_topic_without_generic_inserts() {
        let h = Harness::new(platform());
        let body = r#"{
            "id": 9001,
            "order_id": 123,
            "status": "success",
            "location_id": "loc_1",
            "created_at": "2024-01-01T10:03:00Z",
            "line_items": [{"id": 1, "variant_id": "gid://shopify/ProductVariant/55", "quantity": 3}]
        }"#;
        let ack = h
            .ingestor
            .ingest("t1.myshopify.com", WebhookTopic::FulfillmentsCreate, body.as_bytes())
            .await
            .unwrap();
        assert_eq!(ack.written, 1);

        let rows = h.ledger.entries().await;
        assert_eq!(rows[0].source_id, "123");
        assert_eq!(rows[0].delta, Some(-3));
        assert!(rows[0].idempotency_key.contains(":9001:1:"));
    }

    #[tokio::test]
    async fn test_lookup_failure_skips_only_that_line() {
        let platform = platform().with_failing_variant("56");
        let h = Harness::new(platform);
        let body = order_fulfilled("open", None);

        let ack = h
            .ingestor
            .ingest("t1.myshopify.com", WebhookTopic::OrdersPartiallyFulfilled, body.as_bytes())
            .await
            .unwrap();
        assert_eq!(ack.written, 1);
        assert_eq!(ack.failed, 1);
        assert_eq!(ack.skipped, 1);
    }

    #[tokio::test]
    async fn test_generic_delta_uses_baseline() {
        let h = Harness::new(platform());
        let tenant = "t1.myshopify.com";
        for (available, at) in [(10, "2024-01-01T08:00:00Z"), (7, "2024-01-01T09:00:00Z")] {
            h.ingestor
                .ingest(
                    tenant,
                    WebhookTopic::InventoryLevelsUpdate,
                    level_update(available, at).as_bytes(),
                )
                .await
                .unwrap();
        }
        let rows = h.ledger.entries().await;
        assert_eq!(rows[0].delta, None);
        assert_eq!(rows[1].delta, Some(-3));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let h = Harness::new(platform());
        let result = h
            .ingestor
            .ingest("t1.myshopify.com", WebhookTopic::OrdersFulfilled, b"{not json")
            .await;
        assert!(result.is_err());
        assert!(h.ledger.entries().await.is_empty());
    }
}
