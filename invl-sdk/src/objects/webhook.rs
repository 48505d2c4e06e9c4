//! Inbound webhook topics and payloads.
//!
//! Only the fields the ledger needs are modelled; everything else in the
//! platform's payload is ignored by serde.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

use super::id;

/// Webhook topics the ledger subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebhookTopic {
    /// Generic "stock level changed" signal, no cause attached.
    #[serde(rename = "inventory_levels/update")]
    InventoryLevelsUpdate,
    #[serde(rename = "orders/fulfilled")]
    OrdersFulfilled,
    #[serde(rename = "orders/partially_fulfilled")]
    OrdersPartiallyFulfilled,
    #[serde(rename = "orders/updated")]
    OrdersUpdated,
    #[serde(rename = "fulfillments/create")]
    FulfillmentsCreate,
    #[serde(rename = "fulfillments/update")]
    FulfillmentsUpdate,
}

impl WebhookTopic {
    pub const ALL: [WebhookTopic; 6] = [
        WebhookTopic::InventoryLevelsUpdate,
        WebhookTopic::OrdersFulfilled,
        WebhookTopic::OrdersPartiallyFulfilled,
        WebhookTopic::OrdersUpdated,
        WebhookTopic::FulfillmentsCreate,
        WebhookTopic::FulfillmentsUpdate,
    ];

    /// The platform's REST spelling of the topic.
    pub fn as_str(self) -> &'static str {
        match self {
            WebhookTopic::InventoryLevelsUpdate => "inventory_levels/update",
            WebhookTopic::OrdersFulfilled => "orders/fulfilled",
            WebhookTopic::OrdersPartiallyFulfilled => "orders/partially_fulfilled",
            WebhookTopic::OrdersUpdated => "orders/updated",
            WebhookTopic::FulfillmentsCreate => "fulfillments/create",
            WebhookTopic::FulfillmentsUpdate => "fulfillments/update",
        }
    }

    /// Parse a topic header value.
    ///
    /// Case and separators are ignored, so `ORDERS_FULFILLED`,
    /// `orders/fulfilled` and `Orders-Fulfilled` are the same topic.
    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = squash(raw);
        if wanted.is_empty() {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|topic| squash(topic.as_str()) == wanted)
    }
}

fn squash(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl fmt::Display for WebhookTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a topic header does not name a known topic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized webhook topic: {0}")]
pub struct UnknownTopic(pub String);

impl FromStr for WebhookTopic {
    type Err = UnknownTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownTopic(s.to_owned()))
    }
}

/// `inventory_levels/update` payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InventoryLevelPayload {
    #[serde(deserialize_with = "id::flexible")]
    pub inventory_item_id: String,
    #[serde(deserialize_with = "id::flexible")]
    pub location_id: String,
    /// Absolute available quantity after the change.
    pub available: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Order payload (`orders/*` topics).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderPayload {
    #[serde(deserialize_with = "id::flexible")]
    pub id: String,
    /// Human-readable order name (`#1001`).
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub cancelled_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    /// Location the order was assigned to; used when a fulfillment omits its own.
    #[serde(default, deserialize_with = "id::flexible_option")]
    pub location_id: Option<String>,
    #[serde(default)]
    pub fulfillments: Vec<FulfillmentPayload>,
}

/// Fulfillment payload (`fulfillments/*` topics, and nested in orders).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FulfillmentPayload {
    #[serde(deserialize_with = "id::flexible")]
    pub id: String,
    #[serde(default, deserialize_with = "id::flexible_option")]
    pub order_id: Option<String>,
    /// `success`, `open`, `pending`, `cancelled`, `error`, `failure`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "id::flexible_option")]
    pub location_id: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub line_items: Vec<FulfillmentLineItem>,
}

impl FulfillmentPayload {
    /// Stock leaves the location only for completed or open fulfillments.
    pub fn moves_stock(&self) -> bool {
        matches!(self.status.as_deref(), Some("success") | Some("open"))
    }
}

/// A line item inside a fulfillment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FulfillmentLineItem {
    #[serde(deserialize_with = "id::flexible")]
    pub id: String,
    #[serde(default, deserialize_with = "id::flexible_option")]
    pub variant_id: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    pub quantity: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_spellings() {
        for raw in [
            "orders/fulfilled",
            "ORDERS_FULFILLED",
            "Orders-Fulfilled",
            " orders.fulfilled ",
        ] {
            assert_eq!(WebhookTopic::parse(raw), Some(WebhookTopic::OrdersFulfilled), "{raw}");
        }
        assert_eq!(
            WebhookTopic::parse("INVENTORY_LEVELS_UPDATE"),
            Some(WebhookTopic::InventoryLevelsUpdate)
        );
        assert_eq!(WebhookTopic::parse("orders/create"), None);
        assert_eq!(WebhookTopic::parse("///"), None);
        assert!("products/update".parse::<WebhookTopic>().is_err());
    }

    #[test]
    fn test_inventory_level_payload_numeric_ids() {
        let json = r#"{
            "inventory_item_id": 271878346596884015,
            "location_id": 24826418,
            "available": 6,
            "updated_at": "2024-01-01T10:00:00-05:00",
            "admin_graphql_api_id": "gid://shopify/InventoryLevel/24826418?inventory_item_id=271878346596884015"
        }"#;
        let payload: InventoryLevelPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.inventory_item_id, "271878346596884015");
        assert_eq!(payload.location_id, "24826418");
        assert_eq!(payload.available, Some(6));
        assert_eq!(payload.updated_at.unix_timestamp(), 1_704_121_200);
    }

    #[test]
    fn test_order_payload_defaults() {
        let json = r#"{
            "id": "order_123",
            "cancelled_at": null,
            "location_id": null,
            "fulfillments": [{
                "id": 9,
                "status": "success",
                "created_at": "2024-01-01T10:03:00Z",
                "line_items": [{"id": 1, "variant_id": 55, "sku": "SKU-1", "quantity": 3}]
            }]
        }"#;
        let order: OrderPayload = serde_json::from_str(json).unwrap();
        assert_eq!(order.id, "order_123");
        assert!(order.cancelled_at.is_none());
        assert!(order.location_id.is_none());
        let fulfillment = &order.fulfillments[0];
        assert!(fulfillment.moves_stock());
        assert_eq!(fulfillment.location_id, None);
        assert_eq!(fulfillment.line_items[0].variant_id.as_deref(), Some("55"));
    }
}
