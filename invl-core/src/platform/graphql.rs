//! Admin GraphQL client for the commerce platform.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use super::{AdjustOutcome, AdjustRequest, InventoryPlatform, PlatformError, ResolvedVariant};
use crate::config::{PlatformConfig, Reloadable, TenantDirectory};
use crate::ids::{ResourceKind, canonical_id, gid};

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";
const AVAILABLE: &str = "available";

const ADJUST_MUTATION: &str = r#"
mutation InventoryAdjust($input: InventoryAdjustQuantitiesInput!) {
  inventoryAdjustQuantities(input: $input) {
    inventoryAdjustmentGroup {
      id
      changes { name quantityAfterChange item { id } }
    }
    userErrors { field message }
  }
}"#;

const AVAILABLE_QUERY: &str = r#"
query InventoryAvailable($item: ID!, $location: ID!) {
  inventoryItem(id: $item) {
    inventoryLevel(locationId: $location) {
      quantities(names: ["available"]) { name quantity }
    }
  }
}"#;

const VARIANT_QUERY: &str = r#"
query VariantItem($id: ID!) {
  productVariant(id: $id) { sku inventoryItem { id } }
}"#;

const LOCATION_QUERY: &str = r#"
query LocationName($id: ID!) {
  location(id: $id) { name }
}"#;

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdjustData {
    inventory_adjust_quantities: Option<AdjustPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdjustPayload {
    inventory_adjustment_group: Option<AdjustmentGroup>,
    #[serde(default)]
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
struct AdjustmentGroup {
    id: String,
    #[serde(default)]
    changes: Vec<AdjustmentChange>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdjustmentChange {
    name: String,
    quantity_after_change: Option<i64>,
    item: Option<NodeId>,
}

#[derive(Debug, Deserialize)]
struct NodeId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct UserError {
    #[serde(default)]
    field: Option<Vec<String>>,
    message: String,
}

impl UserError {
    fn describe(&self) -> String {
        match &self.field {
            Some(field) if !field.is_empty() => format!("{}: {}", field.join("."), self.message),
            _ => self.message.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvailableData {
    inventory_item: Option<InventoryItemNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InventoryItemNode {
    inventory_level: Option<InventoryLevelNode>,
}

#[derive(Debug, Deserialize)]
struct InventoryLevelNode {
    #[serde(default)]
    quantities: Vec<NamedQuantity>,
}

#[derive(Debug, Deserialize)]
struct NamedQuantity {
    name: String,
    quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantData {
    product_variant: Option<VariantNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantNode {
    sku: Option<String>,
    inventory_item: Option<NodeId>,
}

#[derive(Debug, Deserialize)]
struct LocationData {
    location: Option<LocationNode>,
}

#[derive(Debug, Deserialize)]
struct LocationNode {
    name: String,
}

/// [`InventoryPlatform`] over the Admin GraphQL API.
///
/// Each tenant is addressed with its own endpoint and access token, read
/// from the reloadable tenant directory on every call.
#[derive(Debug, Clone)]
pub struct GraphqlPlatform {
    http_client: reqwest::Client,
    tenants: Reloadable<TenantDirectory>,
    api_version: String,
}

impl GraphqlPlatform {
    pub fn new(
        config: &PlatformConfig,
        tenants: Reloadable<TenantDirectory>,
    ) -> Result<Self, PlatformError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http_client,
            tenants,
            api_version: config.api_version.clone(),
        })
    }

    async fn endpoint(&self, tenant_id: &str) -> Result<(Url, String), PlatformError> {
        let tenants = self.tenants.read().await;
        let tenant = tenants
            .get(tenant_id)
            .ok_or_else(|| PlatformError::UnknownTenant(tenant_id.to_owned()))?;
        let url = tenant
            .graphql_endpoint(&self.api_version)
            .map_err(|e| PlatformError::Parse(format!("invalid endpoint: {e}")))?;
        Ok((url, tenant.access_token.clone()))
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        tenant_id: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, PlatformError> {
        let (url, token) = self.endpoint(tenant_id).await?;
        let response: GraphqlResponse<T> = self
            .http_client
            .post(url)
            .header(ACCESS_TOKEN_HEADER, token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if !response.errors.is_empty() {
            let messages: Vec<_> = response.errors.into_iter().map(|e| e.message).collect();
            return Err(PlatformError::Graphql(messages.join("; ")));
        }
        response
            .data
            .ok_or_else(|| PlatformError::Parse("response without data".into()))
    }
}

#[async_trait]
impl InventoryPlatform for GraphqlPlatform {
    #[tracing::instrument(skip_all, err, fields(tenant = request.tenant_id, lines = request.changes.len()))]
    async fn adjust(&self, request: AdjustRequest<'_>) -> Result<AdjustOutcome, PlatformError> {
        let location = gid(ResourceKind::Location, request.location_id);
        let changes: Vec<_> = request
            .changes
            .iter()
            .map(|c| {
                json!({
                    "delta": c.delta,
                    "inventoryItemId": gid(ResourceKind::InventoryItem, &c.inventory_item_id),
                    "locationId": location,
                })
            })
            .collect();
        let mut input = json!({
            "reason": request.reason,
            "name": AVAILABLE,
            "changes": changes,
        });
        if let Some(reference) = request.reference {
            input["referenceDocumentUri"] =
                json!(format!("gid://invl-ledger/Reference/{}", canonical_id(reference)));
        }

        let data: AdjustData = self
            .execute(request.tenant_id, ADJUST_MUTATION, json!({ "input": input }))
            .await?;
        let payload = data
            .inventory_adjust_quantities
            .ok_or_else(|| PlatformError::Parse("missing inventoryAdjustQuantities".into()))?;

        let errors: Vec<String> = payload.user_errors.iter().map(UserError::describe).collect();
        let Some(group) = payload.inventory_adjustment_group else {
            return Ok(AdjustOutcome {
                errors,
                ..Default::default()
            });
        };
        let quantities_after: HashMap<String, i64> = group
            .changes
            .into_iter()
            .filter(|c| c.name == AVAILABLE)
            .filter_map(|c| Some((canonical_id(&c.item?.id), c.quantity_after_change?)))
            .collect();
        Ok(AdjustOutcome {
            correlation_id: Some(canonical_id(&group.id)),
            errors,
            quantities_after,
        })
    }

    async fn read_available(
        &self,
        tenant_id: &str,
        inventory_item_id: &str,
        location_id: &str,
    ) -> Result<Option<i64>, PlatformError> {
        let data: AvailableData = self
            .execute(
                tenant_id,
                AVAILABLE_QUERY,
                json!({
                    "item": gid(ResourceKind::InventoryItem, inventory_item_id),
                    "location": gid(ResourceKind::Location, location_id),
                }),
            )
            .await?;
        Ok(data
            .inventory_item
            .and_then(|item| item.inventory_level)
            .and_then(|level| {
                level
                    .quantities
                    .into_iter()
                    .find(|q| q.name == AVAILABLE)
                    .map(|q| q.quantity)
            }))
    }

    async fn resolve_variant(
        &self,
        tenant_id: &str,
        variant_id: &str,
    ) -> Result<Option<ResolvedVariant>, PlatformError> {
        let data: VariantData = self
            .execute(
                tenant_id,
                VARIANT_QUERY,
                json!({ "id": gid(ResourceKind::ProductVariant, variant_id) }),
            )
            .await?;
        Ok(data.product_variant.and_then(|v| {
            Some(ResolvedVariant {
                inventory_item_id: canonical_id(&v.inventory_item?.id),
                sku: v.sku.filter(|s| !s.trim().is_empty()),
            })
        }))
    }

    async fn location_name(
        &self,
        tenant_id: &str,
        location_id: &str,
    ) -> Result<Option<String>, PlatformError> {
        let data: LocationData = self
            .execute(
                tenant_id,
                LOCATION_QUERY,
                json!({ "id": gid(ResourceKind::Location, location_id) }),
            )
            .await?;
        Ok(data.location.map(|l| l.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjust_payload_parsing() {
        let body = r#"{
            "data": {
                "inventoryAdjustQuantities": {
                    "inventoryAdjustmentGroup": {
                        "id": "gid://shopify/InventoryAdjustmentGroup/77",
                        "changes": [
                            {"name": "available", "quantityAfterChange": 12,
                             "item": {"id": "gid://shopify/InventoryItem/42"}},
                            {"name": "on_hand", "quantityAfterChange": 15,
                             "item": {"id": "gid://shopify/InventoryItem/42"}}
                        ]
                    },
                    "userErrors": []
                }
            }
        }"#;
        let response: GraphqlResponse<AdjustData> = serde_json::from_str(body).unwrap();
        let payload = response.data.unwrap().inventory_adjust_quantities.unwrap();
        let group = payload.inventory_adjustment_group.unwrap();
        assert_eq!(group.id, "gid://shopify/InventoryAdjustmentGroup/77");
        assert_eq!(group.changes.len(), 2);
        assert!(payload.user_errors.is_empty());
    }

    #[test]
    fn test_user_error_description() {
        let err = UserError {
            field: Some(vec!["input".into(), "changes".into()]),
            message: "Quantity too low".into(),
        };
        assert_eq!(err.describe(), "input.changes: Quantity too low");
    }
}
