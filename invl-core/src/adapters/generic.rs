//! `inventory_levels/update`: a level changed, cause unknown.

use invl_sdk::objects::InventoryLevelPayload;

use super::{LineOutcome, WebhookIngestor};
use crate::entities::LedgerActivity;
use crate::entities::ledger_entry::LedgerEntryInsert;
use crate::ids::canonical_id;
use crate::ledger::{KeyParts, LedgerWrite, Sign, derive_key};

pub(crate) const SOURCE_TYPE: &str = "inventory_level";

/// A provisional row carrying the new absolute quantity. The delta comes
/// from the stored baseline, and stays unknown without one.
pub(crate) async fn translate(
    ctx: &WebhookIngestor,
    tenant_id: &str,
    payload: InventoryLevelPayload,
) -> LineOutcome {
    let Some(available) = payload.available else {
        return LineOutcome::Skipped("level without available quantity");
    };
    let inventory_item_id = canonical_id(&payload.inventory_item_id);
    let location_id = canonical_id(&payload.location_id);
    let available_text = available.to_string();

    let idempotency_key = derive_key(&KeyParts {
        tenant_id,
        activity_class: LedgerActivity::GenericWebhook.as_str(),
        inventory_item_id: &inventory_item_id,
        location_id: &location_id,
        source_id: Some(&inventory_item_id),
        sub_source_id: Some(&available_text),
        timestamp: payload.updated_at,
    });
    let entry = LedgerEntryInsert {
        tenant_id: tenant_id.to_owned(),
        occurred_at: payload.updated_at,
        calendar_date: ctx.local_date(tenant_id, payload.updated_at).await,
        location_name: ctx.location_name(tenant_id, &location_id).await,
        inventory_item_id: inventory_item_id.clone(),
        variant_id: None,
        sku: None,
        location_id,
        activity: LedgerActivity::GenericWebhook,
        delta: None,
        quantity_after: Some(available),
        source_type: SOURCE_TYPE.to_owned(),
        source_id: inventory_item_id,
        adjustment_group_id: None,
        idempotency_key,
        note: None,
    };
    LineOutcome::Write(LedgerWrite::observed(entry, None, Sign::Decrease))
}
