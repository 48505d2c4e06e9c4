//! Direct-action adapter: admin API requests as orchestrator and store calls.

use invl_sdk::objects::{AdjustmentRequest, CreateReceiptRequest, ListLedgerQuery, clamp_pagination};
use time::OffsetDateTime;

use crate::entities::LedgerActivity;
use crate::entities::ledger_entry::ListLedgerEntries;
use crate::entities::stock_receipt::{InsertStockReceipt, ReceiptLine};
use crate::ids::{ResourceKind, canonical_id, spellings};
use crate::orchestrator::{LineChange, MutationError, MutationRequest};

/// `source_type` of operator adjustments.
pub const ADJUSTMENT_SOURCE_TYPE: &str = "adjustment";

pub fn adjustment_mutation(tenant_id: &str, request: AdjustmentRequest) -> MutationRequest {
    MutationRequest {
        tenant_id: tenant_id.to_owned(),
        location_id: request.location_id,
        lines: request
            .lines
            .into_iter()
            .map(|line| LineChange {
                inventory_item_id: line.inventory_item_id,
                quantity: line.quantity,
            })
            .collect(),
        activity: LedgerActivity::from(invl_sdk::objects::LedgerActivity::from(request.kind)),
        source_type: ADJUSTMENT_SOURCE_TYPE.to_owned(),
        source_id: request.source_id.filter(|id| !id.trim().is_empty()),
        note: request.note,
    }
}

/// Validate and normalize a new receipt. Quantities must be positive; the
/// sign is applied on receive or cancel.
pub fn receipt_insert(
    tenant_id: &str,
    request: CreateReceiptRequest,
) -> Result<InsertStockReceipt, MutationError> {
    let location_id = canonical_id(&request.location_id);
    if location_id.is_empty() {
        return Err(MutationError::Validation("location is required".into()));
    }
    if request.lines.is_empty() {
        return Err(MutationError::Validation("at least one line is required".into()));
    }
    let mut lines = Vec::with_capacity(request.lines.len());
    for line in request.lines {
        let inventory_item_id = canonical_id(&line.inventory_item_id);
        if inventory_item_id.is_empty() || line.quantity <= 0 {
            return Err(MutationError::Validation(format!(
                "line {:?} needs an item and a positive quantity",
                line.inventory_item_id
            )));
        }
        lines.push(ReceiptLine {
            inventory_item_id,
            quantity: line.quantity,
        });
    }
    Ok(InsertStockReceipt {
        tenant_id: tenant_id.to_owned(),
        kind: request.kind.into(),
        location_id,
        lines,
        note: request.note,
    })
}

/// Ledger listing filters. Out-of-range timestamps are treated as absent.
pub fn ledger_listing(tenant_id: &str, query: ListLedgerQuery) -> ListLedgerEntries {
    let (limit, offset) = clamp_pagination(query.limit, query.offset);
    let instant = |secs: i64| OffsetDateTime::from_unix_timestamp(secs).ok();
    ListLedgerEntries {
        tenant_id: tenant_id.to_owned(),
        item_ids: query
            .inventory_item_id
            .map(|id| spellings(ResourceKind::InventoryItem, &id).into_vec()),
        location_ids: query
            .location_id
            .map(|id| spellings(ResourceKind::Location, &id).into_vec()),
        activity: query.activity.map(Into::into),
        from: query.from.and_then(instant),
        to: query.to.and_then(instant),
        limit,
        offset,
    }
}
