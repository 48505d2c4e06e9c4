//! Admin API handlers.
//!
//! These endpoints are called by operator tooling and require the
//! `Invl-Admin-Authorization` header with the plaintext admin secret.
//!
//! # Endpoints
//!
//! - `POST /tenants/{tenant}/adjustments`            – manual adjustment or count correction
//! - `POST /tenants/{tenant}/receipts`               – create a draft receipt
//! - `GET  /tenants/{tenant}/receipts/{id}`          – show a receipt
//! - `POST /tenants/{tenant}/receipts/{id}/receive`  – receive a draft receipt into stock
//! - `POST /tenants/{tenant}/receipts/{id}/cancel`   – reverse a received receipt
//! - `GET  /tenants/{tenant}/ledger`                 – list ledger rows (paginated, filterable)

use axum::{
    Json, Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use invl_core::entities::ledger_entry::LedgerEntry;
use invl_core::entities::stock_receipt::StockReceipt;
use invl_core::ledger::LedgerStoreError;
use invl_core::orchestrator::{MutationApplied, MutationError};
use invl_core::platform::PlatformError;
use invl_sdk::objects::{LedgerEntryResponse, MutationResponse, ReceiptResponse};

use crate::state::AppState;

mod adjustments;
mod ledger;
mod receipts;

/// Build the Admin API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/tenants/{tenant}/adjustments",
            post(adjustments::create_adjustment),
        )
        .route("/tenants/{tenant}/receipts", post(receipts::create_receipt))
        .route("/tenants/{tenant}/receipts/{id}", get(receipts::get_receipt))
        .route(
            "/tenants/{tenant}/receipts/{id}/receive",
            post(receipts::receive_receipt),
        )
        .route(
            "/tenants/{tenant}/receipts/{id}/cancel",
            post(receipts::cancel_receipt),
        )
        .route("/tenants/{tenant}/ledger", get(ledger::list_ledger))
}

// ---------------------------------------------------------------------------
// Shared error type
// ---------------------------------------------------------------------------

/// Errors that can occur in Admin API handlers.
#[derive(Debug)]
pub(crate) enum AdminApiError {
    UnknownTenant,
    NotFound,
    Mutation(MutationError),
    Ledger(LedgerStoreError),
}

impl From<MutationError> for AdminApiError {
    fn from(e: MutationError) -> Self {
        match e {
            MutationError::ReceiptNotFound => AdminApiError::NotFound,
            MutationError::Platform(PlatformError::UnknownTenant(_)) => {
                AdminApiError::UnknownTenant
            }
            other => AdminApiError::Mutation(other),
        }
    }
}

fn failure(status: StatusCode, error: String) -> axum::response::Response {
    let body = MutationResponse {
        ok: false,
        error: Some(error),
        adjustment_group_id: None,
        mutated: false,
        ledger: Default::default(),
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for AdminApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AdminApiError::UnknownTenant => {
                (StatusCode::NOT_FOUND, "tenant not found").into_response()
            }
            AdminApiError::NotFound => {
                (StatusCode::NOT_FOUND, "resource not found").into_response()
            }
            AdminApiError::Mutation(MutationError::Validation(message)) => {
                failure(StatusCode::UNPROCESSABLE_ENTITY, message)
            }
            AdminApiError::Mutation(MutationError::Rejected(message)) => {
                failure(StatusCode::CONFLICT, message)
            }
            AdminApiError::Mutation(MutationError::Platform(e)) => {
                tracing::warn!(error = %e, "Admin API platform call failed");
                failure(StatusCode::CONFLICT, e.to_string())
            }
            AdminApiError::Mutation(MutationError::ReceiptNotFound) => {
                (StatusCode::NOT_FOUND, "resource not found").into_response()
            }
            AdminApiError::Mutation(MutationError::Store(e)) => {
                tracing::error!(error = %e, "Admin API database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            AdminApiError::Ledger(e) => {
                tracing::error!(error = %e, "Admin API ledger error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}

/// Resolve the `{tenant}` path segment against configured tenants.
pub(crate) async fn known_tenant(state: &AppState, raw: &str) -> Result<String, AdminApiError> {
    state
        .tenant_domain(raw)
        .await
        .ok_or(AdminApiError::UnknownTenant)
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

pub(crate) fn entry_to_response(r: &LedgerEntry) -> LedgerEntryResponse {
    LedgerEntryResponse {
        id: r.id,
        tenant_id: r.tenant_id.clone(),
        occurred_at: r.occurred_at.unix_timestamp(),
        calendar_date: r.calendar_date.to_string(),
        inventory_item_id: r.inventory_item_id.clone(),
        variant_id: r.variant_id.clone(),
        sku: r.sku.clone(),
        location_id: r.location_id.clone(),
        location_name: r.location_name.clone(),
        activity: r.activity.into(),
        delta: r.delta,
        quantity_after: r.quantity_after,
        source_type: r.source_type.clone(),
        source_id: r.source_id.clone(),
        adjustment_group_id: r.adjustment_group_id.clone(),
        idempotency_key: r.idempotency_key.clone(),
        note: r.note.clone(),
        created_at: r.created_at.unix_timestamp(),
    }
}

pub(crate) fn receipt_to_response(r: &StockReceipt) -> ReceiptResponse {
    ReceiptResponse {
        id: r.id,
        tenant_id: r.tenant_id.clone(),
        kind: r.kind.into(),
        location_id: r.location_id.clone(),
        lines: r.lines.iter().map(Into::into).collect(),
        status: r.status.into(),
        note: r.note.clone(),
        adjustment_group_id: r.adjustment_group_id.clone(),
        created_at: r.created_at.unix_timestamp(),
        updated_at: r.updated_at.unix_timestamp(),
    }
}

pub(crate) fn applied_to_response(applied: MutationApplied) -> MutationResponse {
    MutationResponse {
        ok: true,
        error: None,
        adjustment_group_id: applied.adjustment_group_id,
        mutated: applied.mutated,
        ledger: applied.ledger.into(),
    }
}
