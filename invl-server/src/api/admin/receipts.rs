use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use invl_core::adapters::direct::receipt_insert;
use invl_core::orchestrator::MutationError;
use invl_sdk::objects::CreateReceiptRequest;
use uuid::Uuid;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::{AdminApiError, applied_to_response, known_tenant, receipt_to_response};

/// `POST /tenants/{tenant}/receipts`: create a draft. Stock is untouched
/// until the receipt is received.
pub async fn create_receipt(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(tenant): Path<String>,
    Json(request): Json<CreateReceiptRequest>,
) -> Result<impl IntoResponse, AdminApiError> {
    let tenant_id = known_tenant(&state, &tenant).await?;
    let insert = receipt_insert(&tenant_id, request)?;
    let receipt = state
        .orchestrator
        .receipts()
        .create(insert)
        .await
        .map_err(|e| AdminApiError::Mutation(MutationError::Store(e)))?;
    Ok((StatusCode::CREATED, Json(receipt_to_response(&receipt))))
}

/// `GET /tenants/{tenant}/receipts/{id}`
pub async fn get_receipt(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path((tenant, id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, AdminApiError> {
    let tenant_id = known_tenant(&state, &tenant).await?;
    let receipt = state
        .orchestrator
        .receipts()
        .get(&tenant_id, id)
        .await
        .map_err(|e| AdminApiError::Mutation(MutationError::Store(e)))?
        .ok_or(AdminApiError::NotFound)?;
    Ok(Json(receipt_to_response(&receipt)))
}

/// `POST /tenants/{tenant}/receipts/{id}/receive`
///
/// Receiving a receipt that is not a draft is a no-op (`mutated: false`).
pub async fn receive_receipt(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path((tenant, id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, AdminApiError> {
    let tenant_id = known_tenant(&state, &tenant).await?;
    let applied = state.orchestrator.receive(&tenant_id, id).await?;
    Ok(Json(applied_to_response(applied)))
}

/// `POST /tenants/{tenant}/receipts/{id}/cancel`
///
/// Only received receipts are reversed; anything else is a no-op.
pub async fn cancel_receipt(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path((tenant, id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, AdminApiError> {
    let tenant_id = known_tenant(&state, &tenant).await?;
    let applied = state.orchestrator.cancel(&tenant_id, id).await?;
    Ok(Json(applied_to_response(applied)))
}
