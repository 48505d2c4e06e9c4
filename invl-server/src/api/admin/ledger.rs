use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use invl_core::adapters::direct::ledger_listing;
use invl_sdk::objects::ListLedgerQuery;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::{AdminApiError, entry_to_response, known_tenant};

/// `GET /tenants/{tenant}/ledger`: ledger rows, newest first.
pub async fn list_ledger(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(tenant): Path<String>,
    Query(query): Query<ListLedgerQuery>,
) -> Result<impl IntoResponse, AdminApiError> {
    let tenant_id = known_tenant(&state, &tenant).await?;
    let rows = state
        .ledger
        .list(ledger_listing(&tenant_id, query))
        .await
        .map_err(AdminApiError::Ledger)?;

    let response: Vec<_> = rows.iter().map(entry_to_response).collect();
    Ok(Json(response))
}
