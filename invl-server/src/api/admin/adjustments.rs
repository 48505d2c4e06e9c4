use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use invl_core::adapters::direct::adjustment_mutation;
use invl_sdk::objects::AdjustmentRequest;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::{AdminApiError, applied_to_response, known_tenant};

/// `POST /tenants/{tenant}/adjustments`: change stock on the platform and
/// record one ledger row per line.
///
/// A ledger failure after the platform accepted the change is reported in
/// the `ledger` tally, not as an error.
pub async fn create_adjustment(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(tenant): Path<String>,
    Json(request): Json<AdjustmentRequest>,
) -> Result<impl IntoResponse, AdminApiError> {
    let tenant_id = known_tenant(&state, &tenant).await?;
    let applied = state
        .orchestrator
        .apply(adjustment_mutation(&tenant_id, request))
        .await?;
    Ok(Json(applied_to_response(applied)))
}
