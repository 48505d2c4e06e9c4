//! Platform webhook ingestion.
//!
//! # Endpoints
//!
//! - `POST /webhooks` – inbound delivery, authenticated by [`VerifiedWebhook`]

use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::post};
use invl_core::adapters::IngestError;
use invl_sdk::objects::WebhookTopic;

use crate::api::extractors::VerifiedWebhook;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/webhooks", post(receive_webhook))
}

#[derive(Debug)]
pub(crate) enum WebhookApiError {
    UnknownTopic(String),
    Malformed(IngestError),
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            WebhookApiError::UnknownTopic(topic) => {
                tracing::warn!(%topic, "Webhook with unsupported topic");
                (StatusCode::BAD_REQUEST, format!("unsupported topic {topic:?}")).into_response()
            }
            WebhookApiError::Malformed(e) => {
                tracing::warn!(error = %e, "Malformed webhook body");
                (StatusCode::BAD_REQUEST, e.to_string()).into_response()
            }
        }
    }
}

/// `POST /webhooks`: record the stock movements a delivery describes.
///
/// Answers 200 with a per-line summary once the body is understood, even if
/// some lines were skipped or failed, so the platform does not retry them.
async fn receive_webhook(
    state: axum::extract::State<AppState>,
    webhook: VerifiedWebhook,
) -> Result<impl IntoResponse, WebhookApiError> {
    let topic = WebhookTopic::parse(&webhook.topic)
        .ok_or_else(|| WebhookApiError::UnknownTopic(webhook.topic.clone()))?;
    tracing::debug!(
        tenant = %webhook.tenant_id,
        %topic,
        delivery_id = webhook.delivery_id.as_deref().unwrap_or("-"),
        "Webhook verified"
    );

    let ack = state
        .ingestor
        .ingest(&webhook.tenant_id, topic, &webhook.body)
        .await
        .map_err(WebhookApiError::Malformed)?;

    Ok(Json(ack))
}
