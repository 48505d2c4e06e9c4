//! Custom Axum extractors for request authentication.
//!
//! Provides:
//! - `VerifiedWebhook`: checks the shop domain and `X-Shopify-Hmac-Sha256`
//!   against the raw body before anything is parsed (used by the webhook API).
//! - `AdminAuth`: checks the `Invl-Admin-Authorization` header against the
//!   argon2 hash from config (used by the Admin API).
//!
//! HMAC operations are delegated to [`invl_sdk::signature`].

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::{HeaderMap, StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use invl_sdk::signature::{
    self, ADMIN_AUTH_HEADER, HMAC_HEADER, SHOP_DOMAIN_HEADER, SignatureError, TOPIC_HEADER,
    WEBHOOK_ID_HEADER,
};

use crate::state::AppState;

/// Largest webhook body accepted.
const MAX_WEBHOOK_BODY: usize = 2 * 1024 * 1024;

// ---------------------------------------------------------------------------
// VerifiedWebhook: platform webhook authentication via body HMAC
// ---------------------------------------------------------------------------

/// A webhook delivery whose HMAC matched the tenant's webhook secret.
///
/// The topic is carried through unparsed so that an unknown topic on an
/// authentic delivery can be told apart from a forged one.
pub struct VerifiedWebhook {
    /// Configured domain of the sending tenant.
    pub tenant_id: String,
    pub topic: String,
    pub delivery_id: Option<String>,
    pub body: Bytes,
}

#[derive(Debug, thiserror::Error)]
pub enum VerifiedWebhookError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),
    #[error("unknown tenant")]
    UnknownTenant,
    #[error("failed to read request body")]
    BodyReadError,
    #[error("signature verification failed")]
    VerificationFailed,
}

impl From<SignatureError> for VerifiedWebhookError {
    fn from(_: SignatureError) -> Self {
        Self::VerificationFailed
    }
}

impl IntoResponse for VerifiedWebhookError {
    fn into_response(self) -> Response {
        let status = match self {
            VerifiedWebhookError::BodyReadError => StatusCode::BAD_REQUEST,
            VerifiedWebhookError::MissingHeader(_)
            | VerifiedWebhookError::UnknownTenant
            | VerifiedWebhookError::VerificationFailed => StatusCode::UNAUTHORIZED,
        };
        tracing::warn!(error = %self, "Webhook rejected");
        (status, self.to_string()).into_response()
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

impl FromRequest<AppState> for VerifiedWebhook {
    type Rejection = VerifiedWebhookError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let headers = req.headers();
        let shop = header(headers, SHOP_DOMAIN_HEADER)
            .ok_or(VerifiedWebhookError::MissingHeader(SHOP_DOMAIN_HEADER))?
            .to_owned();
        let hmac = header(headers, HMAC_HEADER)
            .ok_or(VerifiedWebhookError::MissingHeader(HMAC_HEADER))?
            .to_owned();
        let topic = header(headers, TOPIC_HEADER).unwrap_or_default().to_owned();
        let delivery_id = header(headers, WEBHOOK_ID_HEADER).map(str::to_owned);

        let body = axum::body::to_bytes(req.into_body(), MAX_WEBHOOK_BODY)
            .await
            .map_err(|_| VerifiedWebhookError::BodyReadError)?;

        let tenants = state.config.tenants.read().await;
        let tenant = tenants
            .get(&shop)
            .ok_or(VerifiedWebhookError::UnknownTenant)?;
        signature::verify_webhook(&body, &hmac, tenant.webhook_secret_bytes())?;
        let tenant_id = tenant.domain.to_ascii_lowercase();
        drop(tenants);

        Ok(VerifiedWebhook {
            tenant_id,
            topic,
            delivery_id,
            body,
        })
    }
}

// ---------------------------------------------------------------------------
// AdminAuth: Admin API authentication via plaintext secret
// ---------------------------------------------------------------------------

/// Proof that the request carried the admin secret.
pub struct AdminAuth;

#[derive(Debug)]
pub enum AdminAuthError {
    MissingHeader,
    InvalidSecret,
}

impl IntoResponse for AdminAuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AdminAuthError::MissingHeader => "missing Invl-Admin-Authorization header",
            AdminAuthError::InvalidSecret => "invalid admin secret",
        };
        (StatusCode::UNAUTHORIZED, message).into_response()
    }
}

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AdminAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let secret = header(&parts.headers, ADMIN_AUTH_HEADER)
            .ok_or(AdminAuthError::MissingHeader)?
            .to_owned();

        let admin = state.config.admin.snapshot().await;
        // argon2 verification is CPU-bound.
        let verified = tokio::task::spawn_blocking(move || admin.verify_secret(&secret))
            .await
            .unwrap_or(false);

        if verified {
            Ok(AdminAuth)
        } else {
            Err(AdminAuthError::InvalidSecret)
        }
    }
}
