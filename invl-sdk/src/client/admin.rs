//! Admin API client (operator tooling → ledger server).
//!
//! Every request carries the plaintext admin secret in the
//! `Invl-Admin-Authorization` header.

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;
use uuid::Uuid;

use super::ClientError;
use crate::objects::{
    AdjustmentRequest, CreateReceiptRequest, LedgerEntryResponse, ListLedgerQuery,
    MutationResponse, ReceiptResponse,
};
use crate::signature::ADMIN_AUTH_HEADER;

/// Typed HTTP client for the ledger **Admin API**.
#[derive(Debug, Clone)]
pub struct AdminClient {
    http: Client,
    base_url: Url,
    secret: String,
}

impl AdminClient {
    /// * `base_url` – root URL of the ledger server (e.g. `https://ledger.example.com`).
    /// * `admin_secret` – the plaintext admin secret.
    pub fn new(base_url: Url, admin_secret: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            secret: admin_secret.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    fn endpoint(&self, tenant: &str, path: &str) -> Result<Url, ClientError> {
        Ok(self
            .base_url
            .join(&format!("/api/v1/admin/tenants/{tenant}/{path}"))?)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(ADMIN_AUTH_HEADER, &self.secret)
    }

    /// `POST /tenants/{tenant}/adjustments`
    ///
    /// Validation and platform rejections come back as
    /// [`ClientError::Api`] with the server's message in `body`.
    pub async fn adjust(
        &self,
        tenant: &str,
        request: &AdjustmentRequest,
    ) -> Result<MutationResponse, ClientError> {
        let url = self.endpoint(tenant, "adjustments")?;
        let resp = self.authorized(self.http.post(url)).json(request).send().await?;
        read_json(resp).await
    }

    /// `POST /tenants/{tenant}/receipts`
    pub async fn create_receipt(
        &self,
        tenant: &str,
        request: &CreateReceiptRequest,
    ) -> Result<ReceiptResponse, ClientError> {
        let url = self.endpoint(tenant, "receipts")?;
        let resp = self.authorized(self.http.post(url)).json(request).send().await?;
        read_json(resp).await
    }

    /// `POST /tenants/{tenant}/receipts/{id}/receive`
    pub async fn receive_receipt(
        &self,
        tenant: &str,
        receipt_id: Uuid,
    ) -> Result<MutationResponse, ClientError> {
        let url = self.endpoint(tenant, &format!("receipts/{receipt_id}/receive"))?;
        let resp = self.authorized(self.http.post(url)).send().await?;
        read_json(resp).await
    }

    /// `POST /tenants/{tenant}/receipts/{id}/cancel`
    pub async fn cancel_receipt(
        &self,
        tenant: &str,
        receipt_id: Uuid,
    ) -> Result<MutationResponse, ClientError> {
        let url = self.endpoint(tenant, &format!("receipts/{receipt_id}/cancel"))?;
        let resp = self.authorized(self.http.post(url)).send().await?;
        read_json(resp).await
    }

    /// `GET /tenants/{tenant}/ledger`
    pub async fn list_ledger(
        &self,
        tenant: &str,
        query: &ListLedgerQuery,
    ) -> Result<Vec<LedgerEntryResponse>, ClientError> {
        let url = self.endpoint(tenant, "ledger")?;
        let resp = self.authorized(self.http.get(url)).query(query).send().await?;
        read_json(resp).await
    }
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
        return Err(ClientError::Api { status, body: text });
    }
    Ok(serde_json::from_str(&text)?)
}
