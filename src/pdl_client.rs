use crate::errors::{ConnectorError, Result};
use crate::models::EnrichRequest;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Tracing target for People Data Labs requests.
pub const TRACING_TARGET: &str = "pdl_connector::pdl_client";

/// Person enrichment endpoint.
pub const ENRICH_ENDPOINT: &str = "https://api.peopledatalabs.com/v5/person/enrich";

/// Client-side timeout for one enrichment call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const API_KEY_HEADER: &str = "X-Api-Key";

/// Client for the People Data Labs person enrichment API.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct PdlClient {
    client: reqwest::Client,
    endpoint: String,
}

impl PdlClient {
    /// Creates a client targeting [`ENRICH_ENDPOINT`] with a 60 second timeout.
    pub fn new() -> Result<Self> {
        Self::with_endpoint(ENRICH_ENDPOINT)
    }

    /// Creates a client that posts to `endpoint` instead of the public API.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Posts `request` to the enrichment endpoint and returns the raw body.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Value sent in the `X-Api-Key` header; must be non-empty.
    /// * `request` - Identity attributes to enrich.
    /// * `cancel` - Token of the enclosing query. Cancelling it drops the
    ///   in-flight request.
    ///
    /// # Errors
    ///
    /// * [`ConnectorError::MissingCredential`] if `api_key` is empty. No request is sent.
    /// * [`ConnectorError::Transport`] on connection failure or timeout.
    /// * [`ConnectorError::Cancelled`] if `cancel` fires first.
    /// * [`ConnectorError::Upstream`] on status >= 400, with the body text.
    pub async fn enrich(
        &self,
        api_key: &str,
        request: &EnrichRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        if api_key.is_empty() {
            return Err(ConnectorError::MissingCredential);
        }

        let body = request.to_body()?;

        tracing::info!(target: TRACING_TARGET, endpoint = %self.endpoint, "Requesting person enrichment");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!(target: TRACING_TARGET, "Enrichment request cancelled");
                Err(ConnectorError::Cancelled)
            }
            result = self.send(api_key, body) => result,
        }
    }

    async fn send(&self, api_key: &str, body: Vec<u8>) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, api_key)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: TRACING_TARGET, "Enrichment request failed: {}", e);
                ConnectorError::Transport(e)
            })?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if status.as_u16() >= 400 {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            tracing::error!(
                target: TRACING_TARGET,
                status = status.as_u16(),
                bytes = bytes.len(),
                "People Data Labs returned error"
            );
            // Error bodies can echo the identity attributes that were sent
            tracing::debug!(target: TRACING_TARGET, "Error body: {}", body);
            return Err(ConnectorError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(
            target: TRACING_TARGET,
            status = status.as_u16(),
            bytes = bytes.len(),
            "Enrichment response received"
        );
        Ok(bytes.to_vec())
    }
}
