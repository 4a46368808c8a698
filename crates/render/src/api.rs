//! REST client for the clip render endpoints.
//!
//! Wraps render submission and status retrieval using [`reqwest`]. The
//! download endpoint is never fetched here; callers get its URL and hand
//! it to whatever opens downloads (browser, shell, file writer).

use clipwise_core::render::StatusUpdate;
use clipwise_core::segments::RenderRequest;
use clipwise_core::types::JobId;
use serde::Deserialize;

/// HTTP client for the render backend.
#[derive(Clone)]
pub struct RenderApi {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

/// Response returned by `POST /api/clips/render`.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    /// Backend-assigned identifier for the render job.
    pub job_id: JobId,
}

/// Errors from the render REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum RenderApiError {
    /// The HTTP request itself failed (network, DNS, TLS, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Render API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl RenderApi {
    /// Create a new API client.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://host:8000`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Attach a bearer token to every request.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Start a render job.
    ///
    /// Sends `POST /api/clips/render` and returns the job identifier.
    pub async fn submit_render(
        &self,
        request: &RenderRequest,
    ) -> Result<SubmitResponse, RenderApiError> {
        let response = self
            .authorized(self.client.post(format!("{}/api/clips/render", self.api_url)))
            .json(request)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the current status of a render job.
    ///
    /// Sends `GET /api/clips/{job_id}/status`. The body is a full job
    /// record; its `job_id` is carried along in the update.
    pub async fn fetch_status(&self, job_id: &str) -> Result<StatusUpdate, RenderApiError> {
        let response = self
            .authorized(
                self.client
                    .get(format!("{}/api/clips/{}/status", self.api_url, job_id)),
            )
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// URL of the rendered artifact (`GET /api/clips/{job_id}/download`).
    pub fn download_url(&self, job_id: &str) -> String {
        format!("{}/api/clips/{}/download", self.api_url, job_id)
    }

    // ---- private helpers ----

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Return the response unchanged on success, or an
    /// [`RenderApiError::ApiError`] with the status and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, RenderApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(RenderApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RenderApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}
