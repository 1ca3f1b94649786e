//! REST API client for fal's storage and queue endpoints.
//!
//! Wraps file upload (initiate + `PUT`), queue submission, status queries
//! and result retrieval using [`reqwest`]. Every request carries the
//! `Authorization: Key <credential>` header; without a credential no
//! request is attempted.

use reelswap_core::error::CoreError;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use crate::messages::{
    GenerationInput, InitiateUploadRequest, InitiateUploadResponse, QueueStatusResponse,
    SubmitResponse, UploadFile,
};

/// Default model: Wan 2.2 "animate / replace" character swap.
pub const DEFAULT_MODEL_ID: &str = "fal-ai/wan/v2.2-14b/animate/replace";

/// Default queue base URL.
pub const DEFAULT_QUEUE_URL: &str = "https://queue.fal.run";

/// Default storage REST base URL.
pub const DEFAULT_STORAGE_URL: &str = "https://rest.alpha.fal.ai";

/// Connection settings for fal.
#[derive(Debug, Clone)]
pub struct FalConfig {
    /// API credential (`FAL_KEY`). `None` disables every generation call.
    pub key: Option<String>,
    /// Model endpoint id, e.g. `fal-ai/wan/v2.2-14b/animate/replace`.
    pub model_id: String,
    pub queue_url: String,
    pub storage_url: String,
}

impl Default for FalConfig {
    fn default() -> Self {
        Self {
            key: None,
            model_id: DEFAULT_MODEL_ID.to_string(),
            queue_url: DEFAULT_QUEUE_URL.to_string(),
            storage_url: DEFAULT_STORAGE_URL.to_string(),
        }
    }
}

impl FalConfig {
    /// Owner/app prefix of the model id, used for request-scoped queue paths.
    ///
    /// `fal-ai/wan/v2.2-14b/animate/replace` -> `fal-ai/wan`.
    pub fn app_root(&self) -> String {
        self.model_id
            .split('/')
            .filter(|segment| !segment.is_empty())
            .take(2)
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Errors from the fal REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum FalApiError {
    /// No credential configured; nothing was sent.
    #[error("FAL_KEY not configured on server")]
    MissingCredential,

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// fal returned a non-2xx status code.
    #[error("fal API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl From<FalApiError> for CoreError {
    fn from(err: FalApiError) -> Self {
        match err {
            FalApiError::MissingCredential => {
                CoreError::Config(FalApiError::MissingCredential.to_string())
            }
            other => CoreError::Upstream(other.to_string()),
        }
    }
}

/// HTTP client for fal.
pub struct FalApi {
    client: reqwest::Client,
    config: FalConfig,
}

impl FalApi {
    pub fn new(config: FalConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: FalConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &FalConfig {
        &self.config
    }

    /// Whether a non-empty credential is configured.
    pub fn has_credential(&self) -> bool {
        self.credential().is_ok()
    }

    /// Upload one file to fal storage and return its public URL.
    ///
    /// Two steps: ask storage for a pre-signed upload URL, then `PUT` the
    /// bytes there.
    pub async fn upload_file(&self, file: &UploadFile) -> Result<String, FalApiError> {
        let content_type = file
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream");

        let initiate = self
            .authorized(self.client.post(format!(
                "{}/storage/upload/initiate",
                self.config.storage_url
            )))?
            .query(&[("storage_type", "fal-cdn-v3")])
            .json(&InitiateUploadRequest {
                file_name: &file.file_name,
                content_type,
            })
            .send()
            .await?;
        let target: InitiateUploadResponse = Self::parse_response(initiate).await?;

        let response = self
            .client
            .put(&target.upload_url)
            .header(CONTENT_TYPE, content_type)
            .body(file.data.clone())
            .send()
            .await?;
        Self::check_status(response).await?;

        tracing::debug!(file_name = %file.file_name, bytes = file.data.len(), "Uploaded file to fal storage");
        Ok(target.file_url)
    }

    /// Queue a generation job.
    ///
    /// When `webhook_url` is given fal will `POST` the outcome there.
    pub async fn submit(
        &self,
        input: &GenerationInput,
        webhook_url: Option<&str>,
    ) -> Result<SubmitResponse, FalApiError> {
        let mut request = self
            .authorized(
                self.client
                    .post(format!("{}/{}", self.config.queue_url, self.config.model_id)),
            )?
            .json(input);
        if let Some(webhook) = webhook_url {
            request = request.query(&[("fal_webhook", webhook)]);
        }

        let response = request.send().await?;
        Self::parse_response(response).await
    }

    /// Query the queue status of a job, including its logs.
    pub async fn status(&self, request_id: &str) -> Result<QueueStatusResponse, FalApiError> {
        let response = self
            .authorized(self.client.get(format!(
                "{}/{}/requests/{}/status",
                self.config.queue_url,
                self.config.app_root(),
                request_id
            )))?
            .query(&[("logs", "1")])
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the result document of a completed job.
    ///
    /// Uses the `response_url` reported by the status query when present.
    pub async fn result(
        &self,
        request_id: &str,
        response_url: Option<&str>,
    ) -> Result<serde_json::Value, FalApiError> {
        let url = match response_url {
            Some(url) => url.to_string(),
            None => format!(
                "{}/{}/requests/{}",
                self.config.queue_url,
                self.config.app_root(),
                request_id
            ),
        };

        let response = self.authorized(self.client.get(url))?.send().await?;
        Self::parse_response(response).await
    }

    // ---- private helpers ----

    fn credential(&self) -> Result<&str, FalApiError> {
        self.config
            .key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(FalApiError::MissingCredential)
    }

    fn authorized(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, FalApiError> {
        let key = self.credential()?;
        Ok(builder.header(AUTHORIZATION, format!("Key {key}")))
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`FalApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, FalApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(FalApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, FalApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), FalApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}
