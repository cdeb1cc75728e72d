//! REST client for the remote video generation service.
//!
//! Wraps the three HTTP calls a conversion needs: submitting a
//! generation job, polling its operation by name, and downloading the
//! generated bytes.

use crate::core::Credentials;
use crate::veo::messages::{
    GenerateVideosRequest, GenerationInstance, GenerationParameters, ImagePayload, Operation,
};
use crate::video::ExtractedFrame;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

/// HTTP client for the generation service.
pub struct VeoApi {
    client: reqwest::Client,
    base_url: String,
    model: String,
    credentials: Credentials,
}

/// Errors from the generation REST layer.
#[derive(Debug, thiserror::Error)]
pub enum VeoApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("service error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl VeoApiError {
    /// HTTP status of the failed call, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            VeoApiError::Api { status, .. } => Some(*status),
            VeoApiError::Request(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

impl VeoApi {
    /// Create a new API client.
    ///
    /// * `base_url` - API root, e.g. `https://host/v1beta`.
    /// * `model`    - generation model identifier.
    pub fn new(base_url: String, model: String, credentials: Credentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            model,
            credentials,
        }
    }

    /// Submit a generation job for one output video.
    ///
    /// Sends a `POST {base}/models/{model}:predictLongRunning` request
    /// carrying the frame (base64) and the prompt. Returns the pending
    /// [`Operation`].
    pub async fn generate_videos(
        &self,
        frame: &ExtractedFrame,
        prompt: &str,
    ) -> Result<Operation, VeoApiError> {
        let body = GenerateVideosRequest {
            instances: vec![GenerationInstance {
                prompt: prompt.to_string(),
                image: ImagePayload {
                    bytes_base64_encoded: BASE64.encode(&frame.bytes),
                    mime_type: frame.mime_type.clone(),
                },
            }],
            parameters: GenerationParameters { number_of_videos: 1 },
        };

        let response = self
            .client
            .post(format!("{}/models/{}:predictLongRunning", self.base_url, self.model))
            .header("x-goog-api-key", self.credentials.api_key())
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Re-fetch an operation by its server-assigned name.
    pub async fn get_operation(&self, name: &str) -> Result<Operation, VeoApiError> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, name))
            .header("x-goog-api-key", self.credentials.api_key())
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Download the generated bytes at `uri`.
    ///
    /// The file endpoint authenticates through a `key` query parameter
    /// rather than a header, so the credential is appended to the URI.
    pub async fn download(&self, uri: &str) -> Result<Vec<u8>, VeoApiError> {
        let separator = if uri.contains('?') { '&' } else { '?' };
        let url = format!("{}{}key={}", uri, separator, self.credentials.api_key());

        let response = self.client.get(url).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`VeoApiError::Api`] with the
    /// status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, VeoApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(VeoApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, VeoApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}
