/*
 *  Copyright 2025-2026 FedMCP Contributors
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! FedMCP server client.
//!
//! Pushes signed artifact records to a FedMCP server and fetches them back.
//! Records travel exactly as serialized by [`SignedArtifact`]; nothing is
//! re-canonicalized in transit. Transport failures and 5xx-style responses
//! are retried under the client's [`RetryPolicy`]; any other rejection is
//! returned immediately.

pub mod http;

use crate::artifact::SignedArtifact;
use crate::retry::{run_with_retry, RetryPolicy, RetryableError};
use crate::security::audit;
use chrono::{DateTime, Utc};
use http::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid server URL '{url}': {reason}")]
    InvalidServer { url: String, reason: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server rejected request ({status}): {message}")]
    ServerRejected { status: u16, message: String },

    #[error("Server unavailable ({status}): {message}")]
    ServerUnavailable { status: u16, message: String },

    #[error("Request canceled")]
    Canceled,

    #[error("Failed to decode server response: {0}")]
    Decode(String),
}

impl RetryableError for ClientError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::Transport(_) | ClientError::ServerUnavailable { .. }
        )
    }

    fn canceled() -> Self {
        ClientError::Canceled
    }
}

impl From<HttpError> for ClientError {
    fn from(err: HttpError) -> Self {
        ClientError::Transport(err.to_string())
    }
}

/// Acknowledgement of a pushed artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerReceipt {
    pub artifact_id: String,
    /// Server-assigned receive time.
    pub received_at: DateTime<Utc>,
    /// The server already held this artifact id.
    #[serde(default)]
    pub duplicate: bool,
}

#[derive(Serialize)]
struct PushRequest<'a> {
    signed_artifact: &'a SignedArtifact,
    tags: &'a [String],
}

/// Client for the artifact endpoints of a FedMCP server.
pub struct ServerClient {
    server: String,
    http: Arc<dyn HttpClient>,
    bearer_token: Option<String>,
    retry_policy: RetryPolicy,
}

impl ServerClient {
    /// Create a client for `server` using `reqwest`.
    pub fn new(server: &str) -> Result<Self, ClientError> {
        let http = ReqwestHttpClient::with_timeout(DEFAULT_TIMEOUT)?;
        Self::with_http_client(server, Arc::new(http))
    }

    pub fn with_http_client(server: &str, http: Arc<dyn HttpClient>) -> Result<Self, ClientError> {
        let invalid = |reason: String| ClientError::InvalidServer {
            url: server.to_string(),
            reason,
        };
        let parsed = url::Url::parse(server).map_err(|e| invalid(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
        }

        Ok(Self {
            server: server.trim_end_matches('/').to_string(),
            http,
            bearer_token: None,
            retry_policy: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    /// Push a signed artifact. A duplicate-id response counts as success.
    pub async fn push(&self, signed: &SignedArtifact) -> Result<ServerReceipt, ClientError> {
        self.push_with_cancel(signed, &[], &CancellationToken::new())
            .await
    }

    /// Push with labels sent next to the record (they are not signed).
    pub async fn push_with_cancel(
        &self,
        signed: &SignedArtifact,
        tags: &[String],
        cancel: &CancellationToken,
    ) -> Result<ServerReceipt, ClientError> {
        let body = serde_json::to_vec(&PushRequest {
            signed_artifact: signed,
            tags,
        })
        .map_err(|e| ClientError::Decode(e.to_string()))?;
        let request = self
            .authorize(HttpRequest::post(
                format!("{}/api/v1/artifacts", self.server),
                body,
            ))
            .with_header("Content-Type", "application/json");

        let receipt = run_with_retry(&self.retry_policy, cancel, "server.push", |_| {
            self.push_once(signed.id(), request.clone())
        })
        .await?;

        audit::log_artifact_pushed(&receipt.artifact_id, &self.server, receipt.duplicate);
        Ok(receipt)
    }

    /// Fetch the stored record for `artifact_id`.
    pub async fn fetch(&self, artifact_id: &str) -> Result<SignedArtifact, ClientError> {
        self.fetch_with_cancel(artifact_id, &CancellationToken::new())
            .await
    }

    pub async fn fetch_with_cancel(
        &self,
        artifact_id: &str,
        cancel: &CancellationToken,
    ) -> Result<SignedArtifact, ClientError> {
        let request = self.authorize(HttpRequest::get(format!(
            "{}/api/v1/artifacts/{}",
            self.server,
            urlencoding::encode(artifact_id)
        )));

        let response = run_with_retry(&self.retry_policy, cancel, "server.fetch", |_| {
            self.send_once(request.clone())
        })
        .await?;

        let signed: SignedArtifact = serde_json::from_slice(&response.body)
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        if signed.id() != artifact_id {
            return Err(ClientError::Decode(format!(
                "requested artifact '{}' but server returned '{}'",
                artifact_id,
                signed.id()
            )));
        }

        audit::log_artifact_fetched(artifact_id, &self.server);
        Ok(signed)
    }

    fn authorize(&self, request: HttpRequest) -> HttpRequest {
        let request = request.with_header("Accept", "application/json");
        match &self.bearer_token {
            Some(token) => request.with_header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn push_once(
        &self,
        artifact_id: &str,
        request: HttpRequest,
    ) -> Result<ServerReceipt, ClientError> {
        let response = self.http.send(request).await?;

        if response.status == 409 {
            tracing::debug!(artifact_id, "Server already holds artifact");
            // A 409 body is informational; only a parsed receipt is checked.
            let receipt = serde_json::from_slice::<ServerReceipt>(&response.body)
                .unwrap_or_else(|_| ServerReceipt {
                    artifact_id: artifact_id.to_string(),
                    received_at: Utc::now(),
                    duplicate: true,
                });
            return receipt_for(artifact_id, ServerReceipt {
                duplicate: true,
                ..receipt
            });
        }

        let response = check_status(response)?;
        let receipt = serde_json::from_slice(&response.body)
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        receipt_for(artifact_id, receipt)
    }

    async fn send_once(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let response = self.http.send(request).await?;
        check_status(response)
    }
}

/// Accept `receipt` only if it acknowledges `artifact_id`.
fn receipt_for(artifact_id: &str, receipt: ServerReceipt) -> Result<ServerReceipt, ClientError> {
    if receipt.artifact_id != artifact_id {
        return Err(ClientError::Decode(format!(
            "pushed artifact '{}' but server acknowledged '{}'",
            artifact_id, receipt.artifact_id
        )));
    }
    Ok(receipt)
}

impl std::fmt::Debug for ServerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerClient")
            .field("server", &self.server)
            .field("retry_policy", &self.retry_policy)
            .finish_non_exhaustive()
    }
}

fn check_status(response: HttpResponse) -> Result<HttpResponse, ClientError> {
    match response.status {
        s if (200..300).contains(&s) => Ok(response),
        408 | 429 | 500..=599 => Err(ClientError::ServerUnavailable {
            status: response.status,
            message: response.body_snippet(),
        }),
        status => Err(ClientError::ServerRejected {
            status,
            message: response.body_snippet(),
        }),
    }
}
