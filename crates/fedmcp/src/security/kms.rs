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

//! Remote key-management-service key provider.
//!
//! The private key never leaves the key service: signing sends the digest
//! over HTTPS and receives a signature back. Transient failures (network
//! errors, 5xx, 408, 429) are retried with the configured [`RetryPolicy`];
//! unknown keys and authorization failures are reported immediately.

use crate::client::http::{HttpClient, HttpError, HttpRequest, HttpResponse};
use crate::crypto::{decode_public_key_der, normalize_signature, DIGEST_LEN};
use crate::retry::{run_with_retry, RetryPolicy};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use super::audit;
use super::key_provider::{KeyProvider, KeyProviderError};

/// Signing algorithm requested from the key service.
pub const KMS_SIGNING_ALGORITHM: &str = "ECDSA_SHA_256";

#[derive(Debug, Serialize)]
struct SignRequest<'a> {
    message_type: &'a str,
    signing_algorithm: &'a str,
    message: String,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    signature: String,
}

#[derive(Debug, Deserialize)]
struct PublicKeyResponse {
    public_key: String,
}

/// Signs through a remote key service holding the private key.
pub struct RemoteKmsKeyProvider {
    key_id: String,
    endpoint: String,
    http: Arc<dyn HttpClient>,
    retry_policy: RetryPolicy,
    bearer_token: Option<String>,
    public_key: OnceCell<Vec<u8>>,
}

impl RemoteKmsKeyProvider {
    /// Create a provider for `key_id` served by the key service at `endpoint`.
    pub fn new(
        endpoint: &str,
        key_id: impl Into<String>,
        http: Arc<dyn HttpClient>,
    ) -> Result<Self, KeyProviderError> {
        let parsed = url::Url::parse(endpoint)
            .map_err(|e| KeyProviderError::service(format!("invalid endpoint: {}", e), false))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(KeyProviderError::service(
                format!("unsupported endpoint scheme '{}'", parsed.scheme()),
                false,
            ));
        }

        let key_id = key_id.into();
        if key_id.trim().is_empty() {
            return Err(KeyProviderError::KeyNotFound(key_id));
        }

        Ok(Self {
            key_id,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http,
            retry_policy: RetryPolicy::default(),
            bearer_token: None,
            public_key: OnceCell::new(),
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

    fn key_url(&self, action: &str) -> String {
        format!(
            "{}/v1/keys/{}/{}",
            self.endpoint,
            urlencoding::encode(&self.key_id),
            action
        )
    }

    fn authorize(&self, request: HttpRequest) -> HttpRequest {
        let request = request.with_header("Accept", "application/json");
        match &self.bearer_token {
            Some(token) => request.with_header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn send_once(&self, request: HttpRequest) -> Result<HttpResponse, KeyProviderError> {
        let response = self
            .http
            .send(request)
            .await
            .map_err(|e: HttpError| KeyProviderError::service(e.to_string(), true))?;

        match response.status {
            s if (200..300).contains(&s) => Ok(response),
            404 => Err(KeyProviderError::KeyNotFound(self.key_id.clone())),
            401 | 403 => Err(KeyProviderError::KeyPermission(self.key_id.clone())),
            408 | 429 | 500..=599 => Err(KeyProviderError::service(
                format!("key service returned {}: {}", response.status, response.body_snippet()),
                true,
            )),
            s => Err(KeyProviderError::service(
                format!("key service rejected request ({}): {}", s, response.body_snippet()),
                false,
            )),
        }
    }

    async fn send_with_retry(
        &self,
        operation: &str,
        request: HttpRequest,
    ) -> Result<HttpResponse, KeyProviderError> {
        let cancel = CancellationToken::new();
        run_with_retry(&self.retry_policy, &cancel, operation, |_| {
            self.send_once(request.clone())
        })
        .await
    }

    async fn fetch_public_key(&self) -> Result<Vec<u8>, KeyProviderError> {
        let request = self.authorize(HttpRequest::get(self.key_url("public-key")));
        let response = self.send_with_retry("kms.public_key", request).await?;

        let parsed: PublicKeyResponse = serde_json::from_slice(&response.body)
            .map_err(|e| KeyProviderError::service(format!("invalid response: {}", e), false))?;
        let der = BASE64
            .decode(parsed.public_key)
            .map_err(|e| KeyProviderError::service(format!("invalid public key: {}", e), false))?;

        let public_key = decode_public_key_der(&der)
            .map_err(|e| KeyProviderError::service(e.to_string(), false))?;
        audit::log_key_loaded("kms", &self.key_id);
        Ok(public_key)
    }
}

impl fmt::Debug for RemoteKmsKeyProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteKmsKeyProvider")
            .field("key_id", &self.key_id)
            .field("endpoint", &self.endpoint)
            .field("retry_policy", &self.retry_policy)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl KeyProvider for RemoteKmsKeyProvider {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    async fn public_key(&self) -> Result<Vec<u8>, KeyProviderError> {
        self.public_key
            .get_or_try_init(|| self.fetch_public_key())
            .await
            .cloned()
    }

    async fn sign(&self, digest: &[u8; DIGEST_LEN]) -> Result<Vec<u8>, KeyProviderError> {
        let body = serde_json::to_vec(&SignRequest {
            message_type: "DIGEST",
            signing_algorithm: KMS_SIGNING_ALGORITHM,
            message: BASE64.encode(digest),
        })
        .map_err(|e| KeyProviderError::service(e.to_string(), false))?;

        let request = self
            .authorize(HttpRequest::post(self.key_url("sign"), body))
            .with_header("Content-Type", "application/json");
        let response = self.send_with_retry("kms.sign", request).await?;

        let parsed: SignResponse = serde_json::from_slice(&response.body)
            .map_err(|e| KeyProviderError::service(format!("invalid response: {}", e), false))?;
        let raw = BASE64
            .decode(parsed.signature)
            .map_err(|e| KeyProviderError::service(format!("invalid signature: {}", e), false))?;

        normalize_signature(&raw).map_err(|e| KeyProviderError::service(e.to_string(), false))
    }
}
