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

//! Shared helpers for integration tests.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Duration, TimeZone, Utc};
use fedmcp::artifact::{Artifact, ArtifactType, SignedArtifact};
use fedmcp::client::http::{HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse};
use fedmcp::security::{KeyProvider, LocalFileKeyProvider, TrustStore, TrustedKey};
use p256::ecdsa::signature::hazmat::PrehashSigner;
use p256::ecdsa::{Signature, SigningKey};
use p256::pkcs8::EncodePublicKey;
use std::collections::HashMap;
use std::sync::Mutex;
use tempfile::TempDir;

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

pub fn ml_pipeline_artifact() -> Artifact {
    Artifact::new(
        ArtifactType::SspFragment,
        "ML Pipeline Security",
        b"control_id: AC-2\nimplementation: MFA enforced for all pipeline operators\n".to_vec(),
    )
}

/// A generated key on disk plus the provider reading it.
pub struct LocalKey {
    pub dir: TempDir,
    pub provider: LocalFileKeyProvider,
}

impl LocalKey {
    pub fn generate() -> Self {
        let dir = TempDir::new().unwrap();
        let (provider, _) = LocalFileKeyProvider::generate(dir.path().join("signing.pem")).unwrap();
        Self { dir, provider }
    }

    pub async fn trusted_key(&self) -> TrustedKey {
        TrustedKey::new(
            self.provider.key_id(),
            self.provider.public_key().await.unwrap(),
            epoch() - Duration::days(365),
        )
        .unwrap()
    }

    pub async fn trust_store(&self) -> TrustStore {
        let store = TrustStore::new();
        store.trust(self.trusted_key().await).unwrap();
        store
    }
}

/// Flip one bit of the artifact content through the persisted record.
pub fn tamper_content(signed: &SignedArtifact) -> SignedArtifact {
    let mut record = serde_json::to_value(signed).unwrap();
    let content = record["artifact"]["content"].as_str().unwrap();
    let mut bytes = BASE64.decode(content).unwrap();
    bytes[0] ^= 0x01;
    record["artifact"]["content"] = serde_json::Value::String(BASE64.encode(bytes));
    serde_json::from_value(record).unwrap()
}

/// Answers the key service API with an in-memory P-256 key.
pub struct FakeKms {
    pub key_id: String,
    pub signing_key: SigningKey,
    pub requests: Mutex<Vec<HttpRequest>>,
    /// Number of leading requests answered with 503.
    pub fail_first: Mutex<u32>,
}

impl FakeKms {
    pub fn new(key_id: &str) -> Self {
        Self {
            key_id: key_id.to_string(),
            signing_key: SigningKey::random(&mut rand::thread_rng()),
            requests: Mutex::new(Vec::new()),
            fail_first: Mutex::new(0),
        }
    }
}

#[async_trait]
impl HttpClient for FakeKms {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.requests.lock().unwrap().push(request.clone());
        {
            let mut remaining = self.fail_first.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(HttpResponse::new(503, "throttled"));
            }
        }

        let body = if request.url.ends_with("/sign") {
            let json: serde_json::Value =
                serde_json::from_slice(request.body.as_deref().unwrap()).unwrap();
            assert_eq!(json["message_type"], "DIGEST");
            let digest = BASE64.decode(json["message"].as_str().unwrap()).unwrap();
            let signature: Signature = self.signing_key.sign_prehash(&digest).unwrap();
            serde_json::json!({
                "key_id": self.key_id,
                "signature": BASE64.encode(signature.to_der().as_bytes()),
            })
        } else {
            let der = self
                .signing_key
                .verifying_key()
                .to_public_key_der()
                .unwrap();
            serde_json::json!({
                "key_id": self.key_id,
                "public_key": BASE64.encode(der.as_bytes()),
            })
        };
        Ok(HttpResponse::new(200, body.to_string()))
    }
}

/// An artifact registry that deduplicates by artifact id.
#[derive(Default)]
pub struct InMemoryServer {
    pub records: Mutex<HashMap<String, Vec<u8>>>,
    pub requests: Mutex<Vec<HttpRequest>>,
    /// Status codes returned (in order) before normal handling resumes.
    pub outages: Mutex<Vec<u16>>,
}

impl InMemoryServer {
    pub fn with_outages(statuses: Vec<u16>) -> Self {
        Self {
            outages: Mutex::new(statuses),
            ..Self::default()
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpClient for InMemoryServer {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.requests.lock().unwrap().push(request.clone());
        {
            let mut outages = self.outages.lock().unwrap();
            if !outages.is_empty() {
                let status = outages.remove(0);
                return Ok(HttpResponse::new(status, "unavailable"));
            }
        }

        match request.method {
            HttpMethod::Post => {
                let body: serde_json::Value =
                    match serde_json::from_slice(request.body.as_deref().unwrap_or_default()) {
                        Ok(body) => body,
                        Err(_) => return Ok(HttpResponse::new(400, "invalid json")),
                    };
                let record = &body["signed_artifact"];
                let Some(id) = record["artifact"]["id"].as_str() else {
                    return Ok(HttpResponse::new(422, "missing artifact id"));
                };

                let mut records = self.records.lock().unwrap();
                if records.contains_key(id) {
                    return Ok(HttpResponse::new(409, "duplicate artifact"));
                }
                records.insert(id.to_string(), serde_json::to_vec(record).unwrap());

                let receipt = serde_json::json!({
                    "artifact_id": id,
                    "received_at": "2025-06-01T12:00:00Z",
                });
                Ok(HttpResponse::new(201, receipt.to_string()))
            }
            HttpMethod::Get => {
                let id = request.url.rsplit('/').next().unwrap_or_default();
                match self.records.lock().unwrap().get(id) {
                    Some(record) => Ok(HttpResponse::new(200, record.clone())),
                    None => Ok(HttpResponse::new(404, "not found")),
                }
            }
        }
    }
}
