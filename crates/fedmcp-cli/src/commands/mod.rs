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

//! Command implementations and the wiring they share.

pub mod config;
pub mod create;
pub mod keys;
pub mod push;
pub mod sign;
pub mod trust;
pub mod verify;

use anyhow::{anyhow, bail, Context as _, Result};
use fedmcp::client::http::{HttpClient, ReqwestHttpClient};
use fedmcp::client::ServerClient;
use fedmcp::config::{ConfigLoader, FedmcpConfig, KeySourceKind};
use fedmcp::security::{KeyProvider, LocalFileKeyProvider, RemoteKmsKeyProvider, TrustStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Loaded configuration and where it came from.
pub struct Context {
    pub config: FedmcpConfig,
    /// File to write configuration changes back to.
    pub config_path: PathBuf,
    /// Transport shared by the server client and the KMS provider.
    pub http: Arc<dyn HttpClient>,
}

impl Context {
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let loader = ConfigLoader::new();
        let config = loader
            .load_config(config_file)
            .context("Failed to load configuration")?;
        let config_path = loader
            .resolve_path(config_file)
            .unwrap_or_else(|| fedmcp::config::default_config_dir().join("config.yaml"));

        let http = ReqwestHttpClient::with_timeout(config.client.timeout())
            .context("Failed to set up HTTP client")?;

        Ok(Self {
            config,
            config_path,
            http: Arc::new(http),
        })
    }

    pub fn trust_store_path<'a>(&'a self, explicit: Option<&'a Path>) -> &'a Path {
        explicit.unwrap_or(self.config.trust_store.as_path())
    }

    pub fn load_trust_store(&self, explicit: Option<&Path>) -> Result<TrustStore> {
        let path = self.trust_store_path(explicit);
        TrustStore::load_or_default(path)
            .with_context(|| format!("Failed to load trust store {}", path.display()))
    }

    /// Server client for an explicit URL, a workspace, or the default server.
    pub fn server_client(
        &self,
        server: Option<&str>,
        workspace: Option<&str>,
    ) -> Result<ServerClient> {
        let server = match server {
            Some(server) => server,
            None => self.config.server_for(workspace)?,
        };

        let mut client = ServerClient::with_http_client(server, self.http.clone())?
            .with_retry_policy(self.config.client.retry.to_policy());
        if let Some(token) = token_from_env(self.config.client.token_env.as_deref())? {
            client = client.with_bearer_token(token);
        }
        Ok(client)
    }

    /// Build the key provider selected by flags, falling back to the
    /// workspace's configured key source.
    pub fn key_provider(&self, args: &KeySourceArgs) -> Result<Box<dyn KeyProvider>> {
        if let Some(path) = &args.key_file {
            return Ok(Box::new(LocalFileKeyProvider::load(path)?));
        }
        if let Some(key_id) = &args.kms_key_id {
            return self.kms_provider(key_id);
        }

        let workspace = self
            .config
            .workspace(args.workspace.as_deref())
            .context("No signing key given; use --key-file, --kms-key-id or a workspace with a key")?;
        let source = workspace
            .key
            .as_ref()
            .ok_or_else(|| anyhow!("Workspace '{}' has no key configured", workspace.name))?;

        match (source.kind, &source.path, &source.kms_key_id) {
            (KeySourceKind::Local, Some(path), _) => {
                Ok(Box::new(LocalFileKeyProvider::load(path)?))
            }
            (KeySourceKind::Kms, _, Some(key_id)) => self.kms_provider(key_id),
            _ => bail!("Workspace '{}' has an incomplete key source", workspace.name),
        }
    }

    fn kms_provider(&self, key_id: &str) -> Result<Box<dyn KeyProvider>> {
        let kms = self
            .config
            .kms
            .as_ref()
            .ok_or_else(|| anyhow!("KMS signing requires a kms.endpoint in the configuration"))?;

        let mut provider = RemoteKmsKeyProvider::new(&kms.endpoint, key_id, self.http.clone())?
            .with_retry_policy(self.config.client.retry.to_policy());
        if let Some(token) = token_from_env(kms.token_env.as_deref())? {
            provider = provider.with_bearer_token(token);
        }
        Ok(Box::new(provider))
    }
}

/// Key source flags shared by signing commands.
#[derive(Debug, Default)]
pub struct KeySourceArgs {
    pub key_file: Option<PathBuf>,
    pub kms_key_id: Option<String>,
    pub workspace: Option<String>,
}

fn token_from_env(var: Option<&str>) -> Result<Option<String>> {
    match var {
        None => Ok(None),
        Some(var) => std::env::var(var)
            .map(Some)
            .with_context(|| format!("Environment variable '{}' is not set", var)),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use fedmcp::client::http::{HttpError, HttpRequest, HttpResponse};
    use fedmcp::crypto::encode_public_key_pem;
    use tempfile::TempDir;

    /// A context whose files all live under `dir`, talking to `http`.
    pub fn context_with(dir: &TempDir, http: Arc<dyn HttpClient>) -> Context {
        let config = FedmcpConfig {
            keys_directory: dir.path().join("keys"),
            trust_store: dir.path().join("trust-store.json"),
            ..FedmcpConfig::default()
        };
        Context {
            config,
            config_path: dir.path().join("config.yaml"),
            http,
        }
    }

    pub fn context(dir: &TempDir) -> Context {
        context_with(dir, Arc::new(ReqwestHttpClient::new()))
    }

    /// Answers the key service API by signing with a local key.
    pub struct FakeKms {
        pub backing: LocalFileKeyProvider,
    }

    #[async_trait]
    impl HttpClient for FakeKms {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
            let fail = |e: String| HttpError::Other(e);
            let body = if request.url.ends_with("/sign") {
                let json: serde_json::Value =
                    serde_json::from_slice(request.body.as_deref().unwrap_or_default())
                        .map_err(|e| fail(e.to_string()))?;
                let message = BASE64
                    .decode(json["message"].as_str().unwrap_or_default())
                    .map_err(|e| fail(e.to_string()))?;
                let digest: [u8; 32] = message
                    .try_into()
                    .map_err(|_| fail("digest must be 32 bytes".to_string()))?;
                let signature = self
                    .backing
                    .sign(&digest)
                    .await
                    .map_err(|e| fail(e.to_string()))?;
                serde_json::json!({ "signature": BASE64.encode(signature) })
            } else {
                let public_key = self
                    .backing
                    .public_key()
                    .await
                    .map_err(|e| fail(e.to_string()))?;
                let pem = encode_public_key_pem(&public_key).map_err(|e| fail(e.to_string()))?;
                // The PEM body is the base64 SubjectPublicKeyInfo DER.
                let der_b64: String = pem.lines().filter(|l| !l.starts_with("-----")).collect();
                serde_json::json!({ "public_key": der_b64 })
            };
            Ok(HttpResponse::new(200, body.to_string()))
        }
    }
}
