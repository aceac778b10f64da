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

//! Key provider trait and the local-file implementation.
//!
//! A [`KeyProvider`] is the capability to sign a SHA-256 digest with a
//! P-256 key and to describe that key. Signatures from every provider are
//! DER encoded and verify with the same public-key routine, so the verifier
//! never needs to know which provider produced them.

use crate::crypto::{
    compute_key_fingerprint, decode_private_key_pem, encode_verifying_key,
    generate_signing_keypair, sign_digest, GeneratedKeypair, DIGEST_LEN,
};
use crate::retry::RetryableError;
use async_trait::async_trait;
use p256::ecdsa::SigningKey;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::audit;

/// Errors that can occur while using a signing key.
#[derive(Debug, Error)]
pub enum KeyProviderError {
    #[error("Failed to load signing key from {path}: {reason}")]
    KeyLoad { path: PathBuf, reason: String },

    #[error("Key service error: {reason}")]
    KeyService {
        reason: String,
        /// Network-level or 5xx-style failure that may succeed on retry
        retryable: bool,
    },

    #[error("Key not found in key service: {0}")]
    KeyNotFound(String),

    #[error("Not authorized to use key: {0}")]
    KeyPermission(String),

    #[error("Key operation canceled")]
    Canceled,
}

impl KeyProviderError {
    pub(crate) fn service(reason: impl Into<String>, retryable: bool) -> Self {
        KeyProviderError::KeyService {
            reason: reason.into(),
            retryable,
        }
    }
}

impl RetryableError for KeyProviderError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            KeyProviderError::KeyService {
                retryable: true,
                ..
            }
        )
    }

    fn canceled() -> Self {
        KeyProviderError::Canceled
    }
}

/// Capability to sign digests with an ECDSA P-256 key.
///
/// Implementations must be thread-safe (`Send + Sync`). New key sources
/// (HSMs, hardware tokens) are added as further implementations.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    /// Identifier recorded in envelopes: a fingerprint or a KMS key ARN.
    fn key_id(&self) -> &str;

    /// SEC1 encoded public key.
    async fn public_key(&self) -> Result<Vec<u8>, KeyProviderError>;

    /// Sign a SHA-256 digest, returning a DER encoded signature.
    async fn sign(&self, digest: &[u8; DIGEST_LEN]) -> Result<Vec<u8>, KeyProviderError>;
}

/// Signs with a P-256 private key read from a PEM file.
pub struct LocalFileKeyProvider {
    key_id: String,
    path: PathBuf,
    signing_key: SigningKey,
}

impl LocalFileKeyProvider {
    /// Load a PKCS#8 or SEC1 PEM private key.
    ///
    /// The key id is the SHA256 fingerprint of the public key.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, KeyProviderError> {
        let path = path.as_ref();
        let key_load = |reason: String| KeyProviderError::KeyLoad {
            path: path.to_path_buf(),
            reason,
        };

        // The file handle is dropped as soon as the contents are read.
        let pem = std::fs::read_to_string(path).map_err(|e| key_load(e.to_string()))?;
        let signing_key = decode_private_key_pem(&pem).map_err(|e| key_load(e.to_string()))?;

        let provider = Self::from_signing_key(path, signing_key);
        audit::log_key_loaded("local_file", &provider.key_id);
        Ok(provider)
    }

    /// Generate a fresh key, write it to `path` (owner read/write only) and
    /// return a provider for it together with the exported key material.
    pub fn generate(path: impl AsRef<Path>) -> Result<(Self, GeneratedKeypair), KeyProviderError> {
        let path = path.as_ref();
        let key_load = |reason: String| KeyProviderError::KeyLoad {
            path: path.to_path_buf(),
            reason,
        };

        let keypair = generate_signing_keypair().map_err(|e| key_load(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| key_load(e.to_string()))?;
        }
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path).map_err(|e| key_load(e.to_string()))?;
        file.write_all(keypair.private_key_pem.as_bytes())
            .map_err(|e| key_load(e.to_string()))?;
        drop(file);

        let provider = Self::load(path)?;
        Ok((provider, keypair))
    }

    fn from_signing_key(path: &Path, signing_key: SigningKey) -> Self {
        let public_key = encode_verifying_key(signing_key.verifying_key());
        Self {
            key_id: compute_key_fingerprint(&public_key),
            path: path.to_path_buf(),
            signing_key,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for LocalFileKeyProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalFileKeyProvider")
            .field("key_id", &self.key_id)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl KeyProvider for LocalFileKeyProvider {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    async fn public_key(&self) -> Result<Vec<u8>, KeyProviderError> {
        Ok(encode_verifying_key(self.signing_key.verifying_key()))
    }

    async fn sign(&self, digest: &[u8; DIGEST_LEN]) -> Result<Vec<u8>, KeyProviderError> {
        sign_digest(digest, &self.signing_key).map_err(|e| KeyProviderError::KeyLoad {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }
}
