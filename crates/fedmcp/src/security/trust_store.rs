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

//! Trusted public keys.
//!
//! The trust store is the only source of verification keys: the verifier
//! resolves an envelope's `key_id` here and never trusts key material carried
//! by the artifact itself. Revocation is monotonic.

use crate::artifact::base64_bytes;
use crate::crypto::{compute_key_fingerprint, decode_public_key_pem};
use chrono::{DateTime, Utc};
use p256::ecdsa::VerifyingKey;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::audit;

#[derive(Debug, Error)]
pub enum TrustStoreError {
    #[error("Key not found in trust store: {0}")]
    NotFound(String),

    #[error("Key has been revoked and cannot be trusted again: {0}")]
    Revoked(String),

    #[error("Key is already in the trust store: {0}")]
    AlreadyTrusted(String),

    #[error("Invalid public key for {key_id}: {reason}")]
    InvalidKey { key_id: String, reason: String },

    #[error("Trust store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse trust store {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

/// A public key an operator has chosen to trust.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedKey {
    pub key_id: String,
    /// SEC1 encoded P-256 point
    #[serde(with = "base64_bytes")]
    pub public_key: Vec<u8>,
    pub trusted_from: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trusted_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub revoked: bool,
}

impl TrustedKey {
    pub fn new(
        key_id: impl Into<String>,
        public_key: Vec<u8>,
        trusted_from: DateTime<Utc>,
    ) -> Result<Self, TrustStoreError> {
        let key_id = key_id.into();
        VerifyingKey::from_sec1_bytes(&public_key).map_err(|e| TrustStoreError::InvalidKey {
            key_id: key_id.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            key_id,
            public_key,
            trusted_from,
            trusted_until: None,
            revoked: false,
        })
    }

    /// Import a PEM public key, using its fingerprint as the key id.
    pub fn from_public_key_pem(
        pem_str: &str,
        trusted_from: DateTime<Utc>,
    ) -> Result<Self, TrustStoreError> {
        let public_key = decode_public_key_pem(pem_str).map_err(|e| TrustStoreError::InvalidKey {
            key_id: "<pem>".to_string(),
            reason: e.to_string(),
        })?;
        let key_id = compute_key_fingerprint(&public_key);
        Self::new(key_id, public_key, trusted_from)
    }

    pub fn with_trusted_until(mut self, trusted_until: DateTime<Utc>) -> Self {
        self.trusted_until = Some(trusted_until);
        self
    }

    /// Not revoked and `at` within `[trusted_from, trusted_until]`.
    pub fn is_trusted_at(&self, at: DateTime<Utc>) -> bool {
        !self.revoked
            && at >= self.trusted_from
            && self.trusted_until.map_or(true, |until| at <= until)
    }
}

/// Thread-safe registry of trusted keys, keyed by `key_id`.
///
/// Reads take a shared lock and may run concurrently; `trust` and `revoke`
/// take the write lock over the whole store.
#[derive(Debug, Default)]
pub struct TrustStore {
    keys: RwLock<HashMap<String, TrustedKey>>,
}

impl TrustStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key. Entries are never replaced: an id already present is
    /// rejected, and a revoked key stays revoked.
    pub fn trust(&self, key: TrustedKey) -> Result<(), TrustStoreError> {
        let mut keys = self.keys.write();
        match keys.get(&key.key_id) {
            Some(existing) if existing.revoked => {
                return Err(TrustStoreError::Revoked(key.key_id));
            }
            Some(_) => return Err(TrustStoreError::AlreadyTrusted(key.key_id)),
            None => {}
        }

        audit::log_trusted_key_added(&key.key_id, key.trusted_until);
        keys.insert(key.key_id.clone(), key);
        Ok(())
    }

    pub fn lookup(&self, key_id: &str) -> Result<TrustedKey, TrustStoreError> {
        self.keys
            .read()
            .get(key_id)
            .cloned()
            .ok_or_else(|| TrustStoreError::NotFound(key_id.to_string()))
    }

    /// Whether `key_id` exists, is not revoked, and `at` is in its window.
    pub fn is_trusted(&self, key_id: &str, at: DateTime<Utc>) -> bool {
        self.keys
            .read()
            .get(key_id)
            .is_some_and(|key| key.is_trusted_at(at))
    }

    /// Revoke a key for all future lookups. Revoking twice is a no-op.
    pub fn revoke(&self, key_id: &str) -> Result<(), TrustStoreError> {
        let mut keys = self.keys.write();
        let key = keys
            .get_mut(key_id)
            .ok_or_else(|| TrustStoreError::NotFound(key_id.to_string()))?;

        if !key.revoked {
            key.revoked = true;
            audit::log_trusted_key_revoked(key_id);
        }
        Ok(())
    }

    /// All keys, ordered by `key_id`.
    pub fn list(&self) -> Vec<TrustedKey> {
        let mut keys: Vec<TrustedKey> = self.keys.read().values().cloned().collect();
        keys.sort_by(|a, b| a.key_id.cmp(&b.key_id));
        keys
    }

    pub fn len(&self) -> usize {
        self.keys.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.read().is_empty()
    }

    pub fn load_from_file(path: &Path) -> Result<Self, TrustStoreError> {
        let data = std::fs::read_to_string(path).map_err(|source| TrustStoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let records: BTreeMap<String, TrustedKey> =
            serde_json::from_str(&data).map_err(|e| TrustStoreError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut keys = HashMap::with_capacity(records.len());
        for (key_id, key) in records {
            if key_id != key.key_id {
                return Err(TrustStoreError::Parse {
                    path: path.to_path_buf(),
                    reason: format!("entry '{}' holds key '{}'", key_id, key.key_id),
                });
            }
            VerifyingKey::from_sec1_bytes(&key.public_key).map_err(|e| {
                TrustStoreError::InvalidKey {
                    key_id: key_id.clone(),
                    reason: e.to_string(),
                }
            })?;
            keys.insert(key_id, key);
        }

        tracing::debug!(path = %path.display(), keys = keys.len(), "Loaded trust store");
        Ok(Self {
            keys: RwLock::new(keys),
        })
    }

    /// Load `path`, or start empty when it does not exist yet.
    pub fn load_or_default(path: &Path) -> Result<Self, TrustStoreError> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::new())
        }
    }

    /// Write the store as JSON, replacing `path` atomically.
    pub fn save_to_file(&self, path: &Path) -> Result<(), TrustStoreError> {
        let io_err = |source| TrustStoreError::Io {
            path: path.to_path_buf(),
            source,
        };

        let records: BTreeMap<String, TrustedKey> = self
            .keys
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let json = serde_json::to_string_pretty(&records).map_err(|e| TrustStoreError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }
}
