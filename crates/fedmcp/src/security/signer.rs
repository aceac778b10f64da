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

//! Artifact signing.
//!
//! The signer canonicalizes an artifact, digests the canonical form, and asks
//! a [`KeyProvider`] for a signature. The input artifact is never touched:
//! every call returns a new [`SignedArtifact`].

use crate::artifact::{Artifact, ArtifactError, SignatureEnvelope, SignedArtifact};
use crate::crypto::canonicalize;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::audit;
use super::key_provider::{KeyProvider, KeyProviderError};

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("Cannot sign malformed artifact: {0}")]
    Malformed(#[from] ArtifactError),

    #[error("Key provider failed: {0}")]
    Provider(#[source] KeyProviderError),

    #[error("Signing canceled")]
    Canceled,
}

impl From<KeyProviderError> for SigningError {
    fn from(err: KeyProviderError) -> Self {
        match err {
            KeyProviderError::Canceled => SigningError::Canceled,
            other => SigningError::Provider(other),
        }
    }
}

/// Envelope policy applied at signing time.
#[derive(Debug, Clone, Default)]
pub struct SigningPolicy {
    /// How long a signature stays acceptable; `None` means no expiry.
    pub validity: Option<Duration>,
}

impl SigningPolicy {
    pub fn with_validity(validity: Duration) -> Self {
        Self {
            validity: Some(validity),
        }
    }
}

/// Produces signature envelopes for artifacts.
#[derive(Debug, Clone, Default)]
pub struct Signer {
    policy: SigningPolicy,
}

impl Signer {
    pub fn new(policy: SigningPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SigningPolicy {
        &self.policy
    }

    /// Sign `artifact`, returning a new record with a single active envelope.
    pub async fn sign(
        &self,
        artifact: &Artifact,
        provider: &dyn KeyProvider,
    ) -> Result<SignedArtifact, SigningError> {
        self.sign_with_cancel(artifact, provider, &CancellationToken::new())
            .await
    }

    pub async fn sign_with_cancel(
        &self,
        artifact: &Artifact,
        provider: &dyn KeyProvider,
        cancel: &CancellationToken,
    ) -> Result<SignedArtifact, SigningError> {
        let envelope = self.envelope_for(artifact, provider, cancel).await?;
        Ok(SignedArtifact::new(artifact.clone(), envelope))
    }

    /// Sign an already signed artifact again, superseding its active
    /// envelope. The artifact (id, content) is carried over unchanged.
    pub async fn resign(
        &self,
        signed: &SignedArtifact,
        provider: &dyn KeyProvider,
    ) -> Result<SignedArtifact, SigningError> {
        self.resign_with_cancel(signed, provider, &CancellationToken::new())
            .await
    }

    pub async fn resign_with_cancel(
        &self,
        signed: &SignedArtifact,
        provider: &dyn KeyProvider,
        cancel: &CancellationToken,
    ) -> Result<SignedArtifact, SigningError> {
        let envelope = self.envelope_for(signed.artifact(), provider, cancel).await?;
        Ok(signed.clone().with_envelope(envelope))
    }

    async fn envelope_for(
        &self,
        artifact: &Artifact,
        provider: &dyn KeyProvider,
        cancel: &CancellationToken,
    ) -> Result<SignatureEnvelope, SigningError> {
        artifact.validate()?;

        let digest = canonicalize(artifact).digest();
        let key_id = provider.key_id().to_string();

        let signature = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(KeyProviderError::Canceled),
            result = provider.sign(&digest) => result,
        };
        let signature = match signature {
            Ok(signature) => signature,
            Err(e) => {
                audit::log_artifact_sign_failed(artifact.id(), &key_id, &e.to_string());
                return Err(e.into());
            }
        };

        let envelope = self.assemble(key_id, signature, Utc::now());
        audit::log_artifact_signed(artifact.id(), &envelope.key_id, envelope.expires_at);
        Ok(envelope)
    }

    fn assemble(
        &self,
        key_id: String,
        signature: Vec<u8>,
        signed_at: DateTime<Utc>,
    ) -> SignatureEnvelope {
        SignatureEnvelope {
            algorithm: SignatureEnvelope::ALGORITHM.to_string(),
            key_id,
            signature,
            signed_at,
            expires_at: self.policy.validity.map(|validity| signed_at + validity),
        }
    }
}
