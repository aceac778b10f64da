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

//! Signed artifact verification.
//!
//! Verification walks a fixed sequence of states:
//!
//! ```text
//! Start -> CanonicalizeOk -> DigestMatch -> SignatureValid -> KeyTrusted -> NotExpired -> Verified
//!   \______________\______________\______________\______________\____________> Failed(reason)
//! ```
//!
//! A structurally malformed record is an error ([`VerifyError`]). Every other
//! failure is an expected outcome and is reported inside the [`Verdict`].
//! The result depends only on the record, the trust store contents and the
//! supplied `now`, so re-running at a later time can legitimately change the
//! outcome once a signature expires or a key is revoked.

use crate::artifact::{ArtifactError, SignedArtifact};
use crate::crypto::{canonicalize, verify_digest_signature};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::audit;
use super::trust_store::TrustStore;

/// Why a verification did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The signature does not match the artifact under the resolved key.
    InvalidSignature,
    /// No key with the envelope's `key_id` is in the trust store.
    UnknownKey,
    /// The key is known but revoked or outside its trusted window.
    UntrustedKey,
    /// `now` is past the envelope's `expires_at`.
    Expired,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::InvalidSignature => "invalid_signature",
            FailureReason::UnknownKey => "unknown_key",
            FailureReason::UntrustedKey => "untrusted_key",
            FailureReason::Expired => "expired",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// States of the verification state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationState {
    Start,
    CanonicalizeOk,
    DigestMatch,
    SignatureValid,
    KeyTrusted,
    NotExpired,
    Verified,
    Failed(FailureReason),
}

impl VerificationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, VerificationState::Verified | VerificationState::Failed(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum VerificationOutcome {
    Verified,
    Failed(FailureReason),
}

/// Result of verifying one signed artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub artifact_id: String,
    pub key_id: String,
    pub signed_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    /// The `now` the verdict was rendered at.
    pub verified_at: DateTime<Utc>,
    pub outcome: VerificationOutcome,
    /// States visited, ending in a terminal state.
    pub path: Vec<VerificationState>,
}

impl Verdict {
    pub fn is_verified(&self) -> bool {
        self.outcome == VerificationOutcome::Verified
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self.outcome {
            VerificationOutcome::Verified => None,
            VerificationOutcome::Failed(reason) => Some(reason),
        }
    }

    /// The terminal state.
    pub fn state(&self) -> VerificationState {
        match self.outcome {
            VerificationOutcome::Verified => VerificationState::Verified,
            VerificationOutcome::Failed(reason) => VerificationState::Failed(reason),
        }
    }
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Malformed signed artifact: {0}")]
    MalformedArtifact(#[from] ArtifactError),
}

/// Verifies signed artifacts against a trust store.
#[derive(Debug, Clone, Copy)]
pub struct Verifier<'a> {
    trust_store: &'a TrustStore,
}

impl<'a> Verifier<'a> {
    pub fn new(trust_store: &'a TrustStore) -> Self {
        Self { trust_store }
    }

    /// Verify against the current time.
    pub fn verify_now(&self, signed: &SignedArtifact) -> Result<Verdict, VerifyError> {
        self.verify(signed, Utc::now())
    }

    /// Verify `signed` as of `now`.
    pub fn verify(
        &self,
        signed: &SignedArtifact,
        now: DateTime<Utc>,
    ) -> Result<Verdict, VerifyError> {
        signed.validate()?;
        let envelope = signed.active_envelope()?;

        let mut run = Run {
            path: vec![VerificationState::Start],
        };

        // Start -> CanonicalizeOk
        let canonical = canonicalize(signed.artifact());
        run.advance(VerificationState::CanonicalizeOk);

        // CanonicalizeOk -> DigestMatch
        let digest = canonical.digest();
        run.advance(VerificationState::DigestMatch);

        let outcome = 'machine: {
            // DigestMatch -> SignatureValid
            let trusted_key = match self.trust_store.lookup(&envelope.key_id) {
                Ok(key) => key,
                Err(_) => break 'machine Err(FailureReason::UnknownKey),
            };
            if verify_digest_signature(&digest, &envelope.signature, &trusted_key.public_key)
                .is_err()
            {
                break 'machine Err(FailureReason::InvalidSignature);
            }
            run.advance(VerificationState::SignatureValid);

            // SignatureValid -> KeyTrusted, decided on the same snapshot
            if !trusted_key.is_trusted_at(now) {
                break 'machine Err(FailureReason::UntrustedKey);
            }
            run.advance(VerificationState::KeyTrusted);

            // KeyTrusted -> NotExpired
            if envelope.expires_at.is_some_and(|expires_at| now > expires_at) {
                break 'machine Err(FailureReason::Expired);
            }
            run.advance(VerificationState::NotExpired);

            Ok(())
        };

        let outcome = match outcome {
            Ok(()) => {
                run.advance(VerificationState::Verified);
                audit::log_verification_success(signed.id(), &envelope.key_id, now);
                VerificationOutcome::Verified
            }
            Err(reason) => {
                run.advance(VerificationState::Failed(reason));
                audit::log_verification_failure(
                    signed.id(),
                    reason.as_str(),
                    Some(&envelope.key_id),
                );
                VerificationOutcome::Failed(reason)
            }
        };

        Ok(Verdict {
            artifact_id: signed.id().to_string(),
            key_id: envelope.key_id.clone(),
            signed_at: envelope.signed_at,
            expires_at: envelope.expires_at,
            verified_at: now,
            outcome,
            path: run.path,
        })
    }
}

struct Run {
    path: Vec<VerificationState>,
}

impl Run {
    fn advance(&mut self, next: VerificationState) {
        tracing::trace!(state = ?next, "verification transition");
        self.path.push(next);
    }
}
