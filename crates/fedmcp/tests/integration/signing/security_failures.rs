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

//! Security failure integration tests.
//!
//! These tests verify that verification correctly reports:
//! - Tampered artifacts
//! - Unknown and untrusted signers
//! - Expired signatures
//! - Malformed records

use crate::fixtures::{epoch, ml_pipeline_artifact, tamper_content, LocalKey};
use chrono::{Duration, Utc};
use fedmcp::security::{
    FailureReason, Signer, SigningPolicy, TrustStore, VerificationOutcome, Verifier, VerifyError,
};
use fedmcp::SignedArtifact;

/// Test that a tampered artifact is rejected.
#[tokio::test]
async fn test_tampered_content_rejected() {
    let key = LocalKey::generate();
    let store = key.trust_store().await;
    let signed = Signer::default()
        .sign(&ml_pipeline_artifact(), &key.provider)
        .await
        .unwrap();

    let tampered = tamper_content(&signed);
    assert_eq!(tampered.id(), signed.id());

    let verdict = Verifier::new(&store).verify_now(&tampered).unwrap();
    assert_eq!(
        verdict.outcome,
        VerificationOutcome::Failed(FailureReason::InvalidSignature)
    );
}

/// Test that metadata edits after signing are detected.
#[tokio::test]
async fn test_tampered_metadata_rejected() {
    let key = LocalKey::generate();
    let store = key.trust_store().await;
    let signed = Signer::default()
        .sign(
            &ml_pipeline_artifact().with_metadata("impact", "moderate"),
            &key.provider,
        )
        .await
        .unwrap();

    let mut record = serde_json::to_value(&signed).unwrap();
    record["artifact"]["metadata"]["impact"] = serde_json::json!("low");
    let tampered: SignedArtifact = serde_json::from_value(record).unwrap();

    let verdict = Verifier::new(&store).verify_now(&tampered).unwrap();
    assert_eq!(verdict.failure_reason(), Some(FailureReason::InvalidSignature));
}

/// Test verification against an empty trust store.
#[tokio::test]
async fn test_empty_trust_store_is_unknown_key() {
    let key = LocalKey::generate();
    let signed = Signer::default()
        .sign(&ml_pipeline_artifact(), &key.provider)
        .await
        .unwrap();

    let verdict = Verifier::new(&TrustStore::new())
        .verify_now(&signed)
        .unwrap();
    assert_eq!(verdict.failure_reason(), Some(FailureReason::UnknownKey));
}

/// Test that a key trusted only for a past window is untrusted now.
#[tokio::test]
async fn test_expired_trust_window_is_untrusted() {
    let key = LocalKey::generate();
    let store = TrustStore::new();
    store
        .trust(key.trusted_key().await.with_trusted_until(epoch()))
        .unwrap();
    let signed = Signer::default()
        .sign(&ml_pipeline_artifact(), &key.provider)
        .await
        .unwrap();

    let verifier = Verifier::new(&store);
    assert!(verifier.verify(&signed, epoch()).unwrap().is_verified());
    assert_eq!(
        verifier.verify_now(&signed).unwrap().failure_reason(),
        Some(FailureReason::UntrustedKey)
    );
}

/// Test the inclusive expiry boundary.
#[tokio::test]
async fn test_expiry_boundary() {
    let key = LocalKey::generate();
    let store = key.trust_store().await;
    let signed = Signer::new(SigningPolicy::with_validity(Duration::hours(1)))
        .sign(&ml_pipeline_artifact(), &key.provider)
        .await
        .unwrap();
    let expires_at = signed.active_envelope().unwrap().expires_at.unwrap();

    let verifier = Verifier::new(&store);
    assert!(verifier.verify(&signed, expires_at).unwrap().is_verified());
    assert_eq!(
        verifier
            .verify(&signed, expires_at + Duration::seconds(1))
            .unwrap()
            .failure_reason(),
        Some(FailureReason::Expired)
    );
}

/// Test that a record without an active envelope is malformed.
#[tokio::test]
async fn test_record_without_active_envelope_is_malformed() {
    let key = LocalKey::generate();
    let store = key.trust_store().await;
    let signed = Signer::default()
        .sign(&ml_pipeline_artifact(), &key.provider)
        .await
        .unwrap();

    let mut record = serde_json::to_value(&signed).unwrap();
    record["signatures"][0]["active"] = serde_json::json!(false);
    let malformed: SignedArtifact = serde_json::from_value(record).unwrap();

    assert!(matches!(
        Verifier::new(&store).verify(&malformed, Utc::now()),
        Err(VerifyError::MalformedArtifact(_))
    ));
}

/// Test that a truncated signature is an invalid signature, not an error.
#[tokio::test]
async fn test_truncated_signature_is_invalid() {
    let key = LocalKey::generate();
    let store = key.trust_store().await;
    let signed = Signer::default()
        .sign(&ml_pipeline_artifact(), &key.provider)
        .await
        .unwrap();

    let mut record = serde_json::to_value(&signed).unwrap();
    record["signatures"][0]["signature"] = serde_json::json!("MEQCIA==");
    let truncated: SignedArtifact = serde_json::from_value(record).unwrap();

    let verdict = Verifier::new(&store).verify_now(&truncated).unwrap();
    assert_eq!(verdict.failure_reason(), Some(FailureReason::InvalidSignature));
}
