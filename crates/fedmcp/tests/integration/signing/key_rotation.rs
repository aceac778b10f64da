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

//! Key rotation and revocation tests.

use crate::fixtures::{ml_pipeline_artifact, LocalKey};
use chrono::{Duration, Utc};
use fedmcp::security::{FailureReason, KeyProvider, Signer, TrustStore, Verifier};

/// Test re-signing with a new key after the old key is revoked.
#[tokio::test]
async fn test_resign_after_rotation() {
    let old_key = LocalKey::generate();
    let new_key = LocalKey::generate();
    let store = TrustStore::new();
    store.trust(old_key.trusted_key().await).unwrap();
    store.trust(new_key.trusted_key().await).unwrap();

    let signer = Signer::default();
    let signed = signer
        .sign(&ml_pipeline_artifact(), &old_key.provider)
        .await
        .unwrap();

    store.revoke(old_key.provider.key_id()).unwrap();
    let verifier = Verifier::new(&store);
    assert_eq!(
        verifier.verify_now(&signed).unwrap().failure_reason(),
        Some(FailureReason::UntrustedKey)
    );

    let resigned = signer.resign(&signed, &new_key.provider).await.unwrap();
    assert_eq!(resigned.id(), signed.id());
    assert_eq!(resigned.artifact().content(), signed.artifact().content());
    assert_eq!(resigned.history().count(), 1);

    let verdict = verifier.verify_now(&resigned).unwrap();
    assert!(verdict.is_verified());
    assert_eq!(verdict.key_id, new_key.provider.key_id());
}

/// Test that revocation applies to every later verification.
#[tokio::test]
async fn test_revocation_is_permanent() {
    let key = LocalKey::generate();
    let store = key.trust_store().await;
    let signed = Signer::default()
        .sign(&ml_pipeline_artifact(), &key.provider)
        .await
        .unwrap();
    let verifier = Verifier::new(&store);

    let before = verifier.verify_now(&signed).unwrap();
    assert!(before.is_verified());

    store.revoke(key.provider.key_id()).unwrap();
    assert!(store.trust(key.trusted_key().await).is_err());

    for days in [0, 1, 30] {
        let verdict = verifier
            .verify(&signed, Utc::now() + Duration::days(days))
            .unwrap();
        assert_eq!(verdict.failure_reason(), Some(FailureReason::UntrustedKey));
    }
    assert!(before.is_verified());
}

/// Test that a revised artifact needs its own signature.
#[tokio::test]
async fn test_revision_is_a_new_artifact() {
    let key = LocalKey::generate();
    let store = key.trust_store().await;
    let signer = Signer::default();

    let original = ml_pipeline_artifact();
    let signed = signer.sign(&original, &key.provider).await.unwrap();

    let revised = original.revise(b"control_id: AC-2\nimplementation: hardware tokens\n".to_vec());
    assert_ne!(revised.id(), original.id());
    assert_eq!(revised.name(), original.name());

    let signed_revision = signer.sign(&revised, &key.provider).await.unwrap();
    let verifier = Verifier::new(&store);
    assert!(verifier.verify_now(&signed).unwrap().is_verified());
    assert!(verifier.verify_now(&signed_revision).unwrap().is_verified());
    assert_ne!(
        signed.active_envelope().unwrap().signature,
        signed_revision.active_envelope().unwrap().signature
    );
}
