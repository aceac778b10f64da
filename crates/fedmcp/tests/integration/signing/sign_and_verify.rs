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

//! End-to-end sign and verify tests.

use crate::fixtures::{ml_pipeline_artifact, LocalKey};
use chrono::{Duration, Utc};
use fedmcp::crypto::{canonicalize, compute_key_fingerprint};
use fedmcp::security::{
    KeyProvider, LocalFileKeyProvider, Signer, SigningPolicy, VerificationState, Verifier,
};
use fedmcp::SignedArtifact;

/// Test the basic scenario: generated local key, trusted, no expiry.
#[tokio::test]
async fn test_sign_and_verify_local_key() {
    let key = LocalKey::generate();
    let store = key.trust_store().await;
    let artifact = ml_pipeline_artifact();

    let signed = Signer::default().sign(&artifact, &key.provider).await.unwrap();
    let verdict = Verifier::new(&store).verify_now(&signed).unwrap();

    assert!(verdict.is_verified(), "verdict: {:?}", verdict);
    assert_eq!(verdict.state(), VerificationState::Verified);
    assert_eq!(verdict.artifact_id, artifact.id());
    assert_eq!(verdict.key_id, key.provider.key_id());
    assert!(verdict.expires_at.is_none());
}

/// The key id of a local key is the fingerprint of its public key.
#[tokio::test]
async fn test_local_key_id_is_fingerprint() {
    let key = LocalKey::generate();
    let public_key = key.provider.public_key().await.unwrap();
    assert_eq!(key.provider.key_id(), compute_key_fingerprint(&public_key));
}

/// Test that a signed record survives a file round trip and still verifies.
#[tokio::test]
async fn test_persisted_record_verifies() {
    let key = LocalKey::generate();
    let store = key.trust_store().await;
    let signer = Signer::new(SigningPolicy::with_validity(Duration::days(365)));

    let signed = signer
        .sign(&ml_pipeline_artifact().with_metadata("workspace", "prod"), &key.provider)
        .await
        .unwrap();
    let path = key.dir.path().join("artifact.signed.json");
    signed.write_to_file(&path).unwrap();

    let loaded = SignedArtifact::read_from_file(&path).unwrap();
    assert_eq!(loaded, signed);
    assert_eq!(
        canonicalize(loaded.artifact()).as_bytes(),
        canonicalize(signed.artifact()).as_bytes()
    );
    assert!(Verifier::new(&store).verify_now(&loaded).unwrap().is_verified());
}

/// Test that a key reloaded from disk verifies signatures made before.
#[tokio::test]
async fn test_reloaded_key_verifies() {
    let key = LocalKey::generate();
    let signed = Signer::default()
        .sign(&ml_pipeline_artifact(), &key.provider)
        .await
        .unwrap();

    let reloaded = LocalFileKeyProvider::load(key.provider.path()).unwrap();
    assert_eq!(reloaded.key_id(), key.provider.key_id());

    let store = key.trust_store().await;
    assert!(Verifier::new(&store)
        .verify(&signed, Utc::now())
        .unwrap()
        .is_verified());
}

/// Independent artifacts can be signed and verified concurrently.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sign_and_verify() {
    let key = std::sync::Arc::new(LocalKey::generate());
    let store = std::sync::Arc::new(key.trust_store().await);

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let key = key.clone();
            let store = store.clone();
            tokio::spawn(async move {
                let artifact = ml_pipeline_artifact().with_metadata("index", i.to_string());
                let signed = Signer::default().sign(&artifact, &key.provider).await.unwrap();
                Verifier::new(&store).verify_now(&signed).unwrap().is_verified()
            })
        })
        .collect();

    for task in tasks {
        assert!(task.await.unwrap());
    }
}
