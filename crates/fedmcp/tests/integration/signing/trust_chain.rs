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

//! Trust store persistence tests.

use crate::fixtures::{epoch, ml_pipeline_artifact, LocalKey};
use fedmcp::crypto::generate_signing_keypair;
use fedmcp::security::{
    FailureReason, KeyProvider, LocalFileKeyProvider, Signer, TrustStore, TrustedKey, Verifier,
};
use tempfile::TempDir;

/// Test that trust decisions survive a save and reload.
#[tokio::test]
async fn test_trust_store_file_round_trip() {
    let trusted = LocalKey::generate();
    let revoked = LocalKey::generate();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("trust-store.json");

    {
        let store = TrustStore::new();
        store.trust(trusted.trusted_key().await).unwrap();
        store.trust(revoked.trusted_key().await).unwrap();
        store.revoke(revoked.provider.key_id()).unwrap();
        store.save_to_file(&path).unwrap();
    }

    let store = TrustStore::load_from_file(&path).unwrap();
    let signer = Signer::default();
    let verifier = Verifier::new(&store);

    let good = signer
        .sign(&ml_pipeline_artifact(), &trusted.provider)
        .await
        .unwrap();
    assert!(verifier.verify_now(&good).unwrap().is_verified());

    let bad = signer
        .sign(&ml_pipeline_artifact(), &revoked.provider)
        .await
        .unwrap();
    assert_eq!(
        verifier.verify_now(&bad).unwrap().failure_reason(),
        Some(FailureReason::UntrustedKey)
    );
}

/// Test trusting a key distributed as a PEM public key.
#[tokio::test]
async fn test_trust_exported_public_key() {
    let dir = TempDir::new().unwrap();
    let keypair = generate_signing_keypair().unwrap();
    let key_path = dir.path().join("ops.pem");
    std::fs::write(&key_path, &keypair.private_key_pem).unwrap();
    let provider = LocalFileKeyProvider::load(&key_path).unwrap();

    let store = TrustStore::new();
    let trusted = TrustedKey::from_public_key_pem(&keypair.public_key_pem, epoch()).unwrap();
    assert_eq!(trusted.key_id, provider.key_id());
    store.trust(trusted).unwrap();

    let signed = Signer::default()
        .sign(&ml_pipeline_artifact(), &provider)
        .await
        .unwrap();
    assert!(Verifier::new(&store).verify_now(&signed).unwrap().is_verified());
}

/// Test that SEC1 ("EC PRIVATE KEY") files load as well as PKCS#8.
#[tokio::test]
async fn test_sec1_private_key_file() {
    use p256::pkcs8::LineEnding;

    let dir = TempDir::new().unwrap();
    let secret = p256::SecretKey::random(&mut rand::thread_rng());
    let pem = secret.to_sec1_pem(LineEnding::LF).unwrap();
    let path = dir.path().join("legacy.pem");
    std::fs::write(&path, pem.as_bytes()).unwrap();

    let provider = LocalFileKeyProvider::load(&path).unwrap();
    let store = TrustStore::new();
    store
        .trust(
            TrustedKey::new(
                provider.key_id(),
                provider.public_key().await.unwrap(),
                epoch(),
            )
            .unwrap(),
        )
        .unwrap();

    let signed = Signer::default()
        .sign(&ml_pipeline_artifact(), &provider)
        .await
        .unwrap();
    assert!(Verifier::new(&store).verify_now(&signed).unwrap().is_verified());
}
