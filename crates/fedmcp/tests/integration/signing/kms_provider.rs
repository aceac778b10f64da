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

//! Remote KMS signing tests.

use crate::fixtures::{epoch, ml_pipeline_artifact, FakeKms, LocalKey};
use fedmcp::retry::{BackoffStrategy, RetryPolicy};
use fedmcp::security::{
    KeyProvider, RemoteKmsKeyProvider, Signer, SigningError, TrustStore, TrustedKey, Verifier,
};
use std::sync::Arc;
use std::time::Duration;

const KEY_ARN: &str = "arn:aws-us-gov:kms:us-gov-west-1:111122223333:key/ml-pipeline";

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 4,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        backoff_strategy: BackoffStrategy::Exponential {
            base: 2.0,
            multiplier: 1.0,
        },
        with_jitter: false,
    }
}

/// KMS and local signatures verify through the same verifier.
#[tokio::test]
async fn test_kms_and_local_signatures_verify_alike() {
    let kms = Arc::new(FakeKms::new(KEY_ARN));
    let kms_provider = RemoteKmsKeyProvider::new("https://kms.example.gov", KEY_ARN, kms.clone())
        .unwrap()
        .with_retry_policy(fast_retry());
    let local = LocalKey::generate();

    let store = TrustStore::new();
    store
        .trust(
            TrustedKey::new(KEY_ARN, kms_provider.public_key().await.unwrap(), epoch()).unwrap(),
        )
        .unwrap();
    store.trust(local.trusted_key().await).unwrap();

    let signer = Signer::default();
    let artifact = ml_pipeline_artifact();
    let via_kms = signer.sign(&artifact, &kms_provider).await.unwrap();
    let via_local = signer.sign(&artifact, &local.provider).await.unwrap();

    let verifier = Verifier::new(&store);
    let kms_verdict = verifier.verify_now(&via_kms).unwrap();
    assert!(kms_verdict.is_verified());
    assert_eq!(kms_verdict.key_id, KEY_ARN);
    assert!(verifier.verify_now(&via_local).unwrap().is_verified());
}

/// Throttled key service calls are retried until they succeed.
#[tokio::test]
async fn test_kms_throttling_is_retried() {
    let kms = Arc::new(FakeKms::new(KEY_ARN));
    *kms.fail_first.lock().unwrap() = 2;
    let provider = RemoteKmsKeyProvider::new("https://kms.example.gov", KEY_ARN, kms.clone())
        .unwrap()
        .with_retry_policy(fast_retry());

    let signed = Signer::default()
        .sign(&ml_pipeline_artifact(), &provider)
        .await
        .unwrap();
    assert_eq!(signed.active_envelope().unwrap().key_id, KEY_ARN);
    assert_eq!(kms.requests.lock().unwrap().len(), 3);
}

/// A key service that never recovers surfaces a signing error.
#[tokio::test]
async fn test_kms_outage_fails_signing() {
    let kms = Arc::new(FakeKms::new(KEY_ARN));
    *kms.fail_first.lock().unwrap() = 100;
    let provider = RemoteKmsKeyProvider::new("https://kms.example.gov", KEY_ARN, kms.clone())
        .unwrap()
        .with_retry_policy(fast_retry());

    let result = Signer::default()
        .sign(&ml_pipeline_artifact(), &provider)
        .await;
    assert!(matches!(result, Err(SigningError::Provider(_))));
    assert_eq!(kms.requests.lock().unwrap().len(), 4);
}
