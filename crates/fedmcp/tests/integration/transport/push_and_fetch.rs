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

use crate::fixtures::{ml_pipeline_artifact, tamper_content, InMemoryServer, LocalKey};
use fedmcp::client::{ClientError, ServerClient};
use fedmcp::retry::{BackoffStrategy, RetryPolicy};
use fedmcp::security::{FailureReason, Signer, Verifier};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const SERVER: &str = "https://fedmcp.agency.gov/";

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        backoff_strategy: BackoffStrategy::Fixed,
        with_jitter: false,
    }
}

fn client_for(server: &Arc<InMemoryServer>) -> ServerClient {
    ServerClient::with_http_client(SERVER, server.clone())
        .unwrap()
        .with_retry_policy(fast_retry())
}

/// Push, fetch back, and verify the fetched record locally.
#[tokio::test]
async fn test_push_fetch_verify() {
    let key = LocalKey::generate();
    let store = key.trust_store().await;
    let server = Arc::new(InMemoryServer::default());
    let client = client_for(&server);

    let signed = Signer::default()
        .sign(&ml_pipeline_artifact(), &key.provider)
        .await
        .unwrap();
    let receipt = client.push(&signed).await.unwrap();
    assert_eq!(receipt.artifact_id, signed.id());
    assert!(!receipt.duplicate);

    let fetched = client.fetch(signed.id()).await.unwrap();
    assert_eq!(fetched, signed);
    assert!(Verifier::new(&store).verify_now(&fetched).unwrap().is_verified());
}

/// A second push of the same artifact id is a duplicate, not an error.
#[tokio::test]
async fn test_duplicate_push_succeeds() {
    let key = LocalKey::generate();
    let server = Arc::new(InMemoryServer::default());
    let client = client_for(&server);
    let signed = Signer::default()
        .sign(&ml_pipeline_artifact(), &key.provider)
        .await
        .unwrap();

    client.push(&signed).await.unwrap();
    let again = client.push(&signed).await.unwrap();

    assert!(again.duplicate);
    assert_eq!(again.artifact_id, signed.id());
    assert_eq!(server.records.lock().unwrap().len(), 1);
}

/// Tags travel beside the record and do not affect its signature.
#[tokio::test]
async fn test_push_tags_are_not_signed() {
    let key = LocalKey::generate();
    let store = key.trust_store().await;
    let server = Arc::new(InMemoryServer::default());
    let client = client_for(&server);
    let signed = Signer::default()
        .sign(&ml_pipeline_artifact(), &key.provider)
        .await
        .unwrap();

    let tags = vec!["fedramp-moderate".to_string(), "ml".to_string()];
    client
        .push_with_cancel(&signed, &tags, &CancellationToken::new())
        .await
        .unwrap();

    let fetched = client.fetch(signed.id()).await.unwrap();
    assert!(fetched.artifact().metadata().is_empty());
    assert!(Verifier::new(&store).verify_now(&fetched).unwrap().is_verified());
}

/// Transient outages are retried within the policy.
#[tokio::test]
async fn test_push_retries_outage() {
    let key = LocalKey::generate();
    let server = Arc::new(InMemoryServer::with_outages(vec![503, 429]));
    let client = client_for(&server);
    let signed = Signer::default()
        .sign(&ml_pipeline_artifact(), &key.provider)
        .await
        .unwrap();

    let receipt = client.push(&signed).await.unwrap();
    assert!(!receipt.duplicate);
    assert_eq!(server.request_count(), 3);
}

/// Client errors are reported without retrying.
#[tokio::test]
async fn test_fetch_missing_is_rejected_once() {
    let server = Arc::new(InMemoryServer::default());
    let client = client_for(&server);

    let result = client.fetch("does-not-exist").await;
    assert!(matches!(
        result,
        Err(ClientError::ServerRejected { status: 404, .. })
    ));
    assert_eq!(server.request_count(), 1);
}

/// A record altered at rest on the server fails verification after fetch.
#[tokio::test]
async fn test_server_side_tamper_detected() {
    let key = LocalKey::generate();
    let store = key.trust_store().await;
    let server = Arc::new(InMemoryServer::default());
    let client = client_for(&server);
    let signed = Signer::default()
        .sign(&ml_pipeline_artifact(), &key.provider)
        .await
        .unwrap();
    client.push(&signed).await.unwrap();

    let tampered = tamper_content(&signed);
    server
        .records
        .lock()
        .unwrap()
        .insert(signed.id().to_string(), serde_json::to_vec(&tampered).unwrap());

    let fetched = client.fetch(signed.id()).await.unwrap();
    assert_eq!(
        Verifier::new(&store)
            .verify_now(&fetched)
            .unwrap()
            .failure_reason(),
        Some(FailureReason::InvalidSignature)
    );
}
