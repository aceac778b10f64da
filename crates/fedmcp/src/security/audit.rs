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

//! Security audit logging for SIEM integration.
//!
//! This module provides structured audit logging for all security-sensitive operations:
//! - Artifact signing (success/failure)
//! - Verification verdicts
//! - Trust store changes (trust, revoke)
//! - Artifact transport (push, fetch) and network retries
//!
//! All events use structured fields compatible with common SIEM systems.
//! Events are logged using the `tracing` crate at appropriate levels.
//! Key material and signature bytes are never logged.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Event types for artifact and key operations.
pub mod events {
    /// Artifact signed event type.
    pub const ARTIFACT_SIGNED: &str = "artifact.signed";
    /// Artifact sign failure event type.
    pub const ARTIFACT_SIGN_FAILURE: &str = "artifact.sign.failure";
    /// Artifact pushed to a server event type.
    pub const ARTIFACT_PUSHED: &str = "artifact.pushed";
    /// Artifact fetched from a server event type.
    pub const ARTIFACT_FETCHED: &str = "artifact.fetched";

    /// Signing key loaded event type.
    pub const KEY_LOADED: &str = "key.loaded";
    /// Trusted key added event type.
    pub const KEY_TRUSTED_ADDED: &str = "key.trusted.added";
    /// Trusted key revoked event type.
    pub const KEY_TRUSTED_REVOKED: &str = "key.trusted.revoked";

    /// Verification success event type.
    pub const VERIFICATION_SUCCESS: &str = "verification.success";
    /// Verification failure event type.
    pub const VERIFICATION_FAILURE: &str = "verification.failure";

    /// Network retry scheduled event type.
    pub const NETWORK_RETRY: &str = "network.retry";
}

/// Log a signing key load event.
pub fn log_key_loaded(source: &str, key_id: &str) {
    tracing::info!(
        event_type = events::KEY_LOADED,
        key_source = %source,
        key_id = %key_id,
        "Signing key loaded"
    );
}

/// Log an artifact signing event.
pub fn log_artifact_signed(artifact_id: &str, key_id: &str, expires_at: Option<DateTime<Utc>>) {
    tracing::info!(
        event_type = events::ARTIFACT_SIGNED,
        artifact_id = %artifact_id,
        key_id = %key_id,
        expires_at = %expires_at.map(|t| t.to_rfc3339()).unwrap_or_else(|| "<never>".to_string()),
        "Artifact signed"
    );
}

/// Log an artifact signing failure.
pub fn log_artifact_sign_failed(artifact_id: &str, key_id: &str, error: &str) {
    tracing::error!(
        event_type = events::ARTIFACT_SIGN_FAILURE,
        artifact_id = %artifact_id,
        key_id = %key_id,
        error = %error,
        "Artifact signing failed"
    );
}

/// Log a trusted key addition event.
pub fn log_trusted_key_added(key_id: &str, trusted_until: Option<DateTime<Utc>>) {
    tracing::warn!(
        event_type = events::KEY_TRUSTED_ADDED,
        key_id = %key_id,
        trusted_until = %trusted_until.map(|t| t.to_rfc3339()).unwrap_or_else(|| "<open>".to_string()),
        "Trusted key added"
    );
}

/// Log a trusted key revocation event.
pub fn log_trusted_key_revoked(key_id: &str) {
    tracing::warn!(
        event_type = events::KEY_TRUSTED_REVOKED,
        key_id = %key_id,
        "Trusted key revoked"
    );
}

/// Log a verification success event.
pub fn log_verification_success(artifact_id: &str, key_id: &str, verified_at: DateTime<Utc>) {
    tracing::info!(
        event_type = events::VERIFICATION_SUCCESS,
        artifact_id = %artifact_id,
        key_id = %key_id,
        verified_at = %verified_at.to_rfc3339(),
        "Artifact signature verified successfully"
    );
}

/// Log a verification failure event.
pub fn log_verification_failure(artifact_id: &str, failure_reason: &str, key_id: Option<&str>) {
    tracing::warn!(
        event_type = events::VERIFICATION_FAILURE,
        artifact_id = %artifact_id,
        failure_reason = %failure_reason,
        key_id = key_id.unwrap_or("<unknown>"),
        "Artifact signature verification failed"
    );
}

/// Log a successful push to a server.
pub fn log_artifact_pushed(artifact_id: &str, server: &str, duplicate: bool) {
    tracing::info!(
        event_type = events::ARTIFACT_PUSHED,
        artifact_id = %artifact_id,
        server = %server,
        duplicate = duplicate,
        "Artifact pushed"
    );
}

/// Log a successful fetch from a server.
pub fn log_artifact_fetched(artifact_id: &str, server: &str) {
    tracing::info!(
        event_type = events::ARTIFACT_FETCHED,
        artifact_id = %artifact_id,
        server = %server,
        "Artifact fetched"
    );
}

/// Log a scheduled retry of a transient network failure.
pub fn log_retry_scheduled(operation: &str, attempt: u32, delay: Duration, error: &str) {
    tracing::warn!(
        event_type = events::NETWORK_RETRY,
        operation = %operation,
        attempt = attempt,
        delay_ms = delay.as_millis() as u64,
        error = %error,
        "Transient failure, retrying"
    );
}
