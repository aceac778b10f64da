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

//! Security module for artifact signing and verification.
//!
//! This module provides:
//! - [`KeyProvider`] trait with local-file and remote KMS implementations
//! - [`Signer`] producing signature envelopes
//! - [`TrustStore`] of operator-trusted public keys
//! - [`Verifier`] state machine rendering a [`Verdict`]
//! - Security audit logging for SIEM integration

pub mod audit;
mod key_provider;
mod kms;
mod signer;
mod trust_store;
mod verification;

pub use key_provider::{KeyProvider, KeyProviderError, LocalFileKeyProvider};
pub use kms::{RemoteKmsKeyProvider, KMS_SIGNING_ALGORITHM};
pub use signer::{Signer, SigningError, SigningPolicy};
pub use trust_store::{TrustStore, TrustStoreError, TrustedKey};
pub use verification::{
    FailureReason, Verdict, VerificationOutcome, VerificationState, Verifier, VerifyError,
};
